//! Query materialization.
//!
//! Query templates reference the control's external parameters by position:
//! `?$filter=_parentaccountid_value eq ${1}`. Every placeholder must resolve;
//! a reference to a missing or out-of-range slot is a configuration error.

use picklist_types::{MAX_PARAMETERS, Parameter, ParameterSet};
use serde_json::Value;

use crate::error::ConfigurationError;
use crate::templates::{Segment, tokenize};

/// Identifier substituted for a reference parameter with nothing selected.
///
/// Query syntax needs a well-formed identifier token, so an unset lookup
/// must not collapse to an empty string.
pub const EMPTY_REFERENCE_ID: &str = "00000000-0000-0000-0000-000000000000";

/// A query template parsed into literal and positional segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    segments: Vec<Segment>,
}

impl QueryTemplate {
    /// Parse a query. Only `${digits}` is a placeholder; any other `${...}`
    /// text is passed through unchanged.
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: tokenize(raw, is_position),
        }
    }

    /// Positions referenced by the template, in order of appearance (repeats included).
    pub fn positions(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(position) => Some(position.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder from `parameters`, left to right.
    pub fn build(&self, parameters: &ParameterSet) -> Result<String, ConfigurationError> {
        let mut query = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => query.push_str(text),
                Segment::Placeholder(position) => {
                    let index = parse_index(position)?;
                    let parameter = parameters
                        .get(index)
                        .ok_or(ConfigurationError::UndefinedParameter { index })?;
                    query.push_str(&parameter_text(parameter));
                }
            }
        }
        Ok(query)
    }
}

/// One-shot helper: parse `template` and build it against `parameters`.
pub fn build_query(template: &str, parameters: &ParameterSet) -> Result<String, ConfigurationError> {
    QueryTemplate::parse(template).build(parameters)
}

fn parse_index(position: &str) -> Result<usize, ConfigurationError> {
    position
        .parse::<usize>()
        .ok()
        .filter(|index| (1..=MAX_PARAMETERS).contains(index))
        .ok_or_else(|| ConfigurationError::ParameterOutOfRange {
            placeholder: position.to_string(),
        })
}

fn parameter_text(parameter: &Parameter) -> String {
    match parameter {
        Parameter::Reference(ids) => ids.first().cloned().unwrap_or_else(|| EMPTY_REFERENCE_ID.to_string()),
        Parameter::Scalar(Value::String(text)) => text.clone(),
        // `null` is itself a valid query literal (`eq null`).
        Parameter::Scalar(other) => other.to_string(),
    }
}

fn is_position(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.chars().all(|character| character.is_ascii_digit())
}
