use std::{error::Error, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of query parameter slots a control exposes (`${1}` through `${5}`).
pub const MAX_PARAMETERS: usize = 5;

/// A single external query parameter.
///
/// Serialized externally tagged, e.g. `{ scalar: "foo" }` or
/// `{ reference: ["6d0f..."] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Plain field value (text, number, option set value, ...).
    Scalar(Value),
    /// Lookup field value; an empty id list means nothing is selected.
    Reference(Vec<String>),
}

impl Parameter {
    pub fn scalar(value: impl Into<Value>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn reference<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Reference(ids.into_iter().map(Into::into).collect())
    }
}

/// Raised when a parameter index falls outside `1..=MAX_PARAMETERS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterIndexError(pub usize);

impl fmt::Display for ParameterIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parameter index {} is out of range; expected 1..={}", self.0, MAX_PARAMETERS)
    }
}

impl Error for ParameterIndexError {}

/// Fixed-size, 1-based collection of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<usize, Parameter>", into = "IndexMap<usize, Parameter>")]
pub struct ParameterSet {
    slots: [Option<Parameter>; MAX_PARAMETERS],
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`ParameterSet::set`].
    pub fn with(mut self, index: usize, parameter: Parameter) -> Result<Self, ParameterIndexError> {
        self.set(index, parameter)?;
        Ok(self)
    }

    /// Store `parameter` in slot `index` (1-based), replacing any previous value.
    pub fn set(&mut self, index: usize, parameter: Parameter) -> Result<(), ParameterIndexError> {
        let slot = Self::slot_for(index).ok_or(ParameterIndexError(index))?;
        self.slots[slot] = Some(parameter);
        Ok(())
    }

    /// Remove the parameter in slot `index`, returning it if present.
    pub fn clear(&mut self, index: usize) -> Option<Parameter> {
        Self::slot_for(index).and_then(|slot| self.slots[slot].take())
    }

    /// Look up slot `index`. Out-of-range indexes behave like empty slots.
    pub fn get(&self, index: usize) -> Option<&Parameter> {
        Self::slot_for(index).and_then(|slot| self.slots[slot].as_ref())
    }

    /// Iterate populated slots as `(index, parameter)` in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Parameter)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, parameter)| parameter.as_ref().map(|parameter| (slot + 1, parameter)))
    }

    fn slot_for(index: usize) -> Option<usize> {
        (1..=MAX_PARAMETERS).contains(&index).then(|| index - 1)
    }
}

impl TryFrom<IndexMap<usize, Parameter>> for ParameterSet {
    type Error = ParameterIndexError;

    fn try_from(entries: IndexMap<usize, Parameter>) -> Result<Self, Self::Error> {
        let mut set = ParameterSet::new();
        for (index, parameter) in entries {
            set.set(index, parameter)?;
        }
        Ok(set)
    }
}

impl From<ParameterSet> for IndexMap<usize, Parameter> {
    fn from(set: ParameterSet) -> Self {
        set.iter().map(|(index, parameter)| (index, parameter.clone())).collect()
    }
}
