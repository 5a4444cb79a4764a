//! Field template parsing and resolution.
//!
//! A field template derives an option key or label from a fetched record. Two
//! forms exist:
//!
//! - **Plain**: the whole template is an attribute name (`"accountid"`).
//! - **Interpolated**: literal text mixed with `${attribute}` placeholders
//!   (`"${firstname} ${lastname}"`).
//!
//! Templates are parsed once into a list of segments and then resolved against
//! any number of records without re-scanning the source text.

use picklist_types::Record;

/// Parsed fragment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied verbatim into the output.
    Literal(String),
    /// `${name}` reference, storing `name`.
    Placeholder(String),
}

/// A compiled field template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTemplate {
    /// Direct attribute lookup by the full template text.
    Plain(String),
    /// Segments containing at least one placeholder.
    Interpolated(Vec<Segment>),
}

impl FieldTemplate {
    /// Parse a raw template.
    ///
    /// Placeholder names are `[A-Za-z0-9_]+`. A `${` that is unterminated or
    /// wraps anything else stays literal text. When no placeholder survives
    /// parsing the template is treated as a plain attribute name.
    pub fn parse(raw: &str) -> Self {
        let segments = tokenize(raw, is_attribute_name);
        if segments.iter().any(|segment| matches!(segment, Segment::Placeholder(_))) {
            FieldTemplate::Interpolated(segments)
        } else {
            FieldTemplate::Plain(raw.to_string())
        }
    }

    /// Parse an optional template, treating blank text the same as an unset one.
    pub fn parse_optional(raw: Option<&str>) -> Option<Self> {
        raw.filter(|raw| !raw.trim().is_empty()).map(Self::parse)
    }

    pub fn is_interpolated(&self) -> bool {
        matches!(self, FieldTemplate::Interpolated(_))
    }

    /// Attribute names this template reads, in order of appearance.
    pub fn attributes(&self) -> Vec<&str> {
        match self {
            FieldTemplate::Plain(attribute) => vec![attribute.as_str()],
            FieldTemplate::Interpolated(segments) => segments
                .iter()
                .filter_map(|segment| match segment {
                    Segment::Placeholder(name) => Some(name.as_str()),
                    Segment::Literal(_) => None,
                })
                .collect(),
        }
    }

    /// Resolve against a record. Missing attributes resolve to an empty string.
    pub fn resolve(&self, record: &Record) -> String {
        match self {
            FieldTemplate::Plain(attribute) => record.text(attribute).unwrap_or_default(),
            FieldTemplate::Interpolated(segments) => {
                let mut output = String::new();
                for segment in segments {
                    match segment {
                        Segment::Literal(text) => output.push_str(text),
                        Segment::Placeholder(name) => {
                            if let Some(value) = record.text(name) {
                                output.push_str(&value);
                            }
                        }
                    }
                }
                output
            }
        }
    }
}

/// One-shot helper: parse `template` and resolve it against `record`.
pub fn resolve(template: &str, record: &Record) -> String {
    FieldTemplate::parse(template).resolve(record)
}

/// Split `raw` into literal and `${...}` segments.
///
/// `accepts` decides whether the text between `${` and the next `}` forms a
/// placeholder. Rejected candidates keep their `$` as literal text and scanning
/// resumes at the following character.
pub(crate) fn tokenize(raw: &str, accepts: impl Fn(&str) -> bool) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut remainder = raw;

    while let Some(start) = remainder.find("${") {
        let after_open = &remainder[start + 2..];
        match after_open.find('}') {
            Some(end) if accepts(&after_open[..end]) => {
                literal.push_str(&remainder[..start]);
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(after_open[..end].to_string()));
                remainder = &after_open[end + 1..];
            }
            _ => {
                literal.push_str(&remainder[..start + 1]);
                remainder = &remainder[start + 1..];
            }
        }
    }

    literal.push_str(remainder);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

fn is_attribute_name(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.chars().all(|character| character.is_ascii_alphanumeric() || character == '_')
}
