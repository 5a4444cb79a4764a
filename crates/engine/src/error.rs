//! Error taxonomy for a resolution cycle.
//!
//! Every error here is recoverable at the cycle boundary: the session turns it
//! into the render state's error message and the next cycle starts clean.

use thiserror::Error;

/// Static configuration problems. Retrying the same cycle cannot fix these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Value field or text field are not set.")]
    MissingFieldTemplate,

    #[error("Entity type is not set.")]
    MissingEntityType,

    #[error("Query is not set.")]
    MissingQuery,

    #[error("Query references parameter ${{{index}}} which has no value.")]
    UndefinedParameter { index: usize },

    #[error("Query placeholder ${{{placeholder}}} is outside the supported range 1-5.")]
    ParameterOutOfRange { placeholder: String },
}

/// The fetch collaborator rejected the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    /// HTTP status when the failure came from a remote service.
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Anything that aborts a cycle before options can be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_placeholders_literally() {
        assert_eq!(
            ConfigurationError::UndefinedParameter { index: 3 }.to_string(),
            "Query references parameter ${3} which has no value."
        );
        assert_eq!(
            ConfigurationError::ParameterOutOfRange { placeholder: "7".into() }.to_string(),
            "Query placeholder ${7} is outside the supported range 1-5."
        );
    }

    #[test]
    fn engine_error_is_transparent() {
        let error: EngineError = FetchError::new("service unavailable").with_status(503).into();
        assert_eq!(error.to_string(), "service unavailable");
        let error: EngineError = ConfigurationError::MissingFieldTemplate.into();
        assert_eq!(error.to_string(), "Value field or text field are not set.");
    }
}
