//! Template error types.

/// Errors raised while parsing or evaluating a template.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Unterminated template tag starting at offset {0}")]
    UnterminatedTag(usize),

    #[error("Unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("Undefined method '{method}' for {receiver}")]
    UnknownMethod { method: String, receiver: String },

    #[error("Environment variable not set: {0}")]
    MissingEnv(String),

    #[error("Type error: {0}")]
    Type(String),
}

impl TemplateError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        TemplateError::Syntax {
            offset,
            message: message.into(),
        }
    }
}
