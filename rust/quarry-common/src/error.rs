use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    /// A node or structure was assembled with a shape its kind does not accept
    /// (e.g. a fixed-arity formula with the wrong number of children).
    pub fn invalid_structure(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidStructure {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    /// A caller broke a precondition of the operation. These indicate a bug upstream and
    /// must never be swallowed.
    pub fn invariant_violation(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvariantViolation {
                message: message.into(),
            }
            .into(),
        )
    }

    /// Returns `true` for errors that signal a programming error in the caller rather than
    /// a runtime condition.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidStructure { .. } | ErrorKind::InvariantViolation { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid structure of '{element}': {message}")]
    InvalidStructure { element: String, message: String },

    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
