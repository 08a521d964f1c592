//! Error taxonomy
//!
//! Every fallible bridge operation returns [`Result`]. Violations of the
//! wrapper lifetime invariants are bridge defects and panic instead.

/// Errors surfaced to calling code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The managed heap refused an allocation.
    #[error("out of memory")]
    OutOfMemory,

    /// Wrong receiver or operand type.
    #[error("type error: {0}")]
    Type(String),

    /// The operation is not permitted on this node or property.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The MIME type is not on the parser's allow-list.
    #[error("Unsupported type {0}")]
    UnsupportedType(String),

    /// The document text is not well-formed.
    #[error("Failed to parse document: {0}")]
    Parse(String),
}

impl Error {
    pub(crate) fn type_error(msg: impl Into<String>) -> Self {
        Error::Type(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidOperation(msg.into())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
