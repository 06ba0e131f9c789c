use thiserror::Error;

/// A symbol uri that does not follow the symbol grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolParseError {
    #[error("Empty symbol uri")]
    Empty,

    #[error("Malformed symbol `{uri}`: missing {field}")]
    MissingField { uri: String, field: &'static str },

    #[error("Malformed symbol `{uri}`: no descriptors")]
    NoDescriptors { uri: String },

    #[error("Malformed symbol `{uri}` at byte {position}: {reason}")]
    Malformed {
        uri: String,
        position: usize,
        reason: String,
    },

    #[error("Malformed local symbol `{uri}`: invalid local id")]
    InvalidLocal { uri: String },
}

pub type SymbolResult<T> = Result<T, SymbolParseError>;
