use thiserror::Error;

/// Why loading the event catalog from a sheet link failed.
///
/// Every variant is terminal for the attempt that produced it; the caller
/// keeps whatever catalog it had before.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("malformed sheet link: {0}")]
    MalformedUrl(String),

    #[error("could not download the sheet: {0}")]
    Fetch(String),

    #[error("unexpected sheet layout: {0}")]
    Schema(String),
}

impl LoadError {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::InvalidUrl(_) => "invalid-url",
            LoadError::MalformedUrl(_) => "malformed-url",
            LoadError::Fetch(_) => "fetch",
            LoadError::Schema(_) => "schema",
        }
    }
}

/// Out-of-bounds input that reached the core despite the input widgets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("value {value} for row {row} is outside 0..=100")]
    EditOutOfRange { row: usize, value: u16 },

    #[error("row {row} does not exist")]
    RowOutOfRange { row: usize },

    #[error("event {index} is outside 1..={len}")]
    DrawOutOfRange { index: usize, len: usize },

    #[error("no event catalog loaded")]
    NoCatalog,
}
