use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("corpus is empty: no documents were indexed")]
    EmptyCorpus,

    #[error("invalid weighting config: {0}")]
    InvalidWeightingConfig(String),

    #[error("invalid stop pattern: {0}")]
    InvalidStopPattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed index at line {line}: {reason}")]
    MalformedIndex { line: usize, reason: String },

    #[error("cannot write {field} {value:?}: tabs and line breaks are not allowed")]
    UnwritableField { field: &'static str, value: String },

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
