use nicval_rss::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DumpError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DumpError {
    #[error("invalid RSS key hex: {0}")]
    KeyHex(#[from] hex::FromHexError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("dump has no {0} section")]
    MissingSection(&'static str),

    #[error("line {line}: expected indirection table row at offset {expected}, found {found}")]
    TableOffsetGap {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid number {value:?}")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: expected `<name>: <value>`")]
    MalformedLine { line: usize },

    #[error("line {line}: duplicate entry {name:?}")]
    Duplicate { line: usize, name: String },

    #[error("counter {name:?} is missing")]
    MissingCounter { name: String },

    #[error("counter {name:?} went backwards ({before} -> {after})")]
    CounterWentBackwards { name: String, before: u64, after: u64 },

    #[error("counter pattern {0:?} has no `{{q}}` placeholder")]
    InvalidPattern(String),
}
