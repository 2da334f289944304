use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {0}: {1}")]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("duplicate box name: {0}")]
    DuplicateBoxName(String),

    #[error("no boxes defined")]
    NoBoxesDefined,

    #[error("box {0:?} has an empty program argv")]
    EmptyProgram(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
