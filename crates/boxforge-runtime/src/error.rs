use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("a box named {0:?} already exists")]
    DuplicateName(String),

    #[error("no box named {0:?} is registered")]
    UnknownBox(String),

    #[error("box {0:?} is not currently running")]
    PeerDown(String),

    #[error("box {0:?} has not been started")]
    NotRunning(String),

    #[error("box {0:?} is already running")]
    AlreadyRunning(String),

    #[error("box {0:?} has no task or handlers registered")]
    NothingRegistered(String),

    #[error("request to {0:?} timed out")]
    Timeout(String),

    #[error("handler failed: {0}")]
    HandlerFailed(String),

    #[error("sandbox error: {0}")]
    Sandbox(String),

    #[error("failed to build startup manifest: {0}")]
    Codegen(#[from] boxforge_codegen::CodegenError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
