use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuestError {
    #[error("connection closed by host")]
    ConnectionClosed,

    #[error("{0}")]
    Remote(String),

    #[error("host requested shutdown while awaiting a response")]
    ShutdownRequested,

    #[error("unknown handler name: {0}")]
    UnknownHandler(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GuestError>;
