use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed archive response: {0}")]
    Protocol(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
