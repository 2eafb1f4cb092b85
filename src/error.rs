use thiserror::Error;

#[derive(Error, Debug)]
pub enum GonkError {
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job already finished: {0}")]
    JobAlreadyFinished(String),

    #[error("No path specified")]
    MissingPath,

    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    #[error("Path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GonkError>;
