use thiserror::Error;

/// User-visible shell failures. The display strings are stable output and
/// are asserted on by the integration tests; do not reword them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("Invalid Syntax!")]
    InvalidSyntax,
    #[error("No such file or directory")]
    NoSuchFile,
    #[error("Unable to create file for writing")]
    UnableToCreateFile,
    #[error("No such directory!")]
    NoSuchDirectory,
    #[error("No such process found")]
    NoSuchProcess,
    #[error("Command not found!")]
    CommandNotFound,
    #[error("No such job")]
    NoSuchJob,
    #[error("Job already running")]
    JobAlreadyRunning,
}
