use thiserror::Error;

/// Errors that escape the core's dispatch boundaries.
///
/// Hook faults, command handler faults, and fetch failures are contained where
/// they happen and only logged; this is what reaches the input loop.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("unknown command {0:?}")]
    CommandNotFound(String),
}
