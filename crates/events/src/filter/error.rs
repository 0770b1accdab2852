use thiserror::Error;

/// Errors that can occur when evaluating a filter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The message could not be parsed by the filter.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// The filter could not be evaluated against the message.
    #[error("filter evaluation failed: {0}")]
    Evaluation(String),
}
