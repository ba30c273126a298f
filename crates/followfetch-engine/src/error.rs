use thiserror::Error;

/// Selection-time failure that aborts a request before any attempt.
pub type ConfigurationError = followfetch_utils::error::SelectionError;

/// A success payload whose follower list does not have the required shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("payload has no followers list")]
    MissingFollowers,

    #[error("follower entry {index} is not an object")]
    NotAnObject { index: usize },

    #[error("follower entry {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },
}
