/*!
 * Error types for the yantwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when calling a generative model API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error related to rate limiting or server overload (HTTP 429/503)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The request did not complete within the per-call timeout
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The model refused the prompt (safety block)
    #[error("Prompt blocked by the model: {0}")]
    PromptBlocked(String),

    /// The model returned an empty or unusable completion
    #[error("Empty model response")]
    EmptyResponse,

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether the error is a throttling signal that should not be
    /// persisted as a shard failure. The shard is left without output and
    /// is naturally picked up again by the next new-task pass.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => {
                *status_code == 429 || *status_code == 503 || *status_code == 504
            }
            _ => false,
        }
    }
}

/// Errors that can occur in the durable progress store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error from a file operation on the progress document
    #[error("Progress file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error serializing or deserializing the progress document
    #[error("Progress file serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
