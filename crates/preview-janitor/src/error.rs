//! Error types for preview-janitor.

/// Result type alias using [`JanitorError`].
pub type JanitorResult<T> = Result<T, JanitorError>;

/// Errors that can occur while reconciling preview deployments.
///
/// A deployment that is already absent when deleted is *not* an error; the
/// deletion executor reports it as [`crate::provider::DeleteOutcome::NotFound`]
/// and both reconciliation paths treat it as success.
#[derive(Debug, thiserror::Error)]
pub enum JanitorError {
    /// Malformed notification payload, rejected before any side effect.
    #[error("invalid pull request event: {0}")]
    Validation(String),

    /// Failure from the deployment provider, with the affected deployment name.
    #[error("provider error for {name}: {message}")]
    Provider {
        /// Deployment name the operation targeted.
        name: String,
        /// Underlying cause.
        message: String,
    },

    /// Failure listing pull requests from the VCS host.
    #[error("pull request listing failed: {0}")]
    PullRequestSource(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl JanitorError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a provider error carrying the affected deployment name.
    #[must_use]
    pub fn provider(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_carries_name_context() {
        let err = JanitorError::provider("preview-pr-abc", "boom");
        assert_eq!(
            err.to_string(),
            "provider error for preview-pr-abc: boom"
        );
    }
}
