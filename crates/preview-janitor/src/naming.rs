//! Deployment naming normalizer.
//!
//! Derives the canonical deployment name for a branch. The derivation must be
//! pure and total: the webhook path and the sweep path both recompute it and
//! have to agree on the result for the diff in the sweep to be meaningful.

use crate::types::DeploymentName;

/// Maximum length of a deployment name, imposed by the provider.
pub const MAX_NAME_LEN: usize = 30;

/// Separator character that may be left dangling by truncation.
const SEPARATOR: char = '-';

/// Derives deployment names from branch names using a fixed namespace prefix.
#[derive(Debug, Clone)]
pub struct Namer {
    prefix: String,
}

impl Namer {
    /// Create a namer with the given namespace prefix (e.g. `"preview-pr-"`).
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The namespace prefix, as passed to the provider when listing.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derive the deployment name for a branch.
    ///
    /// Prefixes, truncates to [`MAX_NAME_LEN`] characters, strips every
    /// trailing separator left by the truncation, and lowercases. A branch
    /// that is mostly separators at the truncation boundary therefore never
    /// produces a name ending in one.
    #[must_use]
    pub fn deployment_name(&self, branch: &str) -> DeploymentName {
        let combined = format!("{}{}", self.prefix, branch);
        let truncated: String = combined.chars().take(MAX_NAME_LEN).collect();
        DeploymentName::new(truncated.trim_end_matches(SEPARATOR).to_lowercase())
    }
}
