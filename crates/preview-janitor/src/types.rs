//! Core types for preview-janitor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical name of a preview deployment, derived from a branch name by the
/// naming normalizer.
///
/// Both reconciliation paths recompute this independently, so construction
/// goes through [`crate::naming::Namer`] everywhere outside tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentName(String);

impl DeploymentName {
    /// Wrap an already-normalized name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DeploymentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Per-deployment protection setting, decoded once at the provider boundary.
///
/// The provider stores this as an untyped config value; [`Self::from_config_value`]
/// is the single place that string gets coerced. `Unset` behaves as "not
/// protected": a deployment never explicitly configured is deletable by the
/// sweep. That default fails open toward deletion and is intentional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionFlag {
    /// Deletion protection explicitly enabled.
    Enabled,
    /// Deletion protection explicitly disabled.
    Disabled,
    /// No protection setting present on the deployment.
    Unset,
}

impl ProtectionFlag {
    /// Decode a raw provider config value.
    ///
    /// `None` means the key was absent entirely. Empty strings and the usual
    /// falsy spellings decode as `Disabled`; anything else present is taken
    /// as an explicit opt-in.
    #[must_use]
    pub fn from_config_value(value: Option<&str>) -> Self {
        match value {
            None => Self::Unset,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "no" | "off" => Self::Disabled,
                _ => Self::Enabled,
            },
        }
    }

    /// Whether this flag explicitly enables protection.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }

    /// Get the flag name as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Unset => "unset",
        }
    }
}

impl fmt::Display for ProtectionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A provisioned ephemeral deployment as observed from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Deployment name (carries the namespace prefix).
    pub name: DeploymentName,
    /// Protection setting stored on the deployment.
    pub protection: ProtectionFlag,
}

/// An open pull request as observed from the VCS host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// Name of the branch the pull request is created from.
    pub head_branch: String,
}

/// Lifecycle action reported in a pull request event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    /// Pull request opened.
    Opened,
    /// Pull request closed (merged or abandoned).
    Closed,
    /// Pull request reopened.
    Reopened,
    /// New commits pushed to the head branch.
    Synchronize,
    /// Any action this service does not act on.
    #[serde(other)]
    Other,
}

impl PullRequestAction {
    /// Whether this action denotes closure of the pull request.
    #[must_use]
    pub const fn is_closure(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// A validated pull request lifecycle notification.
///
/// Constructed by the webhook receiver only after the payload has been
/// checked for both an action code and a head branch name.
#[derive(Debug, Clone)]
pub struct PullRequestEvent {
    /// Action code from the notification.
    pub action: PullRequestAction,
    /// Head branch of the pull request.
    pub head_branch: String,
    /// Delivery identifier from the webhook sender, for audit logs.
    pub delivery_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protection_flag_decoding() {
        assert_eq!(
            ProtectionFlag::from_config_value(None),
            ProtectionFlag::Unset
        );
        assert_eq!(
            ProtectionFlag::from_config_value(Some("true")),
            ProtectionFlag::Enabled
        );
        assert_eq!(
            ProtectionFlag::from_config_value(Some("1")),
            ProtectionFlag::Enabled
        );
        assert_eq!(
            ProtectionFlag::from_config_value(Some("enabled")),
            ProtectionFlag::Enabled
        );
        assert_eq!(
            ProtectionFlag::from_config_value(Some("false")),
            ProtectionFlag::Disabled
        );
        assert_eq!(
            ProtectionFlag::from_config_value(Some("0")),
            ProtectionFlag::Disabled
        );
        assert_eq!(
            ProtectionFlag::from_config_value(Some("")),
            ProtectionFlag::Disabled
        );
    }

    #[test]
    fn only_explicit_enable_protects() {
        assert!(ProtectionFlag::Enabled.is_enabled());
        assert!(!ProtectionFlag::Disabled.is_enabled());
        assert!(!ProtectionFlag::Unset.is_enabled());
    }

    #[test]
    fn action_closure_detection() {
        assert!(PullRequestAction::Closed.is_closure());
        assert!(!PullRequestAction::Opened.is_closure());
        assert!(!PullRequestAction::Synchronize.is_closure());
        assert!(!PullRequestAction::Other.is_closure());
    }

    #[test]
    fn unknown_action_deserializes_as_other() {
        let action: PullRequestAction = serde_json::from_str("\"labeled\"").unwrap();
        assert_eq!(action, PullRequestAction::Other);
    }
}
