//! Protection policy for preview deployments.

use std::collections::BTreeSet;

use crate::types::ProtectionFlag;

/// Branch names that are protected unconditionally, whatever the configured
/// set says. Overriding `protection.protected_branches` adds names; it cannot
/// remove these.
const CANONICAL_BRANCHES: [&str; 2] = ["master", "production"];

/// Decides whether a deployment is exempt from deletion.
///
/// A deployment is protected when its branch name matches a protected
/// long-lived branch (case-sensitive, checked against the raw branch name
/// before any normalization) or when its protection flag is explicitly
/// enabled. An absent flag does *not* protect; the policy fails open toward
/// deletion for deployments that were never configured.
#[derive(Debug, Clone)]
pub struct ProtectionPolicy {
    protected_names: BTreeSet<String>,
}

impl ProtectionPolicy {
    /// Create a policy with the given protected branch names.
    #[must_use]
    pub fn new(protected_names: impl IntoIterator<Item = String>) -> Self {
        Self {
            protected_names: protected_names.into_iter().collect(),
        }
    }

    /// Whether a branch name is a canonical branch or in the configured
    /// protected name set.
    #[must_use]
    pub fn is_protected_name(&self, branch: &str) -> bool {
        CANONICAL_BRANCHES.contains(&branch) || self.protected_names.contains(branch)
    }

    /// Whether a deployment is protected from deletion.
    #[must_use]
    pub fn is_protected(&self, branch: &str, flag: ProtectionFlag) -> bool {
        self.is_protected_name(branch) || flag.is_enabled()
    }
}

impl Default for ProtectionPolicy {
    /// No configured names beyond the canonical branches.
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flag_protects_any_name() {
        let policy = ProtectionPolicy::default();
        assert!(policy.is_protected("some-feature", ProtectionFlag::Enabled));
    }

    #[test]
    fn protected_names_ignore_flag_state() {
        let policy = ProtectionPolicy::default();
        assert!(policy.is_protected("master", ProtectionFlag::Disabled));
        assert!(policy.is_protected("production", ProtectionFlag::Unset));
    }

    #[test]
    fn absent_flag_does_not_protect() {
        let policy = ProtectionPolicy::default();
        assert!(!policy.is_protected("some-feature", ProtectionFlag::Unset));
        assert!(!policy.is_protected("some-feature", ProtectionFlag::Disabled));
    }

    #[test]
    fn name_match_is_case_sensitive() {
        let policy = ProtectionPolicy::default();
        assert!(!policy.is_protected("Master", ProtectionFlag::Unset));
    }

    #[test]
    fn custom_name_set() {
        let policy = ProtectionPolicy::new(["main".to_owned()]);
        assert!(policy.is_protected_name("main"));
        assert!(!policy.is_protected_name("develop"));
    }

    #[test]
    fn canonical_branches_survive_a_configured_override() {
        let policy = ProtectionPolicy::new(["main".to_owned()]);
        assert!(policy.is_protected_name("master"));
        assert!(policy.is_protected_name("production"));
    }
}
