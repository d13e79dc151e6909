#![forbid(unsafe_code)]

//! Construction-time configuration for pairs and families.

/// What a binding does with the written side when conversion fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FailurePolicy {
    /// Commit the written side anyway; only the other side is held back.
    #[default]
    CommitOwnSide,
    /// Leave both sides untouched. The failure is still recorded.
    Reject,
}

/// Whether each key of a family gets its own error channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorScope {
    /// One channel per key. An evicted key comes back with a clear channel.
    #[default]
    PerKey,
    /// One channel for the whole family. Any key's outcome overwrites it,
    /// and evicting keys does not reset it.
    Shared,
}

/// Options for a single sync pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SyncOptions {
    pub failure: FailurePolicy,
}

impl SyncOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure policy.
    #[must_use]
    pub fn failure(mut self, failure: FailurePolicy) -> Self {
        self.failure = failure;
        self
    }
}

/// Options for a sync family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FamilyOptions {
    pub error_scope: ErrorScope,
    /// Applied to every per-key binding.
    pub sync: SyncOptions,
}

impl FamilyOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error channel scope.
    #[must_use]
    pub fn error_scope(mut self, error_scope: ErrorScope) -> Self {
        self.error_scope = error_scope;
        self
    }

    /// Set the failure policy of every per-key binding.
    #[must_use]
    pub fn failure(mut self, failure: FailurePolicy) -> Self {
        self.sync.failure = failure;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_commit_own_side_per_key() {
        let opts = FamilyOptions::default();
        assert_eq!(opts.error_scope, ErrorScope::PerKey);
        assert_eq!(opts.sync.failure, FailurePolicy::CommitOwnSide);
    }

    #[test]
    fn builders_chain() {
        let opts = FamilyOptions::new()
            .error_scope(ErrorScope::Shared)
            .failure(FailurePolicy::Reject);
        assert_eq!(opts.error_scope, ErrorScope::Shared);
        assert_eq!(opts.sync, SyncOptions::new().failure(FailurePolicy::Reject));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn options_deserialize_with_defaults() {
        let opts: FamilyOptions = serde_json::from_str(r#"{"error_scope":"shared"}"#).unwrap();
        assert_eq!(opts.error_scope, ErrorScope::Shared);
        assert_eq!(opts.sync.failure, FailurePolicy::CommitOwnSide);
    }
}
