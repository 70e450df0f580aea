//! AgroClaw error taxonomy.
//!
//! Provider errors are classified so the retry and fallback layers can tell
//! "switch credentials" failures (quota, revoked key) apart from failures
//! that rotation cannot fix.

use thiserror::Error;

/// Convenience result alias used across all AgroClaw crates.
pub type Result<T> = std::result::Result<T, AgroClawError>;

#[derive(Error, Debug)]
pub enum AgroClawError {
    /// Provider reported the active credential's quota is spent (HTTP 429
    /// or a RESOURCE_EXHAUSTED status payload).
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Provider rejected the active credential (HTTP 401/403 or a
    /// PERMISSION_DENIED status payload).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Any other provider-side failure. Rotation does not help here.
    #[error("provider error: {0}")]
    Provider(String),

    /// Transport-level failure talking to the provider.
    #[error("http error: {0}")]
    Http(String),

    /// No credential found in the environment.
    #[error("no provider credentials configured")]
    Unconfigured,

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    /// Snapshot artifact is unreadable, truncated, or of a different
    /// version. Always fails closed into a full rebuild.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Document and embedding counts diverged after an index build.
    /// An index in this state must never be queried.
    #[error("index corruption: {documents} documents vs {embeddings} embeddings")]
    IndexCorruption { documents: usize, embeddings: usize },

    #[error("{0}")]
    Other(String),
}

impl AgroClawError {
    /// Whether switching to another credential could plausibly fix this
    /// error. Drives the rotate-and-retry policy.
    pub fn is_rotatable(&self) -> bool {
        matches!(
            self,
            AgroClawError::QuotaExhausted(_) | AgroClawError::PermissionDenied(_)
        )
    }
}

impl From<std::io::Error> for AgroClawError {
    fn from(e: std::io::Error) -> Self {
        AgroClawError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotatable_classes() {
        assert!(AgroClawError::QuotaExhausted("q".into()).is_rotatable());
        assert!(AgroClawError::PermissionDenied("p".into()).is_rotatable());
        assert!(!AgroClawError::Provider("x".into()).is_rotatable());
        assert!(!AgroClawError::Http("x".into()).is_rotatable());
        assert!(!AgroClawError::Unconfigured.is_rotatable());
    }
}
