//! Credential rotation pool.
//!
//! Multiple free-tier API keys loaded from the environment, advanced
//! round-robin whenever the active one runs out of quota. Rotation bumps
//! a generation counter so cached model handles built against the old
//! key are rebuilt lazily.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use agroclaw_core::{AgroClawError, Result};

/// Primary key variable; extras are numbered from 2.
const ENV_PRIMARY: &str = "GEMINI_API_KEY";
/// Highest numbered extra key scanned (GEMINI_API_KEY_2 .. _9).
const ENV_MAX_EXTRA: usize = 9;

pub struct CredentialPool {
    keys: Vec<String>,
    index: AtomicUsize,
    generation: AtomicU64,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            index: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
        }
    }

    /// Collect configured keys from the environment: the primary slot,
    /// then numbered slots scanned until the first gap.
    pub fn from_env() -> Self {
        let mut keys = Vec::new();
        if let Ok(k) = std::env::var(ENV_PRIMARY) {
            if !k.trim().is_empty() {
                keys.push(k);
            }
        }
        for i in 2..=ENV_MAX_EXTRA {
            match std::env::var(format!("{ENV_PRIMARY}_{i}")) {
                Ok(k) if !k.trim().is_empty() => keys.push(k),
                _ => break,
            }
        }
        if keys.is_empty() {
            tracing::warn!("⚠️ No {ENV_PRIMARY} configured — provider calls will fail");
        } else {
            tracing::info!("🔑 Loaded {} API credential(s)", keys.len());
        }
        Self::new(keys)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The currently active key.
    pub fn key(&self) -> Result<&str> {
        if self.keys.is_empty() {
            return Err(AgroClawError::Unconfigured);
        }
        let idx = self.index.load(Ordering::Relaxed) % self.keys.len();
        Ok(&self.keys[idx])
    }

    /// Monotonic counter bumped on every rotation. Handle caches compare
    /// against it to know when to rebuild.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Advance to the next key (wrapping) and invalidate cached handles.
    /// Reports false when there is nothing to rotate to.
    pub fn rotate(&self) -> bool {
        if self.keys.len() < 2 {
            return false;
        }
        let next = (self.index.load(Ordering::Relaxed) + 1) % self.keys.len();
        self.index.store(next, Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            "🔄 Rotated to credential {}/{} ({})",
            next + 1,
            self.keys.len(),
            self.masked_current()
        );
        true
    }

    /// Log-safe form of the active key: last four characters only.
    pub fn masked_current(&self) -> String {
        match self.key() {
            Ok(k) if k.len() > 4 => format!("…{}", &k[k.len() - 4..]),
            Ok(_) => "…".into(),
            Err(_) => "<none>".into(),
        }
    }
}
