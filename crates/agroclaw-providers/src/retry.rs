//! Rotate-and-retry execution policy.
//!
//! One attempt per pooled credential. Only quota/permission failures
//! trigger rotation; anything else propagates on the first attempt.

use std::future::Future;
use std::time::Duration;

use agroclaw_core::{AgroClawError, Result};

use crate::credentials::CredentialPool;

/// Run `op` against the pool's active credential, rotating on
/// quota/permission failures until every key has had one attempt.
pub async fn execute_with_rotation<F, Fut, T>(
    pool: &CredentialPool,
    backoff: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = pool.len().max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_rotatable() => {
                tracing::warn!(
                    "⚠️ Credential {} rejected (attempt {}/{}): {}",
                    pool.masked_current(),
                    attempt,
                    attempts,
                    e
                );
                last_err = Some(e);
                if attempt < attempts && pool.rotate() {
                    tokio::time::sleep(backoff).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or(AgroClawError::Unconfigured))
}
