//! Model fallback chain.
//!
//! Generation models tried in priority order. Any failure advances to
//! the next model; the first answer wins. Credential rotation already
//! ran inside each attempt, so by the time we fall through a model,
//! every key was given a chance on it.

use std::future::Future;

use agroclaw_core::{AgroClawError, Result};

pub struct ModelFallback {
    models: Vec<String>,
}

impl ModelFallback {
    pub fn new(models: Vec<String>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Run `op` against each model in priority order until one answers.
    pub async fn generate<F, Fut, T>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_err = None;

        for (idx, model) in self.models.iter().enumerate() {
            match op(model.clone()).await {
                Ok(v) => {
                    if idx > 0 {
                        tracing::info!("🔄 Model fallback: {} answered", model);
                    }
                    return Ok(v);
                }
                Err(e) => {
                    tracing::warn!("⚠️ Model {} failed: {}", model, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| AgroClawError::Provider("No generation models configured".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn chain() -> ModelFallback {
        ModelFallback::new(vec![
            "gemini-2.5-flash".into(),
            "gemini-2.5-flash-lite".into(),
            "gemini-1.5-flash".into(),
        ])
    }

    #[tokio::test]
    async fn test_first_model_short_circuits() {
        let tried = Mutex::new(Vec::new());
        let out = chain()
            .generate(|model| {
                tried.lock().unwrap().push(model);
                async { Ok::<_, AgroClawError>("cevap") }
            })
            .await
            .unwrap();
        assert_eq!(out, "cevap");
        assert_eq!(tried.lock().unwrap().as_slice(), ["gemini-2.5-flash"]);
    }

    #[tokio::test]
    async fn test_any_error_advances() {
        let tried = Mutex::new(Vec::new());
        let out = chain()
            .generate(|model| {
                tried.lock().unwrap().push(model.clone());
                async move {
                    if model == "gemini-1.5-flash" {
                        Ok("yedek cevap")
                    } else {
                        // Non-rotatable errors also advance the chain.
                        Err(AgroClawError::Provider("500".into()))
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(out, "yedek cevap");
        assert_eq!(tried.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_all_models_fail_returns_last_error() {
        let err = chain()
            .generate::<_, _, ()>(|_| async {
                Err(AgroClawError::QuotaExhausted("429".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AgroClawError::QuotaExhausted(_)));
    }

    #[tokio::test]
    async fn test_composes_with_credential_rotation() {
        use crate::credentials::CredentialPool;
        use crate::retry::execute_with_rotation;
        use std::time::Duration;

        // Model A burns through every key before B gets a turn.
        let pool = CredentialPool::new(vec!["key-0".into(), "key-1".into(), "key-2".into()]);
        let chain = ModelFallback::new(vec!["model-a".into(), "model-b".into()]);

        let out = chain
            .generate(|model| {
                let pool = &pool;
                async move {
                    execute_with_rotation(pool, Duration::ZERO, || async {
                        if model == "model-b" {
                            Ok("b cevabı")
                        } else {
                            Err(AgroClawError::QuotaExhausted("429".into()))
                        }
                    })
                    .await
                }
            })
            .await
            .unwrap();

        assert_eq!(out, "b cevabı");
        // A tried 3 keys: two rotations, landing on key-2 for B.
        assert_eq!(pool.key().unwrap(), "key-2");
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let empty = ModelFallback::new(vec![]);
        let err = empty
            .generate::<_, _, ()>(|_| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, AgroClawError::Provider(_)));
    }
}
