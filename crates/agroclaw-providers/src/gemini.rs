//! Gemini REST client.
//!
//! Speaks the `generativelanguage.googleapis.com` v1beta surface:
//! `batchEmbedContents` for embeddings and `generateContent` for chat.
//! Every request runs under the rotate-and-retry policy; prepared
//! request skeletons ("handles") are cached per (model, instruction)
//! and rebuilt when the credential generation moves.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use agroclaw_core::config::LlmConfig;
use agroclaw_core::traits::TextModel;
use agroclaw_core::types::{EmbeddingTask, InstructionId, SystemInstruction};
use agroclaw_core::{AgroClawError, Result};

use crate::credentials::CredentialPool;
use crate::retry::execute_with_rotation;

/// A prepared generateContent request, valid for one credential
/// generation.
#[derive(Clone)]
struct ModelHandle {
    generation: u64,
    url: String,
    system_instruction: Option<Value>,
}

pub struct GeminiProvider {
    config: LlmConfig,
    pool: CredentialPool,
    client: reqwest::Client,
    handles: Mutex<HashMap<(String, InstructionId), ModelHandle>>,
}

impl GeminiProvider {
    pub fn new(config: LlmConfig, pool: CredentialPool) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            config,
            pool,
            client,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    fn backoff(&self) -> Duration {
        Duration::from_millis(self.config.rotation_backoff_ms)
    }

    /// Map a non-success HTTP response onto the error taxonomy. Status
    /// code wins; the body is probed for the gRPC-style status strings
    /// some quota errors arrive under.
    fn classify(status: u16, body: &str) -> AgroClawError {
        match status {
            429 => AgroClawError::QuotaExhausted(format!("HTTP 429: {body}")),
            401 | 403 => AgroClawError::PermissionDenied(format!("HTTP {status}: {body}")),
            _ if body.contains("RESOURCE_EXHAUSTED") => {
                AgroClawError::QuotaExhausted(format!("HTTP {status}: {body}"))
            }
            _ if body.contains("PERMISSION_DENIED") => {
                AgroClawError::PermissionDenied(format!("HTTP {status}: {body}"))
            }
            _ => AgroClawError::Provider(format!("Gemini API error {status}: {body}")),
        }
    }

    /// Fetch (or rebuild) the request skeleton for this model under the
    /// active credential.
    fn handle_for(&self, model: &str, instruction: Option<&SystemInstruction>) -> Result<ModelHandle> {
        let key = self.pool.key()?.to_string();
        let generation = self.pool.generation();
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint, model, key
        );

        let Some(instr) = instruction else {
            return Ok(ModelHandle {
                generation,
                url,
                system_instruction: None,
            });
        };

        let mut handles = self
            .handles
            .lock()
            .map_err(|_| AgroClawError::Other("model handle cache poisoned".into()))?;
        let cache_key = (model.to_string(), instr.id);
        if let Some(h) = handles.get(&cache_key) {
            if h.generation == generation {
                return Ok(h.clone());
            }
            tracing::debug!("♻️ Rebuilding model handle for {model} after credential rotation");
        }
        let handle = ModelHandle {
            generation,
            url,
            system_instruction: Some(json!({ "parts": [{ "text": instr.text }] })),
        };
        handles.insert(cache_key, handle.clone());
        Ok(handle)
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AgroClawError::Http(format!("Gemini connection failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Self::classify(status.as_u16(), &text));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| AgroClawError::Http(format!("Gemini response decode failed: {e}")))
    }
}

#[async_trait]
impl TextModel for GeminiProvider {
    async fn embed(
        &self,
        model: &str,
        texts: &[String],
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let requests: Vec<Value> = texts
            .iter()
            .map(|t| {
                json!({
                    "model": model,
                    "content": { "parts": [{ "text": t }] },
                    "taskType": task.as_wire(),
                })
            })
            .collect();
        let body = json!({ "requests": requests });

        let response = execute_with_rotation(&self.pool, self.backoff(), move || {
            let body = body.clone();
            async move {
                let key = self.pool.key()?;
                let url = format!(
                    "{}/{}:batchEmbedContents?key={}",
                    self.config.endpoint, model, key
                );
                self.post_json(&url, &body).await
            }
        })
        .await?;

        let embeddings = response["embeddings"]
            .as_array()
            .ok_or_else(|| AgroClawError::Provider("No embeddings in response".into()))?;
        if embeddings.len() != texts.len() {
            return Err(AgroClawError::Provider(format!(
                "Embedding count mismatch: {} requested, {} returned",
                texts.len(),
                embeddings.len()
            )));
        }

        embeddings
            .iter()
            .map(|e| {
                e["values"]
                    .as_array()
                    .map(|vals| {
                        vals.iter()
                            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                            .collect()
                    })
                    .ok_or_else(|| AgroClawError::Provider("Embedding missing values".into()))
            })
            .collect()
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        instruction: Option<&SystemInstruction>,
    ) -> Result<Value> {
        execute_with_rotation(&self.pool, self.backoff(), move || async move {
            let handle = self.handle_for(model, instruction)?;
            let mut body = json!({
                "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            });
            if let Some(si) = &handle.system_instruction {
                body["systemInstruction"] = si.clone();
            }
            self.post_json(&handle.url, &body).await
        })
        .await
    }

    fn is_configured(&self) -> bool {
        !self.pool.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_http_status() {
        assert!(matches!(
            GeminiProvider::classify(429, ""),
            AgroClawError::QuotaExhausted(_)
        ));
        assert!(matches!(
            GeminiProvider::classify(401, ""),
            AgroClawError::PermissionDenied(_)
        ));
        assert!(matches!(
            GeminiProvider::classify(403, ""),
            AgroClawError::PermissionDenied(_)
        ));
        assert!(matches!(
            GeminiProvider::classify(500, "boom"),
            AgroClawError::Provider(_)
        ));
    }

    #[test]
    fn test_classify_body_status_strings() {
        let e = GeminiProvider::classify(400, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#);
        assert!(matches!(e, AgroClawError::QuotaExhausted(_)));
        let e = GeminiProvider::classify(400, r#"{"error":{"status":"PERMISSION_DENIED"}}"#);
        assert!(matches!(e, AgroClawError::PermissionDenied(_)));
    }

    #[test]
    fn test_handle_cache_survives_within_generation() {
        let provider = GeminiProvider::new(
            LlmConfig::default(),
            CredentialPool::new(vec!["key-one".into(), "key-two".into()]),
        );
        let instr = SystemInstruction::new(InstructionId::Advisor, "sen bir tarım uzmanısın");
        let h1 = provider.handle_for("gemini-2.5-flash", Some(&instr)).unwrap();
        let h2 = provider.handle_for("gemini-2.5-flash", Some(&instr)).unwrap();
        assert_eq!(h1.url, h2.url);
        assert_eq!(h1.generation, h2.generation);
        assert!(h1.url.contains("key-one"));
    }

    #[test]
    fn test_handle_rebuilt_after_rotation() {
        let provider = GeminiProvider::new(
            LlmConfig::default(),
            CredentialPool::new(vec!["key-one".into(), "key-two".into()]),
        );
        let instr = SystemInstruction::new(InstructionId::Advisor, "sen bir tarım uzmanısın");
        let h1 = provider.handle_for("gemini-2.5-flash", Some(&instr)).unwrap();
        provider.pool().rotate();
        let h2 = provider.handle_for("gemini-2.5-flash", Some(&instr)).unwrap();
        assert_ne!(h1.generation, h2.generation);
        assert!(h2.url.contains("key-two"));
    }

    #[test]
    fn test_unconfigured_provider() {
        let provider = GeminiProvider::new(LlmConfig::default(), CredentialPool::new(vec![]));
        assert!(!provider.is_configured());
    }
}
