//! Wire types and document model shared across AgroClaw crates.

use serde::{Deserialize, Serialize};

/// One prior exchange in a conversation, as supplied by the caller.
/// The backend keeps no conversation state of its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub assistant: String,
}

/// Inbound chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    Success,
    Error,
}

/// Outbound chat response. Errors are reported in-band with a fixed
/// user-facing message; internal detail stays in the server logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub status: ChatStatus,
}

impl ChatResponse {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            status: ChatStatus::Success,
        }
    }

    pub fn error(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            status: ChatStatus::Error,
        }
    }
}

/// Source kind of a retrievable document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    News,
    Tip,
}

impl DocKind {
    /// Stable id prefix, e.g. `news_12`.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            DocKind::News => "news_",
            DocKind::Tip => "tip_",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::News => "news",
            DocKind::Tip => "tip",
        }
    }
}

/// A retrievable unit: the canonical text that gets embedded plus the
/// original structured record it was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub kind: DocKind,
    pub text: String,
    pub metadata: serde_json::Value,
}

/// A document surviving the relevance threshold, with its cosine score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: Document,
    pub score: f32,
}

/// A news article as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsRecord {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category_id: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    pub created_at: String,
}

/// A weekly growing tip as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    pub created_at: String,
}

/// A content category for news articles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Task hint for the embedding endpoint. Queries and documents are
/// embedded asymmetrically by the provider; the distinction must survive
/// all the way to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    Document,
    Query,
}

impl EmbeddingTask {
    pub fn as_wire(&self) -> &'static str {
        match self {
            EmbeddingTask::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingTask::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Identifier for a system-instruction variant. Model handles are cached
/// by `(model, InstructionId)` — an explicit enum, so two different
/// instruction texts can never collide the way content hashes can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionId {
    /// The agricultural-advisor persona bound to every chat generation.
    Advisor,
}

/// A persona/policy text bound once per model handle rather than being
/// concatenated into every prompt.
#[derive(Debug, Clone)]
pub struct SystemInstruction {
    pub id: InstructionId,
    pub text: String,
}

impl SystemInstruction {
    pub fn new(id: InstructionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_history_defaults_empty() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "merhaba"}"#).unwrap();
        assert_eq!(req.message, "merhaba");
        assert!(req.conversation_history.is_empty());
    }

    #[test]
    fn test_chat_status_wire_format() {
        let ok = serde_json::to_string(&ChatResponse::success("tamam")).unwrap();
        assert!(ok.contains(r#""status":"success""#));
        let err = serde_json::to_string(&ChatResponse::error("hata")).unwrap();
        assert!(err.contains(r#""status":"error""#));
    }

    #[test]
    fn test_scored_document_flattens() {
        let doc = Document {
            id: "news_1".into(),
            kind: DocKind::News,
            text: "t".into(),
            metadata: serde_json::json!({}),
        };
        let scored = ScoredDocument {
            document: doc,
            score: 0.5,
        };
        let v = serde_json::to_value(&scored).unwrap();
        assert_eq!(v["id"], "news_1");
        assert_eq!(v["kind"], "news");
        assert!((v["score"].as_f64().unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_embedding_task_hints_differ() {
        assert_ne!(
            EmbeddingTask::Document.as_wire(),
            EmbeddingTask::Query.as_wire()
        );
    }
}
