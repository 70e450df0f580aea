//! Capability traits at the seams of the system.
//!
//! `TextModel` is the provider boundary (embedding + generation);
//! `RecordStore` is the persisted-record boundary. Both are object-safe so
//! orchestration code can be exercised against in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    CategoryRecord, EmbeddingTask, NewsRecord, SystemInstruction, TipRecord,
};

/// The embedding/generation capability offered by the provider.
///
/// `generate` returns the provider's raw JSON response — the response
/// shape varies across model versions, so normalization into plain text
/// happens in one place upstream, not here.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Embed a batch of texts with the given task hint, one vector per
    /// input, in input order.
    async fn embed(
        &self,
        model: &str,
        texts: &[String],
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>>;

    /// Generate a completion for `prompt`, optionally under a system
    /// instruction bound to the model handle.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        instruction: Option<&SystemInstruction>,
    ) -> Result<serde_json::Value>;

    /// Whether any credential is configured at all.
    fn is_configured(&self) -> bool;
}

/// Basic CRUD over the persisted news/tips records.
pub trait RecordStore: Send + Sync {
    fn all_news(&self, limit: Option<usize>, category_id: Option<i64>) -> Result<Vec<NewsRecord>>;
    fn get_news(&self, id: i64) -> Result<Option<NewsRecord>>;
    fn add_news(
        &self,
        title: &str,
        summary: &str,
        content: &str,
        category_id: i64,
        image_url: Option<&str>,
        published_at: Option<&str>,
    ) -> Result<i64>;
    fn update_news(
        &self,
        id: i64,
        title: Option<&str>,
        summary: Option<&str>,
        content: Option<&str>,
        category_id: Option<i64>,
        image_url: Option<&str>,
        published_at: Option<&str>,
    ) -> Result<bool>;
    fn delete_news(&self, id: i64) -> Result<bool>;

    fn all_tips(&self, limit: Option<usize>, difficulty: Option<&str>) -> Result<Vec<TipRecord>>;
    fn get_tip(&self, id: i64) -> Result<Option<TipRecord>>;
    fn add_tip(&self, title: &str, content: &str, difficulty: Option<&str>) -> Result<i64>;
    fn update_tip(
        &self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
        difficulty: Option<&str>,
    ) -> Result<bool>;
    fn delete_tip(&self, id: i64) -> Result<bool>;

    fn all_categories(&self) -> Result<Vec<CategoryRecord>>;
    fn get_category(&self, id: i64) -> Result<Option<CategoryRecord>>;
    fn add_category(&self, name: &str, description: Option<&str>) -> Result<i64>;
}
