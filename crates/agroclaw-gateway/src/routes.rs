//! API route handlers for the gateway.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use agroclaw_core::types::{ChatRequest, ChatResponse};

use crate::server::AppState;

type ApiResult = std::result::Result<Json<Value>, (StatusCode, Json<Value>)>;

fn internal(detail: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": detail })),
    )
}

fn not_found(what: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("{what} not found") })),
    )
}

/// Health check endpoint.
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "AgroClaw API is running",
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let gemini_status = if state.advisor.is_configured() {
        "configured"
    } else {
        "not_configured"
    };
    Json(json!({
        "status": "healthy",
        "message": format!("API is running. Gemini API: {gemini_status}"),
        "rag_documents": state.retriever.doc_count(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Chat endpoint. Generation failures come back in-band as an error
/// status; only a missing credential is an HTTP-level failure.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> std::result::Result<Json<ChatResponse>, (StatusCode, Json<Value>)> {
    if !state.advisor.is_configured() {
        return Err(internal(
            "Gemini API key not configured. Please set GEMINI_API_KEY in your environment".into(),
        ));
    }
    Ok(Json(state.advisor.chat(&request).await))
}

#[derive(Deserialize)]
pub struct GenerateTextParams {
    pub prompt: String,
}

/// Simple one-shot generation without retrieval.
pub async fn generate_text(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GenerateTextParams>,
) -> ApiResult {
    if !state.advisor.is_configured() {
        return Err(internal("Gemini API key not configured".into()));
    }
    let text = state
        .advisor
        .generate_text(&params.prompt)
        .await
        .map_err(|e| internal(format!("Error generating text: {e}")))?;
    Ok(Json(json!({
        "generated_text": text,
        "status": "success",
    })))
}

/// Force a full corpus re-embed and snapshot rewrite.
pub async fn rag_refresh(State(state): State<Arc<AppState>>) -> ApiResult {
    let count = state
        .retriever
        .load(true)
        .await
        .map_err(|e| internal(format!("Error refreshing index: {e}")))?;
    Ok(Json(json!({
        "status": "success",
        "message": "RAG index rebuilt",
        "documents": count,
    })))
}

// ========== NEWS ==========

#[derive(Deserialize)]
pub struct ListNewsParams {
    pub limit: Option<usize>,
    pub category_id: Option<i64>,
}

pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListNewsParams>,
) -> ApiResult {
    let news = state
        .store
        .all_news(params.limit, params.category_id)
        .map_err(|e| internal(format!("Error fetching news: {e}")))?;
    Ok(Json(json!({
        "status": "success",
        "count": news.len(),
        "data": news,
    })))
}

pub async fn get_news(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult {
    let news = state
        .store
        .get_news(id)
        .map_err(|e| internal(format!("Error fetching news: {e}")))?
        .ok_or_else(|| not_found("News"))?;
    Ok(Json(json!({ "status": "success", "data": news })))
}

#[derive(Deserialize)]
pub struct NewsCreate {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category_id: i64,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
}

pub async fn create_news(
    State(state): State<Arc<AppState>>,
    Json(news): Json<NewsCreate>,
) -> ApiResult {
    let id = state
        .store
        .add_news(
            &news.title,
            &news.summary,
            &news.content,
            news.category_id,
            news.image_url.as_deref(),
            news.published_at.as_deref(),
        )
        .map_err(|e| internal(format!("Error creating news: {e}")))?;
    Ok(Json(json!({
        "status": "success",
        "message": "News created",
        "id": id,
    })))
}

#[derive(Deserialize)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
}

pub async fn update_news(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(news): Json<NewsUpdate>,
) -> ApiResult {
    let updated = state
        .store
        .update_news(
            id,
            news.title.as_deref(),
            news.summary.as_deref(),
            news.content.as_deref(),
            news.category_id,
            news.image_url.as_deref(),
            news.published_at.as_deref(),
        )
        .map_err(|e| internal(format!("Error updating news: {e}")))?;
    if !updated {
        return Err(not_found("News"));
    }
    Ok(Json(json!({ "status": "success", "message": "News updated" })))
}

pub async fn delete_news(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult {
    let deleted = state
        .store
        .delete_news(id)
        .map_err(|e| internal(format!("Error deleting news: {e}")))?;
    if !deleted {
        return Err(not_found("News"));
    }
    Ok(Json(json!({ "status": "success", "message": "News deleted" })))
}

// ========== TIPS ==========

#[derive(Deserialize)]
pub struct ListTipsParams {
    pub limit: Option<usize>,
    pub difficulty: Option<String>,
}

pub async fn list_tips(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTipsParams>,
) -> ApiResult {
    let tips = state
        .store
        .all_tips(params.limit, params.difficulty.as_deref())
        .map_err(|e| internal(format!("Error fetching tips: {e}")))?;
    Ok(Json(json!({
        "status": "success",
        "count": tips.len(),
        "data": tips,
    })))
}

pub async fn get_tip(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult {
    let tip = state
        .store
        .get_tip(id)
        .map_err(|e| internal(format!("Error fetching tip: {e}")))?
        .ok_or_else(|| not_found("Tip"))?;
    Ok(Json(json!({ "status": "success", "data": tip })))
}

#[derive(Deserialize)]
pub struct TipCreate {
    pub title: String,
    pub content: String,
    pub difficulty: Option<String>,
}

pub async fn create_tip(
    State(state): State<Arc<AppState>>,
    Json(tip): Json<TipCreate>,
) -> ApiResult {
    let id = state
        .store
        .add_tip(&tip.title, &tip.content, tip.difficulty.as_deref())
        .map_err(|e| internal(format!("Error creating tip: {e}")))?;
    Ok(Json(json!({
        "status": "success",
        "message": "Tip created",
        "id": id,
    })))
}

#[derive(Deserialize)]
pub struct TipUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub difficulty: Option<String>,
}

pub async fn update_tip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(tip): Json<TipUpdate>,
) -> ApiResult {
    let updated = state
        .store
        .update_tip(
            id,
            tip.title.as_deref(),
            tip.content.as_deref(),
            tip.difficulty.as_deref(),
        )
        .map_err(|e| internal(format!("Error updating tip: {e}")))?;
    if !updated {
        return Err(not_found("Tip"));
    }
    Ok(Json(json!({ "status": "success", "message": "Tip updated" })))
}

pub async fn delete_tip(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult {
    let deleted = state
        .store
        .delete_tip(id)
        .map_err(|e| internal(format!("Error deleting tip: {e}")))?;
    if !deleted {
        return Err(not_found("Tip"));
    }
    Ok(Json(json!({ "status": "success", "message": "Tip deleted" })))
}

// ========== CATEGORIES ==========

pub async fn list_categories(State(state): State<Arc<AppState>>) -> ApiResult {
    let categories = state
        .store
        .all_categories()
        .map_err(|e| internal(format!("Error fetching categories: {e}")))?;
    Ok(Json(json!({
        "status": "success",
        "count": categories.len(),
        "data": categories,
    })))
}

pub async fn get_category(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult {
    let category = state
        .store
        .get_category(id)
        .map_err(|e| internal(format!("Error fetching category: {e}")))?
        .ok_or_else(|| not_found("Category"))?;
    Ok(Json(json!({ "status": "success", "data": category })))
}

#[derive(Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub description: Option<String>,
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(category): Json<CategoryCreate>,
) -> ApiResult {
    let id = state
        .store
        .add_category(&category.name, category.description.as_deref())
        .map_err(|e| internal(format!("Error creating category: {e}")))?;
    Ok(Json(json!({
        "status": "success",
        "message": "Category created",
        "id": id,
    })))
}
