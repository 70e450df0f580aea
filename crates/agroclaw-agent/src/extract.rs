//! Response text extraction.
//!
//! The generateContent payload shape drifts across model versions, so
//! the candidate/content/parts path is probed in order of likelihood
//! before giving up and coercing the raw JSON.

use serde_json::Value;

fn parts_text(parts: &Value) -> Option<String> {
    let parts = parts.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Pull the answer text out of a generation response, trying each known
/// shape in turn.
pub fn response_text(value: &Value) -> Option<String> {
    if let Some(text) = parts_text(&value["candidates"][0]["content"]["parts"]) {
        return Some(text);
    }
    if let Some(text) = value["candidates"][0]["text"].as_str() {
        return Some(text.to_string());
    }
    if let Some(text) = parts_text(&value["content"]["parts"]) {
        return Some(text);
    }
    if let Some(text) = value["text"].as_str() {
        return Some(text.to_string());
    }
    None
}

/// Extraction that never fails: unknown shapes come back as raw JSON so
/// the user at least sees something and the logs show what arrived.
pub fn response_text_or_raw(value: &Value) -> String {
    response_text(value).unwrap_or_else(|| {
        tracing::warn!("⚠️ Unrecognized generation response shape, coercing to string");
        value.to_string()
    })
}
