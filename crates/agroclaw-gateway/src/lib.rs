//! # AgroClaw Gateway
//!
//! HTTP surface of the advisory backend: the chat endpoint plus CRUD
//! for the content that feeds the RAG corpus.

pub mod routes;
pub mod server;

pub use server::{start, AppState};
