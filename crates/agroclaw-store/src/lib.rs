//! # AgroClaw Store
//!
//! SQLite persistence for the advisory content: news articles, weekly
//! growing tips, and news categories. This is the ground truth the RAG
//! corpus is built from.

pub mod sqlite;

pub use sqlite::SqliteStore;
