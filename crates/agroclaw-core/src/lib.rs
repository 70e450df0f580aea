//! # AgroClaw Core
//!
//! Shared foundation for the AgroClaw advisory backend: error taxonomy,
//! configuration, wire types, and the capability traits that decouple the
//! orchestration layers from the concrete provider and record store.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{AgroClawError, Result};
