//! # AgroClaw Providers
//!
//! The generation/embedding layer: a Gemini REST client hardened for
//! free-tier operation. Quota exhaustion on one API key rotates to the
//! next; a dead model falls back down a priority list. The two policies
//! compose: rotation runs inside each model attempt.

pub mod credentials;
pub mod fallback;
pub mod gemini;
pub mod retry;

pub use credentials::CredentialPool;
pub use fallback::ModelFallback;
pub use gemini::GeminiProvider;
pub use retry::execute_with_rotation;
