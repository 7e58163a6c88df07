//! Oracle provider implementations for assetwright.
//!
//! All providers implement the `assetwright_core::Provider` trait; the
//! OpenAI-compatible provider also implements `FineTuner`.
//! The router selects the correct provider based on configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::ProviderRouter;
