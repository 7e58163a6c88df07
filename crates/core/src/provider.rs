//! Provider traits — the abstraction over the external oracle and the
//! fine-tuning collaborator.
//!
//! A [`Provider`] knows how to send a short conversation to a text
//! generation service and get a complete response back. A [`FineTuner`]
//! accepts a curated training file and starts a fine-tuning job.
//!
//! Implementations: OpenAI-compatible endpoints (`assetwright-providers`),
//! scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ProviderError;
use crate::message::Message;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.2
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The extraction and classification pipelines call `complete()` without
/// knowing which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

/// A fine-tuning job accepted by the collaborator.
///
/// Completion is asynchronous and not tracked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineTuneJob {
    /// Identifier of the uploaded training file
    pub training_file_id: String,

    /// Identifier of the created job
    pub job_id: String,
}

/// The fine-tune submission boundary.
///
/// Accepts a file of newline-delimited `{messages, score}` records and
/// returns the created job.
#[async_trait]
pub trait FineTuner: Send + Sync {
    fn name(&self) -> &str;

    async fn submit_fine_tune(
        &self,
        training_file: &Path,
        base_model: &str,
        epochs: u32,
    ) -> std::result::Result<FineTuneJob, ProviderError>;
}
