//! Shared test helpers for gateway route tests.

use assetwright_config::DomainsConfig;
use assetwright_core::error::ProviderError;
use assetwright_core::message::Message;
use assetwright_core::provider::{Provider, ProviderRequest, ProviderResponse};
use assetwright_engine::{ConfigEngine, OracleClient};
use std::sync::{Arc, Mutex};

use crate::{GatewayState, SharedState};

/// A mock oracle that returns scripted replies in order.
pub struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
}

impl ScriptedProvider {
    pub fn new(mut replies: Vec<Result<String, ProviderError>>) -> Self {
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok((*t).to_string())).collect())
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .expect("ScriptedProvider: no more replies");
        reply.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model: request.model,
        })
    }
}

/// Gateway state around a scripted oracle, with corpus recording off.
pub fn test_state(provider: ScriptedProvider) -> SharedState {
    let oracle = OracleClient::new(Arc::new(provider), "mock-model");
    let engine = ConfigEngine::new(Arc::new(oracle));
    Arc::new(GatewayState::new(engine, DomainsConfig::default()))
}
