//! Extraction Oracle Client.
//!
//! Builds the `{system instruction, user message}` pair for a domain and
//! sends it to the configured [`Provider`] under a per-call timeout.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use assetwright_core::error::ProviderError;
use assetwright_core::message::Message;
use assetwright_core::provider::{Provider, ProviderRequest};
use assetwright_core::MergePolicy;
use tracing::debug;

use crate::schema::DomainSchema;
use crate::state::ConfigState;

/// Why the oracle could not produce text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle unreachable: {0}")]
    Connectivity(String),

    #[error("Oracle returned an error status: {message}")]
    Status {
        status_code: Option<u16>,
        message: String,
    },

    #[error("Oracle service response could not be read: {0}")]
    MalformedServiceResponse(String),

    #[error("Oracle failed: {0}")]
    Unclassified(String),
}

impl From<ProviderError> for OracleError {
    fn from(e: ProviderError) -> Self {
        let status_code = e.status_code();
        match e {
            ProviderError::Network(msg) | ProviderError::Timeout(msg) => Self::Connectivity(msg),
            ProviderError::MalformedResponse(msg) => Self::MalformedServiceResponse(msg),
            ProviderError::NotConfigured(msg) => Self::Unclassified(msg),
            other => Self::Status {
                status_code,
                message: other.to_string(),
            },
        }
    }
}

/// Why a turn's extraction produced no usable object.
///
/// Never fatal to a session: the prior state is kept.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("Oracle response contained no configuration object")]
    NoObjectFound,
}

impl ExtractionError {
    /// Message shown to the user when a turn is not applied.
    pub fn user_hint(&self) -> &'static str {
        match self {
            Self::Oracle(OracleError::Connectivity(_)) => {
                "The configuration service could not be reached; your change was not applied. Please try again."
            }
            Self::Oracle(_) => "The configuration service failed; your change was not applied. Please try again.",
            Self::NoObjectFound => "Your change was not applied. Please try rephrasing your request.",
        }
    }
}

/// A single oracle exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub system_instruction: String,
    pub user_message: String,
}

impl OracleRequest {
    pub fn new(system_instruction: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            user_message: user_message.into(),
        }
    }
}

/// Build the extraction request for one turn.
///
/// With no prior state the oracle is asked to create a configuration.
/// Otherwise the instruction depends on the policy: full-replace asks for
/// every field, diff-merge asks only for the fields that change.
pub fn extraction_request(
    schema: &DomainSchema,
    user_text: &str,
    prior: Option<&ConfigState>,
    policy: MergePolicy,
) -> OracleRequest {
    let mut system = String::new();
    let _ = writeln!(
        system,
        "You configure a {} ({}).",
        schema.domain.as_str().replace('-', " "),
        schema.description
    );
    let _ = writeln!(
        system,
        "Answer with a single JSON object whose keys are the field names listed below. \
         Use only the listed values for each field. Use \"{}\" for anything the user has not specified. \
         Do not add any other keys.",
        schema.sentinel
    );

    system.push_str("\nFields:\n");
    for field in schema.fields {
        let _ = writeln!(
            system,
            "- \"{}\": {} (default \"{}\")",
            field.name,
            field.kind.describe(),
            field.default
        );
    }

    if !schema.rules.is_empty() {
        system.push_str("\nRules:\n");
        for rule in schema.rules {
            let _ = writeln!(system, "- {}", rule.describe());
        }
    }

    let _ = writeln!(system, "\n{}", schema.guidance);

    match prior {
        None => {
            system.push_str(
                "\nCreate a new configuration from the user's message. \
                 Fields the user does not mention take their default.\n",
            );
        }
        Some(state) => {
            let instruction = match policy {
                MergePolicy::FullReplace => {
                    "Update the current configuration. Return the complete configuration with every field; \
                     fields the user does not mention keep their current value."
                }
                MergePolicy::DiffMerge => {
                    "Update the current configuration. Return only the fields the user wants to change \
                     and leave every other field out."
                }
            };
            let _ = write!(
                system,
                "\n{instruction}\n\nCurrent configuration:\n{}\n",
                state.to_pretty_json()
            );
        }
    }

    OracleRequest::new(system, user_text)
}

/// Sends oracle requests to a provider.
pub struct OracleClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl OracleClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: Some(1024),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one request and return the oracle's raw text.
    pub async fn ask(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let provider_request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(&request.system_instruction),
                Message::user(&request.user_message),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            provider = %self.provider.name(),
            model = %self.model,
            system = %request.system_instruction,
            user = %request.user_message,
            "Oracle request"
        );

        let response = match tokio::time::timeout(self.timeout, self.provider.complete(provider_request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                debug!(provider = %self.provider.name(), error = %e, "Oracle call failed");
                return Err(e.into());
            }
            Err(_) => {
                return Err(OracleError::Connectivity(format!(
                    "no response within {}s",
                    self.timeout.as_secs_f32()
                )));
            }
        };

        debug!(
            provider = %self.provider.name(),
            model = %response.model,
            response = %response.message.content,
            "Oracle response"
        );

        Ok(response.message.content)
    }

    /// Ask the oracle to extract a configuration for one turn.
    pub async fn extract(
        &self,
        schema: &DomainSchema,
        user_text: &str,
        prior: Option<&ConfigState>,
        policy: MergePolicy,
    ) -> Result<String, OracleError> {
        self.ask(&extraction_request(schema, user_text, prior, policy)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PAYMENT_STREAM, TOKEN_CREATION, TOKEN_VAULT, default_state};
    use crate::test_helpers::{SequentialMockProvider, StalledProvider};
    use assetwright_core::{Domain, Role};

    #[test]
    fn create_request_lists_fields_and_legal_values() {
        let request = extraction_request(&PAYMENT_STREAM, "monthly 2 ETH", None, MergePolicy::DiffMerge);
        for field in PAYMENT_STREAM.fields {
            assert!(request.system_instruction.contains(&format!("\"{}\"", field.name)));
        }
        assert!(request.system_instruction.contains("\"Half-yearly\""));
        assert!(request.system_instruction.contains("Create a new configuration"));
        assert!(!request.system_instruction.contains("Current configuration"));
        assert_eq!(request.user_message, "monthly 2 ETH");
    }

    #[test]
    fn update_requests_follow_policy() {
        let prior = default_state(Domain::TokenVault);
        let full = extraction_request(&TOKEN_VAULT, "12 months", Some(&prior), MergePolicy::FullReplace);
        assert!(full.system_instruction.contains("every field"));
        assert!(full.system_instruction.contains("Current configuration"));
        assert!(full.system_instruction.contains("\"Vault Description\": \"No description\""));

        let diff = extraction_request(&TOKEN_VAULT, "12 months", Some(&prior), MergePolicy::DiffMerge);
        assert!(diff.system_instruction.contains("only the fields the user wants to change"));
    }

    #[test]
    fn rules_are_embedded() {
        let request = extraction_request(&TOKEN_CREATION, "x", None, MergePolicy::FullReplace);
        assert!(request.system_instruction.contains("MaxCap must be greater than Number of Tokens"));
        assert!(request.system_instruction.contains("\"not defined\""));
    }

    #[test]
    fn provider_errors_map_to_distinct_kinds() {
        assert!(matches!(
            OracleError::from(ProviderError::Network("refused".into())),
            OracleError::Connectivity(_)
        ));
        assert!(matches!(
            OracleError::from(ProviderError::Timeout("slow".into())),
            OracleError::Connectivity(_)
        ));
        assert!(matches!(
            OracleError::from(ProviderError::ApiError {
                status_code: 500,
                message: "boom".into()
            }),
            OracleError::Status { status_code: Some(500), .. }
        ));
        assert!(matches!(
            OracleError::from(ProviderError::AuthenticationFailed("bad key".into())),
            OracleError::Status { status_code: Some(401), .. }
        ));
        assert!(matches!(
            OracleError::from(ProviderError::RateLimited { retry_after_secs: 5 }),
            OracleError::Status { status_code: Some(429), .. }
        ));
        assert!(matches!(
            OracleError::from(ProviderError::MalformedResponse("no choices".into())),
            OracleError::MalformedServiceResponse(_)
        ));
        assert!(matches!(
            OracleError::from(ProviderError::NotConfigured("no key".into())),
            OracleError::Unclassified(_)
        ));
    }

    #[tokio::test]
    async fn ask_sends_system_and_user_messages() {
        let provider = Arc::new(SequentialMockProvider::texts(&[r#"{"Payer":"Creator"}"#]));
        let client = OracleClient::new(provider.clone(), "gpt-4o-mini").with_temperature(0.0);
        let text = client
            .ask(&OracleRequest::new("instruction", "user text"))
            .await
            .unwrap();
        assert_eq!(text, r#"{"Payer":"Creator"}"#);

        let sent = provider.request(0);
        assert_eq!(sent.model, "gpt-4o-mini");
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.messages[0].role, Role::System);
        assert_eq!(sent.messages[0].content, "instruction");
        assert_eq!(sent.messages[1].role, Role::User);
        assert_eq!(sent.messages[1].content, "user text");
    }

    #[tokio::test]
    async fn provider_failure_is_reported() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Err(ProviderError::Network(
            "connection refused".into(),
        ))]));
        let client = OracleClient::new(provider, "m");
        let err = client.ask(&OracleRequest::new("s", "u")).await.unwrap_err();
        assert_eq!(err, OracleError::Connectivity("connection refused".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_a_connectivity_failure() {
        let client = OracleClient::new(Arc::new(StalledProvider), "m").with_timeout(Duration::from_secs(5));
        let err = client.ask(&OracleRequest::new("s", "u")).await.unwrap_err();
        assert!(matches!(err, OracleError::Connectivity(_)));
    }

    #[test]
    fn user_hints_differ_by_failure() {
        assert!(ExtractionError::NoObjectFound.user_hint().contains("rephrasing"));
        assert!(
            ExtractionError::Oracle(OracleError::Connectivity("x".into()))
                .user_hint()
                .contains("could not be reached")
        );
    }
}
