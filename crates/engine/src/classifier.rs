//! Protocol Classifier: route free text to one of the closed set of domains.

use std::fmt::Write as _;
use std::sync::Arc;

use assetwright_core::Domain;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::oracle::{OracleClient, OracleError, OracleRequest};
use crate::parser::{Parsed, parse};
use crate::schema::lookup;

/// The classifier's answer: which domain, and the text to pass on to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "Target")]
    pub target: Domain,
    #[serde(rename = "Prompt")]
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    #[error("Classification failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("Classification rejected: {0}")]
    Rejected(String),
}

/// Classifies user requests with the oracle.
pub struct ProtocolClassifier {
    oracle: Arc<OracleClient>,
}

impl ProtocolClassifier {
    pub fn new(oracle: Arc<OracleClient>) -> Self {
        Self { oracle }
    }

    pub async fn classify(&self, user_text: &str) -> Result<Classification, ClassifyError> {
        let raw = self.oracle.ask(&classification_request(user_text)).await?;
        let classification = interpret(&raw)?;
        info!(domain = %classification.target, "Classified request");
        Ok(classification)
    }
}

/// Build the classification request.
pub fn classification_request(user_text: &str) -> OracleRequest {
    let mut system = String::from(
        "You route requests about digital assets to the right configurator. \
         Pick exactly one target from this list:\n",
    );
    for domain in Domain::ALL {
        let schema = lookup(domain);
        let _ = writeln!(
            system,
            "- \"{}\": {}. Typical words: {}.",
            domain,
            schema.description,
            schema.keywords.join(", ")
        );
    }
    system.push_str(
        "\nAnswer with a JSON object with exactly two keys: \"Target\" (one of the targets above) \
         and \"Prompt\" (the user's request, restated for that configurator).",
    );
    OracleRequest::new(system, user_text)
}

/// Interpret raw classifier output.
///
/// Requires an object with exactly the keys `Target` and `Prompt` (matched
/// case-insensitively), both strings, and a target from the closed set.
pub fn interpret(raw: &str) -> Result<Classification, ClassifyError> {
    let Parsed::Object(map) = parse(raw) else {
        return Err(ClassifyError::Rejected("no JSON object in classifier output".into()));
    };

    let mut target = None;
    let mut prompt = None;
    for (key, value) in &map {
        if key.eq_ignore_ascii_case("target") {
            target = Some(value);
        } else if key.eq_ignore_ascii_case("prompt") {
            prompt = Some(value);
        } else {
            return Err(ClassifyError::Rejected(format!("unexpected key \"{key}\"")));
        }
    }
    if map.len() != 2 {
        return Err(ClassifyError::Rejected(format!(
            "expected keys Target and Prompt, got {} key(s)",
            map.len()
        )));
    }

    let target = match target {
        Some(Value::String(s)) => s,
        Some(_) => return Err(ClassifyError::Rejected("Target is not a string".into())),
        None => return Err(ClassifyError::Rejected("missing Target".into())),
    };
    let prompt = match prompt {
        Some(Value::String(s)) => s,
        Some(_) => return Err(ClassifyError::Rejected("Prompt is not a string".into())),
        None => return Err(ClassifyError::Rejected("missing Prompt".into())),
    };

    let target: Domain = target
        .parse()
        .map_err(|_| ClassifyError::Rejected(format!("unknown target \"{target}\"")))?;

    debug!(domain = %target, "Classifier output accepted");

    Ok(Classification {
        target,
        prompt: prompt.clone(),
    })
}
