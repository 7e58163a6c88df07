//! Merge Engine: combine a prior state with a new oracle proposal.

use assetwright_core::MergePolicy;
use serde_json::{Map, Value};
use tracing::debug;

use crate::schema::DomainSchema;
use crate::state::ConfigState;
use crate::validate::{Fill, ValidationCoercion, resolve_keys, validate};

/// The state after one merge, plus what changed.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub state: ConfigState,
    pub coercions: Vec<ValidationCoercion>,
    /// Fields whose value differs from the prior (or from the defaults on a
    /// first turn).
    pub changed_fields: Vec<&'static str>,
}

/// Merge `proposal` into `prior` under `policy`.
///
/// - No prior: build from defaults, whatever the policy.
/// - Full-replace: the validated proposal is the new state; absent fields
///   take their default.
/// - Diff-merge: emitted schema fields that are not the sentinel overwrite
///   the prior; everything else carries over. The overlay is re-validated.
pub fn merge(
    schema: &'static DomainSchema,
    policy: MergePolicy,
    prior: Option<&ConfigState>,
    proposal: &Map<String, Value>,
) -> MergeOutcome {
    let validated = match (prior, policy) {
        (None, _) | (Some(_), MergePolicy::FullReplace) => validate(schema, proposal, Fill::Defaults),
        (Some(prior), MergePolicy::DiffMerge) => {
            let overlay = overlay(schema, prior, proposal);
            validate(schema, &overlay, Fill::Prior(prior))
        }
    };

    let baseline = match prior {
        Some(prior) => prior.clone(),
        None => schema.default_state(),
    };
    let changed_fields = validated.state.diff(&baseline);

    debug!(
        domain = %schema.domain,
        %policy,
        changed = ?changed_fields,
        coercions = validated.coercions.len(),
        "Merged proposal"
    );

    MergeOutcome {
        state: validated.state,
        coercions: validated.coercions,
        changed_fields,
    }
}

fn overlay(schema: &DomainSchema, prior: &ConfigState, proposal: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = prior.to_json_map();
    for (name, value) in resolve_keys(schema, proposal) {
        if is_unset(value, schema.sentinel) {
            continue;
        }
        merged.insert(name.to_string(), value.clone());
    }
    merged
}

/// Null, the sentinel, or a sequence made only of sentinels.
fn is_unset(value: &Value, sentinel: &str) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().eq_ignore_ascii_case(sentinel),
        Value::Array(items) => items.iter().all(|item| is_unset(item, sentinel)),
        _ => false,
    }
}
