//! Validator/Sanitizer.
//!
//! Turns an arbitrary decoded object into a complete, schema-legal
//! [`ConfigState`]. Validation is total: it never fails, it only coerces.
//! Every field of the result is either a canonical legal value or the domain
//! sentinel, and validating a result again yields it unchanged.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::schema::{DomainSchema, FieldKind, FieldSpec};
use crate::state::{ConfigState, FieldValue};

/// Where missing or rejected values come from.
#[derive(Debug, Clone, Copy)]
pub enum Fill<'a> {
    /// Use each field's schema default.
    Defaults,
    /// Keep the value from the prior state.
    Prior(&'a ConfigState),
}

impl Fill<'_> {
    fn value_for(&self, spec: &FieldSpec) -> FieldValue {
        match self {
            Self::Defaults => spec.default_value(),
            Self::Prior(prior) => prior
                .get(spec.name)
                .cloned()
                .unwrap_or_else(|| spec.default_value()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionReason {
    /// The value is outside the field's legal value space.
    IllegalValue,
    /// The value broke a cross-field rule.
    RuleViolation,
}

/// Record of one value the validator replaced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationCoercion {
    pub field: &'static str,
    pub rejected: Value,
    pub replacement: FieldValue,
    pub reason: CoercionReason,
}

/// A validated state plus what had to be coerced to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub state: ConfigState,
    pub coercions: Vec<ValidationCoercion>,
}

/// Validate `input` against `schema`.
///
/// Unknown keys are dropped. Missing, null, and illegal values are taken
/// from `fill`. Cross-field rule violations reset the offending field to the
/// sentinel.
pub fn validate(schema: &'static DomainSchema, input: &Map<String, Value>, fill: Fill<'_>) -> Validated {
    let provided = resolve_keys(schema, input);
    let mut coercions = Vec::new();
    let mut fields = Vec::with_capacity(schema.fields.len());

    for spec in schema.fields {
        let value = match provided.get(spec.name) {
            None | Some(Value::Null) => fill.value_for(spec),
            Some(raw) => match normalize(spec, raw, schema.sentinel) {
                Normalized::Legal(value) => value,
                Normalized::Partial(value) => {
                    coercions.push(coerce(spec.name, raw, &value, CoercionReason::IllegalValue));
                    value
                }
                Normalized::Illegal => {
                    let replacement = fill.value_for(spec);
                    coercions.push(coerce(spec.name, raw, &replacement, CoercionReason::IllegalValue));
                    replacement
                }
            },
        };
        fields.push((spec.name, value));
    }

    for rule in schema.rules {
        let value = lookup_integer(&fields, rule.field);
        let other = lookup_integer(&fields, rule.other);
        if let (Some(value), Some(other)) = (value, other)
            && !rule.holds(value, other)
        {
            let sentinel = FieldValue::scalar(schema.sentinel);
            if let Some(slot) = fields.iter_mut().find(|(name, _)| *name == rule.field) {
                let rejected = std::mem::replace(&mut slot.1, sentinel.clone());
                coercions.push(coerce(
                    rule.field,
                    &rejected.to_json(),
                    &sentinel,
                    CoercionReason::RuleViolation,
                ));
            }
        }
    }

    Validated {
        state: ConfigState::from_fields(schema.domain, fields),
        coercions,
    }
}

fn coerce(field: &'static str, rejected: &Value, replacement: &FieldValue, reason: CoercionReason) -> ValidationCoercion {
    warn!(
        field,
        rejected = %rejected,
        replacement = %replacement,
        ?reason,
        "Coerced field value"
    );
    ValidationCoercion {
        field,
        rejected: rejected.clone(),
        replacement: replacement.clone(),
        reason,
    }
}

/// Map input keys to schema field names. An exact-name key wins over a
/// case-insensitive one for the same field.
pub(crate) fn resolve_keys<'a>(schema: &DomainSchema, input: &'a Map<String, Value>) -> HashMap<&'static str, &'a Value> {
    let mut provided: HashMap<&'static str, &'a Value> = HashMap::new();
    for (key, value) in input {
        match schema.resolve_field(key) {
            Some(spec) if spec.name == key.trim() => {
                provided.insert(spec.name, value);
            }
            Some(spec) => {
                provided.entry(spec.name).or_insert(value);
            }
            None => debug!(domain = %schema.domain, key = %key, "Dropping unknown field"),
        }
    }
    provided
}

fn lookup_integer(fields: &[(&'static str, FieldValue)], name: &str) -> Option<i64> {
    match fields.iter().find(|(n, _)| *n == name)?.1 {
        FieldValue::Scalar(ref s) => s.split_whitespace().next()?.parse().ok(),
        FieldValue::Sequence(_) => None,
    }
}

enum Normalized {
    Legal(FieldValue),
    /// Some list entries were dropped; the rest are legal.
    Partial(FieldValue),
    Illegal,
}

fn normalize(spec: &FieldSpec, raw: &Value, sentinel: &str) -> Normalized {
    match &spec.kind {
        FieldKind::ListOf(inner) => normalize_list(spec, inner, raw, sentinel),
        kind => match normalize_scalar(kind, raw, sentinel) {
            Some(s) => Normalized::Legal(FieldValue::Scalar(s)),
            None => Normalized::Illegal,
        },
    }
}

fn normalize_list(spec: &FieldSpec, inner: &FieldKind, raw: &Value, sentinel: &str) -> Normalized {
    let entries: Vec<Value> = match raw {
        Value::Array(items) => items.clone(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect(),
        Value::Object(_) => return Normalized::Illegal,
        other => vec![other.clone()],
    };

    if entries.is_empty() {
        return Normalized::Legal(spec.default_value());
    }

    let mut dropped = false;
    let mut accepted: Vec<String> = Vec::new();
    for entry in &entries {
        match normalize_scalar(inner, entry, sentinel) {
            Some(value) if !accepted.contains(&value) => accepted.push(value),
            Some(_) => {}
            None => dropped = true,
        }
    }

    if accepted.iter().any(|v| v != sentinel) {
        accepted.retain(|v| v != sentinel);
    }

    match (accepted.is_empty(), dropped) {
        (true, _) => Normalized::Illegal,
        (false, true) => Normalized::Partial(FieldValue::Sequence(accepted)),
        (false, false) => Normalized::Legal(FieldValue::Sequence(accepted)),
    }
}

/// Canonical spelling of a scalar, or `None` if it is not legal.
fn normalize_scalar(kind: &FieldKind, raw: &Value, sentinel: &str) -> Option<String> {
    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Bool(true) => "Yes".into(),
        Value::Bool(false) => "No".into(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.len() == 1 => return normalize_scalar(kind, &items[0], sentinel),
        _ => return None,
    };

    if text.is_empty() {
        return None;
    }
    if text.eq_ignore_ascii_case(sentinel) {
        return Some(sentinel.to_string());
    }

    match kind {
        FieldKind::Enumerated(allowed) => allowed
            .iter()
            .find(|v| v.eq_ignore_ascii_case(&text))
            .map(|v| (*v).to_string()),
        FieldKind::FreeText => Some(text),
        FieldKind::BoundedInteger { min, max, unit } => {
            let caps = INTEGER.captures(&text)?;
            let n = parse_number(caps.get(1)?.as_str())?;
            if n.fract() != 0.0 || n < *min as f64 || n > *max as f64 {
                return None;
            }
            let n = n as i64;
            match (unit, caps.get(2)) {
                (None, None) => Some(n.to_string()),
                (None, Some(_)) => None,
                (Some(unit), suffix) => {
                    if let Some(suffix) = suffix {
                        let suffix = suffix.as_str();
                        if !suffix.eq_ignore_ascii_case(unit.singular) && !suffix.eq_ignore_ascii_case(unit.plural) {
                            return None;
                        }
                    }
                    Some(format!("{n} {}", unit.label(n)))
                }
            }
        }
        FieldKind::BoundedPercentage { min, max } => {
            let caps = PERCENTAGE.captures(&text)?;
            let n = parse_number(caps.get(1)?.as_str())?;
            (n >= *min && n <= *max).then(|| format!("{n}%"))
        }
        FieldKind::MoneyAmount { prefixes, min, max } => {
            let caps = MONEY.captures(&text)?;
            let unit = match (caps.get(1), caps.get(3)) {
                (Some(u), None) | (None, Some(u)) => u.as_str(),
                _ => return None,
            };
            let prefix = prefixes.iter().find(|p| p.eq_ignore_ascii_case(unit))?;
            let n = parse_number(caps.get(2)?.as_str())?;
            let above_min = match min {
                Some(min) => n >= *min,
                None => n > 0.0,
            };
            let below_max = max.is_none_or(|max| n <= max);
            (above_min && below_max).then(|| format!("{prefix} {n}"))
        }
        FieldKind::ListOf(_) => None,
    }
}

fn parse_number(digits: &str) -> Option<f64> {
    let cleaned: String = digits.chars().filter(|c| *c != ',' && *c != '_').collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?\d[\d,_]*(?:\.\d+)?)\s*([A-Za-z]+)?$").expect("valid integer pattern"));

static PERCENTAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?\d[\d,]*(?:\.\d+)?)\s*(?:%|(?i:percent))?$").expect("valid percentage pattern")
});

static MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([A-Za-z]+)\s*)?([+-]?\d[\d,]*(?:\.\d+)?)\s*([A-Za-z]+)?$").expect("valid money pattern")
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PAYMENT_STREAM, TOKEN_CREATION, TOKEN_VAULT, lookup};
    use assetwright_core::Domain;
    use proptest::prelude::*;
    use serde_json::json;

    fn input(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn scalar(result: &Validated, field: &str) -> String {
        match result.state.get(field) {
            Some(FieldValue::Scalar(s)) => s.clone(),
            other => panic!("expected scalar for {field}, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_yields_defaults() {
        let result = validate(&PAYMENT_STREAM, &Map::new(), Fill::Defaults);
        assert_eq!(result.state, PAYMENT_STREAM.default_state());
        assert!(result.coercions.is_empty());
    }

    #[test]
    fn enumerations_match_case_insensitively() {
        let result = validate(
            &PAYMENT_STREAM,
            &input(json!({"input payment frequency": " monthly ", "Payer": "EVERYONE"})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&result, "Input Payment Frequency"), "Monthly");
        assert_eq!(scalar(&result, "Payer"), "Everyone");
        assert!(result.coercions.is_empty());
    }

    #[test]
    fn illegal_enumeration_falls_back_and_is_reported() {
        let result = validate(
            &PAYMENT_STREAM,
            &input(json!({"Input Payment Frequency": "Fortnightly"})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&result, "Input Payment Frequency"), "Not defined");
        assert_eq!(result.coercions.len(), 1);
        assert_eq!(result.coercions[0].field, "Input Payment Frequency");
        assert_eq!(result.coercions[0].rejected, json!("Fortnightly"));
        assert_eq!(result.coercions[0].reason, CoercionReason::IllegalValue);
    }

    #[test]
    fn illegal_value_keeps_prior_under_prior_fill() {
        let prior = validate(
            &PAYMENT_STREAM,
            &input(json!({"Distribution Frequency": "Quarterly"})),
            Fill::Defaults,
        )
        .state;
        let result = validate(
            &PAYMENT_STREAM,
            &input(json!({"Distribution Frequency": "every blue moon"})),
            Fill::Prior(&prior),
        );
        assert_eq!(scalar(&result, "Distribution Frequency"), "Quarterly");
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let result = validate(
            &PAYMENT_STREAM,
            &input(json!({"Penalty": "5%", "Favourite Colour": "blue"})),
            Fill::Defaults,
        );
        assert!(result.state.get("Penalty").is_none());
        assert!(result.state.get("Favourite Colour").is_none());
        assert!(result.coercions.is_empty());
    }

    #[test]
    fn booleans_become_yes_no() {
        let result = validate(
            &PAYMENT_STREAM,
            &input(json!({"Pause Payments": true, "Output Payment Distribution": false})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&result, "Pause Payments"), "Yes");
        assert_eq!(scalar(&result, "Output Payment Distribution"), "No");
    }

    #[test]
    fn money_amounts_canonicalize() {
        for raw in [json!("2 ETH"), json!("ETH 2"), json!("eth2"), json!(" 2.0 eth ")] {
            let result = validate(
                &PAYMENT_STREAM,
                &input(json!({"Input Payment Amount": raw})),
                Fill::Defaults,
            );
            assert_eq!(scalar(&result, "Input Payment Amount"), "ETH 2", "raw = {raw}");
        }
        let result = validate(
            &PAYMENT_STREAM,
            &input(json!({"Input Payment Amount": "1,500 EUR"})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&result, "Input Payment Amount"), "EUR 1500");
    }

    #[test]
    fn money_without_unit_or_wrong_unit_is_rejected() {
        for raw in [json!(2), json!("2 BTC"), json!("ETH 2 EUR"), json!("ETH -1")] {
            let result = validate(
                &PAYMENT_STREAM,
                &input(json!({"Input Payment Amount": raw})),
                Fill::Defaults,
            );
            assert_eq!(scalar(&result, "Input Payment Amount"), "Not defined", "raw = {raw}");
        }
    }

    #[test]
    fn money_bounds_are_enforced() {
        let ok = validate(&TOKEN_CREATION, &input(json!({"FeeInEth": "0.001 ETH"})), Fill::Defaults);
        assert_eq!(scalar(&ok, "FeeInEth"), "ETH 0.001");
        let too_high = validate(&TOKEN_CREATION, &input(json!({"FeeInEth": "ETH 0.01"})), Fill::Defaults);
        assert_eq!(scalar(&too_high, "FeeInEth"), "not defined");
        let too_low = validate(&TOKEN_CREATION, &input(json!({"FeeInEth": "ETH 0.0001"})), Fill::Defaults);
        assert_eq!(scalar(&too_low, "FeeInEth"), "not defined");
    }

    #[test]
    fn duration_with_units() {
        let cases = [
            (json!("12 months"), "12 months"),
            (json!("1 Month"), "1 month"),
            (json!(6), "6 months"),
            (json!("36"), "36 months"),
            (json!("37 months"), "Not defined"),
            (json!("0 months"), "Not defined"),
            (json!("12 weeks"), "Not defined"),
            (json!("1.5 months"), "Not defined"),
        ];
        for (raw, expected) in cases {
            let result = validate(&TOKEN_VAULT, &input(json!({"Duration": raw})), Fill::Defaults);
            assert_eq!(scalar(&result, "Duration"), expected, "raw = {raw}");
        }
    }

    #[test]
    fn penalty_percentages() {
        let cases = [
            (json!("2.5%"), "2.5%"),
            (json!("5 percent"), "5%"),
            (json!(0.01), "0.01%"),
            (json!("10%"), "10%"),
            (json!("11%"), "Not defined"),
            (json!("0%"), "Not defined"),
        ];
        for (raw, expected) in cases {
            let result = validate(&TOKEN_VAULT, &input(json!({"Penalty": raw})), Fill::Defaults);
            assert_eq!(scalar(&result, "Penalty"), expected, "raw = {raw}");
        }
    }

    #[test]
    fn token_counts_accept_grouping() {
        let result = validate(
            &TOKEN_CREATION,
            &input(json!({"Number of Tokens": "1,000", "MaxCap": 5000})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&result, "Number of Tokens"), "1000");
        assert_eq!(scalar(&result, "MaxCap"), "5000");
        assert!(result.coercions.is_empty());
    }

    #[test]
    fn max_cap_must_exceed_supply() {
        let result = validate(
            &TOKEN_CREATION,
            &input(json!({"Number of Tokens": 1000, "MaxCap": 500})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&result, "Number of Tokens"), "1000");
        assert_eq!(scalar(&result, "MaxCap"), "not defined");
        let coercion = &result.coercions[0];
        assert_eq!(coercion.field, "MaxCap");
        assert_eq!(coercion.reason, CoercionReason::RuleViolation);
        assert_eq!(coercion.rejected, json!("500"));
    }

    #[test]
    fn linked_metadata_tokens_cannot_exceed_supply() {
        let result = validate(
            &TOKEN_CREATION,
            &input(json!({"Number of Tokens": 100, "Number of Linked Metadata Tokens": 101})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&result, "Number of Linked Metadata Tokens"), "not defined");

        let equal = validate(
            &TOKEN_CREATION,
            &input(json!({"Number of Tokens": 100, "Number of Linked Metadata Tokens": 100})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&equal, "Number of Linked Metadata Tokens"), "100");
    }

    #[test]
    fn rules_skip_unset_fields() {
        let result = validate(&TOKEN_CREATION, &input(json!({"MaxCap": 500})), Fill::Defaults);
        assert_eq!(scalar(&result, "MaxCap"), "500");
        assert!(result.coercions.is_empty());
    }

    #[test]
    fn lists_from_arrays_and_strings() {
        let result = validate(
            &PAYMENT_STREAM,
            &input(json!({"Manager Permissions": "input payments, Withdraw funds"})),
            Fill::Defaults,
        );
        assert_eq!(
            result.state.get("Manager Permissions"),
            Some(&FieldValue::Sequence(vec!["Input payments".into(), "Withdraw funds".into()]))
        );

        let result = validate(
            &TOKEN_CREATION,
            &input(json!({"Documents": ["whitepaper.pdf", "terms.pdf", "whitepaper.pdf"]})),
            Fill::Defaults,
        );
        assert_eq!(
            result.state.get("Documents"),
            Some(&FieldValue::Sequence(vec!["whitepaper.pdf".into(), "terms.pdf".into()]))
        );
    }

    #[test]
    fn list_drops_illegal_and_sentinel_entries() {
        let result = validate(
            &TOKEN_VAULT,
            &input(json!({"Manager Permissions": ["Not defined", "Change data", "Launch rockets"]})),
            Fill::Defaults,
        );
        assert_eq!(
            result.state.get("Manager Permissions"),
            Some(&FieldValue::Sequence(vec!["Change data".into()]))
        );
        assert_eq!(result.coercions.len(), 1);
    }

    #[test]
    fn list_with_no_legal_entries_falls_back() {
        let result = validate(
            &TOKEN_VAULT,
            &input(json!({"Manager Permissions": ["Launch rockets"]})),
            Fill::Defaults,
        );
        assert_eq!(
            result.state.get("Manager Permissions"),
            Some(&FieldValue::Sequence(vec!["Not defined".into()]))
        );
    }

    #[test]
    fn single_element_array_for_scalar_field() {
        let result = validate(&PAYMENT_STREAM, &input(json!({"Asset Type": ["Watches"]})), Fill::Defaults);
        assert_eq!(scalar(&result, "Asset Type"), "Watches");
    }

    #[test]
    fn null_and_objects() {
        let result = validate(
            &PAYMENT_STREAM,
            &input(json!({"Payer": null, "Asset Type": {"nested": true}})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&result, "Payer"), "Creator");
        assert_eq!(scalar(&result, "Asset Type"), "Not defined");
        assert_eq!(result.coercions.len(), 1);
    }

    #[test]
    fn sentinel_is_always_legal() {
        let result = validate(
            &TOKEN_CREATION,
            &input(json!({"Token Owner": "NOT DEFINED", "Token Name": "Not Defined"})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&result, "Token Owner"), "not defined");
        assert_eq!(scalar(&result, "Token Name"), "not defined");
        assert!(result.coercions.is_empty());
    }

    #[test]
    fn exact_key_wins_over_case_variant() {
        let result = validate(
            &PAYMENT_STREAM,
            &input(json!({"payer": "Everyone", "Payer": "Other address"})),
            Fill::Defaults,
        );
        assert_eq!(scalar(&result, "Payer"), "Other address");
    }

    fn json_leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            (-1.0e6f64..1.0e6).prop_map(Value::from),
            "[ -~]{0,24}".prop_map(Value::String),
            prop::sample::select(vec![
                "Monthly", "ETH 2", "2 eth", "12 months", "2.5%", "Yes", "no", "Creator",
                "Not defined", "not defined", "1,000", "0.001 ETH", "Change data, Input payments",
            ])
            .prop_map(|s| Value::String(s.to_string())),
        ]
    }

    fn json_value() -> impl Strategy<Value = Value> {
        json_leaf().prop_recursive(2, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..3)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn json_input(domain: Domain) -> impl Strategy<Value = Map<String, Value>> {
        let mut keys: Vec<String> = lookup(domain).fields.iter().map(|f| f.name.to_string()).collect();
        keys.extend(lookup(domain).fields.iter().map(|f| f.name.to_lowercase()));
        keys.push("Unknown".into());
        prop::collection::btree_map(prop::sample::select(keys), json_value(), 0..12)
            .prop_map(|m| m.into_iter().collect())
    }

    fn any_domain() -> impl Strategy<Value = Domain> {
        prop::sample::select(Domain::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn validation_is_total_and_idempotent(
            (domain, raw) in any_domain().prop_flat_map(|d| (Just(d), json_input(d)))
        ) {
            let schema = lookup(domain);
            let first = validate(schema, &raw, Fill::Defaults);
            prop_assert_eq!(first.state.len(), schema.fields.len());

            let second = validate(schema, &first.state.to_json_map(), Fill::Defaults);
            prop_assert!(second.coercions.is_empty(), "{:?}", second.coercions);
            prop_assert_eq!(second.state, first.state);
        }
    }
}
