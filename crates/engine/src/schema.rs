//! Field Schema Registry.
//!
//! Static, versioned, per-domain field definitions. Schemas are `'static`
//! data and never change at runtime; every [`ConfigState`] is keyed by the
//! field names declared here.

use std::fmt::Write as _;

use assetwright_core::Domain;

use crate::state::{ConfigState, FieldValue};

/// Singular/plural unit attached to an integer field (e.g. months).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub singular: &'static str,
    pub plural: &'static str,
}

impl Unit {
    pub fn label(&self, n: i64) -> &'static str {
        if n == 1 { self.singular } else { self.plural }
    }
}

/// The legal value space of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// One of an ordered set of canonical spellings.
    Enumerated(&'static [&'static str]),
    /// Any non-empty text.
    FreeText,
    /// A whole number in `min..=max`, optionally carrying a unit.
    BoundedInteger {
        min: i64,
        max: i64,
        unit: Option<Unit>,
    },
    /// A percentage in `min..=max`.
    BoundedPercentage { min: f64, max: f64 },
    /// An amount tagged with one of the allowed unit prefixes ("ETH 2").
    MoneyAmount {
        prefixes: &'static [&'static str],
        min: Option<f64>,
        max: Option<f64>,
    },
    /// A repeating entry; values are always normalized to a sequence.
    ListOf(&'static FieldKind),
}

impl FieldKind {
    pub fn is_list(&self) -> bool {
        matches!(self, Self::ListOf(_))
    }

    /// Human-readable description of the legal values, embedded verbatim in
    /// oracle prompts.
    pub fn describe(&self) -> String {
        match self {
            Self::Enumerated(allowed) => {
                let quoted: Vec<String> = allowed.iter().map(|v| format!("\"{v}\"")).collect();
                format!("one of {}", quoted.join(", "))
            }
            Self::FreeText => "free text".into(),
            Self::BoundedInteger { min, max, unit } => match unit {
                Some(unit) => format!("whole number of {} between {min} and {max}", unit.plural),
                None => format!("whole number between {min} and {max}"),
            },
            Self::BoundedPercentage { min, max } => {
                format!("percentage between {min}% and {max}% (e.g. \"2.5%\")")
            }
            Self::MoneyAmount { prefixes, min, max } => {
                let mut out = format!(
                    "amount prefixed by its unit, one of {} (e.g. \"{} 2\")",
                    prefixes.join(", "),
                    prefixes.first().copied().unwrap_or("ETH")
                );
                match (min, max) {
                    (Some(min), Some(max)) => {
                        let _ = write!(out, ", between {min} and {max}");
                    }
                    (Some(min), None) => {
                        let _ = write!(out, ", at least {min}");
                    }
                    (None, Some(max)) => {
                        let _ = write!(out, ", at most {max}");
                    }
                    (None, None) => {}
                }
                out
            }
            Self::ListOf(inner) => format!("list, each entry {}", inner.describe()),
        }
    }
}

/// One field of a domain schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: &'static str,
}

impl FieldSpec {
    /// The field's default, shaped for its kind.
    pub fn default_value(&self) -> FieldValue {
        if self.kind.is_list() {
            FieldValue::Sequence(vec![self.default.to_string()])
        } else {
            FieldValue::Scalar(self.default.to_string())
        }
    }
}

/// Relation enforced between two integer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    GreaterThan,
    AtMost,
}

/// A constraint tying `field` to `other`; on violation `field` is reset to
/// the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossFieldRule {
    pub field: &'static str,
    pub relation: Relation,
    pub other: &'static str,
}

impl CrossFieldRule {
    pub fn holds(&self, value: i64, other: i64) -> bool {
        match self.relation {
            Relation::GreaterThan => value > other,
            Relation::AtMost => value <= other,
        }
    }

    pub fn describe(&self) -> String {
        match self.relation {
            Relation::GreaterThan => format!("{} must be greater than {}", self.field, self.other),
            Relation::AtMost => format!("{} must not exceed {}", self.field, self.other),
        }
    }
}

/// The complete schema of one domain.
#[derive(Debug, PartialEq)]
pub struct DomainSchema {
    pub domain: Domain,
    pub version: u32,
    /// Placeholder meaning "not yet specified by the user".
    pub sentinel: &'static str,
    /// One-line purpose, shown to the classifier.
    pub description: &'static str,
    /// Typical vocabulary, shown to the classifier.
    pub keywords: &'static [&'static str],
    /// Domain-specific hints appended to extraction prompts.
    pub guidance: &'static str,
    pub fields: &'static [FieldSpec],
    pub rules: &'static [CrossFieldRule],
}

impl DomainSchema {
    /// Resolve an oracle-emitted key to a field: exact match first, then
    /// ASCII case-insensitive.
    pub fn resolve_field(&self, key: &str) -> Option<&'static FieldSpec> {
        let key = key.trim();
        let fields: &'static [FieldSpec] = self.fields;
        fields
            .iter()
            .find(|f| f.name == key)
            .or_else(|| fields.iter().find(|f| f.name.eq_ignore_ascii_case(key)))
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    /// A state with every field at its default.
    pub fn default_state(&'static self) -> ConfigState {
        ConfigState::from_fields(
            self.domain,
            self.fields.iter().map(|f| (f.name, f.default_value())).collect(),
        )
    }
}

/// Look up the schema of a domain.
pub fn lookup(domain: Domain) -> &'static DomainSchema {
    match domain {
        Domain::PaymentStream => &PAYMENT_STREAM,
        Domain::TokenVault => &TOKEN_VAULT,
        Domain::TokenCreation => &TOKEN_CREATION,
    }
}

/// A state with every field of `domain` at its default.
pub fn default_state(domain: Domain) -> ConfigState {
    lookup(domain).default_state()
}

// --- Shared value sets ---

const YES_NO: &[&str] = &["Yes", "No"];
const FREQUENCIES: &[&str] = &["Daily", "Weekly", "Monthly", "Quarterly", "Half-yearly", "Yearly"];
const DISTRIBUTE_TO: &[&str] = &["All token holders/owners", "Only whitelisted addresses"];
const CREATOR: &[&str] = &["Creator"];
const MONTHS: Unit = Unit {
    singular: "month",
    plural: "months",
};

static MANAGER_PERMISSION: FieldKind = FieldKind::Enumerated(&[
    "Input payments",
    "Change data",
    "Withdraw funds",
    "Delete payment stream",
]);
static FREE_TEXT: FieldKind = FieldKind::FreeText;

const fn field(name: &'static str, kind: FieldKind, default: &'static str) -> FieldSpec {
    FieldSpec { name, kind, default }
}

// --- payment-stream ---

const PS: &str = "Not defined";

pub static PAYMENT_STREAM: DomainSchema = DomainSchema {
    domain: Domain::PaymentStream,
    version: 1,
    sentinel: PS,
    description: "Manages payment streams, recurring payments, and financial transactions: \
                  payment frequency, amounts, distributions, payers, currencies (ETH, EUR)",
    keywords: &["payment stream", "dividend", "payout", "recurring payment", "rent", "salary", "ETH", "EUR"],
    guidance: "When the user writes \"my\", \"me\", \"I\" or \"myself\" they mean the \"Creator\". \
               Think about what the payment stream implies: a dividend payment has an output \
               distribution and input payments that can be made at any time.",
    fields: &[
        field(
            "Asset Type",
            FieldKind::Enumerated(&["Equity Tokens", "Real Estate", "Watches", "Vehicles"]),
            PS,
        ),
        field(
            "Payer",
            FieldKind::Enumerated(&["Creator", "Everyone", "Other address"]),
            "Creator",
        ),
        field("Input Payment Frequency", FieldKind::Enumerated(FREQUENCIES), PS),
        field(
            "Input Payment Amount",
            FieldKind::MoneyAmount {
                prefixes: &["ETH", "EUR"],
                min: None,
                max: None,
            },
            PS,
        ),
        field("Output Payment Distribution", FieldKind::Enumerated(YES_NO), PS),
        field("Distribution Frequency", FieldKind::Enumerated(FREQUENCIES), PS),
        field("Distribute to", FieldKind::Enumerated(DISTRIBUTE_TO), PS),
        field("Pause Payments", FieldKind::Enumerated(YES_NO), PS),
        field(
            "Pause Payments by",
            FieldKind::Enumerated(&["Creator/Myself", "Whitelisted addresses"]),
            PS,
        ),
        field("Admin", FieldKind::Enumerated(CREATOR), "Creator"),
        field(
            "Managers",
            FieldKind::Enumerated(&["Whitelisted addresses", "Creator"]),
            PS,
        ),
        field("Manager Permissions", FieldKind::ListOf(&MANAGER_PERMISSION), PS),
    ],
    rules: &[],
};

// --- token-vault ---

pub static TOKEN_VAULT: DomainSchema = DomainSchema {
    domain: Domain::TokenVault,
    version: 1,
    sentinel: PS,
    description: "Handles digital token vaults and secure asset storage: asset storage, \
                  access control, penalties, lockup periods",
    keywords: &["token vault", "secure space", "digital safe", "penalty", "lockup period"],
    guidance: "The creator is the admin: \"only me\" or \"myself\" means \"Only admin\". \
               If managers have access control, the admin has it too (\"Admin & Managers\").",
    fields: &[
        field(
            "Asset Type",
            FieldKind::Enumerated(&["Real Estate", "Watches", "Equity Shares", "Vehicles"]),
            PS,
        ),
        field(
            "Access Control",
            FieldKind::Enumerated(&[
                "All token owners",
                "Only admin",
                "Admin & Managers",
                "Whitelisted addresses",
            ]),
            PS,
        ),
        field(
            "Duration",
            FieldKind::BoundedInteger {
                min: 1,
                max: 36,
                unit: Some(MONTHS),
            },
            PS,
        ),
        field(
            "Penalty",
            FieldKind::BoundedPercentage {
                min: 0.01,
                max: 10.0,
            },
            PS,
        ),
        field("Input Payments", FieldKind::Enumerated(YES_NO), PS),
        field("Input Payments Frequency", FieldKind::Enumerated(FREQUENCIES), PS),
        field(
            "Input Payment Currency",
            FieldKind::Enumerated(&["EUR", "USD", "ETH", "Other"]),
            PS,
        ),
        field("Output Payment Distribution", FieldKind::Enumerated(YES_NO), PS),
        field("Distribution Frequency", FieldKind::Enumerated(FREQUENCIES), PS),
        field("Distribute to", FieldKind::Enumerated(DISTRIBUTE_TO), PS),
        field("Vault Description", FieldKind::FreeText, "No description"),
        field("Admin", FieldKind::Enumerated(CREATOR), "Creator"),
        field("Managers", FieldKind::Enumerated(&["Whitelisted addresses"]), PS),
        field("Manager Permissions", FieldKind::ListOf(&MANAGER_PERMISSION), PS),
    ],
    rules: &[],
};

// --- token-creation ---

const TC: &str = "not defined";

pub static TOKEN_CREATION: DomainSchema = DomainSchema {
    domain: Domain::TokenCreation,
    version: 1,
    sentinel: TC,
    description: "Manages token creation, minting, and compliance features: token metadata, \
                  minting caps, freezing, force transfer, whitelists, fees",
    keywords: &["token creation", "mint tokens", "metadata", "freeze tokens", "whitelist", "force transfer"],
    guidance: "Compliance requests such as recovering stolen tokens mean ForceTransfer \"Yes\"; \
               freezing works the same way. A whitelist creates a private market: only \
               whitelisted addresses can interact with the tokens.",
    fields: &[
        field("Token Name", FieldKind::FreeText, TC),
        field("Token Symbol", FieldKind::FreeText, TC),
        field(
            "Number of Tokens",
            FieldKind::BoundedInteger {
                min: 1,
                max: 1_000_000,
                unit: None,
            },
            TC,
        ),
        field("Description", FieldKind::FreeText, "No description"),
        field("Documents", FieldKind::ListOf(&FREE_TEXT), "No documents"),
        field("CanMint", FieldKind::Enumerated(YES_NO), TC),
        field(
            "MaxCap",
            FieldKind::BoundedInteger {
                min: 1,
                max: 999_999,
                unit: None,
            },
            TC,
        ),
        field("LinkedMetadataTrue", FieldKind::Enumerated(YES_NO), TC),
        field(
            "Number of Linked Metadata Tokens",
            FieldKind::BoundedInteger {
                min: 1,
                max: 1_000_000,
                unit: None,
            },
            TC,
        ),
        field(
            "LinkedMetadata",
            FieldKind::Enumerated(&["Document", "Textfield"]),
            TC,
        ),
        field("LinkedMetadata Datapoint", FieldKind::FreeText, TC),
        field("PreferenceSignature", FieldKind::Enumerated(YES_NO), TC),
        field("PauseTokens", FieldKind::Enumerated(YES_NO), TC),
        field("ForceTransfer", FieldKind::Enumerated(YES_NO), TC),
        field("Freeze", FieldKind::Enumerated(YES_NO), TC),
        field("Blacklist", FieldKind::Enumerated(YES_NO), TC),
        field("TokenFee", FieldKind::Enumerated(YES_NO), TC),
        field(
            "FeeInEth",
            FieldKind::MoneyAmount {
                prefixes: &["ETH"],
                min: Some(0.00021),
                max: Some(0.0033),
            },
            TC,
        ),
        field(
            "FeeEarnedBy",
            FieldKind::Enumerated(&["Creator", "WalletAddress"]),
            TC,
        ),
        field("Whitelist", FieldKind::Enumerated(YES_NO), TC),
        field(
            "Whitelist Admin",
            FieldKind::Enumerated(&["Creator", "Wallet Address"]),
            TC,
        ),
        field("Whitelisted Addresses", FieldKind::ListOf(&FREE_TEXT), TC),
        field("Token Owner", FieldKind::Enumerated(CREATOR), TC),
        field("Change Owner", FieldKind::Enumerated(YES_NO), TC),
        field("NewTokenOwner", FieldKind::FreeText, TC),
    ],
    rules: &[
        CrossFieldRule {
            field: "MaxCap",
            relation: Relation::GreaterThan,
            other: "Number of Tokens",
        },
        CrossFieldRule {
            field: "Number of Linked Metadata Tokens",
            relation: Relation::AtMost,
            other: "Number of Tokens",
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{Fill, validate};

    #[test]
    fn lookup_matches_domain() {
        for domain in Domain::ALL {
            assert_eq!(lookup(domain).domain, domain);
        }
    }

    #[test]
    fn field_names_are_unique() {
        for domain in Domain::ALL {
            let schema = lookup(domain);
            let mut names: Vec<&str> = schema.fields.iter().map(|f| f.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), schema.fields.len(), "duplicate field in {domain}");
        }
    }

    #[test]
    fn rules_reference_declared_fields() {
        for domain in Domain::ALL {
            let schema = lookup(domain);
            for rule in schema.rules {
                assert!(schema.field(rule.field).is_some());
                assert!(schema.field(rule.other).is_some());
            }
        }
    }

    #[test]
    fn default_state_is_schema_legal() {
        // Defaults must survive validation untouched.
        for domain in Domain::ALL {
            let schema = lookup(domain);
            let defaults = default_state(domain);
            let result = validate(schema, &defaults.to_json_map(), Fill::Defaults);
            assert!(result.coercions.is_empty(), "{domain}: {:?}", result.coercions);
            assert_eq!(result.state, defaults);
        }
    }

    #[test]
    fn default_state_covers_every_field_in_order() {
        let state = default_state(Domain::PaymentStream);
        let names: Vec<&str> = state.iter().map(|(name, _)| name).collect();
        let expected: Vec<&str> = PAYMENT_STREAM.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, expected);
        assert_eq!(state.get("Payer"), Some(&FieldValue::scalar("Creator")));
        assert_eq!(
            state.get("Manager Permissions"),
            Some(&FieldValue::Sequence(vec!["Not defined".into()]))
        );
    }

    #[test]
    fn resolve_field_is_case_insensitive() {
        let spec = PAYMENT_STREAM.resolve_field("input payment frequency").unwrap();
        assert_eq!(spec.name, "Input Payment Frequency");
        assert!(PAYMENT_STREAM.resolve_field("Penalty").is_none());
    }

    #[test]
    fn kind_descriptions_list_legal_values() {
        let spec = PAYMENT_STREAM.field("Input Payment Frequency").unwrap();
        assert!(spec.kind.describe().contains("\"Half-yearly\""));
        let fee = TOKEN_CREATION.field("FeeInEth").unwrap();
        assert!(fee.kind.describe().contains("between 0.00021 and 0.0033"));
        let duration = TOKEN_VAULT.field("Duration").unwrap();
        assert!(duration.kind.describe().contains("months between 1 and 36"));
    }

    #[test]
    fn unit_label_pluralizes() {
        assert_eq!(MONTHS.label(1), "month");
        assert_eq!(MONTHS.label(12), "months");
    }
}
