//! Configuration domains and merge policies.
//!
//! A [`Domain`] names one configuration schema family. The set is closed:
//! anything the classifier or a caller produces outside of it is rejected,
//! never defaulted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One configuration schema family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    /// Recurring inflows/outflows attached to an asset (dividends, rent, salaries).
    PaymentStream,
    /// A time-locked token vault with access control and penalties.
    TokenVault,
    /// A token-creation contract with compliance features.
    TokenCreation,
}

impl Domain {
    /// Every supported domain, in classifier presentation order.
    pub const ALL: [Domain; 3] = [Domain::PaymentStream, Domain::TokenVault, Domain::TokenCreation];

    /// The wire name used in prompts, routes, and corpus file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentStream => "payment-stream",
            Self::TokenVault => "token-vault",
            Self::TokenCreation => "token-creation",
        }
    }

    /// The merge policy a domain uses unless configuration overrides it.
    pub fn default_policy(&self) -> MergePolicy {
        match self {
            Self::PaymentStream => MergePolicy::DiffMerge,
            Self::TokenVault | Self::TokenCreation => MergePolicy::FullReplace,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown domain '{0}' (expected one of: payment-stream, token-vault, token-creation)")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == s.trim())
            .ok_or_else(|| UnknownDomain(s.to_string()))
    }
}

/// How an oracle proposal is folded into the prior configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The validated proposal is the new state; absent fields take their default.
    FullReplace,
    /// Only emitted, non-sentinel fields overwrite the prior state.
    DiffMerge,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullReplace => "full_replace",
            Self::DiffMerge => "diff_merge",
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_roundtrips_through_wire_name() {
        for domain in Domain::ALL {
            assert_eq!(domain.as_str().parse::<Domain>().unwrap(), domain);
        }
    }

    #[test]
    fn unknown_domain_rejected() {
        let err = "ai_payments.py".parse::<Domain>().unwrap_err();
        assert!(err.to_string().contains("ai_payments.py"));
    }

    #[test]
    fn domain_serializes_kebab_case() {
        let json = serde_json::to_string(&Domain::TokenVault).unwrap();
        assert_eq!(json, "\"token-vault\"");
    }

    #[test]
    fn payment_stream_defaults_to_diff_merge() {
        assert_eq!(Domain::PaymentStream.default_policy(), MergePolicy::DiffMerge);
        assert_eq!(Domain::TokenCreation.default_policy(), MergePolicy::FullReplace);
    }
}
