//! # assetwright core
//!
//! Domain identifiers, provider traits, and error definitions shared by
//! every assetwright crate. This crate has **no framework dependencies**:
//! the oracle and fine-tuning collaborators are defined here as traits and
//! implemented in `assetwright-providers`.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping the oracle backend via configuration
//! - Scripted mock oracles in tests
//! - Clean dependency graph (all crates depend inward on core)

pub mod domain;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use domain::{Domain, MergePolicy, UnknownDomain};
pub use error::ProviderError;
pub use message::{Message, Role};
pub use provider::{FineTuneJob, FineTuner, Provider, ProviderRequest, ProviderResponse, Usage};
