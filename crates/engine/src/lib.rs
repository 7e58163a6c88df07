//! # assetwright engine
//!
//! Turns natural-language requests into validated configurations for
//! tokenized-asset products. One schema-parameterized pipeline serves every
//! domain:
//!
//! ```text
//! user text -> oracle -> parser -> validator -> merge -> state
//!                                                  \-> scorer -> corpus
//! ```
//!
//! The oracle is an `Arc<dyn Provider>`; nothing here knows which backend
//! answers. Validation is total, so the session state is always
//! schema-legal no matter what the oracle returns.

pub mod classifier;
pub mod merge;
pub mod oracle;
pub mod parser;
pub mod schema;
pub mod scorer;
pub mod session;
pub mod state;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use classifier::{Classification, ClassifyError, ProtocolClassifier};
pub use merge::{MergeOutcome, merge};
pub use oracle::{ExtractionError, OracleClient, OracleError, OracleRequest};
pub use parser::{Parsed, parse};
pub use schema::{DomainSchema, FieldKind, FieldSpec, default_state, lookup};
pub use scorer::score;
pub use session::{ConfigEngine, Session, SessionError, SessionStatus, TurnOutcome};
pub use state::{ConfigState, FieldValue};
pub use validate::{CoercionReason, Fill, Validated, ValidationCoercion, validate};
