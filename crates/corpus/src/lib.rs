//! Interaction corpus for assetwright.
//!
//! Each scored turn is appended to a per-domain JSONL file of
//! `{messages, score}` records. Curation filters the corpus down to the
//! store-worthy records and hands the result to a fine-tuning backend.
//!
//! Layout under the corpus directory:
//! - `training_data_<domain>.jsonl`: append-only, one record per line
//! - `filtered_training_data_<domain>.jsonl`: regenerated by each curation

pub mod curate;
pub mod record;
pub mod store;

pub use curate::{
    CuratedCorpus, CurationOutcome, MIN_FINE_TUNE_RECORDS, STORE_WORTHY_THRESHOLD, is_store_worthy, submit,
};
pub use record::InteractionRecord;
pub use store::CorpusStore;

use assetwright_core::error::ProviderError;

/// Corpus errors.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("Corpus I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corpus serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Fine-tune submission failed: {0}")]
    FineTune(#[from] ProviderError),
}
