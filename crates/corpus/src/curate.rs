//! Fine-tune curation: filter the corpus and submit it for training.

use std::path::PathBuf;

use assetwright_core::Domain;
use assetwright_core::provider::{FineTuneJob, FineTuner};
use tracing::info;

use crate::CorpusError;
use crate::record::InteractionRecord;
use crate::store::CorpusStore;

/// Records scoring strictly above this are store-worthy.
pub const STORE_WORTHY_THRESHOLD: f32 = 0.5;

/// Fewer qualifying records than this and curation stops.
pub const MIN_FINE_TUNE_RECORDS: usize = 10;

pub fn is_store_worthy(score: f32) -> bool {
    score > STORE_WORTHY_THRESHOLD
}

/// A regenerated curated file, ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CuratedCorpus {
    pub domain: Domain,
    pub path: PathBuf,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurationOutcome {
    /// Not enough store-worthy records; nothing was written.
    Insufficient { qualifying: usize, required: usize },
    Ready(CuratedCorpus),
}

impl CorpusStore {
    /// Filter the domain's corpus to store-worthy records.
    ///
    /// With at least [`MIN_FINE_TUNE_RECORDS`] qualifying records the
    /// curated file is regenerated (written beside it, then renamed over
    /// it). Otherwise the curated file is left untouched.
    pub async fn curate(&self, domain: Domain) -> Result<CurationOutcome, CorpusError> {
        let qualifying: Vec<InteractionRecord> = self
            .read_all(domain)
            .await?
            .into_iter()
            .filter(|r| is_store_worthy(r.score))
            .collect();

        if qualifying.len() < MIN_FINE_TUNE_RECORDS {
            info!(
                %domain,
                qualifying = qualifying.len(),
                required = MIN_FINE_TUNE_RECORDS,
                "Not enough store-worthy records for fine-tuning"
            );
            return Ok(CurationOutcome::Insufficient {
                qualifying: qualifying.len(),
                required: MIN_FINE_TUNE_RECORDS,
            });
        }

        let mut content = String::new();
        for record in &qualifying {
            content.push_str(&record.to_line()?);
        }

        let path = self.curated_path(domain);
        let staging = path.with_extension("jsonl.tmp");
        tokio::fs::create_dir_all(self.dir()).await?;
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, &path).await?;

        info!(%domain, records = qualifying.len(), path = %path.display(), "Curated corpus written");

        Ok(CurationOutcome::Ready(CuratedCorpus {
            domain,
            path,
            records: qualifying.len(),
        }))
    }
}

/// Upload a curated corpus and start a fine-tuning job.
pub async fn submit(
    curated: &CuratedCorpus,
    fine_tuner: &dyn FineTuner,
    base_model: &str,
    epochs: u32,
) -> Result<FineTuneJob, CorpusError> {
    info!(
        domain = %curated.domain,
        backend = %fine_tuner.name(),
        base_model,
        epochs,
        records = curated.records,
        "Submitting fine-tuning job"
    );
    let job = fine_tuner.submit_fine_tune(&curated.path, base_model, epochs).await?;
    info!(domain = %curated.domain, job_id = %job.job_id, "Fine-tuning job accepted");
    Ok(job)
}
