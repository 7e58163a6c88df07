//! `assetwright curate` — Filter the corpus and optionally start fine-tuning.

use assetwright_config::AppConfig;
use assetwright_core::Domain;
use assetwright_corpus::{CorpusStore, CurationOutcome, submit};

pub async fn run(domain: Domain, submit_job: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = if submit_job {
        super::load_with_api_key()?
    } else {
        AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?
    };
    let store = CorpusStore::new(config.corpus_dir());

    println!("🧹 Curating {domain} corpus");
    println!("   Source:  {}", store.corpus_path(domain).display());

    let curated = match store.curate(domain).await? {
        CurationOutcome::Insufficient { qualifying, required } => {
            println!("\n⚠️  Only {qualifying} store-worthy record(s); {required} needed. Nothing written.");
            return Ok(());
        }
        CurationOutcome::Ready(curated) => curated,
    };

    println!("✅ Wrote {} record(s) to {}", curated.records, curated.path.display());

    if submit_job {
        let router = assetwright_providers::router::build_from_config(&config);
        let fine_tuner = router
            .default_fine_tuner()
            .ok_or("Default provider does not support fine-tuning")?;
        let job = submit(
            &curated,
            fine_tuner.as_ref(),
            &config.corpus.fine_tune_model,
            config.corpus.epochs,
        )
        .await?;
        println!("🚀 Fine-tuning job started");
        println!("   File: {}", job.training_file_id);
        println!("   Job:  {}", job.job_id);
    }

    Ok(())
}
