//! `assetwright doctor` — Diagnose system health.

use assetwright_config::AppConfig;
use assetwright_core::Domain;
use assetwright_corpus::CorpusStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 assetwright Doctor — System Diagnostics");
    println!("==========================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid");
                Some(config)
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
                None
            }
        }
    } else {
        println!("  ❌ No config file — run `assetwright onboard`");
        issues += 1;
        None
    };

    if let Some(config) = config {
        // Check API key
        if config.has_api_key() {
            println!("  ✅ API key configured");
        } else {
            println!("  ⚠️  No API key configured — add api_key to config.toml");
            issues += 1;
        }

        // Check corpus
        let store = CorpusStore::new(config.corpus_dir());
        if store.dir().exists() {
            println!("  ✅ Corpus directory exists");
            for domain in Domain::ALL {
                let records = store.read_all(domain).await?.len();
                println!("     {domain}: {records} record(s)");
            }
        } else {
            println!("  ⚠️  No corpus directory — run `assetwright onboard`");
            issues += 1;
        }

        for domain in Domain::ALL {
            println!("     {domain} merge policy: {}", config.domains.policy_for(domain));
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
