//! `assetwright classify` — Route a request to its domain.

use assetwright_engine::ProtocolClassifier;

pub async fn run(text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_with_api_key()?;
    let classifier = ProtocolClassifier::new(super::oracle_from_config(&config)?);

    let classification = classifier.classify(text).await?;
    println!("{}", serde_json::to_string_pretty(&classification)?);

    Ok(())
}
