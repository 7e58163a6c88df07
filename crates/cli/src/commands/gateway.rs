//! `assetwright gateway` — Start the HTTP API server.

use assetwright_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🌐 assetwright Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Recording interactions: {}", config.corpus.record_interactions);

    assetwright_gateway::start(config).await?;

    Ok(())
}
