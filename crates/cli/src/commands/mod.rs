pub mod classify;
pub mod configure;
pub mod curate;
pub mod doctor;
pub mod gateway;
pub mod onboard;
pub mod schema;

use std::sync::Arc;

use assetwright_config::AppConfig;
use assetwright_engine::OracleClient;

/// Load the config and fail early, with setup instructions, when no API key
/// is available.
pub(crate) fn load_with_api_key() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    ASSETWRIGHT_API_KEY = 'sk-...'   (preferred)");
        eprintln!("    OPENAI_API_KEY      = 'sk-...'   (for OpenAI direct)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    Ok(config)
}

/// The oracle client for the configured default provider.
pub(crate) fn oracle_from_config(config: &AppConfig) -> Result<Arc<OracleClient>, Box<dyn std::error::Error>> {
    let router = assetwright_providers::router::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;

    let oracle = OracleClient::new(provider, &config.default_model)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_timeout(config.oracle.timeout());
    Ok(Arc::new(oracle))
}
