mod configuration;
mod error;
mod routes;
mod startup;
mod state;

use configuration::Settings;
use kittenbot::secrets::google::GoogleSecretManager;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = Settings::new()?;

    // Credentials come from the secret store, never from local configuration
    let store = GoogleSecretManager::new(settings.secrets.store_config())?;
    let code = startup::run(&settings, store).await?;
    Ok(ExitCode::from(code))
}
