use std::sync::Arc;

use agro_gateway::{build_app, run_server, AppConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine; the process environment still applies.
    let dotenv = dotenvy::dotenv();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let config = AppConfig::from_env();
    tracing::info!(
        port = config.port,
        groq_base_url = %config.groq.base_url,
        admin = ?config.upstreams.admin,
        auth = ?config.upstreams.auth,
        insect = ?config.upstreams.insect,
        plant = ?config.upstreams.plant,
        "starting agro gateway"
    );

    let app = build_app(Arc::new(AppState::new(&config)?));
    run_server(app, config.port).await?;
    Ok(())
}
