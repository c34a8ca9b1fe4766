//! Library Management Engine
//!
//! Reads JSON requests line by line on stdin and answers on stdout.

use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lms_engine::{api, config::AppConfig, services::Services};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // stdout carries the protocol, logs go to stderr
    let (log_writer, _log_guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lms_engine={}", config.logging.level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(log_writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(log_writer))
            .init();
    }

    tracing::info!("Starting lms-engine v{}", env!("CARGO_PKG_VERSION"));

    let mut services = Services::open(&config).await?;

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let served = api::serve(&mut services, stdin, stdout).await;

    services.close().await;
    served?;

    tracing::info!("Shutdown complete");
    Ok(())
}
