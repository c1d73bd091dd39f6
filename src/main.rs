use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mf_host::bootstrap::{config, tracing as host_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 可选的 .env，用于 RUST_LOG / SENTRY_DSN / MEMBERFLOW_CONFIG
    let _ = dotenvy::dotenv();

    if let Err(err) = host_tracing::init_tracing_subscriber() {
        eprintln!("Failed to initialize tracing: {err}");
    }

    let config_path = config::resolve_config_path();
    let config = config::load_or_default(config_path.as_deref())?;
    let runtime = mf_host::wire(config)?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(err) => error!(error = %err, "failed to listen for ctrl-c"),
        }
        signal.cancel();
    });

    mf_host::run_host(runtime, shutdown).await
}
