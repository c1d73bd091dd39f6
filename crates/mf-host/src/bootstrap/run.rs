use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument};

use super::wiring::HostRuntime;

/// Runs the intent watcher until `shutdown` is cancelled.
pub async fn run_host(runtime: HostRuntime, shutdown: CancellationToken) -> anyhow::Result<()> {
    let span = tracing::info_span!("host.run", steps = runtime.registry.len());
    async move {
        if let Some(session) = runtime.resume_verification_session().execute() {
            info!(
                verification_id = %session.verification_id,
                existing_user = session.is_existing_user,
                "resuming pending email verification"
            );
        }

        let watcher = runtime.watcher().spawn(shutdown);
        info!("navigation host started");

        watcher.await?;
        info!(location = ?runtime.router.location(), "navigation host stopped");
        Ok(())
    }
    .instrument(span)
    .await
}
