use tokio::sync::watch;

use crate::signup::AuthSnapshot;

/// Auth/identity collaborator.
///
/// Exposes the current user together with the server-synced signup progress.
/// A failed or in-flight refresh is reported as a snapshot that is not ready,
/// never as an error. It keeps the known user via [`AuthSnapshot::refreshing`].
pub trait AuthStatePort: Send + Sync {
    fn current(&self) -> AuthSnapshot;

    /// Receives a new value on every reactive update.
    fn subscribe(&self) -> watch::Receiver<AuthSnapshot>;
}
