use tokio::sync::watch;
use tracing::debug;

use mf_core::ports::AuthStatePort;
use mf_core::signup::AuthSnapshot;

/// Auth state fed by whatever talks to the identity backend.
///
/// Starts as loading. The backend integration calls [`publish`] on every
/// refresh and [`begin_refresh`] when one starts or fails.
///
/// [`publish`]: WatchAuthState::publish
/// [`begin_refresh`]: WatchAuthState::begin_refresh
pub struct WatchAuthState {
    tx: watch::Sender<AuthSnapshot>,
}

impl WatchAuthState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AuthSnapshot::loading());
        Self { tx }
    }

    pub fn publish(&self, snapshot: AuthSnapshot) {
        debug!(
            ready = snapshot.is_ready(),
            signed_in = snapshot.user.is_some(),
            "auth snapshot published"
        );
        self.tx.send_replace(snapshot);
    }

    /// Marks the state as not ready while keeping the signed-in user, if any.
    pub fn begin_refresh(&self) {
        let snapshot = match self.current().user {
            Some(user) => AuthSnapshot::refreshing(user),
            None => AuthSnapshot::loading(),
        };
        self.publish(snapshot);
    }
}

impl Default for WatchAuthState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStatePort for WatchAuthState {
    fn current(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use mf_core::signup::{Identity, SignupProgressState};

    use super::*;

    #[tokio::test]
    async fn subscribers_see_published_snapshots() {
        let auth = WatchAuthState::new();
        let mut rx = auth.subscribe();
        assert!(!rx.borrow().is_ready());

        auth.publish(AuthSnapshot::signed_out());

        rx.changed().await.unwrap();
        assert!(rx.borrow().is_ready());
        assert!(auth.current().user.is_none());
    }

    #[test]
    fn refresh_keeps_the_signed_in_user() {
        let auth = WatchAuthState::new();
        auth.publish(AuthSnapshot::signed_in(
            Identity::new("user-a"),
            SignupProgressState::new(2, "profile"),
        ));

        auth.begin_refresh();

        let current = auth.current();
        assert!(!current.is_ready());
        assert_eq!(current.user, Some(Identity::new("user-a")));
    }

    #[test]
    fn refresh_without_user_is_plain_loading() {
        let auth = WatchAuthState::new();
        auth.publish(AuthSnapshot::signed_out());
        auth.begin_refresh();
        assert_eq!(auth.current(), AuthSnapshot::loading());
    }
}
