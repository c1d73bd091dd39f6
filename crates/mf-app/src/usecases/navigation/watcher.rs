//! Intent watcher.
//!
//! Drives a navigation session from outside signals: auth/progress updates
//! and writes to the durable flag store made by code the session cannot
//! observe directly. Store change notifications are preferred; stores that
//! cannot notify are polled at `poll_interval` instead, so an externally set
//! intent is picked up within one interval either way.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Instrument};

use mf_core::ports::NavigationKey;
use mf_core::signup::AuthSnapshot;

use super::coordinator::NavigationCoordinator;
use super::route_guard::RouteSession;

/// Something the watcher can feed signals into.
pub trait NavigationDriver: Send {
    fn on_auth_changed(&mut self, snapshot: AuthSnapshot);

    fn on_intents_changed(&mut self);
}

impl NavigationDriver for NavigationCoordinator {
    fn on_auth_changed(&mut self, snapshot: AuthSnapshot) {
        self.reconcile(snapshot);
    }

    fn on_intents_changed(&mut self) {
        self.process_intents();
    }
}

impl NavigationDriver for RouteSession {
    fn on_auth_changed(&mut self, snapshot: AuthSnapshot) {
        self.update_auth(snapshot);
    }

    fn on_intents_changed(&mut self) {
        self.process_intents();
    }
}

pub struct IntentWatcher<D: NavigationDriver> {
    driver: Arc<Mutex<D>>,
    auth: watch::Receiver<AuthSnapshot>,
    store_events: Option<broadcast::Receiver<NavigationKey>>,
    poll_interval: Duration,
}

impl<D: NavigationDriver + 'static> IntentWatcher<D> {
    pub fn new(
        driver: Arc<Mutex<D>>,
        auth: watch::Receiver<AuthSnapshot>,
        store_events: Option<broadcast::Receiver<NavigationKey>>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            driver,
            auth,
            store_events,
            // tokio intervals cannot be zero.
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Runs until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let span = tracing::info_span!(
            "usecase.navigation.intent_watcher",
            notify = self.store_events.is_some(),
            poll_ms = self.poll_interval.as_millis() as u64,
        );
        async move {
            let initial = self.auth.borrow_and_update().clone();
            self.driver.lock().await.on_auth_changed(initial);
            // A notification may have been missed before we subscribed.
            self.driver.lock().await.on_intents_changed();

            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut auth_open = true;

            loop {
                let polling = self.store_events.is_none();
                let signal = tokio::select! {
                    _ = shutdown.cancelled() => Signal::Shutdown,
                    changed = self.auth.changed(), if auth_open => Signal::Auth(changed.is_ok()),
                    event = next_store_event(&mut self.store_events), if !polling => Signal::Store(event),
                    _ = ticker.tick(), if polling => Signal::Tick,
                };

                match signal {
                    Signal::Shutdown => break,
                    Signal::Auth(false) => {
                        debug!("auth source closed");
                        auth_open = false;
                    }
                    Signal::Auth(true) => {
                        let snapshot = self.auth.borrow_and_update().clone();
                        self.driver.lock().await.on_auth_changed(snapshot);
                    }
                    Signal::Store(Ok(key)) if !key.carries_intent() => {}
                    Signal::Store(Ok(_))
                    | Signal::Store(Err(broadcast::error::RecvError::Lagged(_)))
                    | Signal::Tick => {
                        self.driver.lock().await.on_intents_changed();
                    }
                    Signal::Store(Err(broadcast::error::RecvError::Closed)) => {
                        info!("store notifications closed, falling back to polling");
                        self.store_events = None;
                    }
                }
            }
            debug!("intent watcher stopped");
        }
        .instrument(span)
        .await
    }

    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

enum Signal {
    Shutdown,
    Auth(bool),
    Store(Result<NavigationKey, broadcast::error::RecvError>),
    Tick,
}

async fn next_store_event(
    events: &mut Option<broadcast::Receiver<NavigationKey>>,
) -> Result<NavigationKey, broadcast::error::RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
