#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use mf_app::usecases::navigation::{NavigationCoordinator, NavigationIntentStore};
use mf_core::config::NavigationConfig;
use mf_core::ports::{HistoryMode, NavigationEventPort, RouterPort, StepChange};
use mf_core::signup::{AuthSnapshot, Identity, SignupProgressState, StepRegistry};
use mf_infra::{FakeClock, InMemoryNavigationStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterCall {
    Navigate(String, HistoryMode),
    External(String),
}

#[derive(Default)]
pub struct RecordingRouter {
    pub calls: Mutex<Vec<RouterCall>>,
}

impl RecordingRouter {
    pub fn calls(&self) -> Vec<RouterCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn external_redirects(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RouterCall::External(_)))
            .count()
    }
}

impl RouterPort for RecordingRouter {
    fn navigate(&self, path: &str, mode: HistoryMode) {
        self.calls
            .lock()
            .unwrap()
            .push(RouterCall::Navigate(path.to_string(), mode));
    }

    fn redirect_external(&self, destination: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(RouterCall::External(destination.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingEvents {
    pub changes: Mutex<Vec<StepChange>>,
    pub exits: Mutex<Vec<String>>,
}

impl RecordingEvents {
    pub fn change_count(&self) -> usize {
        self.changes.lock().unwrap().len()
    }
}

impl NavigationEventPort for RecordingEvents {
    fn step_changed(&self, change: &StepChange) {
        self.changes.lock().unwrap().push(change.clone());
    }

    fn flow_exited(&self, destination: &str) {
        self.exits.lock().unwrap().push(destination.to_string());
    }
}

pub struct Fixture {
    pub backing: Arc<InMemoryNavigationStore>,
    pub store: NavigationIntentStore,
    pub clock: Arc<FakeClock>,
    pub router: Arc<RecordingRouter>,
    pub events: Arc<RecordingEvents>,
    pub registry: Arc<StepRegistry>,
    pub config: NavigationConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let backing = Arc::new(InMemoryNavigationStore::new());
        let clock = Arc::new(FakeClock::new(1_700_000_000_000));
        Self {
            store: NavigationIntentStore::new(backing.clone(), clock.clone()),
            backing,
            clock,
            router: Arc::new(RecordingRouter::default()),
            events: Arc::new(RecordingEvents::default()),
            registry: Arc::new(StepRegistry::membership()),
            config: NavigationConfig::default(),
        }
    }

    pub fn coordinator(&self) -> NavigationCoordinator {
        NavigationCoordinator::new(
            self.registry.clone(),
            self.config.clone(),
            self.store.clone(),
            self.router.clone(),
            self.events.clone(),
        )
    }
}

pub fn signed_in(user: &str, progress: u32, step: &str) -> AuthSnapshot {
    AuthSnapshot::signed_in(Identity::new(user), SignupProgressState::new(progress, step))
}

pub fn completed(user: &str) -> AuthSnapshot {
    AuthSnapshot::signed_in(Identity::new(user), SignupProgressState::completed())
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
