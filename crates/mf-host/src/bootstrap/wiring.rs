//! # Dependency Injection / 依赖注入模块
//!
//! Builds the concrete adapters and hands them to the navigation use cases
//! through their ports. Assembly only: every navigation decision is made in
//! `mf-app`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use mf_app::usecases::navigation::{
    CompleteEmailVerification, IntentWatcher, NavigationCoordinator, NavigationIntentStore,
    ResumeVerificationSession, SaveVerificationSession,
};
use mf_core::config::NavigationConfig;
use mf_core::ports::{AuthStatePort, NavigationStorePort};
use mf_core::signup::{StepLookupError, StepRegistry};
use mf_infra::{FileNavigationStore, InMemoryNavigationStore, SystemClock, WatchAuthState};

use super::config::resolve_state_path;
use crate::adapters::{TracingNavigationEvents, TracingRouter};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("confirmation step is not part of the flow: {0}")]
    UnknownConfirmationStep(#[source] StepLookupError),
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// Fully assembled navigation runtime.
pub struct HostRuntime {
    pub config: NavigationConfig,
    pub registry: Arc<StepRegistry>,
    pub store: NavigationIntentStore,
    pub auth: Arc<WatchAuthState>,
    pub router: Arc<TracingRouter>,
    pub coordinator: Arc<Mutex<NavigationCoordinator>>,
}

impl HostRuntime {
    pub fn watcher(&self) -> IntentWatcher<NavigationCoordinator> {
        IntentWatcher::new(
            self.coordinator.clone(),
            self.auth.subscribe(),
            self.store.subscribe(),
            Duration::from_millis(self.config.poll_interval_ms),
        )
    }

    pub fn save_verification_session(&self) -> SaveVerificationSession {
        SaveVerificationSession::new(self.store.clone())
    }

    pub fn resume_verification_session(&self) -> ResumeVerificationSession {
        ResumeVerificationSession::new(self.store.clone(), self.config.session_ttl_ms)
    }

    pub fn complete_email_verification(&self) -> CompleteEmailVerification {
        CompleteEmailVerification::new(
            self.store.clone(),
            &self.registry,
            &self.config.confirmation.step_id,
        )
    }
}

pub fn wire(config: NavigationConfig) -> Result<HostRuntime, HostError> {
    if config.poll_interval_ms == 0 {
        return Err(HostError::ZeroPollInterval);
    }

    let registry = Arc::new(StepRegistry::membership());
    registry
        .index_of(&config.confirmation.step_id)
        .map_err(HostError::UnknownConfirmationStep)?;

    let backing: Arc<dyn NavigationStorePort> = match resolve_state_path(&config) {
        Some(path) => {
            info!(path = %path.display(), "using file navigation store");
            Arc::new(FileNavigationStore::new(path))
        }
        None => {
            warn!("no data directory, navigation state will not survive a restart");
            Arc::new(InMemoryNavigationStore::new())
        }
    };
    let store = NavigationIntentStore::new(backing, Arc::new(SystemClock));

    let auth = Arc::new(WatchAuthState::new());
    let router = Arc::new(TracingRouter::new());
    let coordinator = NavigationCoordinator::new(
        registry.clone(),
        config.clone(),
        store.clone(),
        router.clone(),
        Arc::new(TracingNavigationEvents),
    );

    Ok(HostRuntime {
        config,
        registry,
        store,
        auth,
        router,
        coordinator: Arc::new(Mutex::new(coordinator)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::signup::AuthSnapshot;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> NavigationConfig {
        NavigationConfig {
            state_path: dir.path().join("state.json"),
            ..NavigationConfig::default()
        }
    }

    #[test]
    fn rejects_unknown_confirmation_step() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.confirmation.step_id = "welcome".to_string();

        assert!(matches!(
            wire(config),
            Err(HostError::UnknownConfirmationStep(_))
        ));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.poll_interval_ms = 0;

        assert!(matches!(wire(config), Err(HostError::ZeroPollInterval)));
    }

    #[tokio::test]
    async fn wired_coordinator_persists_to_state_file() {
        let dir = TempDir::new().unwrap();
        let runtime = wire(config_in(&dir)).unwrap();

        runtime.auth.publish(AuthSnapshot::signed_out());
        let snapshot = runtime.auth.current();
        runtime.coordinator.lock().await.reconcile(snapshot);
        runtime.complete_email_verification().execute();

        assert!(runtime.coordinator.lock().await.process_intents().is_some());
        assert!(dir.path().join("state.json").exists());
        assert_eq!(
            runtime.store.current_step_id().map(|id| id.into_inner()),
            Some("verified".to_string())
        );
    }
}
