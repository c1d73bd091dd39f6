//! Email verification session use cases.

use tracing::info;

use mf_core::signup::{StepRegistry, VerificationSession};

use super::intent_store::NavigationIntentStore;

/// Persists a freshly requested verification so a reload can resume it.
pub struct SaveVerificationSession {
    store: NavigationIntentStore,
}

impl SaveVerificationSession {
    pub fn new(store: NavigationIntentStore) -> Self {
        Self { store }
    }

    pub fn execute(
        &self,
        email: impl Into<String>,
        display_name: impl Into<String>,
        verification_id: impl Into<String>,
        is_existing_user: bool,
    ) -> VerificationSession {
        let session = VerificationSession {
            email: email.into(),
            display_name: display_name.into(),
            verification_id: verification_id.into(),
            is_existing_user,
            timestamp: self.store.now_ms(),
        };
        self.store.save_verification_session(&session);
        session
    }
}

/// Loads the saved verification, discarding it once past its TTL.
pub struct ResumeVerificationSession {
    store: NavigationIntentStore,
    ttl_ms: i64,
}

impl ResumeVerificationSession {
    pub fn new(store: NavigationIntentStore, ttl_ms: i64) -> Self {
        Self { store, ttl_ms }
    }

    pub fn execute(&self) -> Option<VerificationSession> {
        self.store.load_verification_session(self.ttl_ms)
    }
}

/// Marks email verification as done.
///
/// Sets the just-verified bypass, drops the saved session and asks for a
/// critical navigation to the confirmation step.
pub struct CompleteEmailVerification {
    store: NavigationIntentStore,
    confirmation_path: Option<String>,
}

impl CompleteEmailVerification {
    pub fn new(store: NavigationIntentStore, registry: &StepRegistry, confirmation_id: &str) -> Self {
        let confirmation_path = registry
            .index_of(confirmation_id)
            .ok()
            .map(|index| registry.path_for(index).to_string());
        Self {
            store,
            confirmation_path,
        }
    }

    pub fn execute(&self) {
        self.store.mark_just_verified();
        self.store.clear_verification_session();
        if let Some(path) = &self.confirmation_path {
            self.store.request_critical_navigation(path.clone());
        }
        info!("email verification completed");
    }
}
