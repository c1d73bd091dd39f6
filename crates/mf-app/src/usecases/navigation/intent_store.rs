//! Typed access to the durable navigation flag store.
//!
//! Every read and write is infallible from the caller's side: store failures
//! and undecodable entries are logged and treated as "absent", because the
//! navigation core must never take the host UI down.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use mf_core::ids::StepId;
use mf_core::ports::{ClockPort, NavigationKey, NavigationStorePort};
use mf_core::signup::{
    BypassFlags, CriticalNavigation, ForceNavigation, JustVerified, VerificationSession,
};

#[derive(Clone)]
pub struct NavigationIntentStore {
    store: Arc<dyn NavigationStorePort>,
    clock: Arc<dyn ClockPort>,
}

impl NavigationIntentStore {
    pub fn new(store: Arc<dyn NavigationStorePort>, clock: Arc<dyn ClockPort>) -> Self {
        Self { store, clock }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn clock(&self) -> Arc<dyn ClockPort> {
        self.clock.clone()
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<NavigationKey>> {
        self.store.subscribe()
    }

    fn read<T: DeserializeOwned>(&self, key: NavigationKey) -> Option<T> {
        let value = match self.store.get(key) {
            Ok(value) => value?,
            Err(err) => {
                warn!(%key, error = %err, "navigation store read failed");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(%key, error = %err, "discarding undecodable navigation entry");
                self.clear(key);
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: NavigationKey, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                warn!(%key, error = %err, "failed to encode navigation entry");
                return;
            }
        };
        if let Err(err) = self.store.set(key, value) {
            warn!(%key, error = %err, "navigation store write failed");
        }
    }

    fn clear(&self, key: NavigationKey) {
        if let Err(err) = self.store.remove(key) {
            warn!(%key, error = %err, "navigation store remove failed");
        }
    }

    fn flag(&self, key: NavigationKey) -> bool {
        self.read::<bool>(key).unwrap_or(false)
    }

    fn set_flag(&self, key: NavigationKey, enabled: bool) {
        if enabled {
            self.write(key, &true);
        } else {
            self.clear(key);
        }
    }

    pub fn current_step_id(&self) -> Option<StepId> {
        self.read(NavigationKey::CurrentStepId)
    }

    pub fn set_current_step_id(&self, id: &StepId) {
        self.write(NavigationKey::CurrentStepId, id);
    }

    pub fn clear_current_step_id(&self) {
        self.clear(NavigationKey::CurrentStepId);
    }

    pub fn save_verification_session(&self, session: &VerificationSession) {
        self.write(NavigationKey::VerificationSession, session);
    }

    /// Returns the saved session unless it is older than `ttl_ms`, in which
    /// case it is purged.
    pub fn load_verification_session(&self, ttl_ms: i64) -> Option<VerificationSession> {
        let session: VerificationSession = self.read(NavigationKey::VerificationSession)?;
        if session.is_expired(self.now_ms(), ttl_ms) {
            debug!(verification_id = %session.verification_id, "verification session expired");
            self.clear_verification_session();
            return None;
        }
        Some(session)
    }

    pub fn clear_verification_session(&self) {
        self.clear(NavigationKey::VerificationSession);
    }

    pub fn request_force_navigation(&self, step_index: usize) {
        let request = ForceNavigation {
            step_index,
            timestamp: self.now_ms(),
        };
        self.write(NavigationKey::ForceNavigation, &request);
    }

    pub fn force_navigation(&self) -> Option<ForceNavigation> {
        self.read(NavigationKey::ForceNavigation)
    }

    /// Reads and clears the pending force request in one step.
    pub fn take_force_navigation(&self) -> Option<ForceNavigation> {
        let request = self.force_navigation()?;
        self.clear(NavigationKey::ForceNavigation);
        Some(request)
    }

    pub fn request_critical_navigation(&self, path: impl Into<String>) {
        let request = CriticalNavigation {
            path: path.into(),
            timestamp: self.now_ms(),
        };
        self.write(NavigationKey::CriticalNavigation, &request);
    }

    /// Reads and clears the pending critical request in one step.
    pub fn take_critical_navigation(&self) -> Option<CriticalNavigation> {
        let request: CriticalNavigation = self.read(NavigationKey::CriticalNavigation)?;
        self.clear(NavigationKey::CriticalNavigation);
        Some(request)
    }

    pub fn is_navigation_blocked(&self) -> bool {
        self.flag(NavigationKey::NavigationBlocked)
    }

    pub fn set_navigation_blocked(&self, blocked: bool) {
        self.set_flag(NavigationKey::NavigationBlocked, blocked);
    }

    pub fn is_account_linking_active(&self) -> bool {
        self.flag(NavigationKey::AccountLinkingActive)
    }

    pub fn set_account_linking_active(&self, active: bool) {
        self.set_flag(NavigationKey::AccountLinkingActive, active);
    }

    pub fn mark_just_verified(&self) {
        let flag = JustVerified {
            timestamp: self.now_ms(),
        };
        self.write(NavigationKey::JustVerified, &flag);
    }

    pub fn just_verified(&self) -> Option<JustVerified> {
        self.read(NavigationKey::JustVerified)
    }

    pub fn clear_just_verified(&self) {
        self.clear(NavigationKey::JustVerified);
    }

    /// Snapshot of all bypass flags. Nothing is consumed.
    pub fn bypass_flags(&self) -> BypassFlags {
        BypassFlags {
            navigation_blocked: self.is_navigation_blocked(),
            account_linking_active: self.is_account_linking_active(),
            just_verified: self.just_verified(),
            force_navigation: self.force_navigation(),
            critical_navigation: self.read(NavigationKey::CriticalNavigation),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    use mf_core::ports::NavigationStoreError;

    use super::*;

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<NavigationKey, serde_json::Value>>,
    }

    impl NavigationStorePort for MapStore {
        fn get(
            &self,
            key: NavigationKey,
        ) -> Result<Option<serde_json::Value>, NavigationStoreError> {
            Ok(self.entries.lock().unwrap().get(&key).cloned())
        }

        fn set(
            &self,
            key: NavigationKey,
            value: serde_json::Value,
        ) -> Result<(), NavigationStoreError> {
            self.entries.lock().unwrap().insert(key, value);
            Ok(())
        }

        fn remove(&self, key: NavigationKey) -> Result<(), NavigationStoreError> {
            self.entries.lock().unwrap().remove(&key);
            Ok(())
        }
    }

    struct BrokenStore;

    impl NavigationStorePort for BrokenStore {
        fn get(&self, _: NavigationKey) -> Result<Option<serde_json::Value>, NavigationStoreError> {
            Err(NavigationStoreError::Poisoned)
        }

        fn set(&self, _: NavigationKey, _: serde_json::Value) -> Result<(), NavigationStoreError> {
            Err(NavigationStoreError::Poisoned)
        }

        fn remove(&self, _: NavigationKey) -> Result<(), NavigationStoreError> {
            Err(NavigationStoreError::Poisoned)
        }
    }

    struct StepClock(AtomicI64);

    impl ClockPort for StepClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn store_at(now: i64) -> (NavigationIntentStore, Arc<MapStore>, Arc<StepClock>) {
        let map = Arc::new(MapStore::default());
        let clock = Arc::new(StepClock(AtomicI64::new(now)));
        (
            NavigationIntentStore::new(map.clone(), clock.clone()),
            map,
            clock,
        )
    }

    #[test]
    fn take_force_navigation_clears_the_flag() {
        let (store, _, _) = store_at(1_000);
        store.request_force_navigation(3);

        let taken = store.take_force_navigation().unwrap();
        assert_eq!(taken.step_index, 3);
        assert_eq!(taken.timestamp, 1_000);
        assert!(store.take_force_navigation().is_none());
    }

    #[test]
    fn expired_verification_session_is_purged() {
        let (store, map, clock) = store_at(0);
        store.save_verification_session(&VerificationSession {
            email: "ada@example.org".into(),
            display_name: "Ada".into(),
            verification_id: "vrf-1".into(),
            is_existing_user: false,
            timestamp: 0,
        });

        clock.0.store(14 * 60_000 + 59_000, Ordering::SeqCst);
        assert!(store.load_verification_session(15 * 60_000).is_some());

        clock.0.store(15 * 60_000 + 1_000, Ordering::SeqCst);
        assert!(store.load_verification_session(15 * 60_000).is_none());
        assert!(map
            .entries
            .lock()
            .unwrap()
            .get(&NavigationKey::VerificationSession)
            .is_none());
    }

    #[test]
    fn undecodable_entries_are_discarded() {
        let (store, map, _) = store_at(0);
        map.set(NavigationKey::ForceNavigation, serde_json::json!("garbage"))
            .unwrap();

        assert!(store.force_navigation().is_none());
        assert!(map.get(NavigationKey::ForceNavigation).unwrap().is_none());
    }

    #[test]
    fn false_flags_are_removed_not_stored() {
        let (store, map, _) = store_at(0);
        store.set_navigation_blocked(true);
        assert!(store.is_navigation_blocked());

        store.set_navigation_blocked(false);
        assert!(!store.is_navigation_blocked());
        assert!(map.get(NavigationKey::NavigationBlocked).unwrap().is_none());
    }

    #[test]
    fn broken_store_reads_as_empty() {
        let clock = Arc::new(StepClock(AtomicI64::new(0)));
        let store = NavigationIntentStore::new(Arc::new(BrokenStore), clock);

        store.mark_just_verified();
        assert_eq!(store.bypass_flags(), BypassFlags::default());
    }
}
