use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Keys of the durable navigation flag store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationKey {
    CurrentStepId,
    VerificationSession,
    ForceNavigation,
    CriticalNavigation,
    NavigationBlocked,
    AccountLinkingActive,
    JustVerified,
}

impl NavigationKey {
    pub const ALL: [NavigationKey; 7] = [
        NavigationKey::CurrentStepId,
        NavigationKey::VerificationSession,
        NavigationKey::ForceNavigation,
        NavigationKey::CriticalNavigation,
        NavigationKey::NavigationBlocked,
        NavigationKey::AccountLinkingActive,
        NavigationKey::JustVerified,
    ];

    /// Key name in the persisted document.
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationKey::CurrentStepId => "currentStepId",
            NavigationKey::VerificationSession => "verificationSession",
            NavigationKey::ForceNavigation => "forceNavigation",
            NavigationKey::CriticalNavigation => "criticalNavigation",
            NavigationKey::NavigationBlocked => "navigationBlocked",
            NavigationKey::AccountLinkingActive => "accountLinkingActive",
            NavigationKey::JustVerified => "justVerified",
        }
    }

    /// Keys whose changes can produce a navigation intent.
    pub fn carries_intent(&self) -> bool {
        matches!(
            self,
            NavigationKey::ForceNavigation
                | NavigationKey::CriticalNavigation
                | NavigationKey::NavigationBlocked
                | NavigationKey::AccountLinkingActive
                | NavigationKey::JustVerified
        )
    }
}

impl fmt::Display for NavigationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NavigationStoreError {
    #[error("navigation store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("navigation store is corrupt: {0}")]
    Corrupt(String),
    #[error("navigation store lock poisoned")]
    Poisoned,
}

/// Durable, synchronous key-value store that survives a restart.
///
/// Keys are independent; no transaction spans more than one key.
pub trait NavigationStorePort: Send + Sync {
    fn get(&self, key: NavigationKey) -> Result<Option<serde_json::Value>, NavigationStoreError>;

    fn set(&self, key: NavigationKey, value: serde_json::Value)
        -> Result<(), NavigationStoreError>;

    fn remove(&self, key: NavigationKey) -> Result<(), NavigationStoreError>;

    /// Change notifications, if the store can produce them. Callers fall
    /// back to polling on `None`.
    fn subscribe(&self) -> Option<broadcast::Receiver<NavigationKey>> {
        None
    }
}
