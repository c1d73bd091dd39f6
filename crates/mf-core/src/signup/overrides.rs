//! Bypass flags and the tagged override they resolve to.
//!
//! The durable store holds a handful of independent flags. Rather than
//! checking each in an if/else chain, callers take a [`BypassFlags`] snapshot
//! and ask it for the active [`NavigationOverride`]s in priority order.

use serde::{Deserialize, Serialize};

use crate::signup::intent::{NavigationIntent, PriorityTier};

/// Persisted "force navigation to step N" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceNavigation {
    pub step_index: usize,
    pub timestamp: i64,
}

/// Persisted "critical navigation to path" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalNavigation {
    pub path: String,
    pub timestamp: i64,
}

/// Persisted marker set when email verification completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JustVerified {
    pub timestamp: i64,
}

impl JustVerified {
    /// The flag is honored for `grace_ms` after it was set. A timestamp too
    /// far from `now_ms` to subtract is never honored.
    pub fn is_within_grace(&self, now_ms: i64, grace_ms: i64) -> bool {
        now_ms
            .checked_sub(self.timestamp)
            .is_some_and(|age| (0..=grace_ms).contains(&age))
    }
}

/// Snapshot of every bypass flag in the durable store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BypassFlags {
    pub navigation_blocked: bool,
    pub account_linking_active: bool,
    pub just_verified: Option<JustVerified>,
    pub force_navigation: Option<ForceNavigation>,
    pub critical_navigation: Option<CriticalNavigation>,
}

/// An active bypass, tagged with the tier it outranks normal gating with.
///
/// 生效中的导航覆盖。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOverride {
    /// An account-linking interruption owns navigation.
    AccountLinking,
    /// A critical path navigation was requested.
    Critical(CriticalNavigation),
    /// A forced jump to a step was requested.
    Forced(ForceNavigation),
    /// Email was just verified; the confirmation step is unlocked.
    JustVerified(JustVerified),
}

impl NavigationOverride {
    pub fn tier(&self) -> PriorityTier {
        match self {
            NavigationOverride::AccountLinking | NavigationOverride::Critical(_) => {
                PriorityTier::Critical
            }
            NavigationOverride::Forced(_) => PriorityTier::High,
            NavigationOverride::JustVerified(_) => PriorityTier::Medium,
        }
    }

    /// Queue entry for overrides that request a destination.
    pub fn to_intent(&self) -> Option<NavigationIntent> {
        match self {
            NavigationOverride::Critical(critical) => Some(
                NavigationIntent::to_path(&critical.path, self.tier(), critical.timestamp)
                    .forced()
                    .replacing()
                    .with_reason("critical navigation"),
            ),
            NavigationOverride::Forced(forced) => Some(
                NavigationIntent::to_index(forced.step_index, self.tier(), forced.timestamp)
                    .forced()
                    .with_reason("force navigation"),
            ),
            NavigationOverride::AccountLinking | NavigationOverride::JustVerified(_) => None,
        }
    }
}

impl BypassFlags {
    /// Active overrides, strongest first. An expired just-verified flag is
    /// not active.
    pub fn overrides(&self, now_ms: i64, grace_ms: i64) -> Vec<NavigationOverride> {
        let mut active = Vec::new();
        if self.account_linking_active {
            active.push(NavigationOverride::AccountLinking);
        }
        if let Some(critical) = &self.critical_navigation {
            active.push(NavigationOverride::Critical(critical.clone()));
        }
        if let Some(forced) = &self.force_navigation {
            active.push(NavigationOverride::Forced(forced.clone()));
        }
        if let Some(verified) = self.just_verified {
            if verified.is_within_grace(now_ms, grace_ms) {
                active.push(NavigationOverride::JustVerified(verified));
            }
        }
        // Stable sort keeps declaration order inside a tier.
        active.sort_by(|a, b| b.tier().cmp(&a.tier()));
        active
    }

    pub fn strongest(&self, now_ms: i64, grace_ms: i64) -> Option<NavigationOverride> {
        self.overrides(now_ms, grace_ms).into_iter().next()
    }

    pub fn just_verified_active(&self, now_ms: i64, grace_ms: i64) -> bool {
        self.just_verified
            .is_some_and(|v| v.is_within_grace(now_ms, grace_ms))
    }
}
