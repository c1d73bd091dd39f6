//! Navigation intents and the pending intent queue.
//!
//! Several triggers can ask to move the user at the same time. Each request
//! becomes a [`NavigationIntent`]; one resolution pass applies at most one of
//! them, chosen by tier first and recency second.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ids::IntentId;

/// Priority of a navigation intent. Declaration order is ascending, so
/// `Critical` compares greatest.
///
/// 导航意图优先级。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityTier {
    Suggestion,
    Low,
    Medium,
    High,
    Critical,
}

/// Where an intent wants to go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntentTarget {
    Index(usize),
    Path(String),
}

/// One pending request to move the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationIntent {
    pub id: IntentId,
    pub target: IntentTarget,
    pub tier: PriorityTier,
    /// Unix millis; newer wins within a tier.
    pub created_at: i64,
    /// Replace the history entry instead of pushing a new one.
    pub replace: bool,
    /// Skip progress gating when applied.
    pub force: bool,
    pub reason: Option<String>,
}

impl NavigationIntent {
    pub fn new(target: IntentTarget, tier: PriorityTier, created_at: i64) -> Self {
        Self {
            id: IntentId::new(),
            target,
            tier,
            created_at,
            replace: false,
            force: false,
            reason: None,
        }
    }

    pub fn to_index(index: usize, tier: PriorityTier, created_at: i64) -> Self {
        Self::new(IntentTarget::Index(index), tier, created_at)
    }

    pub fn to_path(path: impl Into<String>, tier: PriorityTier, created_at: i64) -> Self {
        Self::new(IntentTarget::Path(path.into()), tier, created_at)
    }

    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Pending intents awaiting a resolution pass.
#[derive(Debug, Clone, Default)]
pub struct IntentQueue {
    pending: Vec<NavigationIntent>,
}

impl IntentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, intent: NavigationIntent) {
        self.pending.push(intent);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[NavigationIntent] {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Drops intents `is_satisfied` reports as already reached. Returns how
    /// many were pruned.
    pub fn prune(&mut self, mut is_satisfied: impl FnMut(&IntentTarget) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|intent| !is_satisfied(&intent.target));
        before - self.pending.len()
    }

    /// One resolution pass: prune satisfied intents, then remove and return
    /// the winner. Everything else stays queued for the next pass.
    pub fn resolve(
        &mut self,
        is_satisfied: impl FnMut(&IntentTarget) -> bool,
    ) -> Option<NavigationIntent> {
        let pruned = self.prune(is_satisfied);
        if pruned > 0 {
            debug!(pruned, remaining = self.pending.len(), "satisfied intents dropped");
        }

        // max_by_key keeps the last maximum, so among exact ties the most
        // recently queued intent wins.
        let (winner, _) = self
            .pending
            .iter()
            .enumerate()
            .max_by_key(|(_, intent)| (intent.tier, intent.created_at))?;
        Some(self.pending.remove(winner))
    }
}
