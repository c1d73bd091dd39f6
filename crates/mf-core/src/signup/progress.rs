//! Signup progress and the progress resolver.
//!
//! The resolver turns a server progress snapshot into the furthest step the
//! user may currently open. It never fails: missing data resolves to step 0.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Signed-in identity as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

/// Server-synced signup progress. Read-only from the navigation core.
///
/// 服务端同步的注册进度（只读）。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupProgressState {
    /// Highest fully completed step.
    pub progress_count: u32,
    /// Informational step name (e.g. `"success"` right after verification).
    pub current_step_name: String,
    /// Whole flow is done.
    pub completed: bool,
}

impl SignupProgressState {
    pub fn new(progress_count: u32, current_step_name: impl Into<String>) -> Self {
        Self {
            progress_count,
            current_step_name: current_step_name.into(),
            completed: false,
        }
    }

    pub fn completed() -> Self {
        Self {
            progress_count: 0,
            current_step_name: String::new(),
            completed: true,
        }
    }
}

/// Everything the auth collaborator reports in one reactive update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthSnapshot {
    pub user: Option<Identity>,
    pub progress: Option<SignupProgressState>,
    pub is_loading: bool,
    pub auth_resolved: bool,
}

impl AuthSnapshot {
    /// Auth resolved, nothing loading, nobody signed in.
    pub fn signed_out() -> Self {
        Self {
            user: None,
            progress: None,
            is_loading: false,
            auth_resolved: true,
        }
    }

    pub fn loading() -> Self {
        Self {
            user: None,
            progress: None,
            is_loading: true,
            auth_resolved: false,
        }
    }

    /// A refresh in flight for a known user. Not ready, but the identity is
    /// kept so the refresh is not mistaken for a sign-out.
    pub fn refreshing(user: Identity) -> Self {
        Self {
            user: Some(user),
            progress: None,
            is_loading: true,
            auth_resolved: true,
        }
    }

    pub fn signed_in(user: Identity, progress: SignupProgressState) -> Self {
        Self {
            user: Some(user),
            progress: Some(progress),
            is_loading: false,
            auth_resolved: true,
        }
    }

    /// Decisions may only be taken on a ready snapshot.
    pub fn is_ready(&self) -> bool {
        self.auth_resolved && !self.is_loading
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|u| &u.id)
    }

    pub fn flow_completed(&self) -> bool {
        self.user.is_some() && self.progress.as_ref().is_some_and(|p| p.completed)
    }
}

/// Result of [`ProgressResolver::max_allowed_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxAllowedStep {
    Index(usize),
    /// Sentinel: the flow is finished, callers must leave the wizard.
    FlowCompleted,
}

impl MaxAllowedStep {
    pub fn index(self) -> Option<usize> {
        match self {
            MaxAllowedStep::Index(index) => Some(index),
            MaxAllowedStep::FlowCompleted => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressResolver {
    allowed_lookahead: usize,
    last_index: usize,
}

impl ProgressResolver {
    pub fn new(allowed_lookahead: usize, last_index: usize) -> Self {
        Self {
            allowed_lookahead,
            last_index,
        }
    }

    pub fn allowed_lookahead(&self) -> usize {
        self.allowed_lookahead
    }

    pub fn max_allowed_step(
        &self,
        user: Option<&Identity>,
        progress: Option<&SignupProgressState>,
    ) -> MaxAllowedStep {
        if user.is_none() {
            return MaxAllowedStep::Index(0);
        }
        let Some(progress) = progress else {
            return MaxAllowedStep::Index(0);
        };
        if progress.completed {
            return MaxAllowedStep::FlowCompleted;
        }

        let reachable = (progress.progress_count as usize).saturating_add(self.allowed_lookahead);
        MaxAllowedStep::Index(reachable.min(self.last_index))
    }

    pub fn max_allowed_for(&self, snapshot: &AuthSnapshot) -> MaxAllowedStep {
        self.max_allowed_step(snapshot.user.as_ref(), snapshot.progress.as_ref())
    }

    pub fn is_step_completed(&self, index: usize, progress: Option<&SignupProgressState>) -> bool {
        progress.is_some_and(|p| index < p.progress_count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Identity {
        Identity::new("user-a")
    }

    #[test]
    fn refreshing_keeps_identity_but_is_not_ready() {
        let snapshot = AuthSnapshot::refreshing(user());
        assert!(!snapshot.is_ready());
        assert_eq!(snapshot.user_id().map(UserId::as_str), Some("user-a"));
        assert!(!snapshot.flow_completed());
        assert!(!AuthSnapshot::loading().is_ready());
    }

    #[test]
    fn no_user_only_reaches_first_step() {
        let resolver = ProgressResolver::new(2, 5);
        let progress = SignupProgressState::new(4, "profile");
        assert_eq!(
            resolver.max_allowed_step(None, Some(&progress)),
            MaxAllowedStep::Index(0)
        );
    }

    #[test]
    fn missing_progress_is_conservative() {
        let resolver = ProgressResolver::new(2, 5);
        assert_eq!(
            resolver.max_allowed_step(Some(&user()), None),
            MaxAllowedStep::Index(0)
        );
    }

    #[test]
    fn lookahead_is_added_and_clamped() {
        let resolver = ProgressResolver::new(2, 5);
        let progress = SignupProgressState::new(2, "profile");
        assert_eq!(
            resolver.max_allowed_step(Some(&user()), Some(&progress)),
            MaxAllowedStep::Index(4)
        );

        let progress = SignupProgressState::new(5, "payment");
        assert_eq!(
            resolver.max_allowed_step(Some(&user()), Some(&progress)),
            MaxAllowedStep::Index(5)
        );
    }

    #[test]
    fn completed_flow_returns_sentinel() {
        let resolver = ProgressResolver::new(2, 5);
        let progress = SignupProgressState::completed();
        assert_eq!(
            resolver.max_allowed_step(Some(&user()), Some(&progress)),
            MaxAllowedStep::FlowCompleted
        );
        assert_eq!(MaxAllowedStep::FlowCompleted.index(), None);
    }

    #[test]
    fn step_completed_is_strictly_below_progress() {
        let resolver = ProgressResolver::new(2, 5);
        let progress = SignupProgressState::new(2, "profile");
        assert!(resolver.is_step_completed(1, Some(&progress)));
        assert!(!resolver.is_step_completed(2, Some(&progress)));
        assert!(!resolver.is_step_completed(0, None));
    }

    #[test]
    fn progress_state_uses_camel_case_on_the_wire() {
        let json = r#"{"progressCount":1,"currentStepName":"success","completed":false}"#;
        let progress: SignupProgressState = serde_json::from_str(json).unwrap();
        assert_eq!(progress, SignupProgressState::new(1, "success"));
    }
}
