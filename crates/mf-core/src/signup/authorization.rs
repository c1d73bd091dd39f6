//! Step authorization shared by the index-based coordinator and the
//! path-based route guard.

use crate::signup::progress::{AuthSnapshot, MaxAllowedStep, ProgressResolver};

/// Outcome of authorizing a single step change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    /// Index is outside the registry. Never allowed, even when forced.
    OutOfRange,
    /// Global "navigation blocked" flag is set and the request is not forced.
    Blocked,
    /// Flow is finished; the caller has to leave the wizard.
    FlowCompleted,
    /// Target lies beyond what the user's progress permits.
    Unauthorized { max_allowed: usize },
}

impl Authorization {
    pub fn is_allowed(self) -> bool {
        matches!(self, Authorization::Allowed)
    }
}

/// A step change to authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRequest {
    pub target: i64,
    pub force: bool,
    pub blocked: bool,
}

pub fn authorize(request: StepRequest, len: usize, max_allowed: MaxAllowedStep) -> Authorization {
    if request.target < 0 || request.target as u64 >= len as u64 {
        return Authorization::OutOfRange;
    }
    if request.blocked && !request.force {
        return Authorization::Blocked;
    }
    let max_allowed = match max_allowed {
        MaxAllowedStep::FlowCompleted => return Authorization::FlowCompleted,
        MaxAllowedStep::Index(index) => index,
    };
    if !request.force && request.target as usize > max_allowed {
        return Authorization::Unauthorized { max_allowed };
    }
    Authorization::Allowed
}

/// Progress gate applied to a route that maps to a wizard step.
///
/// 路由层的进度校验结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepGate {
    Allow,
    /// Replace the current history entry with the step at `index`.
    RedirectTo { index: usize },
    /// Leave the wizard for the main authenticated destination.
    ExitCompleted,
    /// Unauthenticated access to a protected step: restart at step 0.
    RestartAtFirstStep,
    /// Progress is not known yet; stay where we are.
    Indeterminate,
}

/// Inputs for [`gate_step`] besides the auth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateRequest {
    pub requested: usize,
    pub start_fresh: bool,
    pub force_stay: bool,
    /// A just-verified flag inside its grace window is active.
    pub just_verified: bool,
    pub confirmation_index: usize,
}

/// Progress gating for a requested step (route guard rules 5-7).
pub fn gate_step(
    request: GateRequest,
    snapshot: &AuthSnapshot,
    resolver: &ProgressResolver,
) -> StepGate {
    if snapshot.user.is_none() {
        let verified_landing =
            request.just_verified && request.requested == request.confirmation_index;
        if request.requested != 0 && !verified_landing {
            return StepGate::RestartAtFirstStep;
        }
        return StepGate::Allow;
    }

    let Some(progress) = snapshot.progress.as_ref() else {
        return StepGate::Indeterminate;
    };

    let max_allowed = match resolver.max_allowed_for(snapshot) {
        MaxAllowedStep::FlowCompleted => return StepGate::ExitCompleted,
        MaxAllowedStep::Index(index) => index,
    };

    if request.requested > max_allowed {
        return StepGate::RedirectTo { index: max_allowed };
    }

    let progress_count = progress.progress_count as usize;
    if request.requested == 0 && progress_count >= 1 && !request.start_fresh {
        return StepGate::RedirectTo {
            index: request.confirmation_index,
        };
    }

    if request.requested < progress_count && !request.force_stay {
        return StepGate::RedirectTo {
            index: progress_count.min(max_allowed),
        };
    }

    StepGate::Allow
}
