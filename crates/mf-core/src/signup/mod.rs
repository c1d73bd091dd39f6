//! Signup navigation domain.
//!
//! Pure types and rules for the multi-step membership wizard: the step
//! registry, progress resolution, authorization, intent arbitration and the
//! bypass flags that short-circuit normal gating. No I/O happens here.

pub mod authorization;
pub mod intent;
pub mod overrides;
pub mod progress;
pub mod route;
pub mod step;
pub mod verification;

pub use authorization::{authorize, gate_step, Authorization, GateRequest, StepGate, StepRequest};
pub use intent::{IntentQueue, IntentTarget, NavigationIntent, PriorityTier};
pub use overrides::{
    BypassFlags, CriticalNavigation, ForceNavigation, JustVerified, NavigationOverride,
};
pub use progress::{AuthSnapshot, Identity, MaxAllowedStep, ProgressResolver, SignupProgressState};
pub use route::{normalize_path, RoutePath, FORCE_STAY_MARKER, START_FRESH_MARKER};
pub use step::{RegistryError, StepDescriptor, StepLookupError, StepRegistry};
pub use verification::VerificationSession;
