//! Signup navigation use cases.
//!
//! This module exposes the navigation coordinator (index mode), the route
//! guard (path mode), the durable intent store facade and the watcher that
//! feeds outside signals into either of them.

pub mod coordinator;
pub mod intent_store;
pub mod route_guard;
pub mod verification;
pub mod watcher;

pub use coordinator::{CoordinatorPhase, NavigationCoordinator, ReconcileOutcome, RequestOptions};
pub use intent_store::NavigationIntentStore;
pub use route_guard::{GuardDecision, RouteGuard, RouteSession};
pub use verification::{
    CompleteEmailVerification, ResumeVerificationSession, SaveVerificationSession,
};
pub use watcher::{IntentWatcher, NavigationDriver};
