//! # mf-core
//!
//! Core domain models and navigation rules for the MemberFlow signup wizard.
//!
//! This crate contains pure business logic without any infrastructure dependencies.

// Public module exports
pub mod config;
pub mod ids;
pub mod ports;
pub mod signup;

// Re-export commonly used types at the crate root
pub use config::{ConfirmationTrigger, NavigationConfig};
pub use ids::{IntentId, StepId, UserId};
pub use signup::{
    AuthSnapshot, Identity, MaxAllowedStep, NavigationIntent, PriorityTier, ProgressResolver,
    SignupProgressState, StepDescriptor, StepRegistry,
};
