//! ID type wrappers for type safety.

pub mod intent_id;
pub mod step_id;
pub mod user_id;

pub use intent_id::IntentId;
pub use step_id::StepId;
pub use user_id::UserId;
