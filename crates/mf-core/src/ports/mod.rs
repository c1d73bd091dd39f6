//! Port interfaces for the navigation core
//!
//! Ports define the contract between the navigation use cases and the
//! collaborators they drive or observe: the durable flag store, the clock,
//! the auth/progress provider, the host router and the step-change sink.
//! Implementations live in `mf-infra` and `mf-host`.

mod auth_state;
mod clock;
mod navigation_event;
mod navigation_store;
mod router;

pub use auth_state::AuthStatePort;
pub use clock::ClockPort;
pub use navigation_event::{NavigationEventPort, StepChange};
pub use navigation_store::{NavigationKey, NavigationStoreError, NavigationStorePort};
pub use router::{HistoryMode, RouterPort};
