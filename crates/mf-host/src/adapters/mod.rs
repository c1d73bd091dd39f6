mod events;
mod router;

pub use events::TracingNavigationEvents;
pub use router::TracingRouter;
