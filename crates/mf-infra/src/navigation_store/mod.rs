//! Durable navigation flag stores.

mod file;
mod memory;

pub use file::{FileNavigationStore, DEFAULT_NAVIGATION_STATE_FILE};
pub use memory::InMemoryNavigationStore;

/// Capacity of the change-notification channel. Slow receivers see `Lagged`
/// and re-read everything.
const NOTIFY_CAPACITY: usize = 64;
