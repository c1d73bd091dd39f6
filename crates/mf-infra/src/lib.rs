pub mod auth;
pub mod navigation_store;
pub mod time;

pub use auth::WatchAuthState;
pub use navigation_store::{FileNavigationStore, InMemoryNavigationStore};
pub use time::{FakeClock, SystemClock};
