mod watch_auth_state;

pub use watch_auth_state::WatchAuthState;
