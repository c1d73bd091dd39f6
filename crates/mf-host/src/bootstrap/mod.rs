pub mod config;
pub mod run;
pub mod tracing;
pub mod wiring;

pub use config::{load_config, load_or_default, resolve_config_path};
pub use run::run_host;
pub use wiring::{wire, HostError, HostRuntime};
