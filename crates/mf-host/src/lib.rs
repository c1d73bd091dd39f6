//! # mf-host
//!
//! Host layer for the MemberFlow signup wizard.
//!
//! ## Modules
//!
//! - **bootstrap**: config loading, tracing setup, wiring and the run loop
//! - **adapters**: router and UI event sinks for a headless host

pub mod adapters;
pub mod bootstrap;

pub use bootstrap::{load_config, run_host, wire, HostError, HostRuntime};
