//! Memberflow application layer
//!
//! Navigation use cases for the membership signup wizard. Everything here
//! talks to the outside world through the ports declared in `mf-core`.

pub mod usecases;

pub use usecases::navigation::{
    IntentWatcher, NavigationCoordinator, NavigationIntentStore, RouteGuard, RouteSession,
};
