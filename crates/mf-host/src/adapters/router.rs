use std::sync::Mutex;

use tracing::info;

use mf_core::ports::{HistoryMode, RouterPort};

/// Router for a headless host: records the location and logs every move.
#[derive(Debug, Default)]
pub struct TracingRouter {
    location: Mutex<Option<String>>,
}

impl TracingRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last path navigated or redirected to.
    pub fn location(&self) -> Option<String> {
        self.location.lock().ok().and_then(|l| l.clone())
    }

    fn set_location(&self, path: &str) {
        if let Ok(mut location) = self.location.lock() {
            *location = Some(path.to_string());
        }
    }
}

impl RouterPort for TracingRouter {
    fn navigate(&self, path: &str, mode: HistoryMode) {
        info!(%path, ?mode, "router.navigate");
        self.set_location(path);
    }

    fn redirect_external(&self, destination: &str) {
        info!(%destination, "router.redirect_external");
        self.set_location(destination);
    }
}
