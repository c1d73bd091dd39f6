//! Route path parsing for the multi-route deployment.

/// Query marker that allows re-entering step 0 after progress has been made.
pub const START_FRESH_MARKER: &str = "fresh";

/// Query marker that allows staying on an already-completed step.
pub const FORCE_STAY_MARKER: &str = "stay";

/// Strips the query string and any trailing slash (except for `/` itself).
pub fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// A requested browser path plus the markers the guard cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath {
    pub path: String,
    pub start_fresh: bool,
    pub force_stay: bool,
}

impl RoutePath {
    pub fn parse(raw: &str) -> Self {
        let path = normalize_path(raw).to_string();
        let query = raw
            .split_once('?')
            .map(|(_, q)| q.split('#').next().unwrap_or(""))
            .unwrap_or("");

        let mut start_fresh = false;
        let mut force_stay = false;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, "1"));
            let enabled = !matches!(value, "0" | "false");
            match key {
                START_FRESH_MARKER => start_fresh = enabled,
                FORCE_STAY_MARKER => force_stay = enabled,
                _ => {}
            }
        }

        Self {
            path,
            start_fresh,
            force_stay,
        }
    }

    /// True when `other` names the same route, ignoring markers.
    pub fn same_route(&self, other: &str) -> bool {
        self.path == normalize_path(other)
    }
}
