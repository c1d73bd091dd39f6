use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryMode {
    Push,
    Replace,
}

/// Host routing mechanism.
pub trait RouterPort: Send + Sync {
    /// In-app navigation without a full reload.
    fn navigate(&self, path: &str, mode: HistoryMode);

    /// Full navigation out of the wizard.
    fn redirect_external(&self, destination: &str);
}
