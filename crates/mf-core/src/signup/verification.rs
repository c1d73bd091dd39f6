use serde::{Deserialize, Serialize};

/// Email verification in progress, persisted so a reload can resume it.
///
/// 邮箱验证会话（带时间戳持久化）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSession {
    pub email: String,
    pub display_name: String,
    pub verification_id: String,
    pub is_existing_user: bool,
    /// Unix millis when the code was requested.
    pub timestamp: i64,
}

impl VerificationSession {
    /// A session older than `ttl_ms` must be treated as absent. So must one
    /// whose timestamp cannot be compared with `now_ms`.
    pub fn is_expired(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms
            .checked_sub(self.timestamp)
            .map_or(true, |age| age > ttl_ms)
    }
}
