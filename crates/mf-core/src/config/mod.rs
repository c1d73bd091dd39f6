//! # Navigation configuration / 导航配置
//!
//! Tunable constants of the navigation core and their TOML mapping.
//!
//! The lookahead, grace window and session TTL were tuned empirically, so
//! they are data here rather than hard invariants. Keys absent from the TOML
//! document keep their default value; no other validation is performed.

use std::path::PathBuf;

/// Server state that triggers the one-shot jump to the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationTrigger {
    /// `currentStepName` reported by the server right after verification.
    pub step_name: String,
    /// `progressCount` reported alongside it.
    pub progress: u32,
    /// Step shown for the confirmation.
    pub step_id: String,
}

impl Default for ConfirmationTrigger {
    fn default() -> Self {
        Self {
            step_name: "success".to_string(),
            progress: 1,
            step_id: "verified".to_string(),
        }
    }
}

/// Navigation configuration DTO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationConfig {
    /// Steps a user may open beyond confirmed progress.
    pub allowed_lookahead: usize,
    /// Cosmetic fade window after a step change.
    pub transition_delay_ms: u64,
    /// Fallback poll interval for stores that cannot notify.
    pub poll_interval_ms: u64,
    /// Where a finished flow sends the user.
    pub completed_destination: String,
    /// Verification sessions older than this are discarded.
    pub session_ttl_ms: i64,
    /// How long a just-verified flag is honored.
    pub just_verified_grace_ms: i64,
    pub confirmation: ConfirmationTrigger,
    /// Durable store location. Empty means "use the platform data dir".
    pub state_path: PathBuf,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            allowed_lookahead: 2,
            transition_delay_ms: 150,
            poll_interval_ms: 300,
            completed_destination: "/member/dashboard".to_string(),
            session_ttl_ms: 15 * 60 * 1000,
            just_verified_grace_ms: 10 * 1000,
            confirmation: ConfirmationTrigger::default(),
            state_path: PathBuf::new(),
        }
    }
}

impl NavigationConfig {
    /// Create NavigationConfig from a TOML value
    /// 从 TOML 值创建 NavigationConfig
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let get = |section: &str, key: &str| toml_value.get(section).and_then(|s| s.get(key));
        let int = |section: &str, key: &str| get(section, key).and_then(|v| v.as_integer());
        let string = |section: &str, key: &str| {
            get(section, key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Ok(Self {
            allowed_lookahead: int("navigation", "allowed_lookahead")
                .map(|v| v.max(0) as usize)
                .unwrap_or(defaults.allowed_lookahead),
            transition_delay_ms: int("navigation", "transition_delay_ms")
                .map(|v| v.max(0) as u64)
                .unwrap_or(defaults.transition_delay_ms),
            poll_interval_ms: int("navigation", "poll_interval_ms")
                .map(|v| v.max(0) as u64)
                .unwrap_or(defaults.poll_interval_ms),
            completed_destination: string("navigation", "completed_destination")
                .unwrap_or(defaults.completed_destination),
            session_ttl_ms: int("verification", "session_ttl_ms").unwrap_or(defaults.session_ttl_ms),
            just_verified_grace_ms: int("verification", "just_verified_grace_ms")
                .unwrap_or(defaults.just_verified_grace_ms),
            confirmation: ConfirmationTrigger {
                step_name: string("confirmation", "step_name")
                    .unwrap_or(defaults.confirmation.step_name),
                progress: int("confirmation", "progress")
                    .map(|v| v.max(0) as u32)
                    .unwrap_or(defaults.confirmation.progress),
                step_id: string("confirmation", "step_id")
                    .unwrap_or(defaults.confirmation.step_id),
            },
            state_path: string("storage", "state_path")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml::Value;

    #[test]
    fn test_from_toml_keeps_defaults_for_missing_keys() {
        let toml_value: Value = toml::from_str("[navigation]\n").unwrap();
        let config = NavigationConfig::from_toml(&toml_value).unwrap();
        assert_eq!(config, NavigationConfig::default());
    }

    #[test]
    fn test_from_toml_reads_every_section() {
        let toml_str = r#"
            [navigation]
            allowed_lookahead = 1
            transition_delay_ms = 0
            poll_interval_ms = 500
            completed_destination = "/portal"

            [verification]
            session_ttl_ms = 60000
            just_verified_grace_ms = 5000

            [confirmation]
            step_name = "verified"
            progress = 2
            step_id = "welcome"

            [storage]
            state_path = "/tmp/nav.json"
        "#;
        let toml_value: Value = toml::from_str(toml_str).unwrap();
        let config = NavigationConfig::from_toml(&toml_value).unwrap();

        assert_eq!(config.allowed_lookahead, 1);
        assert_eq!(config.transition_delay_ms, 0);
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.completed_destination, "/portal");
        assert_eq!(config.session_ttl_ms, 60_000);
        assert_eq!(config.just_verified_grace_ms, 5_000);
        assert_eq!(config.confirmation.step_name, "verified");
        assert_eq!(config.confirmation.progress, 2);
        assert_eq!(config.confirmation.step_id, "welcome");
        assert_eq!(config.state_path, PathBuf::from("/tmp/nav.json"));
    }

    #[test]
    fn test_from_toml_clamps_negative_counts() {
        let toml_value: Value = toml::from_str("[navigation]\nallowed_lookahead = -3\n").unwrap();
        let config = NavigationConfig::from_toml(&toml_value).unwrap();
        assert_eq!(config.allowed_lookahead, 0);
    }
}
