use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable identifier of a wizard step (e.g. `"account"`, `"payment"`).
///
/// 向导步骤的稳定标识。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for StepId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_id_serializes_as_plain_string() {
        let id = StepId::new("payment");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"payment\"");
    }
}
