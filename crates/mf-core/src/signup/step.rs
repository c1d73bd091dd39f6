//! Step registry.
//!
//! The ordered, immutable list of wizard steps. Indices into this list are the
//! coordinator's primary state, so every lookup is bounds-checked here.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ids::StepId;
use crate::signup::route::normalize_path;

/// One screen of the signup wizard.
///
/// 向导中的一个步骤。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    pub id: StepId,
    /// Display label.
    pub label: String,
    /// Opaque key the UI layer uses to look up what to mount.
    pub render_key: String,
    /// Route path used in multi-route deployments.
    pub path: String,
}

impl StepDescriptor {
    pub fn new(
        id: impl Into<StepId>,
        label: impl Into<String>,
        render_key: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            render_key: render_key.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("step registry must contain at least one step")]
    Empty,
    #[error("duplicate step id: {0}")]
    DuplicateId(StepId),
    #[error("duplicate step path: {0}")]
    DuplicatePath(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepLookupError {
    #[error("step index {index} out of range (len {len})")]
    OutOfRange { index: i64, len: usize },
    #[error("unknown step id: {0}")]
    NotFound(String),
}

/// Ordered step list. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRegistry {
    steps: Vec<StepDescriptor>,
}

impl StepRegistry {
    pub fn new(steps: Vec<StepDescriptor>) -> Result<Self, RegistryError> {
        if steps.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut ids = HashSet::new();
        let mut paths = HashSet::new();
        for step in &steps {
            if !ids.insert(step.id.clone()) {
                return Err(RegistryError::DuplicateId(step.id.clone()));
            }
            let path = normalize_path(&step.path).to_string();
            if !paths.insert(path.clone()) {
                return Err(RegistryError::DuplicatePath(path));
            }
        }

        Ok(Self { steps })
    }

    /// Default membership signup flow.
    ///
    /// Index 1 is the post-verification confirmation screen.
    pub fn membership() -> Self {
        Self {
            steps: vec![
                StepDescriptor::new("account", "Create account", "AccountStep", "/signup/account"),
                StepDescriptor::new("verified", "Email verified", "VerifiedStep", "/signup/verified"),
                StepDescriptor::new("profile", "Member profile", "ProfileStep", "/signup/profile"),
                StepDescriptor::new(
                    "organization",
                    "Organization details",
                    "OrganizationStep",
                    "/signup/organization",
                ),
                StepDescriptor::new(
                    "agreement",
                    "Membership agreement",
                    "AgreementStep",
                    "/signup/agreement",
                ),
                StepDescriptor::new("payment", "Payment", "PaymentStep", "/signup/payment"),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn contains(&self, index: i64) -> bool {
        index >= 0 && (index as u64) < self.steps.len() as u64
    }

    pub fn get(&self, index: i64) -> Result<&StepDescriptor, StepLookupError> {
        if !self.contains(index) {
            return Err(StepLookupError::OutOfRange {
                index,
                len: self.steps.len(),
            });
        }
        Ok(&self.steps[index as usize])
    }

    pub fn index_of(&self, id: &str) -> Result<usize, StepLookupError> {
        self.steps
            .iter()
            .position(|step| step.id.as_str() == id)
            .ok_or_else(|| StepLookupError::NotFound(id.to_string()))
    }

    /// Path → index lookup. Query strings and trailing slashes are ignored.
    pub fn index_of_path(&self, path: &str) -> Option<usize> {
        let path = normalize_path(path);
        self.steps
            .iter()
            .position(|step| normalize_path(&step.path) == path)
    }

    /// Path for `index`, clamped to the last step.
    pub fn path_for(&self, index: usize) -> &str {
        let index = index.min(self.last_index());
        &self.steps[index].path
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDescriptor> {
        self.steps.iter()
    }
}
