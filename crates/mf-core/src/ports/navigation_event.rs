use crate::ids::StepId;

/// Emitted whenever the active step index changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepChange {
    pub from: usize,
    pub to: usize,
    pub step_id: StepId,
    pub render_key: String,
    pub reason: Option<String>,
}

/// Sink for the coordinator's outputs, consumed by the UI layer.
pub trait NavigationEventPort: Send + Sync {
    fn step_changed(&self, change: &StepChange);

    fn flow_exited(&self, destination: &str);
}
