use tracing::info;

use mf_core::ports::{NavigationEventPort, StepChange};

/// Event sink that only logs. Hosts with a UI replace it with a renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigationEvents;

impl NavigationEventPort for TracingNavigationEvents {
    fn step_changed(&self, change: &StepChange) {
        info!(
            from = change.from,
            to = change.to,
            step = %change.step_id,
            render_key = %change.render_key,
            reason = change.reason.as_deref().unwrap_or(""),
            "ui.render_step"
        );
    }

    fn flow_exited(&self, destination: &str) {
        info!(%destination, "ui.flow_exited");
    }
}
