//! Navigation coordinator.
//!
//! Owns the active step index of the signup wizard and arbitrates every
//! request to change it: explicit user actions, reactive auth/progress
//! updates, and intents written to the durable store by other parts of the
//! system.
//!
//! ## Invariants
//!
//! - While in flow, `current` is always a valid registry index.
//! - Public operations never fail; rejections resolve to "no navigation".
//! - The confirmation auto-jump fires at most once per user identity.
//! - At most one navigation is applied per resolution pass.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use mf_core::config::NavigationConfig;
use mf_core::ids::UserId;
use mf_core::ports::{ClockPort, NavigationEventPort, RouterPort, StepChange};
use mf_core::signup::{
    authorize, AuthSnapshot, Authorization, IntentQueue, IntentTarget, MaxAllowedStep,
    NavigationIntent, NavigationOverride, ProgressResolver, StepDescriptor, StepRegistry,
    StepRequest,
};

use super::intent_store::NavigationIntentStore;

/// Options for a single step request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Skip progress gating and the "navigation blocked" flag.
    pub force: bool,
    pub reason: Option<String>,
}

impl RequestOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorPhase {
    InFlow,
    /// The flow finished and the user was sent to `destination`. Indices are
    /// no longer managed.
    Exited { destination: String },
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Auth or progress still loading; nothing was decided.
    Deferred,
    Unchanged,
    Navigated { to: usize },
    Exited,
}

/// One-shot latch for the confirmation auto-jump, scoped to a user.
#[derive(Debug, Default)]
struct ConfirmationLatch {
    user: Option<UserId>,
    handled: bool,
}

impl ConfirmationLatch {
    /// Re-keys the latch. Returns the previous identity when it changed.
    fn observe(&mut self, user: Option<&UserId>) -> Option<Option<UserId>> {
        if self.user.as_ref() == user {
            return None;
        }
        let previous = std::mem::replace(&mut self.user, user.cloned());
        self.handled = false;
        Some(previous)
    }

    fn is_handled(&self) -> bool {
        self.handled
    }

    fn mark_handled(&mut self) {
        self.handled = true;
    }
}

pub struct NavigationCoordinator {
    registry: Arc<StepRegistry>,
    resolver: ProgressResolver,
    config: NavigationConfig,
    store: NavigationIntentStore,
    clock: Arc<dyn ClockPort>,
    router: Arc<dyn RouterPort>,
    events: Arc<dyn NavigationEventPort>,

    current: usize,
    phase: CoordinatorPhase,
    auth: AuthSnapshot,
    latch: ConfirmationLatch,
    queue: IntentQueue,
    /// Step restored from the durable store, applied on the first decisive
    /// reconciliation.
    restore: Option<usize>,
    /// A ready snapshot arrived while account linking held navigation.
    settle_pending: bool,
    transition_started_ms: Option<i64>,
}

impl NavigationCoordinator {
    pub fn new(
        registry: Arc<StepRegistry>,
        config: NavigationConfig,
        store: NavigationIntentStore,
        router: Arc<dyn RouterPort>,
        events: Arc<dyn NavigationEventPort>,
    ) -> Self {
        let resolver = ProgressResolver::new(config.allowed_lookahead, registry.last_index());
        let restore = store.current_step_id().and_then(|id| {
            match registry.index_of(id.as_str()) {
                Ok(index) => Some(index),
                Err(err) => {
                    warn!(error = %err, "ignoring persisted step");
                    store.clear_current_step_id();
                    None
                }
            }
        });

        Self {
            resolver,
            clock: store.clock(),
            registry,
            config,
            store,
            router,
            events,
            current: 0,
            phase: CoordinatorPhase::InFlow,
            auth: AuthSnapshot::loading(),
            latch: ConfirmationLatch::default(),
            queue: IntentQueue::new(),
            restore,
            settle_pending: false,
            transition_started_ms: None,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&StepDescriptor> {
        self.registry.get(self.current as i64).ok()
    }

    pub fn phase(&self) -> &CoordinatorPhase {
        &self.phase
    }

    pub fn is_exited(&self) -> bool {
        matches!(self.phase, CoordinatorPhase::Exited { .. })
    }

    pub fn snapshot(&self) -> &AuthSnapshot {
        &self.auth
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn max_allowed_step(&self) -> MaxAllowedStep {
        self.resolver.max_allowed_for(&self.auth)
    }

    pub fn pending_intents(&self) -> &[NavigationIntent] {
        self.queue.pending()
    }

    /// True during the cosmetic fade after a step change.
    pub fn is_transitioning(&self) -> bool {
        let delay = self.config.transition_delay_ms as i64;
        self.transition_started_ms
            .is_some_and(|started| self.clock.now_ms().saturating_sub(started) < delay)
    }

    /// Requests step `index`. Returns whether the request was accepted.
    pub fn request_step(&mut self, index: i64, options: RequestOptions) -> bool {
        if self.is_exited() {
            debug!(index, "navigation request after flow exit ignored");
            return false;
        }

        let request = StepRequest {
            target: index,
            force: options.force,
            blocked: self.store.is_navigation_blocked(),
        };
        match authorize(request, self.registry.len(), self.max_allowed_step()) {
            Authorization::Allowed => {
                self.apply(index as usize, options.reason);
                true
            }
            Authorization::FlowCompleted => {
                self.exit_flow();
                false
            }
            Authorization::OutOfRange => {
                warn!(index, len = self.registry.len(), "step request out of range");
                false
            }
            Authorization::Blocked => {
                debug!(index, "step request rejected: navigation blocked");
                false
            }
            Authorization::Unauthorized { max_allowed } => {
                debug!(index, max_allowed, "step request beyond allowed progress");
                false
            }
        }
    }

    pub fn advance(&mut self) -> bool {
        self.request_step(self.current as i64 + 1, RequestOptions::default())
    }

    pub fn retreat(&mut self) -> bool {
        self.request_step(self.current as i64 - 1, RequestOptions::default())
    }

    pub fn jump_to(&mut self, step_id: &str, options: RequestOptions) -> bool {
        match self.registry.index_of(step_id) {
            Ok(index) => self.request_step(index as i64, options),
            Err(err) => {
                warn!(error = %err, "jump to unknown step");
                false
            }
        }
    }

    /// Queues an intent for the next resolution pass.
    pub fn enqueue(&mut self, intent: NavigationIntent) {
        debug!(intent_id = %intent.id, tier = ?intent.tier, target = ?intent.target, "intent queued");
        self.queue.push(intent);
    }

    /// Re-evaluates navigation after a reactive auth/progress update.
    pub fn reconcile(&mut self, snapshot: AuthSnapshot) -> ReconcileOutcome {
        let span = info_span!(
            "usecase.navigation.reconcile",
            user = ?snapshot.user_id().map(UserId::as_str),
            ready = snapshot.is_ready(),
        );
        let _entered = span.enter();

        if !snapshot.is_ready() {
            // A refresh in flight says nothing about who is signed in.
            self.auth = snapshot;
            return ReconcileOutcome::Deferred;
        }
        if let Some(previous) = self.latch.observe(snapshot.user_id()) {
            self.on_identity_changed(previous.is_some(), snapshot.user.is_some());
        }
        self.auth = snapshot;

        if self.linking_holds_navigation() {
            self.settle_pending = true;
            return ReconcileOutcome::Unchanged;
        }
        self.settle()
    }

    /// Acts on the last ready snapshot: flow exit, confirmation jump, step
    /// restore, then queued intents.
    fn settle(&mut self) -> ReconcileOutcome {
        self.settle_pending = false;
        if self.auth.flow_completed() {
            return if self.exit_flow() {
                ReconcileOutcome::Exited
            } else {
                ReconcileOutcome::Unchanged
            };
        }
        if self.is_exited() {
            return ReconcileOutcome::Unchanged;
        }
        if self.auth.user.is_some() && self.auth.progress.is_none() {
            // Signed in but progress unknown: wait for the next snapshot.
            return ReconcileOutcome::Deferred;
        }

        let before = self.current;

        if let Some(index) = self.confirmation_due() {
            self.latch.mark_handled();
            info!(index, "email verified, showing confirmation step");
            self.request_step(
                index as i64,
                RequestOptions::forced().with_reason("email verified"),
            );
        } else if let Some(index) = self.restore.take() {
            // Silently ignored when progress does not allow it yet.
            self.request_step(
                index as i64,
                RequestOptions::default().with_reason("restore persisted step"),
            );
        }

        if self.current == before {
            self.process_intents();
        }

        if self.is_exited() {
            ReconcileOutcome::Exited
        } else if self.current != before {
            ReconcileOutcome::Navigated { to: self.current }
        } else {
            ReconcileOutcome::Unchanged
        }
    }

    /// Account linking owns navigation while active. Queued and durable
    /// intents stay where they are until it ends.
    fn linking_holds_navigation(&self) -> bool {
        let strongest = self
            .store
            .bypass_flags()
            .strongest(self.clock.now_ms(), self.config.just_verified_grace_ms);
        let held = matches!(strongest, Some(NavigationOverride::AccountLinking));
        if held {
            debug!("account linking active, auto-navigation held");
        }
        held
    }

    /// One intent resolution pass. Durable force/critical requests are
    /// consumed into the queue first, then at most one intent is applied.
    pub fn process_intents(&mut self) -> Option<NavigationIntent> {
        if !self.auth.is_ready() || self.linking_holds_navigation() {
            return None;
        }
        if self.settle_pending {
            self.settle();
            return None;
        }
        if self.is_exited() {
            return None;
        }
        self.ingest_durable_intents();

        let registry = self.registry.clone();
        let current = self.current;
        let winner = self
            .queue
            .resolve(|target| resolve_target(&registry, target) == Some(current))?;

        let Some(index) = resolve_target(&registry, &winner.target) else {
            warn!(target = ?winner.target, "dropping intent for unknown step");
            return None;
        };

        let options = RequestOptions {
            force: winner.force,
            reason: winner.reason.clone(),
        };
        if self.request_step(index as i64, options) {
            Some(winner)
        } else {
            debug!(intent_id = %winner.id, "intent rejected");
            None
        }
    }

    fn ingest_durable_intents(&mut self) {
        if let Some(critical) = self.store.take_critical_navigation() {
            if let Some(intent) = NavigationOverride::Critical(critical).to_intent() {
                self.enqueue(intent);
            }
        }
        if let Some(forced) = self.store.take_force_navigation() {
            if let Some(intent) = NavigationOverride::Forced(forced).to_intent() {
                self.enqueue(intent);
            }
        }
    }

    fn confirmation_due(&self) -> Option<usize> {
        if self.latch.is_handled() {
            return None;
        }
        let progress = self.auth.progress.as_ref()?;
        self.auth.user.as_ref()?;

        let trigger = &self.config.confirmation;
        if progress.current_step_name != trigger.step_name
            || progress.progress_count != trigger.progress
        {
            return None;
        }
        self.registry.index_of(&trigger.step_id).ok()
    }

    fn on_identity_changed(&mut self, had_user: bool, has_user: bool) {
        debug!(had_user, has_user, "identity changed, confirmation latch reset");
        if had_user {
            // Intents queued for the previous user must not leak to the next.
            self.queue.clear();
        }
        if self.is_exited() {
            self.phase = CoordinatorPhase::InFlow;
            self.current = 0;
            self.transition_started_ms = None;
        } else if !has_user && self.current != 0 {
            self.apply(0, Some("signed out".to_string()));
        }
    }

    fn apply(&mut self, index: usize, reason: Option<String>) {
        if index == self.current {
            return;
        }
        let Ok(step) = self.registry.get(index as i64) else {
            return;
        };

        let change = StepChange {
            from: self.current,
            to: index,
            step_id: step.id.clone(),
            render_key: step.render_key.clone(),
            reason,
        };
        self.store.set_current_step_id(&step.id);
        self.current = index;
        self.transition_started_ms = Some(self.clock.now_ms());

        info!(from = change.from, to = change.to, step = %change.step_id, "signup step changed");
        self.events.step_changed(&change);
    }

    /// Leaves the wizard. Returns false when already exited.
    fn exit_flow(&mut self) -> bool {
        if self.is_exited() {
            return false;
        }
        let destination = self.config.completed_destination.clone();
        info!(%destination, "signup flow completed, leaving wizard");

        self.queue.clear();
        self.restore = None;
        self.store.clear_current_step_id();
        self.router.redirect_external(&destination);
        self.events.flow_exited(&destination);
        self.phase = CoordinatorPhase::Exited { destination };
        true
    }
}

fn resolve_target(registry: &StepRegistry, target: &IntentTarget) -> Option<usize> {
    match target {
        IntentTarget::Index(index) => registry.contains(*index as i64).then_some(*index),
        IntentTarget::Path(path) => registry.index_of_path(path),
    }
}
