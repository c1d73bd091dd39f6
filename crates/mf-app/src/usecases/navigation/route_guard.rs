//! Route guard for the multi-route deployment.
//!
//! Gates a browser path before protected content renders. Bypass flags are
//! checked first, in priority order, then the same progress rules the
//! coordinator uses are applied through [`gate_step`].
//!
//! ## Check order
//!
//! 1. Account linking in progress: allow.
//! 2. Auth/progress loading: show the loading placeholder.
//! 3. Force navigation pending: consume it, allow.
//! 4. Just verified within the grace window on the confirmation path: allow,
//!    clear the flag.
//! 5. Flow completed: leave for the main destination.
//! 6. / 7. Progress gating (authenticated / unauthenticated).
//! 8. Allow.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use mf_core::config::NavigationConfig;
use mf_core::ports::{HistoryMode, RouterPort};
use mf_core::signup::{
    gate_step, AuthSnapshot, GateRequest, IntentQueue, IntentTarget, NavigationIntent,
    NavigationOverride, ProgressResolver, RoutePath, StepGate, StepRegistry,
};

use super::intent_store::NavigationIntentStore;

/// What the host should do with the requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    ShowLoading,
    Redirect { path: String, mode: HistoryMode },
    /// Full navigation out of the in-app router.
    Exit { destination: String },
}

pub struct RouteGuard {
    registry: Arc<StepRegistry>,
    resolver: ProgressResolver,
    config: NavigationConfig,
    store: NavigationIntentStore,
    queue: IntentQueue,
}

impl RouteGuard {
    pub fn new(
        registry: Arc<StepRegistry>,
        config: NavigationConfig,
        store: NavigationIntentStore,
    ) -> Self {
        Self {
            resolver: ProgressResolver::new(config.allowed_lookahead, registry.last_index()),
            registry,
            config,
            store,
            queue: IntentQueue::new(),
        }
    }

    fn confirmation_index(&self) -> Option<usize> {
        self.registry
            .index_of(&self.config.confirmation.step_id)
            .ok()
    }

    /// Decides what to do with `raw_path`. Consumes the force-navigation and
    /// just-verified flags when they are honored.
    pub fn evaluate(&self, raw_path: &str, auth: &AuthSnapshot) -> GuardDecision {
        let route = RoutePath::parse(raw_path);
        let now = self.store.now_ms();
        let grace = self.config.just_verified_grace_ms;
        let flags = self.store.bypass_flags();
        let overrides = flags.overrides(now, grace);

        if overrides.contains(&NavigationOverride::AccountLinking) {
            debug!(path = %route.path, "account linking active, guard bypassed");
            return GuardDecision::Allow;
        }

        if !auth.is_ready() {
            return GuardDecision::ShowLoading;
        }

        if let Some(forced) = self.store.take_force_navigation() {
            debug!(path = %route.path, step = forced.step_index, "force navigation consumed");
            return GuardDecision::Allow;
        }

        let confirmation_index = self.confirmation_index();
        let just_verified = flags.just_verified_active(now, grace);
        if let Some(index) = confirmation_index {
            if just_verified && route.same_route(self.registry.path_for(index)) {
                debug!(path = %route.path, "confirmation reached, just-verified flag cleared");
                self.store.clear_just_verified();
                return GuardDecision::Allow;
            }
        }
        if flags.just_verified.is_some() && !just_verified {
            self.store.clear_just_verified();
        }

        if auth.flow_completed() {
            return self.exit_completed();
        }

        let Some(requested) = self.registry.index_of_path(&route.path) else {
            // Not a wizard route.
            return GuardDecision::Allow;
        };

        let request = GateRequest {
            requested,
            start_fresh: route.start_fresh,
            force_stay: route.force_stay,
            just_verified,
            confirmation_index: confirmation_index.unwrap_or(0),
        };
        match gate_step(request, auth, &self.resolver) {
            StepGate::Allow | StepGate::Indeterminate => GuardDecision::Allow,
            StepGate::RedirectTo { index } => {
                let path = self.registry.path_for(index);
                if route.same_route(path) {
                    return GuardDecision::Allow;
                }
                debug!(from = %route.path, to = %path, "guard redirect");
                GuardDecision::Redirect {
                    path: path.to_string(),
                    mode: HistoryMode::Replace,
                }
            }
            StepGate::ExitCompleted => self.exit_completed(),
            StepGate::RestartAtFirstStep => GuardDecision::Exit {
                destination: self.registry.path_for(0).to_string(),
            },
        }
    }

    fn exit_completed(&self) -> GuardDecision {
        GuardDecision::Exit {
            destination: self.config.completed_destination.clone(),
        }
    }

    /// Evaluates `raw_path` and performs the resulting redirect, if any.
    pub fn enforce(
        &self,
        raw_path: &str,
        auth: &AuthSnapshot,
        router: &dyn RouterPort,
    ) -> GuardDecision {
        let span = info_span!("usecase.navigation.route_guard", path = %raw_path);
        let _entered = span.enter();

        let decision = self.evaluate(raw_path, auth);
        match &decision {
            GuardDecision::Redirect { path, mode } => router.navigate(path, *mode),
            GuardDecision::Exit { destination } => {
                info!(%destination, "guard leaving in-app routing");
                router.redirect_external(destination);
            }
            GuardDecision::Allow | GuardDecision::ShowLoading => {}
        }
        decision
    }

    pub fn enqueue(&mut self, intent: NavigationIntent) {
        self.queue.push(intent);
    }

    pub fn pending_intents(&self) -> &[NavigationIntent] {
        self.queue.pending()
    }

    /// Route-mode intent pass: applies at most one queued intent by pushing
    /// (or replacing) its path. Forced intents leave a force-navigation flag
    /// behind so the guard lets the landing render.
    pub fn resolve_intents(
        &mut self,
        current_path: &str,
        auth: &AuthSnapshot,
        router: &dyn RouterPort,
    ) -> Option<NavigationIntent> {
        if !auth.is_ready() {
            return None;
        }
        if let Some(critical) = self.store.take_critical_navigation() {
            if let Some(intent) = NavigationOverride::Critical(critical).to_intent() {
                self.queue.push(intent);
            }
        }

        let current = RoutePath::parse(current_path);
        let registry = self.registry.clone();
        let winner = self.queue.resolve(|target| match target {
            IntentTarget::Path(path) => current.same_route(path),
            IntentTarget::Index(index) => registry.index_of_path(&current.path) == Some(*index),
        })?;

        let path = match &winner.target {
            IntentTarget::Path(path) => path.clone(),
            IntentTarget::Index(index) if registry.contains(*index as i64) => {
                registry.path_for(*index).to_string()
            }
            IntentTarget::Index(index) => {
                warn!(index, "dropping intent for unknown step");
                return None;
            }
        };

        if winner.force {
            if let Some(index) = registry.index_of_path(&path) {
                self.store.request_force_navigation(index);
            }
        }
        let mode = if winner.replace {
            HistoryMode::Replace
        } else {
            HistoryMode::Push
        };
        info!(intent_id = %winner.id, tier = ?winner.tier, %path, "applying navigation intent");
        router.navigate(&path, mode);
        Some(winner)
    }
}

/// Route-mode session: tracks the current path and re-runs the guard on
/// every location change, auth update and intent notification.
pub struct RouteSession {
    guard: RouteGuard,
    router: Arc<dyn RouterPort>,
    current_path: String,
    auth: AuthSnapshot,
    last_decision: Option<GuardDecision>,
}

impl RouteSession {
    pub fn new(guard: RouteGuard, router: Arc<dyn RouterPort>, initial_path: &str) -> Self {
        Self {
            guard,
            router,
            current_path: initial_path.to_string(),
            auth: AuthSnapshot::loading(),
            last_decision: None,
        }
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn last_decision(&self) -> Option<&GuardDecision> {
        self.last_decision.as_ref()
    }

    pub fn guard_mut(&mut self) -> &mut RouteGuard {
        &mut self.guard
    }

    /// The host router reports that the location changed.
    pub fn visit(&mut self, path: &str) -> GuardDecision {
        self.current_path = path.to_string();
        self.check()
    }

    pub fn update_auth(&mut self, auth: AuthSnapshot) -> GuardDecision {
        self.auth = auth;
        self.check()
    }

    /// Runs an intent pass, then re-checks the (possibly new) location.
    pub fn process_intents(&mut self) -> Option<NavigationIntent> {
        let intent = self
            .guard
            .resolve_intents(&self.current_path, &self.auth, self.router.as_ref())?;
        if let IntentTarget::Path(path) = &intent.target {
            self.current_path = path.clone();
        } else if let IntentTarget::Index(index) = intent.target {
            self.current_path = self.guard.registry.path_for(index).to_string();
        }
        self.check();
        Some(intent)
    }

    /// Follows guard redirects until a path is allowed. Bounded by the step
    /// count, since each redirect lands on a registry path.
    fn check(&mut self) -> GuardDecision {
        let mut decision = GuardDecision::Allow;
        for _ in 0..=self.guard.registry.len() {
            decision = self
                .guard
                .enforce(&self.current_path, &self.auth, self.router.as_ref());
            match &decision {
                GuardDecision::Redirect { path, .. } if *path != self.current_path => {
                    self.current_path = path.clone();
                }
                _ => break,
            }
        }
        self.last_decision = Some(decision.clone());
        decision
    }
}

#[cfg(test)]
mod tests {
    use mf_core::signup::{Identity, PriorityTier, SignupProgressState};
    use mf_infra::{FakeClock, InMemoryNavigationStore};

    use super::*;

    mockall::mock! {
        pub Router {}

        impl RouterPort for Router {
            fn navigate(&self, path: &str, mode: HistoryMode);
            fn redirect_external(&self, destination: &str);
        }
    }

    fn guard_at(now: i64) -> (RouteGuard, NavigationIntentStore, Arc<FakeClock>) {
        let clock = Arc::new(FakeClock::new(now));
        let store = NavigationIntentStore::new(Arc::new(InMemoryNavigationStore::new()), clock.clone());
        let guard = RouteGuard::new(
            Arc::new(StepRegistry::membership()),
            NavigationConfig::default(),
            store.clone(),
        );
        (guard, store, clock)
    }

    fn signed_in(progress: u32, step: &str) -> AuthSnapshot {
        AuthSnapshot::signed_in(Identity::new("user-a"), SignupProgressState::new(progress, step))
    }

    fn redirect(path: &str) -> GuardDecision {
        GuardDecision::Redirect {
            path: path.to_string(),
            mode: HistoryMode::Replace,
        }
    }

    #[test]
    fn loading_shows_placeholder_unless_linking() {
        let (guard, store, _) = guard_at(0);
        assert_eq!(
            guard.evaluate("/signup/profile", &AuthSnapshot::loading()),
            GuardDecision::ShowLoading
        );

        store.set_account_linking_active(true);
        assert_eq!(
            guard.evaluate("/signup/profile", &AuthSnapshot::loading()),
            GuardDecision::Allow
        );
    }

    #[test]
    fn anonymous_user_restarts_at_first_step() {
        let (guard, _, _) = guard_at(0);
        let anonymous = AuthSnapshot::signed_out();

        assert_eq!(guard.evaluate("/signup/account", &anonymous), GuardDecision::Allow);
        assert_eq!(
            guard.evaluate("/signup/profile", &anonymous),
            GuardDecision::Exit {
                destination: "/signup/account".to_string()
            }
        );
    }

    #[test]
    fn steps_beyond_lookahead_redirect_to_max_allowed() {
        let (guard, _, _) = guard_at(0);
        assert_eq!(
            guard.evaluate("/signup/payment", &signed_in(1, "profile")),
            redirect("/signup/organization")
        );
        assert_eq!(
            guard.evaluate("/signup/organization", &signed_in(1, "profile")),
            GuardDecision::Allow
        );
    }

    #[test]
    fn completed_steps_send_user_forward_unless_stay() {
        let (guard, _, _) = guard_at(0);
        let auth = signed_in(3, "organization");

        assert_eq!(
            guard.evaluate("/signup/profile", &auth),
            redirect("/signup/organization")
        );
        assert_eq!(
            guard.evaluate("/signup/profile?stay=1", &auth),
            GuardDecision::Allow
        );
        assert_eq!(
            guard.evaluate("/signup/account", &auth),
            redirect("/signup/verified")
        );
    }

    #[test]
    fn force_flag_is_consumed_once() {
        let (guard, store, _) = guard_at(0);
        store.request_force_navigation(5);
        let auth = signed_in(0, "account");

        assert_eq!(guard.evaluate("/signup/payment", &auth), GuardDecision::Allow);
        assert!(store.force_navigation().is_none());
        assert_eq!(
            guard.evaluate("/signup/payment", &auth),
            redirect("/signup/profile")
        );
    }

    #[test]
    fn just_verified_allows_confirmation_within_grace() {
        let (guard, store, clock) = guard_at(10_000);
        store.mark_just_verified();
        clock.advance(10_000);

        assert_eq!(
            guard.evaluate("/signup/verified", &AuthSnapshot::signed_out()),
            GuardDecision::Allow
        );
        assert!(store.just_verified().is_none());
    }

    #[test]
    fn stale_just_verified_flag_is_dropped() {
        let (guard, store, clock) = guard_at(0);
        store.mark_just_verified();
        clock.advance(10_001);

        assert_eq!(
            guard.evaluate("/signup/verified", &AuthSnapshot::signed_out()),
            GuardDecision::Exit {
                destination: "/signup/account".to_string()
            }
        );
        assert!(store.just_verified().is_none());
    }

    #[test]
    fn out_of_range_just_verified_timestamp_is_dropped() {
        let (guard, store, clock) = guard_at(i64::MIN);
        store.mark_just_verified();
        clock.set(1_700_000_000_000);

        assert_eq!(
            guard.evaluate("/signup/verified", &AuthSnapshot::signed_out()),
            GuardDecision::Exit {
                destination: "/signup/account".to_string()
            }
        );
        assert!(store.just_verified().is_none());
    }

    #[test]
    fn completed_flow_exits_from_any_path() {
        let (guard, _, _) = guard_at(0);
        let done = AuthSnapshot::signed_in(Identity::new("user-a"), SignupProgressState::completed());

        for path in ["/signup/account", "/signup/payment", "/settings"] {
            assert_eq!(
                guard.evaluate(path, &done),
                GuardDecision::Exit {
                    destination: "/member/dashboard".to_string()
                }
            );
        }
    }

    #[test]
    fn session_follows_redirects_with_replace() {
        let (guard, _, _) = guard_at(0);
        let mut router = MockRouter::new();
        router
            .expect_navigate()
            .withf(|path, mode| path == "/signup/organization" && *mode == HistoryMode::Replace)
            .times(1)
            .returning(|_, _| ());

        let mut session = RouteSession::new(guard, Arc::new(router), "/signup/payment");
        assert_eq!(session.update_auth(signed_in(1, "profile")), GuardDecision::Allow);
        assert_eq!(session.current_path(), "/signup/organization");
    }

    #[test]
    fn forced_route_intent_leaves_force_flag_for_the_guard() {
        let (guard, store, _) = guard_at(0);
        let mut router = MockRouter::new();
        router
            .expect_navigate()
            .withf(|path, mode| path == "/signup/payment" && *mode == HistoryMode::Push)
            .times(1)
            .returning(|_, _| ());

        let mut session = RouteSession::new(guard, Arc::new(router), "/signup/account");
        session.update_auth(signed_in(0, "account"));
        session
            .guard_mut()
            .enqueue(NavigationIntent::to_index(5, PriorityTier::High, 1).forced());

        let applied = session.process_intents().unwrap();
        assert_eq!(applied.tier, PriorityTier::High);
        assert_eq!(session.current_path(), "/signup/payment");
        assert_eq!(session.last_decision(), Some(&GuardDecision::Allow));
        assert!(store.force_navigation().is_none());
    }
}
