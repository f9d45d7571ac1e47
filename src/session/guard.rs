//! The idle session guard: logs the user out once no tab has seen activity
//! for longer than the configured timeout.

use std::sync::Arc;

use time::Duration;

use crate::{
    Error,
    clock::epoch_millis,
    session::{ActivityEvent, ActivitySource, GuardConfig, ListenerId, SessionContext},
};

/// Takes the user back to the unauthenticated view, e.g. the log-in page.
pub trait Navigator: Send + Sync {
    /// Redirect to the log-in view.
    fn redirect_to_log_in(&self);
}

impl<F> Navigator for F
where
    F: Fn() + Send + Sync,
{
    fn redirect_to_log_in(&self) {
        self()
    }
}

/// The result of checking the shared activity timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The guard is not running, nothing was checked.
    Inactive,
    /// The session is still live and expires in `remaining` unless there is
    /// more activity.
    Active {
        /// Time left until the session expires.
        remaining: Duration,
    },
    /// The session expired on this check and has been cleared.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    Stopped,
    Running { listener: ListenerId },
    Expired,
}

/// Enforces the idle timeout for one tab.
///
/// Activity is shared between tabs through the [SessionContext]'s store, so
/// the session expires only when no tab has recorded activity for longer than
/// the timeout. The guard subscribes to its [ActivitySource] while running
/// and unsubscribes when stopped, logged out or expired.
pub struct SessionGuard {
    context: Arc<SessionContext>,
    activity: Arc<dyn ActivitySource>,
    navigator: Arc<dyn Navigator>,
    config: GuardConfig,
    state: GuardState,
}

impl SessionGuard {
    /// Create a stopped guard with the default five minute timeout.
    pub fn new(
        context: Arc<SessionContext>,
        activity: Arc<dyn ActivitySource>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            context,
            activity,
            navigator,
            config: GuardConfig::default(),
            state: GuardState::Stopped,
        }
    }

    /// Replace the config, e.g. to change the poll interval.
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the idle timeout to `timeout_ms` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimeout] if `timeout_ms` is zero or negative,
    /// leaving the current timeout unchanged.
    pub fn configure(&mut self, timeout_ms: i64) -> Result<(), Error> {
        self.config = self.config.with_timeout_ms(timeout_ms)?;

        Ok(())
    }

    /// The current settings.
    pub fn config(&self) -> GuardConfig {
        self.config
    }

    /// The session context this guard watches.
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Whether the guard is listening for activity and checking for expiry.
    pub fn is_running(&self) -> bool {
        matches!(self.state, GuardState::Running { .. })
    }

    /// Whether the last session watched by this guard expired.
    pub fn has_expired(&self) -> bool {
        self.state == GuardState::Expired
    }

    /// Start watching the current session.
    ///
    /// Subscribes to activity events and immediately checks for expiry, so a
    /// session that went idle while no guard was running is ended right away.
    /// Starting a running guard only repeats the check. Starting without a
    /// session leaves the guard stopped.
    pub fn start(&mut self) -> TickOutcome {
        if self.is_running() {
            return self.tick();
        }

        if !self.context.is_authenticated() {
            tracing::debug!("Not starting session guard, no one is logged in.");
            return TickOutcome::Inactive;
        }

        let context = self.context.clone();
        let listener = self
            .activity
            .subscribe(Arc::new(move |event: ActivityEvent| {
                if let Err(error) = context.record_activity() {
                    tracing::warn!("Could not record {event:?} activity: {error}");
                }
            }));

        self.state = GuardState::Running { listener };
        tracing::debug!(
            "Started session guard with a timeout of {} ms.",
            self.config.timeout().whole_milliseconds()
        );

        self.tick()
    }

    /// Stop watching the session without logging out.
    ///
    /// Removes the activity listener. Stopping a stopped guard does nothing.
    pub fn stop(&mut self) {
        if let GuardState::Running { listener } = self.state {
            self.activity.unsubscribe(listener);
            self.state = GuardState::Stopped;
            tracing::debug!("Stopped session guard.");
        }
    }

    /// Record user activity in the shared store.
    ///
    /// Does nothing while the guard is not running.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not be read or written, or holds a
    /// corrupt timestamp.
    pub fn record_activity(&self) -> Result<(), Error> {
        if !self.is_running() {
            return Ok(());
        }

        self.context.record_activity().map(|_| ())
    }

    /// Check whether the session has been idle for longer than the timeout.
    ///
    /// The session is ended when the idle time exceeds the timeout, or when
    /// the credential or activity timestamp is missing or unreadable. After
    /// that the guard stays inactive until it is started for a new session.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Inactive;
        }

        if !self.context.is_authenticated() {
            tracing::info!("Session was ended elsewhere.");
            return self.on_expire();
        }

        let last_activity = match self.context.last_activity() {
            Ok(Some(last_activity)) => last_activity,
            Ok(None) => {
                tracing::warn!("Last activity is missing from the session store, logging out.");
                return self.on_expire();
            }
            Err(error) => {
                tracing::warn!("Could not read last activity, logging out: {error}");
                return self.on_expire();
            }
        };

        // Stored timestamps have millisecond precision.
        let idle = Duration::milliseconds(
            epoch_millis(self.context.now()).saturating_sub(epoch_millis(last_activity)),
        );

        if idle > self.config.timeout() {
            tracing::info!(
                "Session idle for {} ms, logging out.",
                idle.whole_milliseconds()
            );
            return self.on_expire();
        }

        TickOutcome::Active {
            remaining: self.config.timeout() - idle,
        }
    }

    /// Log the user out on request.
    ///
    /// Takes the same path as idle expiry, so it is safe to call when another
    /// tab has already cleared the session.
    pub fn log_out(&mut self) {
        self.end_session();
        self.state = GuardState::Stopped;
    }

    fn on_expire(&mut self) -> TickOutcome {
        self.end_session();
        self.state = GuardState::Expired;

        TickOutcome::Expired
    }

    fn end_session(&mut self) {
        if let GuardState::Running { listener } = self.state {
            self.activity.unsubscribe(listener);
        }

        if let Err(error) = self.context.log_out() {
            tracing::error!("Could not clear the session: {error}");
        }

        self.navigator.redirect_to_log_in();
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod session_guard_tests {
    use std::sync::Arc;

    use time::{Duration, macros::datetime};

    use crate::{
        Error,
        session::{
            ActivityEvent, ActivityHub, KeyValueStore, LAST_ACTIVITY_KEY, MemoryStore,
            SessionContext, SessionGuard, TOKEN_KEY, TickOutcome,
        },
        test_utils::{CountingNavigator, ManualClock},
    };

    struct Tab {
        guard: SessionGuard,
        hub: ActivityHub,
        navigator: CountingNavigator,
    }

    fn open_tab(store: &MemoryStore, clock: &ManualClock, timeout_ms: i64) -> Tab {
        let context = SessionContext::new(Arc::new(store.clone()), Arc::new(clock.clone()));
        let hub = ActivityHub::new();
        let navigator = CountingNavigator::default();
        let mut guard = SessionGuard::new(
            Arc::new(context),
            Arc::new(hub.clone()),
            Arc::new(navigator.clone()),
        );
        guard.configure(timeout_ms).unwrap();

        Tab {
            guard,
            hub,
            navigator,
        }
    }

    fn logged_in_tab(timeout_ms: i64) -> (Tab, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let mut tab = open_tab(&store, &clock, timeout_ms);
        tab.guard.context().log_in("ana", "abc").unwrap();
        tab.guard.start();

        (tab, store, clock)
    }

    #[test]
    fn configure_rejects_non_positive_timeout() {
        let (mut tab, _, _) = logged_in_tab(5_000);

        assert_eq!(tab.guard.configure(0), Err(Error::InvalidTimeout(0)));
        assert_eq!(tab.guard.configure(-10), Err(Error::InvalidTimeout(-10)));
        assert_eq!(tab.guard.config().timeout(), Duration::seconds(5));
    }

    #[test]
    fn default_timeout_is_five_minutes() {
        let store = MemoryStore::new();
        let context = SessionContext::with_system_clock(Arc::new(store));
        let guard = SessionGuard::new(
            Arc::new(context),
            Arc::new(ActivityHub::new()),
            Arc::new(CountingNavigator::default()),
        );

        assert_eq!(guard.config().timeout(), Duration::milliseconds(300_000));
    }

    #[test]
    fn start_without_session_stays_stopped() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let mut tab = open_tab(&store, &clock, 5_000);

        assert_eq!(tab.guard.start(), TickOutcome::Inactive);
        assert!(!tab.guard.is_running());
        assert_eq!(tab.hub.listener_count(), 0);
    }

    #[test]
    fn start_subscribes_once() {
        let (mut tab, _, _) = logged_in_tab(5_000);

        tab.guard.start();

        assert!(tab.guard.is_running());
        assert_eq!(tab.hub.listener_count(), 1);
    }

    #[test]
    fn expires_exactly_once_after_timeout_without_activity() {
        let (mut tab, store, clock) = logged_in_tab(5_000);

        clock.advance(Duration::milliseconds(5_000));
        assert!(matches!(tab.guard.tick(), TickOutcome::Active { .. }));

        clock.advance(Duration::milliseconds(1));
        assert_eq!(tab.guard.tick(), TickOutcome::Expired);

        clock.advance(Duration::seconds(10));
        assert_eq!(tab.guard.tick(), TickOutcome::Inactive);
        assert_eq!(tab.guard.tick(), TickOutcome::Inactive);

        assert_eq!(tab.navigator.count(), 1);
        assert!(tab.guard.has_expired());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn activity_postpones_expiry() {
        let (mut tab, _, clock) = logged_in_tab(5_000);

        clock.advance(Duration::milliseconds(4_000));
        tab.hub.dispatch(ActivityEvent::PointerMove);

        clock.advance(Duration::milliseconds(1_000));
        assert_eq!(
            tab.guard.tick(),
            TickOutcome::Active {
                remaining: Duration::milliseconds(4_000)
            }
        );

        clock.advance(Duration::milliseconds(4_000));
        assert!(matches!(tab.guard.tick(), TickOutcome::Active { .. }));

        clock.advance(Duration::milliseconds(1));
        assert_eq!(tab.guard.tick(), TickOutcome::Expired);
        assert_eq!(tab.navigator.count(), 1);
    }

    #[test]
    fn repeated_activity_counts_as_latest_only() {
        let (mut tab, _, clock) = logged_in_tab(5_000);
        clock.advance(Duration::milliseconds(2_000));

        for _ in 0..100 {
            tab.guard.record_activity().unwrap();
        }

        clock.advance(Duration::milliseconds(5_000));
        assert!(matches!(tab.guard.tick(), TickOutcome::Active { .. }));
        clock.advance(Duration::milliseconds(1));
        assert_eq!(tab.guard.tick(), TickOutcome::Expired);
    }

    #[test]
    fn activity_in_another_tab_keeps_session_alive() {
        let (mut first_tab, store, clock) = logged_in_tab(5_000);
        let mut second_tab = open_tab(&store, &clock, 5_000);
        second_tab.guard.start();

        clock.advance(Duration::milliseconds(4_000));
        second_tab.hub.dispatch(ActivityEvent::KeyPress);
        clock.advance(Duration::milliseconds(4_000));

        assert!(matches!(first_tab.guard.tick(), TickOutcome::Active { .. }));
        assert_eq!(first_tab.navigator.count(), 0);
    }

    #[test]
    fn both_tabs_expire_and_clear_without_error() {
        let (mut first_tab, store, clock) = logged_in_tab(5_000);
        let mut second_tab = open_tab(&store, &clock, 5_000);
        second_tab.guard.start();

        clock.advance(Duration::milliseconds(5_001));

        assert_eq!(first_tab.guard.tick(), TickOutcome::Expired);
        assert_eq!(second_tab.guard.tick(), TickOutcome::Expired);
        assert_eq!(first_tab.navigator.count(), 1);
        assert_eq!(second_tab.navigator.count(), 1);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(LAST_ACTIVITY_KEY).unwrap(), None);
    }

    #[test]
    fn missing_last_activity_expires_immediately() {
        let (mut tab, store, _) = logged_in_tab(5_000);
        store.remove(LAST_ACTIVITY_KEY).unwrap();

        assert_eq!(tab.guard.tick(), TickOutcome::Expired);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_last_activity_expires_immediately() {
        let (mut tab, store, _) = logged_in_tab(5_000);
        store.set(LAST_ACTIVITY_KEY, "\"not a number\"").unwrap();

        assert_eq!(tab.guard.tick(), TickOutcome::Expired);
    }

    #[test]
    fn start_expires_session_that_went_idle_while_stopped() {
        let (mut tab, _, clock) = logged_in_tab(5_000);
        tab.guard.stop();

        clock.advance(Duration::seconds(6));

        assert_eq!(tab.guard.start(), TickOutcome::Expired);
    }

    #[test]
    fn log_out_in_another_tab_ends_this_tab() {
        let (mut first_tab, store, clock) = logged_in_tab(5_000);
        let mut second_tab = open_tab(&store, &clock, 5_000);
        second_tab.guard.start();

        second_tab.guard.log_out();

        assert_eq!(first_tab.guard.tick(), TickOutcome::Expired);
        assert_eq!(first_tab.navigator.count(), 1);
    }

    #[test]
    fn stop_removes_listener_and_stops_checks() {
        let (mut tab, store, clock) = logged_in_tab(5_000);

        tab.guard.stop();
        tab.guard.stop();
        clock.advance(Duration::seconds(60));

        assert_eq!(tab.hub.listener_count(), 0);
        assert_eq!(tab.guard.tick(), TickOutcome::Inactive);
        assert_eq!(tab.navigator.count(), 0);
        assert!(store.get(TOKEN_KEY).unwrap().is_some());
    }

    #[test]
    fn expiry_removes_listener() {
        let (mut tab, _, clock) = logged_in_tab(5_000);

        clock.advance(Duration::seconds(6));
        tab.guard.tick();

        assert_eq!(tab.hub.listener_count(), 0);
    }

    #[test]
    fn log_out_clears_session_and_redirects() {
        let (mut tab, store, _) = logged_in_tab(5_000);

        tab.guard.log_out();

        assert!(!tab.guard.is_running());
        assert!(!tab.guard.has_expired());
        assert_eq!(tab.navigator.count(), 1);
        assert_eq!(tab.hub.listener_count(), 0);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn guard_can_watch_a_new_session_after_expiry() {
        let (mut tab, _, clock) = logged_in_tab(5_000);
        clock.advance(Duration::seconds(6));
        tab.guard.tick();

        tab.guard.context().log_in("ana", "def").unwrap();
        let outcome = tab.guard.start();

        assert_eq!(
            outcome,
            TickOutcome::Active {
                remaining: Duration::seconds(5)
            }
        );
        assert!(tab.guard.is_running());
    }

    #[test]
    fn tick_compares_whole_milliseconds() {
        let store = MemoryStore::new();
        let clock = ManualClock::at(datetime!(2024-10-05 09:00:00.0005 UTC));
        let mut tab = open_tab(&store, &clock, 5_000);
        tab.guard.context().log_in("ana", "abc").unwrap();
        tab.guard.start();

        clock.advance(Duration::milliseconds(5_000));
        assert_eq!(
            tab.guard.tick(),
            TickOutcome::Active {
                remaining: Duration::ZERO
            }
        );

        clock.advance(Duration::milliseconds(1));
        assert_eq!(tab.guard.tick(), TickOutcome::Expired);
        assert_eq!(tab.navigator.count(), 1);
    }

    #[test]
    fn dropping_guard_removes_listener() {
        let (tab, _, _) = logged_in_tab(5_000);
        let hub = tab.hub.clone();

        drop(tab);

        assert_eq!(hub.listener_count(), 0);
    }
}
