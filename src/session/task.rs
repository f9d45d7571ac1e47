//! Runs a [SessionGuard] on a tokio interval.

use std::sync::{Arc, Mutex};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::session::{SessionGuard, TickOutcome};

/// A background task checking a [SessionGuard] at its poll interval.
///
/// The task ends by itself when the session expires or the guard stops
/// running. Stopping or dropping the handle aborts the timer and removes the
/// guard's activity listener.
pub struct GuardTask {
    guard: Arc<Mutex<SessionGuard>>,
    handle: JoinHandle<()>,
    joined: bool,
}

impl GuardTask {
    /// Start `guard` and spawn the task that checks it at its poll interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(mut guard: SessionGuard) -> Self {
        let poll_interval = std::time::Duration::from_millis(
            guard.config().poll_interval().whole_milliseconds() as u64,
        );
        let initial_outcome = guard.start();
        let guard = Arc::new(Mutex::new(guard));

        let task_guard = guard.clone();
        let handle = tokio::spawn(async move {
            if !matches!(initial_outcome, TickOutcome::Active { .. }) {
                return;
            }

            let mut ticks = interval(poll_interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately and the guard has just been checked.
            ticks.tick().await;

            loop {
                ticks.tick().await;

                let outcome = match task_guard.lock() {
                    Ok(mut guard) => guard.tick(),
                    Err(error) => {
                        tracing::error!("Could not acquire session guard lock: {error}");
                        return;
                    }
                };

                match outcome {
                    TickOutcome::Active { .. } => continue,
                    TickOutcome::Expired => {
                        tracing::debug!("Session expired, stopping guard task.");
                        return;
                    }
                    TickOutcome::Inactive => return,
                }
            }
        });

        Self {
            guard,
            handle,
            joined: false,
        }
    }

    /// The guard checked by this task.
    pub fn guard(&self) -> &Arc<Mutex<SessionGuard>> {
        &self.guard
    }

    /// Whether the task has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to end, i.e. until the session expires or the task
    /// is stopped.
    pub async fn finished(&mut self) {
        if self.joined {
            return;
        }

        let result = (&mut self.handle).await;
        self.joined = true;

        match result {
            Err(error) if !error.is_cancelled() => {
                tracing::error!("Session guard task failed: {error}");
            }
            _ => {}
        }
    }

    /// Abort the timer and stop the guard.
    pub fn stop(&self) {
        self.handle.abort();

        match self.guard.lock() {
            Ok(mut guard) => guard.stop(),
            Err(error) => tracing::error!("Could not acquire session guard lock: {error}"),
        }
    }
}

impl Drop for GuardTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod guard_task_tests {
    use std::sync::Arc;

    use time::Duration;

    use crate::{
        session::{
            ActivityEvent, ActivityHub, GuardTask, KeyValueStore, MemoryStore, SessionContext,
            SessionGuard, TOKEN_KEY,
        },
        test_utils::{CountingNavigator, ManualClock},
    };

    fn get_guard(
        store: &MemoryStore,
        clock: &ManualClock,
        hub: &ActivityHub,
        navigator: &CountingNavigator,
    ) -> SessionGuard {
        let context = SessionContext::new(Arc::new(store.clone()), Arc::new(clock.clone()));
        context.log_in("ana", "abc").unwrap();

        let mut guard = SessionGuard::new(
            Arc::new(context),
            Arc::new(hub.clone()),
            Arc::new(navigator.clone()),
        );
        guard.configure(5_000).unwrap();

        guard
    }

    #[tokio::test(start_paused = true)]
    async fn task_expires_session_once_and_finishes() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let hub = ActivityHub::new();
        let navigator = CountingNavigator::default();
        let mut task = GuardTask::spawn(get_guard(&store, &clock, &hub, &navigator));

        clock.advance(Duration::milliseconds(5_001));
        tokio::time::timeout(std::time::Duration::from_secs(5), task.finished())
            .await
            .unwrap();

        assert!(task.is_finished());
        assert_eq!(navigator.count(), 1);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn task_keeps_running_while_there_is_activity() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let hub = ActivityHub::new();
        let navigator = CountingNavigator::default();
        let task = GuardTask::spawn(get_guard(&store, &clock, &hub, &navigator));

        for _ in 0..10 {
            clock.advance(Duration::seconds(3));
            hub.dispatch(ActivityEvent::Scroll);
            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        }

        assert!(!task.is_finished());
        assert_eq!(navigator.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_aborts_task_and_removes_listener() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let hub = ActivityHub::new();
        let navigator = CountingNavigator::default();
        let mut task = GuardTask::spawn(get_guard(&store, &clock, &hub, &navigator));

        task.stop();
        task.finished().await;
        clock.advance(Duration::seconds(60));
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;

        assert!(task.is_finished());
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(navigator.count(), 0);
        assert!(store.get(TOKEN_KEY).unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_task_removes_listener() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let hub = ActivityHub::new();
        let navigator = CountingNavigator::default();
        let task = GuardTask::spawn(get_guard(&store, &clock, &hub, &navigator));
        assert_eq!(hub.listener_count(), 1);

        drop(task);

        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn task_finishes_immediately_without_session() {
        let store = MemoryStore::new();
        let clock = ManualClock::default();
        let hub = ActivityHub::new();
        let navigator = CountingNavigator::default();
        let guard = get_guard(&store, &clock, &hub, &navigator);
        guard.context().log_out().unwrap();

        let mut task = GuardTask::spawn(guard);
        task.finished().await;

        assert_eq!(hub.listener_count(), 0);
        assert_eq!(navigator.count(), 0);
    }
}
