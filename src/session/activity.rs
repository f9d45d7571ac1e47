//! User activity signals and the listener registry the guard subscribes to.

use std::sync::{Arc, Mutex};

/// A user input that counts as activity and postpones the idle log out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    /// The pointer moved.
    PointerMove,
    /// A key was pressed.
    KeyPress,
    /// The page was scrolled.
    Scroll,
    /// The pointer was clicked.
    Click,
}

impl ActivityEvent {
    /// Every kind of activity the guard listens for.
    pub const ALL: [ActivityEvent; 4] = [
        ActivityEvent::PointerMove,
        ActivityEvent::KeyPress,
        ActivityEvent::Scroll,
        ActivityEvent::Click,
    ];
}

/// A callback run for each activity event.
pub type ActivityListener = Arc<dyn Fn(ActivityEvent) + Send + Sync>;

/// Identifies a subscribed listener so that it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Something that reports user activity, e.g. the window's input events.
pub trait ActivitySource: Send + Sync {
    /// Run `listener` for every activity event until it is unsubscribed.
    fn subscribe(&self, listener: ActivityListener) -> ListenerId;

    /// Stop running the listener registered as `id`.
    ///
    /// Returns whether the listener was subscribed.
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    registered: Vec<(ListenerId, ActivityListener)>,
}

/// An in-process [ActivitySource] that forwards dispatched events to its
/// listeners.
///
/// Clones share the same listeners.
#[derive(Clone, Default)]
pub struct ActivityHub {
    listeners: Arc<Mutex<Listeners>>,
}

impl ActivityHub {
    /// Create a hub without any listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every subscribed listener with `event`.
    pub fn dispatch(&self, event: ActivityEvent) {
        // Listeners run outside of the lock so they may (un)subscribe.
        let listeners: Vec<ActivityListener> = match self.listeners.lock() {
            Ok(listeners) => listeners
                .registered
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect(),
            Err(error) => {
                tracing::error!("Could not acquire activity listener lock: {error}");
                return;
            }
        };

        for listener in listeners {
            listener(event);
        }
    }

    /// The number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .map(|listeners| listeners.registered.len())
            .unwrap_or_default()
    }
}

impl ActivitySource for ActivityHub {
    fn subscribe(&self, listener: ActivityListener) -> ListenerId {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        listeners.registered.push((id, listener));

        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let count_before = listeners.registered.len();
        listeners
            .registered
            .retain(|(listener_id, _)| *listener_id != id);

        listeners.registered.len() != count_before
    }
}
