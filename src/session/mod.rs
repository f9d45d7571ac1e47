//! Client-side session lifecycle: log in, activity tracking shared between
//! tabs, and automatic log out after a period of inactivity.

mod activity;
mod config;
mod context;
mod guard;
mod sqlite_store;
mod store;
mod task;
mod token;

pub use activity::{ActivityEvent, ActivityHub, ActivityListener, ActivitySource, ListenerId};
pub use config::{DEFAULT_IDLE_TIMEOUT, DEFAULT_POLL_INTERVAL, GuardConfig};
pub use context::{Session, SessionContext};
pub use guard::{Navigator, SessionGuard, TickOutcome};
pub use sqlite_store::SqliteStore;
pub use store::{KeyValueStore, LAST_ACTIVITY_KEY, MemoryStore, TOKEN_KEY};
pub use task::GuardTask;
pub use token::SessionToken;
