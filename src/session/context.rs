//! The explicit session context passed to the components that need the
//! session: log in, activity bookkeeping and the shared log-out path.

use std::{cmp::max, sync::Arc};

use time::OffsetDateTime;

use crate::{
    Error,
    clock::{Clock, SystemClock, epoch_millis, from_epoch_millis},
    session::{KeyValueStore, LAST_ACTIVITY_KEY, SessionToken, TOKEN_KEY},
};

/// The state of an authenticated session as seen in the shared store.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The opaque credential issued by the auth service.
    pub token: String,
    /// The name the user logged in with.
    pub username: String,
    /// When any tab last saw user activity, `None` if the entry is missing.
    pub last_activity_at: Option<OffsetDateTime>,
}

/// Reads and writes the session in a [KeyValueStore] shared by every tab.
///
/// Each tab builds its own context over the same store. Nothing here is
/// cached, every call goes to the store so that changes made by other tabs
/// are seen immediately.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl SessionContext {
    /// Create a context over `store` that reads the time from `clock`.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a context over `store` that uses the system clock.
    pub fn with_system_clock(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    /// The store holding the session.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// The current time according to this context's clock.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Start a session for `username` with the credential `token`.
    ///
    /// Writes the credential bundle and the initial activity timestamp,
    /// replacing any previous session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not be written to.
    pub fn log_in(&self, username: &str, token: &str) -> Result<Session, Error> {
        let session_token = SessionToken {
            user: username.to_owned(),
            token: token.to_owned(),
        };
        let now = self.now();

        self.store
            .set(TOKEN_KEY, &serde_json::to_string(&session_token)?)?;
        self.store
            .set(LAST_ACTIVITY_KEY, &encode_timestamp(epoch_millis(now))?)?;

        tracing::info!("Started session for user {username}.");

        Ok(Session {
            token: session_token.token,
            username: session_token.user,
            last_activity_at: Some(now),
        })
    }

    /// The session in the store, or `None` if no one is logged in.
    ///
    /// # Errors
    ///
    /// Returns [Error::CorruptSessionData] if the credential bundle or the
    /// activity timestamp cannot be parsed.
    pub fn current_session(&self) -> Result<Option<Session>, Error> {
        let Some(session_token) = self.session_token()? else {
            return Ok(None);
        };

        Ok(Some(Session {
            token: session_token.token,
            username: session_token.user,
            last_activity_at: self.last_activity()?,
        }))
    }

    /// Whether a credential is present in the store.
    ///
    /// A corrupt credential or an unreadable store counts as logged out.
    pub fn is_authenticated(&self) -> bool {
        match self.session_token() {
            Ok(token) => token.is_some(),
            Err(error) => {
                tracing::warn!("Treating unreadable credential as logged out: {error}");
                false
            }
        }
    }

    /// When any tab last recorded activity, or `None` if the entry is missing.
    ///
    /// # Errors
    ///
    /// Returns [Error::CorruptSessionData] if the stored value is not an epoch
    /// millisecond timestamp.
    pub fn last_activity(&self) -> Result<Option<OffsetDateTime>, Error> {
        let Some(raw) = self.store.get(LAST_ACTIVITY_KEY)? else {
            return Ok(None);
        };

        decode_timestamp(&raw)
            .and_then(from_epoch_millis)
            .map(Some)
            .ok_or_else(|| {
                Error::CorruptSessionData(LAST_ACTIVITY_KEY.to_owned(), format!("{raw:?}"))
            })
    }

    /// Record user activity by setting the shared activity timestamp to the
    /// later of now and the stored timestamp, so it never moves backwards.
    ///
    /// Nothing is written when there is no session or its activity entry is
    /// missing, an activity event must not revive a session that another tab
    /// has ended or whose storage was cleared.
    ///
    /// Returns the stored timestamp, or `None` if nothing was written.
    ///
    /// # Errors
    ///
    /// Returns [Error::CorruptSessionData] if the stored timestamp is corrupt,
    /// leaving it for the guard to treat as expired.
    pub fn record_activity(&self) -> Result<Option<OffsetDateTime>, Error> {
        if self.store.get(TOKEN_KEY)?.is_none() {
            return Ok(None);
        }

        let Some(stored) = self.last_activity()? else {
            return Ok(None);
        };

        let latest = max(stored, self.now());
        self.store
            .set(LAST_ACTIVITY_KEY, &encode_timestamp(epoch_millis(latest))?)?;

        Ok(Some(latest))
    }

    /// Clear the session from the store.
    ///
    /// Both idle expiry and user initiated log out end up here. Clearing an
    /// already cleared session is a no-op, so any number of tabs may call this
    /// for the same session.
    ///
    /// Returns whether there was a credential to clear.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not be written to.
    pub fn log_out(&self) -> Result<bool, Error> {
        let had_token = self.store.get(TOKEN_KEY)?.is_some();

        self.store.remove(TOKEN_KEY)?;
        self.store.remove(LAST_ACTIVITY_KEY)?;

        if had_token {
            tracing::info!("Cleared session.");
        } else {
            tracing::debug!("Session already cleared.");
        }

        Ok(had_token)
    }

    fn session_token(&self) -> Result<Option<SessionToken>, Error> {
        let Some(raw) = self.store.get(TOKEN_KEY)? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|error| Error::CorruptSessionData(TOKEN_KEY.to_owned(), error.to_string()))
    }
}

/// Encode epoch milliseconds the way the web client stores them: as a JSON
/// string holding the decimal number.
fn encode_timestamp(millis: i64) -> Result<String, Error> {
    serde_json::to_string(&millis.to_string()).map_err(Error::from)
}

/// Decode a stored timestamp, accepting a JSON string holding the number, a
/// bare JSON number, or the plain decimal digits.
fn decode_timestamp(raw: &str) -> Option<i64> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::String(text)) => text.trim().parse().ok(),
        Ok(serde_json::Value::Number(number)) => number.as_i64(),
        Ok(_) => None,
        Err(_) => raw.trim().parse().ok(),
    }
}
