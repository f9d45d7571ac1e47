//! The application log kept in the key-value store under [APP_LOGS_KEY], so
//! it can be inspected after the fact like the browser's local storage log.

use std::{io, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing_subscriber::fmt::MakeWriter;

use crate::{Clock, Error, session::KeyValueStore};

/// The store key holding the JSON array of [LogEntry].
pub const APP_LOGS_KEY: &str = "appLogs";

mod datetime_format {
    //! Serializes a [time::OffsetDateTime] as an RFC 3339 string, e.g.
    //! "2024-10-05T14:30:12.345Z".
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

/// A message in the application log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the message was logged.
    #[serde(with = "datetime_format")]
    pub timestamp: OffsetDateTime,
    /// The log message.
    pub message: String,
}

/// Read the application log, oldest entry first.
///
/// # Errors
///
/// Returns [Error::CorruptSessionData] if the stored log is not a list of log
/// entries, or the store's error if it could not be read.
pub fn read_logs(store: &dyn KeyValueStore) -> Result<Vec<LogEntry>, Error> {
    match store.get(APP_LOGS_KEY)? {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|error| Error::CorruptSessionData(APP_LOGS_KEY.to_owned(), error.to_string())),
    }
}

/// Add `message` to the end of the application log.
///
/// A corrupt log is replaced by a new log containing only `message`.
///
/// # Errors
///
/// Returns the store's error if the log could not be read or written.
pub fn append_log(
    store: &dyn KeyValueStore,
    timestamp: OffsetDateTime,
    message: &str,
) -> Result<(), Error> {
    let mut entries = match read_logs(store) {
        Ok(entries) => entries,
        Err(Error::CorruptSessionData(..)) => Vec::new(),
        Err(error) => return Err(error),
    };

    entries.push(LogEntry {
        timestamp,
        message: message.to_owned(),
    });

    store.set(APP_LOGS_KEY, &serde_json::to_string(&entries)?)
}

/// Delete the application log.
///
/// # Errors
///
/// Returns the store's error if the log could not be removed.
pub fn clear_logs(store: &dyn KeyValueStore) -> Result<(), Error> {
    store.remove(APP_LOGS_KEY)
}

/// A [MakeWriter] that appends each formatted tracing event to the
/// application log.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use accounting_client::{StoreLogWriter, SystemClock, session::MemoryStore};
/// use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
///
/// let writer = StoreLogWriter::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock));
/// tracing_subscriber::registry()
///     .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
///     .init();
/// ```
#[derive(Clone)]
pub struct StoreLogWriter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl StoreLogWriter {
    /// Create a writer that logs into `store`, stamping entries with `clock`.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

impl<'a> MakeWriter<'a> for StoreLogWriter {
    type Writer = StoreLogLine;

    fn make_writer(&'a self) -> Self::Writer {
        StoreLogLine {
            store: self.store.clone(),
            clock: self.clock.clone(),
            buffer: Vec::new(),
        }
    }
}

/// Buffers one formatted event and appends it to the log when dropped.
pub struct StoreLogLine {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    buffer: Vec<u8>,
}

impl io::Write for StoreLogLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for StoreLogLine {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buffer);
        let message = line.trim_end();

        if message.is_empty() {
            return;
        }

        // Logging the failure through tracing would write back into this store.
        if let Err(error) = append_log(self.store.as_ref(), self.clock.now(), message) {
            eprintln!("Could not write to the application log: {error}");
        }
    }
}
