//! Test doubles shared by the unit tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use time::{Duration, OffsetDateTime, UtcOffset, macros::datetime};

use crate::{
    Error,
    clock::Clock,
    ledger::{
        Entry, NewTransaction, Period, TransactionBackend, TransactionId, TransactionRecord,
    },
    session::Navigator,
};

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(datetime!(2024-10-05 09:00:00).assume_offset(UtcOffset::UTC))
    }
}

impl ManualClock {
    pub fn at(now: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap()
    }

    pub fn advance(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        ManualClock::now(self)
    }
}

/// Counts redirects to the log-in view.
#[derive(Debug, Clone, Default)]
pub struct CountingNavigator {
    redirects: Arc<AtomicUsize>,
}

impl CountingNavigator {
    pub fn count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn redirect_to_log_in(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// A transaction record with a value.
pub fn record(id: &str, day: u8, month: u8, year: i32, value: i64, entry: Entry) -> TransactionRecord {
    TransactionRecord {
        id: TransactionId::new(id),
        day,
        month,
        year,
        description: format!("Transaction {id}"),
        value: Some(value),
        entry,
    }
}

/// A transaction record dated 5 October 2024.
pub fn october_record(value: i64, entry: Entry) -> TransactionRecord {
    record(&value.to_string(), 5, 10, 2024, value, entry)
}

/// A transaction record dated 5 October 2024 that has no value.
pub fn record_without_value(entry: Entry) -> TransactionRecord {
    TransactionRecord {
        value: None,
        ..october_record(0, entry)
    }
}

/// An in-memory stand-in for the REST backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: Arc<Mutex<Vec<(String, TransactionRecord)>>>,
    next_id: Arc<AtomicUsize>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryBackend {
    pub fn with_records(user: &str, records: Vec<TransactionRecord>) -> Self {
        let backend = Self::default();
        backend.records.lock().unwrap().extend(
            records
                .into_iter()
                .map(|record| (user.to_owned(), record)),
        );

        backend
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    fn check_failing(&self) -> Result<(), Error> {
        if *self.failing.lock().unwrap() {
            return Err(Error::BackendError("connection refused".to_owned()));
        }

        Ok(())
    }
}

impl TransactionBackend for MemoryBackend {
    fn list(&self, user: &str, period: Period) -> Result<Vec<TransactionRecord>, Error> {
        self.check_failing()?;

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, record)| {
                owner == user
                    && record.month == period.month_number()
                    && record.year == period.year()
            })
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn create(&self, transaction: &NewTransaction) -> Result<TransactionRecord, Error> {
        self.check_failing()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = TransactionRecord {
            id: TransactionId::new(&format!("server-{id}")),
            day: transaction.day,
            month: transaction.month,
            year: transaction.year,
            description: transaction.description.clone(),
            value: Some(transaction.value),
            entry: transaction.entry,
        };
        self.records
            .lock()
            .unwrap()
            .push((transaction.user.clone(), record.clone()));

        Ok(record)
    }

    fn delete(&self, id: &TransactionId) -> Result<(), Error> {
        self.check_failing()?;

        self.records
            .lock()
            .unwrap()
            .retain(|(_, record)| &record.id != id);

        Ok(())
    }
}
