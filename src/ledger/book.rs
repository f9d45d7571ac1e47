//! Keeps the transactions, totals and balance of the selected month in sync
//! with the backend.

use std::sync::Arc;

use time::UtcOffset;

use crate::{
    Error,
    clock::Clock,
    ledger::{
        AggregateTotals, BalanceSeries, Entry, NewTransaction, Period, TransactionId,
        TransactionRecord, TransactionSet,
    },
};

/// The REST backend that stores transactions.
pub trait TransactionBackend: Send + Sync {
    /// Get the transactions of `user` for `period`, in the backend's order.
    fn list(&self, user: &str, period: Period) -> Result<Vec<TransactionRecord>, Error>;

    /// Store a new transaction and return it with its server-assigned ID.
    fn create(&self, transaction: &NewTransaction) -> Result<TransactionRecord, Error>;

    /// Delete the transaction with `id`.
    fn delete(&self, id: &TransactionId) -> Result<(), Error>;
}

/// The transactions of a user's selected month, with their totals and
/// running balance.
///
/// The book reloads from the backend whenever the period changes and after
/// every create or delete, so the derived data always matches what the
/// backend holds.
pub struct LedgerBook {
    backend: Arc<dyn TransactionBackend>,
    user: String,
    clock: Arc<dyn Clock>,
    local_offset: UtcOffset,
    transactions: TransactionSet,
    totals: AggregateTotals,
    balance: BalanceSeries,
}

impl LedgerBook {
    /// Create an empty book for `user` showing the current month at
    /// `local_offset`. Call [LedgerBook::reload] to fetch the transactions.
    pub fn new(
        backend: Arc<dyn TransactionBackend>,
        user: &str,
        clock: Arc<dyn Clock>,
        local_offset: UtcOffset,
    ) -> Self {
        let period = Period::current(clock.now(), local_offset);

        Self {
            backend,
            user: user.to_owned(),
            clock,
            local_offset,
            transactions: TransactionSet::empty(period),
            totals: AggregateTotals::default(),
            balance: BalanceSeries::NoData,
        }
    }

    /// The selected month.
    pub fn period(&self) -> Period {
        self.transactions.period()
    }

    /// The transactions of the selected month.
    pub fn transactions(&self) -> &TransactionSet {
        &self.transactions
    }

    /// The totals of the selected month.
    pub fn totals(&self) -> AggregateTotals {
        self.totals
    }

    /// The running balance of the selected month.
    pub fn balance(&self) -> &BalanceSeries {
        &self.balance
    }

    /// Show `period` and fetch its transactions.
    ///
    /// The previous month's transactions are cleared even if the fetch fails.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the transactions could not be fetched.
    pub fn select_period(&mut self, period: Period) -> Result<(), Error> {
        if period != self.period() {
            self.replace(TransactionSet::empty(period));
        }

        self.reload()
    }

    /// Fetch the transactions of the selected month again.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or [Error::PeriodMismatch] if the backend
    /// sent a transaction from another month. The book is left unchanged on
    /// error.
    pub fn reload(&mut self) -> Result<(), Error> {
        let period = self.period();

        let records = self
            .backend
            .list(&self.user, period)
            .inspect_err(|error| {
                tracing::error!("Could not fetch transactions for {period}: {error}")
            })?;
        tracing::debug!("Fetched {} transactions for {period}.", records.len());

        let transactions = TransactionSet::new(period, records).inspect_err(|error| {
            tracing::error!("Backend sent invalid transactions for {period}: {error}")
        })?;
        self.replace(transactions);

        Ok(())
    }

    /// Add a transaction to the selected month, dated today, then reload.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is invalid, or the backend could
    /// not store it or reload the month.
    pub fn add(
        &mut self,
        description: &str,
        value: i64,
        entry: Entry,
    ) -> Result<TransactionRecord, Error> {
        let today = self.clock.now().to_offset(self.local_offset).date();
        let transaction =
            NewTransaction::new(&self.user, description, value, entry, self.period(), today)?;

        let created = self
            .backend
            .create(&transaction)
            .inspect_err(|error| tracing::error!("Could not create transaction: {error}"))?;
        tracing::info!("Created transaction {} for {}.", created.id, self.period());

        self.reload()?;

        Ok(created)
    }

    /// Delete the transaction with `id`, then reload.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not delete the transaction or
    /// reload the month.
    pub fn delete(&mut self, id: &TransactionId) -> Result<(), Error> {
        self.backend
            .delete(id)
            .inspect_err(|error| tracing::error!("Could not delete transaction {id}: {error}"))?;
        tracing::info!("Deleted transaction {id}.");

        self.reload()
    }

    fn replace(&mut self, transactions: TransactionSet) {
        self.totals = transactions.totals();
        self.balance = transactions.balance_series();
        self.transactions = transactions;
    }
}
