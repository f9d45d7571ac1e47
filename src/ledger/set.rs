//! The transactions of one month in backend order.

use crate::{
    Error,
    ledger::{
        AggregateTotals, BalanceSeries, Period, TransactionRecord, compute_balance_series,
        compute_totals,
    },
};

/// The transactions of a single period, in the order the backend returned
/// them.
///
/// Every record in the set belongs to the set's period. The records are never
/// re-sorted since the balance series depends on their order.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSet {
    period: Period,
    records: Vec<TransactionRecord>,
}

impl TransactionSet {
    /// Create a set from records that should all belong to `period`.
    ///
    /// # Errors
    ///
    /// Returns [Error::PeriodMismatch] for the first record from another month.
    pub fn new(period: Period, records: Vec<TransactionRecord>) -> Result<Self, Error> {
        if let Some(record) = records
            .iter()
            .find(|record| record.month != period.month_number() || record.year != period.year())
        {
            return Err(Error::PeriodMismatch {
                id: record.id.clone(),
                expected: period,
                found_month: record.month,
                found_year: record.year,
            });
        }

        Ok(Self { period, records })
    }

    /// Create a set from the records in `records` that belong to `period`,
    /// ignoring the rest.
    pub fn select(period: Period, records: impl IntoIterator<Item = TransactionRecord>) -> Self {
        let records = records
            .into_iter()
            .filter(|record| record.month == period.month_number() && record.year == period.year())
            .collect();

        Self { period, records }
    }

    /// A set with no transactions.
    pub fn empty(period: Period) -> Self {
        Self {
            period,
            records: Vec::new(),
        }
    }

    /// The period all records belong to.
    pub fn period(&self) -> Period {
        self.period
    }

    /// The records in backend order.
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The credit, debit and net totals of the set.
    pub fn totals(&self) -> AggregateTotals {
        compute_totals(&self.records)
    }

    /// The running balance after each record.
    pub fn balance_series(&self) -> BalanceSeries {
        compute_balance_series(&self.records)
    }
}
