//! The running balance of a month, one point per transaction.

use serde::Serialize;

use crate::ledger::{Entry, TransactionRecord, totals::clamp_to_i64};

/// The balance after one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalancePoint {
    /// The transaction's date, e.g. "5/outubro/2024".
    pub label: String,
    /// The sum of the signed values up to and including the transaction, in
    /// minor currency units.
    pub balance: i64,
}

/// A running balance series, or the lack of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BalanceSeries {
    /// There is nothing to chart: there are no transactions, or the first one
    /// has no value.
    NoData,
    /// One point per transaction, in transaction order.
    Points(Vec<BalancePoint>),
}

impl BalanceSeries {
    /// Whether there is nothing to chart.
    pub fn is_no_data(&self) -> bool {
        matches!(self, BalanceSeries::NoData)
    }

    /// The points of the series, empty for [BalanceSeries::NoData].
    pub fn points(&self) -> &[BalancePoint] {
        match self {
            BalanceSeries::NoData => &[],
            BalanceSeries::Points(points) => points,
        }
    }
}

/// Calculate the running balance after each of `records`, in order.
///
/// The balance starts at zero and every record, the first included, adds its
/// value if it is a credit and subtracts it if it is a debit. So a month that
/// starts with a debit starts with a negative balance.
///
/// Returns [BalanceSeries::NoData] if `records` is empty or the first record
/// has no value. Later records without a value or with an unrecognised entry
/// type leave the balance unchanged but still get a point.
///
/// The running sum is exact. A point whose balance falls outside the `i64`
/// range shows the nearest representable value.
pub fn compute_balance_series(records: &[TransactionRecord]) -> BalanceSeries {
    match records.first() {
        Some(first) if first.value.is_some() => {}
        _ => return BalanceSeries::NoData,
    }

    let mut balance = 0i128;
    let points = records
        .iter()
        .map(|record| {
            match record.signed_value() {
                Some(value) => balance += i128::from(value),
                None if record.entry == Entry::Unrecognized => tracing::warn!(
                    "Transaction {} has an unrecognised entry type, the balance is unchanged.",
                    record.id
                ),
                None => tracing::warn!(
                    "Transaction {} has no value, the balance is unchanged.",
                    record.id
                ),
            }

            BalancePoint {
                label: record.label(),
                balance: clamp_to_i64(balance),
            }
        })
        .collect();

    BalanceSeries::Points(points)
}
