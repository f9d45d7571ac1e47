//! Credit, debit and net totals of a set of transactions.

use serde::Serialize;

use crate::ledger::{Entry, TransactionRecord};

/// The sums of a set of transactions in minor currency units.
///
/// `total` is always `total_credits - total_debits`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateTotals {
    /// The sum of all credits.
    pub total_credits: i64,
    /// The sum of all debits.
    pub total_debits: i64,
    /// Credits minus debits.
    pub total: i64,
}

/// Sum the credits and debits in `records`.
///
/// Records without a value or with an unrecognised entry type are skipped and
/// logged. The result does not depend on the order of `records`.
///
/// The sums are exact. A credit or debit sum beyond `i64::MAX` is clamped to
/// `i64::MAX`, and `total` is taken from the clamped sums.
pub fn compute_totals(records: &[TransactionRecord]) -> AggregateTotals {
    let mut credits = 0i128;
    let mut debits = 0i128;

    for record in records {
        let Some(value) = record.value else {
            tracing::warn!("Skipping transaction {} with no value in totals.", record.id);
            continue;
        };

        match record.entry {
            Entry::Credit => credits += i128::from(value),
            Entry::Debit => debits += i128::from(value),
            Entry::Unrecognized => {
                tracing::warn!(
                    "Skipping transaction {} with an unrecognised entry type in totals.",
                    record.id
                );
            }
        }
    }

    let total_credits = clamp_to_i64(credits);
    let total_debits = clamp_to_i64(debits);

    AggregateTotals {
        total_credits,
        total_debits,
        // Both sums are non-negative, so the difference cannot overflow.
        total: total_credits - total_debits,
    }
}

pub(crate) fn clamp_to_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}
