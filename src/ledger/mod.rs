//! Transactions of a month and the totals and running balance derived from
//! them.

mod balance;
mod book;
mod file;
mod period;
mod record;
mod set;
mod totals;

pub use balance::{BalancePoint, BalanceSeries, compute_balance_series};
pub use book::{LedgerBook, TransactionBackend};
pub use file::{load_transactions, read_csv_transactions, read_json_transactions};
pub use period::Period;
pub use record::{Entry, NewTransaction, TransactionId, TransactionRecord};
pub use set::TransactionSet;
pub use totals::{AggregateTotals, compute_totals};
