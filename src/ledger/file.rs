//! Reads exported transactions from JSON or CSV files.

use std::{fs::File, io::Read, path::Path};

use crate::{Error, ledger::TransactionRecord};

/// Read a JSON array of backend transaction records.
///
/// # Errors
///
/// Returns [Error::InvalidTransactions] if the input is not a list of
/// transaction records.
pub fn read_json_transactions(reader: impl Read) -> Result<Vec<TransactionRecord>, Error> {
    serde_json::from_reader(reader).map_err(|error| Error::InvalidTransactions(error.to_string()))
}

/// Read transaction records from CSV with the header
/// `_id,day,month,year,description,value,entry`.
///
/// # Errors
///
/// Returns [Error::InvalidTransactions] naming the first row that could not be
/// read.
pub fn read_csv_transactions(reader: impl Read) -> Result<Vec<TransactionRecord>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    reader
        .deserialize::<TransactionRecord>()
        .enumerate()
        .map(|(row_index, result)| {
            result.map_err(|error| {
                Error::InvalidTransactions(format!("row {}: {error}", row_index + 1))
            })
        })
        .collect()
}

/// Read transaction records from `path`, as CSV if the file extension is
/// `csv` and as JSON otherwise.
///
/// # Errors
///
/// Returns [Error::InvalidTransactions] if the file could not be opened or
/// parsed.
pub fn load_transactions(path: &Path) -> Result<Vec<TransactionRecord>, Error> {
    let file = File::open(path).map_err(|error| {
        Error::InvalidTransactions(format!("could not open {}: {error}", path.display()))
    })?;

    let is_csv = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));

    let records = if is_csv {
        read_csv_transactions(file)?
    } else {
        read_json_transactions(file)?
    };
    tracing::debug!("Read {} transactions from {}.", records.len(), path.display());

    Ok(records)
}
