//! Transaction records as returned by the backend, and drafts of new ones.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de};
use time::Date;

use crate::{Error, ledger::Period};

/// The server-assigned ID of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create an ID from the string the server assigned.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => Self(id),
            RawId::Number(id) => Self(id.to_string()),
        })
    }
}

/// Whether a transaction adds money to or takes money from the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entry {
    /// Money coming in.
    Credit,
    /// Money going out.
    Debit,
    /// Any other entry type sent by the backend. These are excluded from
    /// totals and balances.
    #[serde(other)]
    Unrecognized,
}

/// A transaction stored by the backend.
///
/// The backend may send the date fields and the value either as numbers or as
/// numeric strings, both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The server-assigned ID.
    #[serde(rename = "_id", alias = "id")]
    pub id: TransactionId,
    /// The day of the month.
    #[serde(deserialize_with = "number_or_string")]
    pub day: u8,
    /// The month, 1-12.
    #[serde(deserialize_with = "number_or_string")]
    pub month: u8,
    /// The year.
    #[serde(deserialize_with = "number_or_string")]
    pub year: i32,
    /// What the transaction was for.
    #[serde(default)]
    pub description: String,
    /// The amount in minor currency units (e.g. cents). `None` if the backend
    /// sent no usable value.
    #[serde(default, deserialize_with = "optional_minor_units")]
    pub value: Option<i64>,
    /// Whether the value is a credit or a debit.
    pub entry: Entry,
}

impl TransactionRecord {
    /// The value with its direction applied: positive for credits, negative
    /// for debits.
    ///
    /// Returns `None` if there is no value or the entry type is not
    /// recognised.
    pub fn signed_value(&self) -> Option<i64> {
        let value = self.value?;

        match self.entry {
            Entry::Credit => Some(value),
            Entry::Debit => Some(-value),
            Entry::Unrecognized => None,
        }
    }

    /// The period the transaction belongs to.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidMonth] if the record's month is not in 1-12.
    pub fn period(&self) -> Result<Period, Error> {
        Period::new(self.month, self.year)
    }

    /// The date label shown in charts, e.g. "5/outubro/2024".
    pub fn label(&self) -> String {
        match self.period() {
            Ok(period) => period.day_label(self.day),
            Err(_) => format!("{}/{}/{}", self.day, self.month, self.year),
        }
    }
}

/// A transaction the user wants to add, before the backend has assigned it an
/// ID.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    /// The user that owns the transaction.
    pub user: String,
    /// The day of the month.
    pub day: u8,
    /// The month, 1-12.
    pub month: u8,
    /// The year.
    pub year: i32,
    /// What the transaction was for.
    pub description: String,
    /// The amount in minor currency units.
    pub value: i64,
    /// Whether the value is a credit or a debit.
    pub entry: Entry,
}

impl NewTransaction {
    /// Create a transaction for `period`, dated on the day of `today`.
    ///
    /// If `today` is past the end of the selected month (e.g. the 31st while
    /// viewing April), the last day of the month is used instead.
    ///
    /// # Errors
    ///
    /// Returns [Error::NegativeValue] if `value` is negative, or
    /// [Error::InvalidTransactions] if `entry` is not a credit or debit.
    pub fn new(
        user: &str,
        description: &str,
        value: i64,
        entry: Entry,
        period: Period,
        today: Date,
    ) -> Result<Self, Error> {
        if value < 0 {
            return Err(Error::NegativeValue(value));
        }

        if entry == Entry::Unrecognized {
            return Err(Error::InvalidTransactions(
                "new transactions must be a credit or a debit".to_owned(),
            ));
        }

        Ok(Self {
            user: user.to_owned(),
            day: today.day().min(period.days_in_month()),
            month: period.month_number(),
            year: period.year(),
            description: description.to_owned(),
            value,
            entry,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    Text(String),
}

fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(number) => Ok(number),
        NumberOrString::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

fn optional_minor_units<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<NumberOrString<i64>>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrString::Number(number)) => number,
        Some(NumberOrString::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(NumberOrString::Text(text)) => text.trim().parse().map_err(de::Error::custom)?,
    };

    if value < 0 {
        return Err(de::Error::custom(Error::NegativeValue(value)));
    }

    Ok(Some(value))
}
