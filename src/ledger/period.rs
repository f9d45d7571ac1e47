//! The month and year a set of transactions belongs to.

use std::fmt::Display;

use time::{Date, Month, OffsetDateTime, UtcOffset};

use crate::{Error, timezone::local_offset_at};

/// Month names as displayed to and typed by users.
const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// A calendar month of a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: Month,
}

impl Period {
    /// Create a period from a month number (1-12) and a year.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidMonth] if `month` is not in 1-12.
    pub fn new(month: u8, year: i32) -> Result<Self, Error> {
        let month = Month::try_from(month).map_err(|_| Error::InvalidMonth(month))?;

        Ok(Self { year, month })
    }

    /// Create a period from a month name such as "outubro" and a year.
    ///
    /// Case and surrounding whitespace are ignored.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidMonthName] if `name` is not a month name.
    pub fn from_month_name(name: &str, year: i32) -> Result<Self, Error> {
        let normalised = name.trim().to_lowercase();

        let index = MONTH_NAMES
            .iter()
            .position(|month_name| *month_name == normalised)
            .ok_or_else(|| Error::InvalidMonthName(name.to_owned()))?;

        Self::new(index as u8 + 1, year)
    }

    /// The period containing `date`.
    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The period containing `now` at the UTC offset `local_offset`.
    pub fn current(now: OffsetDateTime, local_offset: UtcOffset) -> Self {
        Self::containing(now.to_offset(local_offset).date())
    }

    /// The period containing `now` in the time zone `canonical_timezone`,
    /// e.g. "Europe/Lisbon".
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimezoneError] if the time zone is not known.
    pub fn current_in(now: OffsetDateTime, canonical_timezone: &str) -> Result<Self, Error> {
        let local_offset = local_offset_at(canonical_timezone, now)?;

        Ok(Self::current(now, local_offset))
    }

    /// The year of the period.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the period.
    pub fn month(&self) -> Month {
        self.month
    }

    /// The month as a number from 1 to 12.
    pub fn month_number(&self) -> u8 {
        self.month as u8
    }

    /// The month as a two digit string, e.g. "03" for March.
    pub fn two_digit_month(&self) -> String {
        format!("{:02}", self.month_number())
    }

    /// The display name of the month, e.g. "outubro".
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[usize::from(self.month_number()) - 1]
    }

    /// The number of days in the month.
    pub fn days_in_month(&self) -> u8 {
        self.month.length(self.year)
    }

    /// The label of `day` in this period, e.g. "5/outubro/2024".
    pub fn day_label(&self, day: u8) -> String {
        format!("{day}/{}/{}", self.month_name(), self.year)
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.two_digit_month(), self.year)
    }
}
