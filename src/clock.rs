//! Wall-clock time source shared by the session components.

use time::OffsetDateTime;

/// A source of the current wall-clock time.
///
/// The session guard only ever compares times read from the same shared store,
/// so the clock does not need to be monotonic.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> OffsetDateTime;
}

/// A [Clock] that reads the system time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Milliseconds since the Unix epoch, the format used for timestamps in the
/// session store.
pub fn epoch_millis(date_time: OffsetDateTime) -> i64 {
    (date_time.unix_timestamp_nanos() / 1_000_000) as i64
}

/// The UTC date time `millis` milliseconds after the Unix epoch, or `None` if
/// it is outside of the range supported by [OffsetDateTime].
pub fn from_epoch_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

#[cfg(test)]
mod clock_tests {
    use time::{UtcOffset, macros::datetime};

    use crate::clock::{epoch_millis, from_epoch_millis};

    #[test]
    fn epoch_millis_round_trips_to_millisecond_precision() {
        let date_time = datetime!(2024-10-05 14:30:12.345).assume_offset(UtcOffset::UTC);

        let millis = epoch_millis(date_time);

        assert_eq!(millis, 1_728_138_612_345);
        assert_eq!(from_epoch_millis(millis), Some(date_time));
    }

    #[test]
    fn from_epoch_millis_rejects_out_of_range_values() {
        assert_eq!(from_epoch_millis(i64::MAX), None);
    }
}
