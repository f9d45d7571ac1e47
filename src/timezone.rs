//! Resolves canonical time zone names such as "Europe/Lisbon" to UTC offsets.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// The current UTC offset of `canonical_timezone`, or `None` if the time zone
/// is not known.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    local_offset_at(canonical_timezone, OffsetDateTime::now_utc()).ok()
}

/// The UTC offset of `canonical_timezone` at the instant `at`.
///
/// # Errors
///
/// Returns [Error::InvalidTimezoneError] if the time zone is not known.
pub(crate) fn local_offset_at(
    canonical_timezone: &str,
    at: OffsetDateTime,
) -> Result<UtcOffset, Error> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&at).to_utc())
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}
