//! Displays amounts stored in minor currency units.

/// Format `minor_units` (e.g. cents) the way amounts are written in Portugal,
/// with a dot between thousands and a comma before the two decimal places.
///
/// ```
/// use accounting_client::format_minor_units;
///
/// assert_eq!(format_minor_units(123_456), "1.234,56");
/// assert_eq!(format_minor_units(-300), "-3,00");
/// ```
pub fn format_minor_units(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let magnitude = minor_units.unsigned_abs();
    let whole = (magnitude / 100).to_string();
    let cents = magnitude % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{sign}{grouped},{cents:02}")
}
