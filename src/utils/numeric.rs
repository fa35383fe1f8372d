//! Numeric cleaning for free-text values in the source extracts.
//!
//! Casemix measures arrive with decimal commas and percent signs; tariff
//! columns arrive as currency text ("1 234,56 €"). Unparsable values
//! resolve to `None`, never to zero, and `None` propagates through all
//! downstream arithmetic.

/// Parse a decimal value that may use a comma as the decimal separator
/// and may carry a trailing percent sign.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Clean a currency amount from free text.
///
/// Keeps digits, comma and dot, drops everything else (currency symbols,
/// thousands separators), then normalizes the decimal comma.
#[must_use]
pub fn clean_tariff(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Parse a whole count (patient volume). Counts with a decimal comma and a
/// zero fraction are accepted; anything negative or fractional is not.
#[must_use]
pub fn parse_count(text: &str) -> Option<u32> {
    let value = parse_decimal(text)?;
    if value < 0.0 || value.fract() != 0.0 {
        return None;
    }
    if value > f64::from(u32::MAX) {
        return None;
    }
    Some(value as u32)
}
