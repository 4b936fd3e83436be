use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

/// Wire format for dates sent to the server.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date as the server emits it.
///
/// Accepts both `2023-11-14` and HTTP dates such as
/// `Tue, 14 Nov 2023 00:00:00 GMT`.
#[must_use]
pub fn parse_server_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(date);
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Serde helper for optional server dates.
///
/// Missing, null and unparseable values all decode to `None`.
///
/// # Errors
///
/// Returns an error only if the field is present with a non-string,
/// non-null JSON type.
pub fn deserialize_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_server_date))
}

/// Deterministic date for tests and examples (2023-11-14).
///
/// # Panics
///
/// Panics if the fixed date cannot be represented.
#[must_use]
pub fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 11, 14).expect("fixed date should be valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_server_date("2023-11-14"), Some(fixed_date()));
    }

    #[test]
    fn parses_http_dates() {
        assert_eq!(
            parse_server_date("Tue, 14 Nov 2023 00:00:00 GMT"),
            Some(fixed_date())
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_server_date("next tuesday"), None);
    }
}
