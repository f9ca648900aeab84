//! SMS value type: number formatting and inbound notification parsing.
//!
//! Numbers are stored in the local form they arrive in. When a country
//! code is set, `international_number()` rewrites a leading `0` into
//! `+<country code>` and `national_number()` performs the inverse;
//! without a country code both pass the number through unchanged, and the
//! two directions round-trip.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

/// Inbound notification grammar: sender number, then an empty field, then
/// the two-digit-year date, time, and timezone offset.
static CMT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\+CMT: "([+0-9]{10,})","","([/0-9]{8}),([:0-9]{8})\+([0-9]+)""#)
        .unwrap_or_else(|e| panic!("CMT grammar: {e}"))
});

/// A short message, inbound or outbound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sms {
    number: String,
    content: String,
    timestamp: i64,
    country_code: Option<u16>,
}

impl Sms {
    /// Create a message stamped with the current time.
    pub fn new(number: impl Into<String>, content: impl Into<String>) -> Self {
        Sms {
            number: number.into(),
            content: content.into(),
            timestamp: Utc::now().timestamp(),
            country_code: None,
        }
    }

    /// Replace the unix timestamp.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the country code used by the number formatting rules.
    pub fn with_country_code(mut self, country_code: u16) -> Self {
        self.country_code = Some(country_code);
        self
    }

    /// The number in the local form it was provided in.
    pub fn number(&self) -> &str {
        &self.number
    }

    /// The message body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Unix timestamp of the message.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The configured country code, if any.
    pub fn country_code(&self) -> Option<u16> {
        self.country_code
    }

    /// The number in international form.
    ///
    /// With a country code set, a leading `0` becomes `+<cc>`; otherwise
    /// the number is returned unchanged.
    pub fn international_number(&self) -> String {
        match self.country_code {
            Some(cc) if self.number.starts_with('0') => {
                format!("+{cc}{}", &self.number[1..])
            }
            _ => self.number.clone(),
        }
    }

    /// The number in national form.
    ///
    /// With a country code set, a leading `+<cc>` becomes `0`; otherwise
    /// the number is returned unchanged.
    pub fn national_number(&self) -> String {
        match self.country_code {
            Some(cc) => {
                let prefix = format!("+{cc}");
                match self.number.strip_prefix(&prefix) {
                    Some(rest) => format!("0{rest}"),
                    None => self.number.clone(),
                }
            }
            None => self.number.clone(),
        }
    }

    /// Parse an inbound `+CMT` notification from normalized reply lines.
    ///
    /// The first line must match the notification grammar; every
    /// subsequent line belongs to the body (joined with line feeds).
    /// Returns `None` when the first line is not a notification -- the
    /// absence of a message is expected traffic, not an error.
    ///
    /// The date/time pair uses a two-digit year (`23/01/01,12:00:00+01`);
    /// the timezone suffix is matched but takes no part in the computed
    /// timestamp.
    pub fn parse_cmt(lines: &[String]) -> Option<Sms> {
        let first = lines.first()?;
        let captures = CMT_RE.captures(first)?;

        let number = captures[1].to_string();
        let stamp = format!("{} {}", &captures[2], &captures[3]);
        let timestamp = NaiveDateTime::parse_from_str(&stamp, "%y/%m/%d %H:%M:%S")
            .ok()?
            .and_utc()
            .timestamp();

        let content = lines[1..].join("\n");

        Some(Sms {
            number,
            content,
            timestamp,
            country_code: None,
        })
    }
}

impl fmt::Display for Sms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = DateTime::<Utc>::from_timestamp(self.timestamp, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| self.timestamp.to_string());
        write!(
            f,
            "SMS received on {} from {}:\n\t{}",
            when,
            self.number(),
            self.content()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    // -----------------------------------------------------------------
    // Number formatting
    // -----------------------------------------------------------------

    #[test]
    fn internationalise_with_country_code() {
        let sms = Sms::new("0612345678", "").with_country_code(33);
        assert_eq!(sms.international_number(), "+33612345678");
    }

    #[test]
    fn internationalise_without_country_code_passes_through() {
        let sms = Sms::new("0612345678", "");
        assert_eq!(sms.international_number(), "0612345678");
    }

    #[test]
    fn internationalise_leaves_non_local_numbers() {
        let sms = Sms::new("+33612345678", "").with_country_code(33);
        assert_eq!(sms.international_number(), "+33612345678");
    }

    #[test]
    fn nationalise_with_country_code() {
        let sms = Sms::new("+33612345678", "").with_country_code(33);
        assert_eq!(sms.national_number(), "0612345678");
    }

    #[test]
    fn nationalise_without_country_code_passes_through() {
        let sms = Sms::new("+33612345678", "");
        assert_eq!(sms.national_number(), "+33612345678");
    }

    #[test]
    fn nationalise_leaves_other_prefixes() {
        let sms = Sms::new("+44612345678", "").with_country_code(33);
        assert_eq!(sms.national_number(), "+44612345678");
    }

    #[test]
    fn number_formatting_round_trips() {
        let local = "0612345678";
        let sms = Sms::new(local, "").with_country_code(33);
        let international = sms.international_number();
        let back = Sms::new(international, "").with_country_code(33);
        assert_eq!(back.national_number(), local);
    }

    // -----------------------------------------------------------------
    // Inbound notification parsing
    // -----------------------------------------------------------------

    #[test]
    fn parse_single_line_body() {
        let input = lines(&[
            r#"+CMT: "+3312345678","","23/01/01,12:00:00+01""#,
            "Hello",
        ]);
        let sms = Sms::parse_cmt(&input).unwrap();
        assert_eq!(sms.number(), "+3312345678");
        assert_eq!(sms.content(), "Hello");
        // 2023-01-01T12:00:00, timezone suffix ignored.
        assert_eq!(sms.timestamp(), 1_672_574_400);
    }

    #[test]
    fn parse_multi_line_body() {
        let input = lines(&[
            r#"+CMT: "+3312345678","","23/01/01,12:00:00+01""#,
            "first line",
            "second line",
        ]);
        let sms = Sms::parse_cmt(&input).unwrap();
        assert_eq!(sms.content(), "first line\nsecond line");
    }

    #[test]
    fn parse_empty_body() {
        let input = lines(&[r#"+CMT: "+3312345678","","23/01/01,12:00:00+01""#]);
        let sms = Sms::parse_cmt(&input).unwrap();
        assert!(sms.content().is_empty());
    }

    #[test]
    fn parse_rejects_short_numbers() {
        let input = lines(&[r#"+CMT: "+331234","","23/01/01,12:00:00+01""#, "Hi"]);
        assert!(Sms::parse_cmt(&input).is_none());
    }

    #[test]
    fn parse_rejects_ordinary_replies() {
        assert!(Sms::parse_cmt(&lines(&["OK"])).is_none());
        assert!(Sms::parse_cmt(&lines(&[])).is_none());
        assert!(Sms::parse_cmt(&lines(&["+CSQ: 21,99", "OK"])).is_none());
    }

    #[test]
    fn parse_rejects_malformed_timestamp_fields() {
        let input = lines(&[r#"+CMT: "+3312345678","","2023/1/1,12:00:00+01""#, "Hi"]);
        assert!(Sms::parse_cmt(&input).is_none());
    }

    #[test]
    fn display_includes_number_and_body() {
        let sms = Sms::new("+3312345678", "Hello").with_timestamp(1_672_574_400);
        let printed = sms.to_string();
        assert!(printed.contains("+3312345678"));
        assert!(printed.contains("Hello"));
        assert!(printed.contains("2023-01-01T12:00:00"));
    }

    #[test]
    fn new_message_is_stamped_now() {
        let before = Utc::now().timestamp();
        let sms = Sms::new("0612345678", "hi");
        let after = Utc::now().timestamp();
        assert!(sms.timestamp() >= before && sms.timestamp() <= after);
    }
}
