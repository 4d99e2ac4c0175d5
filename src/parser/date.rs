//! Date tokens embedded in listing markup.

use chrono::NaiveDate;
use tracing::{debug, trace};

/// Parse a `YYYY-MM-DDT...` token that follows `marker` in `text`.
///
/// Returns `None` when the marker is absent, the `T` separator is missing,
/// or the date is not a real calendar date.
///
/// ```
/// use retrokanal::parser::date::parse_marked_date;
///
/// let date = parse_marked_date(r#"<time datetime="2009-11-21T20:00:00+01:00">"#, "datetime=\"");
/// assert_eq!(date.map(|d| d.to_string()), Some("2009-11-21".to_string()));
/// ```
#[must_use]
pub fn parse_marked_date(text: &str, marker: &str) -> Option<NaiveDate> {
    let Some(start) = text.find(marker).map(|i| i + marker.len()) else {
        debug!("No date found");
        return None;
    };
    let rest = &text[start..];
    let token = &rest[..rest.find('T')?];

    let mut parts = token.split('-');
    let year = parts.next()?.trim().parse().ok()?;
    let month = parts.next()?.trim().parse().ok()?;
    let day = parts.next()?.trim().parse().ok()?;
    trace!("{token} - {year}-{month}-{day}");

    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "datetime=\"";

    #[test]
    fn parses_iso_token_after_marker() {
        let date = parse_marked_date(r#"<time datetime="1987-03-05T18:30:00">"#, MARKER);
        assert_eq!(date, NaiveDate::from_ymd_opt(1987, 3, 5));
    }

    #[test]
    fn ignores_t_before_marker() {
        let text = r#"<Time class="t" datetime="2001-12-24T10:00">"#;
        assert_eq!(parse_marked_date(text, MARKER), NaiveDate::from_ymd_opt(2001, 12, 24));
    }

    #[test]
    fn missing_marker_means_no_date() {
        assert_eq!(parse_marked_date("Sändes 5 mars 1987", MARKER), None);
    }

    #[test]
    fn missing_separator_or_garbage_means_no_date() {
        assert_eq!(parse_marked_date(r#"datetime="1987-03-05""#, MARKER), None);
        assert_eq!(parse_marked_date(r#"datetime="19x7-03-05T00""#, MARKER), None);
        assert_eq!(parse_marked_date(r#"datetime="1987-02-30T00""#, MARKER), None);
    }
}
