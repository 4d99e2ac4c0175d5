//! Subtitle normalization.
//!
//! Some archive subtitles carry timestamps one hour off: cue times start
//! at `1:` or `10:` where `0:`/`00:` was meant. The fix is a textual
//! substitution on the first hour digit, applied at the start of a line
//! and right after the `-->` timer arrow. Everything else is left
//! byte-for-byte intact.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_START_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^1(\d?:)").expect("static subtitle pattern"));

static ARROW_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--> 1(\d?):").expect("static subtitle pattern"));

/// Rewrite shifted cue hours (`1:` → `0:`, `1x:` → `0x:`).
///
/// Idempotent: every rewritten hour starts with `0`, which no pattern
/// matches again.
///
/// ```
/// use retrokanal::stream::subtitle::correct_hours;
///
/// assert_eq!(correct_hours("1:23:45 --> 1:23:50"), "0:23:45 --> 0:23:50");
/// ```
#[must_use]
pub fn correct_hours(content: &str) -> String {
    let fixed: Cow<'_, str> = LINE_START_HOUR.replace_all(content, "0${1}");
    ARROW_HOUR.replace_all(&fixed, "--> 0${1}:").into_owned()
}

/// Cache file name for a subtitle URL: MD5 hex digest plus `.srt`.
#[must_use]
pub fn subtitle_file_name(url: &str) -> String {
    format!("{:x}.srt", md5::compute(url.as_bytes()))
}
