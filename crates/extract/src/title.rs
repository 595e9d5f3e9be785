//! Volume and chapter numbers from free-form file names.
//!
//! Scanlation file names follow no standard at all, so this is heuristic
//! and never fails: anything it can't make sense of comes back as zero.

use crate::consts::{ANNOTATION_REGEX, CHAPTER_REGEX, DIGIT_RUN_REGEX, VOLUME_REGEX};
use regex::Regex;
use tracing::trace;

/// Volume and chapter parsed from an issue name. Zero means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Numbering {
    pub volume: u32,
    pub chapter: u32,
}

/// Remove `[...]`, `(...)` and `{...}` annotations and surrounding whitespace.
#[must_use]
pub fn strip_annotations(name: &str) -> String {
    ANNOTATION_REGEX.replace_all(name, "").trim().to_string()
}

/// Parse volume and chapter numbers out of an issue name (a file stem or a
/// chapter directory name).
///
/// - Volume: first `v12`, `vol12`, `vol.12` or `volume.12`, case-insensitive.
/// - Chapter: first `c12`, case-insensitive. Failing that, and only if no
///   volume was found either, the last standalone run of 2 to 4 digits.
///
/// # Examples
///
/// ```
/// use luxi_extract::{Numbering, parse};
///
/// assert_eq!(parse("Series - c012 [Group]"), Numbering { volume: 0, chapter: 12 });
/// assert_eq!(parse("OnePiece - v1 c001"), Numbering { volume: 1, chapter: 1 });
/// assert_eq!(parse("Blame! 045 (2001)"), Numbering { volume: 0, chapter: 45 });
/// ```
#[must_use]
pub fn parse(name: &str) -> Numbering {
    let cleaned = strip_annotations(name);
    let volume = first_number(&VOLUME_REGEX, &cleaned);
    let chapter = match first_number(&CHAPTER_REGEX, &cleaned) {
        0 if volume == 0 => last_standalone_number(&cleaned),
        chapter => chapter,
    };
    trace!(name, cleaned = %cleaned, volume, chapter, "parsed issue numbering");
    Numbering { volume, chapter }
}

/// First capture group of `regex` as a number, or 0.
fn first_number(regex: &Regex, haystack: &str) -> u32 {
    regex
        .captures(haystack)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
        .unwrap_or(0)
}

/// Last maximal digit run that is 2 to 4 digits long, or 0.
fn last_standalone_number(haystack: &str) -> u32 {
    DIGIT_RUN_REGEX
        .find_iter(haystack)
        .filter(|digits| (2..=4).contains(&digits.as_str().len()))
        .last()
        .and_then(|digits| digits.as_str().parse().ok())
        .unwrap_or(0)
}
