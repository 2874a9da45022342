//! Locating suggestion spans inside a live buffer.
//!
//! Suggestions reference text by content, never by offset, because offsets
//! drift as soon as the user types. Model output also quotes spans loosely:
//! newlines come back as single spaces and letter case occasionally changes.
//! [`locate`] therefore tries an exact search first and only then falls back
//! to a pattern where every run of spaces matches any run of whitespace.
//!
//! All ranges are half-open byte ranges into the searched text.

use regex::RegexBuilder;
use std::ops::Range;
use tracing::trace;

/// Find the first occurrence of `target` in `text`.
///
/// Search order:
/// 1. exact substring
/// 2. whitespace-flexible pattern, case-sensitive
/// 3. whitespace-flexible pattern, case-insensitive
///
/// A blank `target` never matches.
pub fn locate(text: &str, target: &str) -> Option<Range<usize>> {
    if target.trim().is_empty() {
        return None;
    }

    if let Some(start) = text.find(target) {
        return Some(start..start + target.len());
    }

    locate_flexible(text, target)
}

/// Whether [`locate`] would find `target` in `text`.
pub fn contains(text: &str, target: &str) -> bool {
    locate(text, target).is_some()
}

/// Exact search for `target` starting at or after byte `offset`.
///
/// Offsets recorded earlier may no longer sit on a char boundary once the
/// text has changed; the search then starts at the next boundary.
pub fn locate_from(text: &str, target: &str, offset: usize) -> Option<Range<usize>> {
    if target.is_empty() || offset > text.len() {
        return None;
    }

    let from = (offset..=text.len()).find(|&i| text.is_char_boundary(i))?;
    text[from..]
        .find(target)
        .map(|relative| from + relative..from + relative + target.len())
}

fn locate_flexible(text: &str, target: &str) -> Option<Range<usize>> {
    let pattern = flexible_pattern(target);

    for case_insensitive in [false, true] {
        let regex = match RegexBuilder::new(&pattern)
            .case_insensitive(case_insensitive)
            .build()
        {
            Ok(regex) => regex,
            Err(err) => {
                trace!("Could not build span pattern {pattern:?}: {err}");
                return None;
            },
        };

        if let Some(found) = regex.find(text) {
            return Some(found.range());
        }
    }

    None
}

/// Escape `target` and let each run of spaces match one or more whitespace
/// characters.
fn flexible_pattern(target: &str) -> String {
    target
        .trim()
        .split(' ')
        .filter(|part| !part.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins() {
        assert_eq!(locate("I has went to store.", "has went"), Some(2..10));
    }

    #[test]
    fn first_occurrence() {
        assert_eq!(locate("the cat and the dog", "the"), Some(0..3));
    }

    #[test]
    fn whitespace_runs_are_flexible() {
        let text = "I  like\ncats";
        assert_eq!(locate(text, "I like cats"), Some(0..text.len()));
    }

    #[test]
    fn runs_of_spaces_in_target_collapse() {
        assert_eq!(locate("a b c", "a   b"), Some(0..3));
    }

    #[test]
    fn case_insensitive_is_last_resort() {
        assert_eq!(locate("Him went home", "him went"), Some(0..8));
        // Case-sensitive flexible match is preferred over an earlier
        // case-insensitive one.
        assert_eq!(locate("HIM  went, him  went", "him went"), Some(11..20));
    }

    #[test]
    fn pattern_metacharacters_are_literal() {
        assert_eq!(locate("cost is $5 (approx.)", "$5  (approx.)"), Some(8..20));
        assert_eq!(locate("abc", "a.c"), None);
    }

    #[test]
    fn blank_target_never_matches() {
        assert_eq!(locate("anything", ""), None);
        assert_eq!(locate("anything", "   "), None);
        assert!(!contains("   ", " "));
    }

    #[test]
    fn missing_target() {
        assert_eq!(locate("hello world", "goodbye"), None);
    }

    #[test]
    fn locate_from_skips_earlier_occurrences() {
        let text = "went and went";
        assert_eq!(locate_from(text, "went", 0), Some(0..4));
        assert_eq!(locate_from(text, "went", 1), Some(9..13));
        assert_eq!(locate_from(text, "went", 10), None);
        assert_eq!(locate_from(text, "went", 100), None);
    }

    #[test]
    fn locate_from_moves_to_char_boundary() {
        let text = "héllo héllo";
        // Offset 2 is inside the two-byte 'é'.
        assert_eq!(locate_from(text, "llo", 2), Some(3..6));
    }
}
