//! Letter index: pairing text operations with extractor glyphs.
//!
//! The extractor reports the page's letters in reading order with their glyph
//! rectangles. To decide which characters of a text-showing operation fall
//! inside a redaction area, each operation's decoded text is matched against
//! a contiguous run of those letters. Matching is by *content*, not by
//! position: content matching is rotation-invariant and robust to the small
//! geometric discrepancies between the extractor's glyph boxes and the
//! content stream's own coordinates.
//!
//! Both sides are normalized before comparison: whitespace runs collapse to
//! a single space, typographic apostrophes fold to ASCII, and en/em dashes
//! fold to hyphen-minus.

use crate::geometry::Rect;
use log::debug;

/// A Unicode codepoint with its glyph rectangle, in page user-space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letter {
    /// The codepoint
    pub code: char,
    /// Glyph rectangle
    pub rect: Rect,
}

/// A pairing of one character of an operation's text with a page letter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterMatch {
    /// Character index into the operation's decoded text (`chars` order)
    pub char_index: usize,
    /// The matched letter's glyph rectangle
    pub rect: Rect,
}

/// Fold typographic punctuation to its ASCII equivalent.
fn fold_char(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{2013}' | '\u{2014}' => '-',
        _ => c,
    }
}

fn lower(c: char) -> char {
    if c.is_ascii() {
        c.to_ascii_lowercase()
    } else {
        c.to_lowercase().next().unwrap_or(c)
    }
}

/// Normalize text for matching.
///
/// Collapses whitespace runs to a single space, folds typographic
/// apostrophes and dashes, and trims leading/trailing whitespace.
///
/// # Examples
///
/// ```
/// use redact_oxide::redact::letters::normalize_text;
///
/// assert_eq!(normalize_text("  John\u{2019}s   Book ", true), "John's Book");
/// assert_eq!(normalize_text("A\u{2014}B", true), "A-B");
/// assert_eq!(normalize_text("HeLLo", false), "hello");
/// ```
pub fn normalize_text(text: &str, case_sensitive: bool) -> String {
    normalize_indexed(text.chars().enumerate(), case_sensitive)
        .into_iter()
        .map(|(c, _)| c)
        .collect()
}

/// Normalize a character sequence, keeping each output character's source
/// index. Collapsed whitespace maps to the index of the run's first char.
fn normalize_indexed(
    chars: impl Iterator<Item = (usize, char)>,
    case_sensitive: bool,
) -> Vec<(char, usize)> {
    let mut out: Vec<(char, usize)> = Vec::new();
    let mut pending_space: Option<usize> = None;
    for (index, c) in chars {
        if c.is_whitespace() {
            if !out.is_empty() && pending_space.is_none() {
                pending_space = Some(index);
            }
            continue;
        }
        if let Some(space_index) = pending_space.take() {
            out.push((' ', space_index));
        }
        let folded = fold_char(c);
        let folded = if case_sensitive { folded } else { lower(folded) };
        out.push((folded, index));
    }
    out
}

/// Index over a page's letters, consumed operation by operation.
///
/// A cursor tracks how far into the page the previous operations matched, so
/// repeated identical strings map to successive occurrences rather than all
/// landing on the first one.
pub struct LetterIndex {
    letters: Vec<Letter>,
    normalized: Vec<(char, usize)>,
    cursor: usize,
    case_sensitive: bool,
}

impl LetterIndex {
    /// Build an index over a page's letters (rectangles already in user
    /// space).
    pub fn new(letters: Vec<Letter>, case_sensitive: bool) -> Self {
        let normalized = normalize_indexed(
            letters.iter().map(|l| l.code).enumerate(),
            case_sensitive,
        );
        Self {
            letters,
            normalized,
            cursor: 0,
            case_sensitive,
        }
    }

    /// Number of letters on the page.
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    /// Whether the page has no letters.
    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Match an operation's decoded text against the page letters.
    ///
    /// Returns one entry per operation character that found a letter; an
    /// empty result means the operation is treated as a whole-operation atom
    /// by the segmenter.
    pub fn match_operation(&mut self, text: &str) -> Vec<LetterMatch> {
        let pattern = normalize_indexed(text.chars().enumerate(), self.case_sensitive);
        if pattern.is_empty() {
            return Vec::new();
        }
        let found = self
            .find_from(&pattern, self.cursor)
            .or_else(|| self.find_from(&pattern, 0));
        let Some(at) = found else {
            debug!("no contiguous letter match for operation text {:?}", text);
            return Vec::new();
        };
        self.cursor = at + pattern.len();
        pattern
            .iter()
            .enumerate()
            .map(|(k, &(_, char_index))| LetterMatch {
                char_index,
                rect: self.letters[self.normalized[at + k].1].rect,
            })
            .collect()
    }

    fn find_from(&self, pattern: &[(char, usize)], start: usize) -> Option<usize> {
        if self.normalized.len() < pattern.len() {
            return None;
        }
        (start..=self.normalized.len() - pattern.len()).find(|&i| {
            pattern
                .iter()
                .zip(&self.normalized[i..])
                .all(|(&(p, _), &(c, _))| p == c)
        })
    }
}

/// Find every non-overlapping occurrence of `pattern` in a page's letters.
///
/// Returns, per occurrence, the indices of the matched letters. Used by
/// text-driven redaction to derive redaction rectangles.
pub fn find_occurrences(
    letters: &[(char, Rect)],
    pattern: &str,
    case_sensitive: bool,
) -> Vec<Vec<usize>> {
    let haystack = normalize_indexed(
        letters.iter().map(|&(c, _)| c).enumerate(),
        case_sensitive,
    );
    let needle = normalize_indexed(pattern.chars().enumerate(), case_sensitive);
    if needle.is_empty() || haystack.len() < needle.len() {
        return Vec::new();
    }
    let mut occurrences = Vec::new();
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        let matches = needle
            .iter()
            .zip(&haystack[i..])
            .all(|(&(p, _), &(c, _))| p == c);
        if matches {
            occurrences.push(
                haystack[i..i + needle.len()]
                    .iter()
                    .map(|&(_, letter_index)| letter_index)
                    .collect(),
            );
            i += needle.len();
        } else {
            i += 1;
        }
    }
    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters_of(text: &str) -> Vec<Letter> {
        text.chars()
            .enumerate()
            .map(|(i, c)| Letter {
                code: c,
                rect: Rect::from_origin(i as f64 * 6.0, 0.0, 6.0, 12.0),
            })
            .collect()
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("a  b\t\nc", true), "a b c");
        assert_eq!(normalize_text("   ", true), "");
    }

    #[test]
    fn test_normalize_folds_punctuation() {
        assert_eq!(normalize_text("John\u{2019}s", true), "John's");
        assert_eq!(normalize_text("\u{2018}q\u{2018}", true), "'q'");
        assert_eq!(normalize_text("1\u{2013}2\u{2014}3", true), "1-2-3");
    }

    #[test]
    fn test_match_returns_rects() {
        let mut index = LetterIndex::new(letters_of("Hello World"), true);
        let matches = index.match_operation("World");
        assert_eq!(matches.len(), 5);
        assert_eq!(matches[0].char_index, 0);
        // 'W' is the 7th letter on the page
        assert_eq!(matches[0].rect.left, 36.0);
    }

    #[test]
    fn test_cursor_advances_for_repeats() {
        let mut index = LetterIndex::new(letters_of("ab ab"), true);
        let first = index.match_operation("ab");
        let second = index.match_operation("ab");
        assert_eq!(first[0].rect.left, 0.0);
        assert_eq!(second[0].rect.left, 18.0);
    }

    #[test]
    fn test_cursor_wraps_to_start() {
        let mut index = LetterIndex::new(letters_of("xy"), true);
        assert_eq!(index.match_operation("xy").len(), 2);
        // Second identical request wraps and matches the same letters again
        assert_eq!(index.match_operation("xy").len(), 2);
    }

    #[test]
    fn test_no_match_is_empty() {
        let mut index = LetterIndex::new(letters_of("abc"), true);
        assert!(index.match_operation("zzz").is_empty());
        assert!(index.match_operation("").is_empty());
    }

    #[test]
    fn test_case_folding_option() {
        let mut strict = LetterIndex::new(letters_of("HELLO"), true);
        assert!(strict.match_operation("hello").is_empty());
        let mut folded = LetterIndex::new(letters_of("HELLO"), false);
        assert_eq!(folded.match_operation("hello").len(), 5);
    }

    #[test]
    fn test_unicode_apostrophe_matches_ascii_pattern() {
        let mut index = LetterIndex::new(letters_of("John\u{2019}s Book"), true);
        let matches = index.match_operation("John's Book");
        assert_eq!(matches.len(), 11);
    }

    #[test]
    fn test_find_occurrences() {
        let letters: Vec<(char, Rect)> = "ab ab ab"
            .chars()
            .enumerate()
            .map(|(i, c)| (c, Rect::from_origin(i as f64, 0.0, 1.0, 1.0)))
            .collect();
        let found = find_occurrences(&letters, "ab", true);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], vec![0, 1]);
        assert_eq!(found[2], vec![6, 7]);
        assert!(find_occurrences(&letters, "zz", true).is_empty());
    }
}
