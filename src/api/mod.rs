//! High-level entry points.
//!
//! [`redact_document`] drives a sequence of page requests through the
//! orchestrator and aggregates the outcome; [`redact_by_text`] derives the
//! redaction rectangles from a text search over the extractor's letters.
//!
//! Sequential requests against one document are processed in order: each
//! pass rewrites content streams and changes byte offsets, so callers that
//! can pre-union their rectangles into a single request per page should.

use crate::cancel::CancelToken;
use crate::compliance::{PdfALevel, PdfAPreserver};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::interfaces::{CharacterMapDecoder, PdfStore, TextExtractor};
use crate::redact::letters::find_occurrences;
use crate::redact::options::{RedactOptions, RedactionArea, RedactionRequest};
use crate::redact::page::{PageOutcome, redact_page};
use crate::redact::rotation::RotationBridge;
use serde::{Deserialize, Serialize};

/// Per-page errors beyond this count are dropped from the report.
const MAX_REPORTED_ERRORS: usize = 10;
/// Pad around matched letters when deriving redaction rectangles, in points.
const SEARCH_PAD: f64 = 1.0;

/// One reported per-page failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageError {
    /// The page the error occurred on
    pub page_index: usize,
    /// Human-readable description
    pub message: String,
}

/// Aggregate result of a redaction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionReport {
    /// Pages whose content stream was rewritten
    pub pages_redacted: usize,
    /// Pages skipped because of a local error
    pub pages_skipped: usize,
    /// Occurrences located by text-driven redaction
    pub match_count: usize,
    /// Text operations that lost characters
    pub removed_text: usize,
    /// Images dropped or blacked out
    pub removed_images: usize,
    /// Paths deleted or cut
    pub removed_paths: usize,
    /// Annotations deleted
    pub removed_annotations: usize,
    /// The first ten per-page errors
    pub errors: Vec<PageError>,
}

impl RedactionReport {
    fn absorb(&mut self, outcome: PageOutcome) {
        self.pages_redacted += 1;
        self.removed_text += outcome.removed_text;
        self.removed_images += outcome.removed_images;
        self.removed_paths += outcome.removed_paths;
        self.removed_annotations += outcome.removed_annotations;
    }

    fn record_error(&mut self, page_index: usize, error: &Error) {
        self.pages_skipped += 1;
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(PageError {
                page_index,
                message: error.to_string(),
            });
        }
    }

    /// Serialize the report as pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Run a sequence of redaction requests against a document, then hand the
/// store to the PDF/A preserver and save.
///
/// Local errors (malformed stream, validation failure) skip the affected
/// page and are recorded in the report; cancellation aborts the run.
pub fn redact_document(
    store: &mut dyn PdfStore,
    decoder: &dyn CharacterMapDecoder,
    extractor: &dyn TextExtractor,
    requests: &[RedactionRequest],
    options: &RedactOptions,
    preserver: &dyn PdfAPreserver,
    pdfa_level: PdfALevel,
    cancel: &CancelToken,
) -> Result<RedactionReport> {
    let mut report = RedactionReport::default();
    for request in requests {
        match redact_page(
            store,
            decoder,
            extractor,
            request.page_index,
            &request.areas,
            options,
            cancel,
        ) {
            Ok(outcome) => report.absorb(outcome),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(error) => report.record_error(request.page_index, &error),
        }
    }
    preserver.preserve(store, pdfa_level)?;
    store.save()?;
    Ok(report)
}

/// Redact every occurrence of `search` across the document.
///
/// For each page the extractor's letters are consulted, the (normalized)
/// search string located, and one redaction rectangle derived per occurrence
/// as the bounding box of its letters expanded by a small pad.
pub fn redact_by_text(
    store: &mut dyn PdfStore,
    decoder: &dyn CharacterMapDecoder,
    extractor: &dyn TextExtractor,
    search: &str,
    options: &RedactOptions,
    preserver: &dyn PdfAPreserver,
    pdfa_level: PdfALevel,
    cancel: &CancelToken,
) -> Result<RedactionReport> {
    let mut requests = Vec::new();
    let mut match_count = 0usize;
    let mut early_errors: Vec<PageError> = Vec::new();

    for page_index in 0..store.page_count() {
        cancel.check()?;
        let letters = match extractor.get_page_letters(page_index) {
            Ok(letters) => letters,
            Err(error) => {
                early_errors.push(PageError {
                    page_index,
                    message: error.to_string(),
                });
                continue;
            },
        };
        let occurrences = find_occurrences(&letters, search, options.case_sensitive);
        if occurrences.is_empty() {
            continue;
        }
        let (width, height) = store.get_page_user_space_size(page_index)?;
        let rotation = store.get_page_rotation(page_index)?;
        let bridge = RotationBridge::new(rotation, width, height);

        let mut areas = Vec::with_capacity(occurrences.len());
        for letter_indices in &occurrences {
            let visual = letter_indices
                .iter()
                .map(|&i| letters[i].1)
                .reduce(|a, b| a.union(&b));
            if let Some(visual) = visual {
                let rect = bridge.visual_rect_to_user(visual).expand(SEARCH_PAD);
                areas.push(RedactionArea::new(rect));
            }
        }
        match_count += occurrences.len();
        requests.push(RedactionRequest { page_index, areas });
    }

    let mut report = redact_document(
        store, decoder, extractor, &requests, options, preserver, pdfa_level, cancel,
    )?;
    report.match_count = match_count;
    for error in early_errors {
        report.pages_skipped += 1;
        if report.errors.len() < MAX_REPORTED_ERRORS {
            report.errors.push(error);
        }
    }
    Ok(report)
}

/// Derive the union rectangle of one occurrence, for callers that want the
/// areas without running the redaction.
pub fn occurrence_rect(letters: &[(char, Rect)], letter_indices: &[usize]) -> Option<Rect> {
    letter_indices
        .iter()
        .filter_map(|&i| letters.get(i).map(|&(_, r)| r))
        .reduce(|a, b| a.union(&b))
        .map(|r| r.expand(SEARCH_PAD))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes() {
        let mut report = RedactionReport::default();
        report.absorb(PageOutcome {
            removed_text: 2,
            removed_images: 1,
            removed_paths: 0,
            removed_annotations: 3,
        });
        let json = report.to_json();
        assert!(json.contains("\"pages_redacted\": 1"));
        assert!(json.contains("\"removed_text\": 2"));
    }

    #[test]
    fn test_error_cap() {
        let mut report = RedactionReport::default();
        for page in 0..20 {
            report.record_error(page, &Error::ValidationFailure("x".into()));
        }
        assert_eq!(report.pages_skipped, 20);
        assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS);
    }

    #[test]
    fn test_occurrence_rect_unions_and_pads() {
        let letters = [
            ('a', Rect::new(0.0, 0.0, 6.0, 12.0)),
            ('b', Rect::new(6.0, 0.0, 12.0, 12.0)),
        ];
        let rect = occurrence_rect(&letters, &[0, 1]).unwrap();
        assert_eq!(rect, Rect::new(-1.0, -1.0, 13.0, 13.0));
    }
}
