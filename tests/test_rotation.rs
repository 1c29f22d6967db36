//! Redaction on rotated pages, including the sequential pass that exposed
//! the 270° coordinate bug class.


use redact_oxide::redact::letters::find_occurrences;
use redact_oxide::{
    CancelToken, NoopPreserver, PdfALevel, RedactOptions, TextExtractor, redact_by_text,
};
use stream_support::{AsciiDecoder, MockDoc, PageData, extract_text, squash_spaces};

fn three_line_page(rotation: u16) -> MockDoc {
    let content = b"BT /F1 12 Tf 1 0 0 1 72 700 Tm (Name: John Doe) Tj ET\n\
                    BT /F1 12 Tf 1 0 0 1 72 680 Tm (SSN: 123-45-6789) Tj ET\n\
                    BT /F1 12 Tf 1 0 0 1 72 660 Tm (Phone: 555-1234) Tj ET";
    MockDoc::new(vec![PageData::letter_page(content).with_rotation(rotation)])
}

fn redact(doc: &MockDoc, search: &str) -> usize {
    let mut store = doc.store();
    let extractor = doc.extractor();
    let report = redact_by_text(
        &mut store,
        &AsciiDecoder,
        &extractor,
        search,
        &RedactOptions::new(),
        &NoopPreserver,
        PdfALevel::None,
        &CancelToken::new(),
    )
    .unwrap();
    report.match_count
}

#[test]
fn scenario_s4_sequential_redaction_on_rotated_page() {
    let doc = three_line_page(270);

    // First pass removes the name
    assert_eq!(redact(&doc, "John Doe"), 1);
    let after_first = extract_text(&doc, 0);
    assert!(!after_first.contains("John Doe"));
    assert!(after_first.contains("123-45-6789"));

    // Second pass runs on the produced document
    assert_eq!(redact(&doc, "123-45-6789"), 1);
    let text = extract_text(&doc, 0);
    assert!(text.contains("Phone"));
    assert!(!text.contains("John Doe"));
    assert!(!text.contains("123-45-6789"));
    assert!(text.contains("555-1234"));
}

#[test]
fn test_rotation_invariance_of_text_redaction() {
    for rotation in [0u16, 90, 180, 270] {
        let content = b"BT /F1 12 Tf 1 0 0 1 72 700 Tm (TOP SECRET stuff) Tj ET";
        let doc = MockDoc::new(vec![PageData::letter_page(content).with_rotation(rotation)]);
        assert_eq!(redact(&doc, "SECRET"), 1, "rotation {}", rotation);
        let text = extract_text(&doc, 0);
        assert!(!text.contains("SECRET"), "rotation {}", rotation);
        assert!(text.contains("stuff"), "rotation {}", rotation);
        assert!(text.contains("TOP"), "rotation {}", rotation);
    }
}

#[test]
fn test_rotated_page_preserves_untouched_lines() {
    let doc = three_line_page(90);
    redact(&doc, "John Doe");
    let text = squash_spaces(&extract_text(&doc, 0));
    assert!(text.contains("SSN: 123-45-6789"));
    assert!(text.contains("Phone: 555-1234"));
    assert!(text.starts_with("Name:"));
}

#[test]
fn test_sequential_positions_stay_put() {
    // After two passes on a 270° page, untouched glyphs must sit exactly
    // where they started; a missed bridge teleports them ~600pt away.
    let doc = three_line_page(270);
    let before = doc.extractor().get_page_letters(0).unwrap();
    let phone_before = find_occurrences(&before, "Phone: 555-1234", true);
    assert_eq!(phone_before.len(), 1);

    redact(&doc, "John Doe");
    redact(&doc, "123-45-6789");

    let after = doc.extractor().get_page_letters(0).unwrap();
    let phone_after = find_occurrences(&after, "Phone: 555-1234", true);
    assert_eq!(phone_after.len(), 1);
    for (&i, &j) in phone_before[0].iter().zip(&phone_after[0]) {
        let (c0, r0) = before[i];
        let (c1, r1) = after[j];
        assert_eq!(c0, c1);
        assert!((r0.left - r1.left).abs() < 1e-6, "glyph {:?} moved", c0);
        assert!((r0.bottom - r1.bottom).abs() < 1e-6, "glyph {:?} moved", c0);
    }
}
