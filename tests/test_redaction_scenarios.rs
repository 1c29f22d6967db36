//! End-to-end redaction scenarios over the in-memory document store.


use redact_oxide::{
    CancelToken, Error, NoopPreserver, PartialImageMode, PdfALevel, Rect, RedactOptions,
    RedactionArea, RedactionRequest, TextExtractor, redact_by_text, redact_document, redact_page,
};
use stream_support::{
    AsciiDecoder, MockDoc, PageData, extract_text, squash_spaces, white_gray_image,
};

fn text_page(line: &str) -> Vec<u8> {
    let mut content = b"BT /F1 12 Tf 1 0 0 1 72 700 Tm (".to_vec();
    content.extend_from_slice(line.as_bytes());
    content.extend_from_slice(b") Tj ET");
    content
}

/// Area covering the glyphs `[first, last]` of a 12pt line starting at x=72.
fn area_for_chars(first: usize, last: usize) -> Rect {
    let left = 72.0 + first as f64 * 6.0 + 0.5;
    let right = 72.0 + (last + 1) as f64 * 6.0 - 0.5;
    Rect::new(left, 695.0, right, 715.0)
}

#[test]
fn scenario_s1_word_removed_from_line() {
    let _ = env_logger::builder().is_test(true).try_init();
    let doc = MockDoc::single_page(&text_page("This is public information"));
    let mut store = doc.store();
    let extractor = doc.extractor();
    // "public" occupies character indices 8..=13
    let areas = [RedactionArea::new(area_for_chars(8, 13))];
    let outcome = redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &areas,
        &RedactOptions::new(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(outcome.removed_text, 1);

    let text = extract_text(&doc, 0);
    assert!(!text.contains("public"));
    assert!(text.contains("information"));
    assert_eq!(squash_spaces(&text), "This is information");
}

#[test]
fn scenario_s2_redact_by_text() {
    let doc = MockDoc::single_page(&text_page("HELLO WORLD SECRET DATA"));
    let mut store = doc.store();
    let extractor = doc.extractor();
    let report = redact_by_text(
        &mut store,
        &AsciiDecoder,
        &extractor,
        "SECRET",
        &RedactOptions::new(),
        &NoopPreserver,
        PdfALevel::None,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(report.match_count, 1);
    assert_eq!(report.removed_text, 1);
    assert_eq!(report.pages_redacted, 1);
    assert_eq!(doc.save_count(), 1);

    let text = extract_text(&doc, 0);
    assert!(text.contains("HELLO WORLD"));
    assert!(text.contains("DATA"));
    assert!(!text.contains("SECRET"));
}

#[test]
fn scenario_s2_case_sensitivity() {
    let doc = MockDoc::single_page(&text_page("HELLO WORLD SECRET DATA"));
    let mut store = doc.store();
    let extractor = doc.extractor();
    let report = redact_by_text(
        &mut store,
        &AsciiDecoder,
        &extractor,
        "secret",
        &RedactOptions::new(),
        &NoopPreserver,
        PdfALevel::None,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(report.match_count, 0);
    assert!(extract_text(&doc, 0).contains("SECRET"));

    let report = redact_by_text(
        &mut store,
        &AsciiDecoder,
        &extractor,
        "secret",
        &RedactOptions::new().with_case_sensitive(false),
        &NoopPreserver,
        PdfALevel::None,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(report.match_count, 1);
    assert!(!extract_text(&doc, 0).contains("SECRET"));
}

#[test]
fn scenario_s3_unicode_apostrophe_folding() {
    // Byte 0x92 decodes to U+2019 under the WinAnsi-flavored decoder
    let doc =
        MockDoc::single_page(b"BT /F1 12 Tf 1 0 0 1 72 700 Tm (John\x92s Book) Tj ET");
    let mut store = doc.store();
    let extractor = doc.extractor();
    let report = redact_by_text(
        &mut store,
        &AsciiDecoder,
        &extractor,
        "John's Book",
        &RedactOptions::new(),
        &NoopPreserver,
        PdfALevel::None,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(report.match_count, 1);

    let text = extract_text(&doc, 0);
    assert!(!text.contains("John"));
    assert!(!text.contains("Book"));
}

#[test]
fn scenario_s5_rectangle_cut_geometrically() {
    let doc = MockDoc::single_page(b"100 500 200 80 re f");
    let mut store = doc.store();
    let extractor = doc.extractor();
    let areas = [RedactionArea::new(Rect::new(200.0, 480.0, 400.0, 600.0))];
    let outcome = redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &areas,
        &RedactOptions::new().with_visual_marker(false),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(outcome.removed_paths, 1);

    let content = doc.content(0);
    let text = String::from_utf8_lossy(&content);
    // The left half survives; nothing extends past x = 200
    assert!(text.contains("100 500 100 80 re"));
    assert!(text.contains('f'));
    assert!(!text.contains("200 80 re"));
}

#[test]
fn scenario_s6_partial_image_blackout() {
    let doc = MockDoc::new(vec![PageData::letter_page(
        b"q 200 0 0 200 100 100 cm /Im1 Do Q",
    )
    .with_image("Im1", white_gray_image(8, 8))]);
    let mut store = doc.store();
    let extractor = doc.extractor();
    let areas = [RedactionArea::new(Rect::new(100.0, 250.0, 200.0, 300.0))];
    let options = RedactOptions::new()
        .with_partial_image_mode(PartialImageMode::PreserveWithBlackout)
        .with_visual_marker(false);
    let outcome = redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &areas,
        &options,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(outcome.removed_images, 1);

    // The invocation is retained
    let content = doc.content(0);
    assert!(String::from_utf8_lossy(&content).contains("/Im1 Do"));

    // The redaction covers image-space x 0..0.5, y 0.75..1.0: the top two
    // sample rows' left half. Everything else is untouched.
    let image = doc.image(0, "Im1").unwrap();
    let samples = image.samples.as_ref();
    for row in 0..8 {
        for col in 0..8 {
            let expected = if row < 2 && col < 4 { 0x00 } else { 0xFF };
            assert_eq!(
                samples[row * 8 + col],
                expected,
                "sample ({}, {})",
                row,
                col
            );
        }
    }
}

#[test]
fn test_fully_covered_image_removed() {
    let doc = MockDoc::new(vec![PageData::letter_page(
        b"q 200 0 0 200 100 100 cm /Im1 Do Q",
    )
    .with_image("Im1", white_gray_image(4, 4))]);
    let mut store = doc.store();
    let extractor = doc.extractor();
    let areas = [RedactionArea::new(Rect::new(50.0, 50.0, 350.0, 350.0))];
    let outcome = redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &areas,
        &RedactOptions::new().with_visual_marker(false),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(outcome.removed_images, 1);
    assert!(!String::from_utf8_lossy(&doc.content(0)).contains("Do"));
}

#[test]
fn test_font_size_stable_after_redaction() {
    let doc = MockDoc::single_page(&text_page("This is public information"));
    let mut store = doc.store();
    let extractor = doc.extractor();
    let areas = [RedactionArea::new(area_for_chars(8, 13))];
    redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &areas,
        &RedactOptions::new(),
        &CancelToken::new(),
    )
    .unwrap();

    // Every surviving glyph still renders at 12pt
    for (_, rect) in doc.extractor().get_page_letters(0).unwrap() {
        assert!((rect.height() - 12.0).abs() < 1e-6);
    }
}

#[test]
fn test_idempotence_same_area_twice() {
    let doc = MockDoc::single_page(&text_page("This is public information"));
    let mut store = doc.store();
    let extractor = doc.extractor();
    let areas = [RedactionArea::new(area_for_chars(8, 13))];
    let options = RedactOptions::new();
    for _ in 0..2 {
        redact_page(
            &mut store,
            &AsciiDecoder,
            &extractor,
            0,
            &areas,
            &options,
            &CancelToken::new(),
        )
        .unwrap();
    }
    let text = extract_text(&doc, 0);
    assert!(!text.contains("public"));
    assert_eq!(squash_spaces(&text), "This is information");
}

#[test]
fn test_commutativity_over_disjoint_areas() {
    let line = "alpha beta gamma delta";
    // "beta" is chars 6..=9, "delta" is chars 17..=21
    let beta = RedactionArea::new(area_for_chars(6, 9));
    let delta = RedactionArea::new(area_for_chars(17, 21));

    let run = |first: RedactionArea, second: RedactionArea| {
        let doc = MockDoc::single_page(&text_page(line));
        let mut store = doc.store();
        let extractor = doc.extractor();
        for area in [first, second] {
            redact_page(
                &mut store,
                &AsciiDecoder,
                &extractor,
                0,
                &[area],
                &RedactOptions::new(),
                &CancelToken::new(),
            )
            .unwrap();
        }
        squash_spaces(&extract_text(&doc, 0))
    };

    let forward = run(beta, delta);
    let backward = run(delta, beta);
    assert_eq!(forward, backward);
    assert_eq!(forward, "alpha gamma");
}

#[test]
fn test_untouched_blocks_keep_exact_bytes() {
    let mut content = text_page("kept exactly");
    content.extend_from_slice(b" ");
    content.extend_from_slice(b"BT /F1 12 Tf 1 0 0 1 72 600 Tm (redact me) Tj ET");
    let doc = MockDoc::single_page(&content);
    let mut store = doc.store();
    let extractor = doc.extractor();
    // Covers the whole second line only
    let areas = [RedactionArea::new(Rect::new(60.0, 595.0, 300.0, 615.0))];
    redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &areas,
        &RedactOptions::new().with_visual_marker(false),
        &CancelToken::new(),
    )
    .unwrap();

    let out = String::from_utf8_lossy(&doc.content(0)).to_string();
    // The untouched block's operators survive with their original operands
    assert!(out.contains("(kept exactly) Tj"));
    assert!(out.contains("1 0 0 1 72 700 Tm"));
    assert!(!out.contains("redact me"));
}

#[test]
fn test_annotations_gated_by_intersection() {
    let doc = MockDoc::new(vec![PageData::letter_page(&text_page("note here"))
        .with_annotations(vec![
            Rect::new(70.0, 690.0, 130.0, 720.0),
            Rect::new(400.0, 400.0, 500.0, 500.0),
        ])]);
    let mut store = doc.store();
    let extractor = doc.extractor();
    let areas = [RedactionArea::new(area_for_chars(0, 3))];
    let outcome = redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &areas,
        &RedactOptions::new(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(outcome.removed_annotations, 1);
    assert_eq!(doc.annotation_count(0), 1);
}

#[test]
fn test_sanitize_drops_all_annotations() {
    let doc = MockDoc::new(vec![PageData::letter_page(&text_page("text"))
        .with_annotations(vec![
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(500.0, 700.0, 600.0, 780.0),
        ])]);
    let mut store = doc.store();
    let extractor = doc.extractor();
    let outcome = redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &[],
        &RedactOptions::new().with_sanitize_metadata(true),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(outcome.removed_annotations, 2);
    assert_eq!(doc.annotation_count(0), 0);
    // No areas: content untouched
    assert!(String::from_utf8_lossy(&doc.content(0)).contains("(text) Tj"));
}

#[test]
fn test_malformed_page_left_unchanged() {
    let broken = b"BT (never closed Tj ET".to_vec();
    let doc = MockDoc::single_page(&broken);
    let mut store = doc.store();
    let extractor = doc.extractor();
    let areas = [RedactionArea::new(Rect::new(0.0, 0.0, 600.0, 700.0))];
    let err = redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &areas,
        &RedactOptions::new(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MalformedContentStream { .. }));
    assert_eq!(doc.content(0), broken);
}

#[test]
fn test_document_run_aggregates_errors() {
    let doc = MockDoc::new(vec![
        PageData::letter_page(&text_page("page one secret")),
        PageData::letter_page(b"BT (broken Tj ET"),
    ]);
    let mut store = doc.store();
    let extractor = doc.extractor();
    let requests = vec![
        RedactionRequest {
            page_index: 0,
            areas: vec![RedactionArea::new(area_for_chars(9, 14))],
        },
        RedactionRequest {
            page_index: 1,
            areas: vec![RedactionArea::new(Rect::new(0.0, 0.0, 600.0, 792.0))],
        },
    ];
    let report = redact_document(
        &mut store,
        &AsciiDecoder,
        &extractor,
        &requests,
        &RedactOptions::new(),
        &NoopPreserver,
        PdfALevel::None,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(report.pages_redacted, 1);
    assert_eq!(report.pages_skipped, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].page_index, 1);
    assert_eq!(doc.save_count(), 1);
    assert!(!extract_text(&doc, 0).contains("secret"));
}

#[test]
fn test_cancellation_leaves_document_untouched() {
    let original = text_page("do not touch");
    let doc = MockDoc::single_page(&original);
    let mut store = doc.store();
    let extractor = doc.extractor();
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &[RedactionArea::new(area_for_chars(0, 4))],
        &RedactOptions::new(),
        &cancel,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(doc.content(0), original);
}

#[test]
fn test_marker_overlay_present_by_default() {
    let doc = MockDoc::single_page(&text_page("covered words"));
    let mut store = doc.store();
    let extractor = doc.extractor();
    redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &[RedactionArea::new(area_for_chars(0, 6))],
        &RedactOptions::new(),
        &CancelToken::new(),
    )
    .unwrap();
    let out = String::from_utf8_lossy(&doc.content(0)).to_string();
    assert!(out.contains("rg"));
    assert!(out.ends_with("Q\n"));
}

#[test]
fn test_invisible_text_mode_still_redacted() {
    // Rendering mode 3 paints nothing but still carries extractable text
    let content = b"BT /F1 12 Tf 3 Tr 1 0 0 1 72 700 Tm (hidden secret) Tj ET".to_vec();
    let doc = MockDoc::single_page(&content);
    let mut store = doc.store();
    let extractor = doc.extractor();
    // "secret" is chars 7..=12
    redact_page(
        &mut store,
        &AsciiDecoder,
        &extractor,
        0,
        &[RedactionArea::new(area_for_chars(7, 12))],
        &RedactOptions::new(),
        &CancelToken::new(),
    )
    .unwrap();
    let text = extract_text(&doc, 0);
    assert!(!text.contains("secret"));
    assert!(text.contains("hidden"));
    // The invisible rendering mode is preserved through reconstruction
    assert!(String::from_utf8_lossy(&doc.content(0)).contains("3 Tr"));
}
