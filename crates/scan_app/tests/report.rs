use std::path::Path;

use scan_app::history::{HistoryEntry, HistoryKind};
use scan_app::report::{content_type_for, render_history, render_result, render_summary};
use scan_core::{reconcile, summarize, AcquiredResult, AnalysisRecord, OcrResult, SafetyLevel};

#[test]
fn content_type_follows_extension() {
    assert_eq!(content_type_for(Path::new("label.JPG")), "image/jpeg");
    assert_eq!(content_type_for(Path::new("label.png")), "image/png");
    assert_eq!(content_type_for(Path::new("label")), "application/octet-stream");
}

#[test]
fn ocr_result_lists_ingredients() {
    let text = render_result(&AcquiredResult::Ocr(OcrResult {
        ingredients: vec!["water".to_string(), "salt".to_string()],
        processing_millis: 1250,
    }));
    assert!(text.contains("Extracted in 1.25s"));
    assert!(text.contains("Ingredients (2):"));
    assert!(text.contains("  - salt"));
}

#[test]
fn missing_product_suggests_manual_entry() {
    let text = render_result(&AcquiredResult::NotFound {
        barcode: "4006381333931".to_string(),
    });
    assert!(text.contains("No product found for barcode 4006381333931."));
    assert!(text.contains("scan add-product 4006381333931 --name"));
}

#[test]
fn summary_shows_unmatched_rows_and_highlights() {
    let mut sugar = AnalysisRecord::new("sugar", SafetyLevel::Caution);
    sugar.concerns.push("high glycemic load".to_string());
    let ingredients = vec!["Sugar".to_string(), "E999".to_string()];
    let summary = summarize(&reconcile(&ingredients, &[sugar]));

    let text = render_summary(&summary);
    assert!(text.contains("Safety: 0 safe, 1 caution, 0 avoid, 0 unknown"));
    assert!(text.contains("Analyzed 1 of 2"));
    assert!(text.contains("E999"));
    assert!(text.contains("not analyzed"));
    assert!(text.contains("concern: high glycemic load"));
}

#[test]
fn history_is_listed_newest_first() {
    let entries = vec![
        HistoryEntry {
            id: 1,
            timestamp: "2025-10-09T08:53:20Z".to_string(),
            kind: HistoryKind::Ocr {
                ingredients: vec!["salt".to_string()],
                processing_millis: 10,
            },
        },
        HistoryEntry {
            id: 2,
            timestamp: "2025-10-09T08:54:20Z".to_string(),
            kind: HistoryKind::Barcode {
                code: "5000112637922".to_string(),
                product_name: "Cola".to_string(),
                ingredients: vec![],
            },
        },
    ];
    let text = render_history(&entries);
    let newest = text.find("Cola").unwrap();
    let oldest = text.find("label scan").unwrap();
    assert!(newest < oldest);
    assert_eq!(render_history(&[]), "History is empty.\n");
}
