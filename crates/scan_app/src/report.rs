//! Plain-text rendering of results for the terminal.

use std::fmt::Write;
use std::path::Path;

use scan_core::{AcquiredResult, AnalysisSummary, DetailStatus, SafetyLevel};

use crate::history::{HistoryEntry, HistoryKind};

/// Guesses the upload content type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

pub fn render_result(result: &AcquiredResult) -> String {
    let mut out = String::new();
    match result {
        AcquiredResult::Product(product) => {
            let _ = writeln!(out, "Product:   {}", product.name);
            let _ = writeln!(out, "Brand:     {}", product.brand);
            let _ = writeln!(out, "Barcode:   {}", product.barcode);
            let _ = writeln!(out, "Countries: {}", product.countries);
            if let Some(source) = &product.source_db {
                let _ = writeln!(out, "Source:    {source}");
            }
            render_ingredients(&mut out, &product.ingredients);
        }
        AcquiredResult::NotFound { barcode } => {
            let _ = writeln!(out, "No product found for barcode {barcode}.");
            let _ = writeln!(
                out,
                "Add it with: scan add-product {barcode} --name <NAME> --ingredients <TEXT>"
            );
        }
        AcquiredResult::Ocr(ocr) => {
            let _ = writeln!(
                out,
                "Extracted in {:.2}s",
                ocr.processing_millis as f64 / 1000.0
            );
            render_ingredients(&mut out, &ocr.ingredients);
        }
    }
    out
}

fn render_ingredients(out: &mut String, ingredients: &[String]) {
    if ingredients.is_empty() {
        let _ = writeln!(out, "No ingredients listed.");
        return;
    }
    let _ = writeln!(out, "Ingredients ({}):", ingredients.len());
    for name in ingredients {
        let _ = writeln!(out, "  - {name}");
    }
}

pub fn render_summary(summary: &AnalysisSummary) -> String {
    let mut out = String::new();
    let counts = &summary.counts;
    let _ = writeln!(
        out,
        "Safety: {} safe, {} caution, {} avoid, {} unknown",
        counts.get(SafetyLevel::Safe),
        counts.get(SafetyLevel::Caution),
        counts.get(SafetyLevel::Avoid),
        counts.get(SafetyLevel::Unknown),
    );
    let _ = writeln!(
        out,
        "Analyzed {} of {}",
        summary.matched,
        summary.matched + summary.unmatched
    );
    if let Some(score) = summary.average_health_score {
        let _ = writeln!(out, "Average health score: {score}/100");
    }

    for detail in &summary.details {
        match &detail.status {
            DetailStatus::Analyzed(record) => {
                let _ = writeln!(out, "  {:<28} {}", detail.ingredient, record.safety_level);
            }
            DetailStatus::NotAnalyzed => {
                let _ = writeln!(out, "  {:<28} not analyzed", detail.ingredient);
            }
        }
    }

    for record in &summary.highlights {
        let _ = writeln!(out, "* {}", record.name);
        for concern in &record.concerns {
            let _ = writeln!(out, "    concern: {concern}");
        }
        for benefit in &record.benefits {
            let _ = writeln!(out, "    benefit: {benefit}");
        }
    }
    out
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "History is empty.\n".to_string();
    }
    let mut out = String::new();
    for entry in entries.iter().rev() {
        match &entry.kind {
            HistoryKind::Barcode {
                code,
                product_name,
                ingredients,
            } => {
                let _ = writeln!(
                    out,
                    "#{:<4} {}  barcode {} {} ({} ingredients)",
                    entry.id,
                    entry.timestamp,
                    code,
                    product_name,
                    ingredients.len()
                );
            }
            HistoryKind::Ocr { ingredients, .. } => {
                let _ = writeln!(
                    out,
                    "#{:<4} {}  label scan ({} ingredients)",
                    entry.id,
                    entry.timestamp,
                    ingredients.len()
                );
            }
        }
    }
    out
}
