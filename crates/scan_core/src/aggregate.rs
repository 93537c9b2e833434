use crate::{AnalysisRecord, MatchResult, SafetyLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafetyCounts {
    pub safe: usize,
    pub caution: usize,
    pub avoid: usize,
    pub unknown: usize,
}

impl SafetyCounts {
    fn add(&mut self, level: SafetyLevel) {
        match level {
            SafetyLevel::Safe => self.safe += 1,
            SafetyLevel::Caution => self.caution += 1,
            SafetyLevel::Avoid => self.avoid += 1,
            SafetyLevel::Unknown => self.unknown += 1,
        }
    }

    pub fn get(&self, level: SafetyLevel) -> usize {
        match level {
            SafetyLevel::Safe => self.safe,
            SafetyLevel::Caution => self.caution,
            SafetyLevel::Avoid => self.avoid,
            SafetyLevel::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.safe + self.caution + self.avoid + self.unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailStatus {
    Analyzed(AnalysisRecord),
    /// Rendered as a neutral "Not analyzed" row.
    NotAnalyzed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientDetail {
    pub ingredient: String,
    pub status: DetailStatus,
}

/// View-ready summary of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisSummary {
    pub counts: SafetyCounts,
    /// Every ingredient in input order, matched or not.
    pub details: Vec<IngredientDetail>,
    /// Matched records with concerns or benefits, in ingredient order.
    pub highlights: Vec<AnalysisRecord>,
    pub matched: usize,
    pub unmatched: usize,
    pub average_health_score: Option<u8>,
}

pub fn summarize(matches: &[MatchResult]) -> AnalysisSummary {
    let mut summary = AnalysisSummary::default();
    let mut score_total = 0u32;
    let mut scored = 0u32;

    for result in matches {
        let status = match &result.record {
            Some(record) => {
                summary.counts.add(record.safety_level);
                summary.matched += 1;
                if let Some(score) = record.health_score {
                    score_total += u32::from(score);
                    scored += 1;
                }
                if record.has_notes() {
                    summary.highlights.push(record.clone());
                }
                DetailStatus::Analyzed(record.clone())
            }
            None => {
                summary.unmatched += 1;
                DetailStatus::NotAnalyzed
            }
        };
        summary.details.push(IngredientDetail {
            ingredient: result.ingredient.clone(),
            status,
        });
    }

    if scored > 0 {
        // Rounded mean; scores are 0-100 so the result fits a u8.
        let mean = (score_total + scored / 2) / scored;
        summary.average_health_score = u8::try_from(mean).ok();
    }
    summary
}
