use scan_logging::scan_trace;

use crate::ingredients::{normalize_name, tokenize_name};
use crate::AnalysisRecord;

/// Which matching tier bound an ingredient to its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    Containment,
    TokenOverlap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub ingredient: String,
    pub record: Option<AnalysisRecord>,
    pub tier: Option<MatchTier>,
}

struct Candidate<'a> {
    record: &'a AnalysisRecord,
    normalized: String,
    tokens: Vec<String>,
    consumed: bool,
}

struct Pending {
    normalized: String,
    tokens: Vec<String>,
    bound: Option<(usize, MatchTier)>,
}

/// Associates free-text ingredient names with analysis records.
///
/// Returns one result per ingredient, in input order. Each record is bound to
/// at most one ingredient. Tiers run as whole passes (exact, then
/// containment, then token overlap), so a loose match for one ingredient never
/// consumes a record another ingredient matches more strictly. Within a pass
/// ingredients are visited in input order and records in pool order.
pub fn reconcile(ingredients: &[String], records: &[AnalysisRecord]) -> Vec<MatchResult> {
    let mut pool: Vec<Candidate<'_>> = records
        .iter()
        .map(|record| {
            let normalized = normalize_name(&record.name);
            let tokens = tokenize_name(&normalized);
            Candidate {
                record,
                normalized,
                tokens,
                consumed: false,
            }
        })
        .collect();

    let mut pending: Vec<Pending> = ingredients
        .iter()
        .map(|raw| {
            let normalized = normalize_name(raw);
            let tokens = tokenize_name(&normalized);
            Pending {
                normalized,
                tokens,
                bound: None,
            }
        })
        .collect();

    for tier in [MatchTier::Exact, MatchTier::Containment, MatchTier::TokenOverlap] {
        for item in pending.iter_mut() {
            if item.bound.is_some() || item.normalized.is_empty() {
                continue;
            }
            let chosen = match tier {
                MatchTier::Exact => find_exact(item, &pool),
                MatchTier::Containment => find_containment(item, &pool),
                MatchTier::TokenOverlap => find_overlap(item, &pool),
            };
            if let Some(index) = chosen {
                pool[index].consumed = true;
                item.bound = Some((index, tier));
                scan_trace!(
                    "reconcile: '{}' -> '{}' ({:?})",
                    item.normalized,
                    pool[index].normalized,
                    tier
                );
            }
        }
    }

    ingredients
        .iter()
        .zip(pending)
        .map(|(raw, item)| MatchResult {
            ingredient: raw.clone(),
            record: item.bound.map(|(index, _)| pool[index].record.clone()),
            tier: item.bound.map(|(_, tier)| tier),
        })
        .collect()
}

fn available<'p, 'a>(pool: &'p [Candidate<'a>]) -> impl Iterator<Item = (usize, &'p Candidate<'a>)> {
    pool.iter()
        .enumerate()
        .filter(|(_, c)| !c.consumed && !c.normalized.is_empty())
}

fn find_exact(item: &Pending, pool: &[Candidate<'_>]) -> Option<usize> {
    available(pool)
        .find(|(_, c)| c.normalized == item.normalized)
        .map(|(index, _)| index)
}

/// Longest qualifying record name wins; earlier pool entries win ties.
fn find_containment(item: &Pending, pool: &[Candidate<'_>]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, candidate) in available(pool) {
        let qualifies = item.normalized.contains(candidate.normalized.as_str())
            || candidate.normalized.contains(item.normalized.as_str());
        if !qualifies {
            continue;
        }
        let len = candidate.normalized.chars().count();
        if best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((index, len));
        }
    }
    best.map(|(index, _)| index)
}

/// Most overlapping word pairs wins; earlier pool entries win ties.
fn find_overlap(item: &Pending, pool: &[Candidate<'_>]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, candidate) in available(pool) {
        let overlap = overlapping_pairs(&item.tokens, &candidate.tokens);
        if overlap == 0 {
            continue;
        }
        if best.map_or(true, |(_, best_overlap)| overlap > best_overlap) {
            best = Some((index, overlap));
        }
    }
    best.map(|(index, _)| index)
}

fn overlapping_pairs(left: &[String], right: &[String]) -> usize {
    left.iter()
        .map(|a| {
            right
                .iter()
                .filter(|b| a.contains(b.as_str()) || b.contains(a.as_str()))
                .count()
        })
        .sum()
}
