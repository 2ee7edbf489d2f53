use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FairvalError;
use crate::types::{with_metadata, ComputationOutput, Multiple};
use crate::FairvalResult;

use super::multiples::{ComparableSet, MultipleKind};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Composite score and per-multiple z-scores for one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyScore {
    pub name: String,
    /// Sign-adjusted z-score per multiple (higher = more favorable)
    pub z_scores: Vec<(MultipleKind, Decimal)>,
    /// Unweighted mean of the sign-adjusted z-scores present
    pub composite: Decimal,
    /// 1-indexed rank, descending by composite
    pub rank: u32,
}

/// Ranked scoring output across the comparable set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Multiples that contributed to the composite
    pub multiples: Vec<MultipleKind>,
    /// Companies ranked best-first; ties broken by name
    pub scores: Vec<CompanyScore>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalize each multiple via z-scores and rank companies by the
/// composite. Lower-is-better multiples have their z-score sign
/// inverted so a higher composite always reads as cheaper.
pub fn score_comparables(
    set: &ComparableSet,
) -> FairvalResult<ComputationOutput<ScoringResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if set.companies.is_empty() {
        return Err(FairvalError::InsufficientData(
            "Comparable set contains no companies".into(),
        ));
    }

    // name -> accumulated (kind, z) pairs, input order preserved
    let mut z_by_company: Vec<(String, Vec<(MultipleKind, Decimal)>)> = set
        .companies
        .iter()
        .map(|c| (c.name.clone(), Vec::new()))
        .collect();

    for kind in &set.multiples {
        let pool: Vec<(usize, Multiple)> = set
            .companies
            .iter()
            .enumerate()
            .filter_map(|(idx, c)| c.values.get(kind).map(|v| (idx, *v)))
            .collect();

        if pool.is_empty() {
            warnings.push(format!("No company had data for {kind}; skipped in scoring"));
            continue;
        }

        let n = Decimal::from(pool.len() as u64);
        let mean: Decimal = pool.iter().map(|(_, v)| *v).sum::<Decimal>() / n;
        // Population standard deviation over the non-excluded pool
        let variance: Decimal = pool
            .iter()
            .map(|(_, v)| {
                let diff = *v - mean;
                diff * diff
            })
            .sum::<Decimal>()
            / n;
        let std_dev = variance.sqrt().unwrap_or(Decimal::ZERO);

        for (idx, value) in &pool {
            // Identical values across the pool score 0, not a division error
            let mut z = if std_dev.is_zero() {
                Decimal::ZERO
            } else {
                (*value - mean) / std_dev
            };
            if kind.lower_is_better() {
                z = -z;
            }
            z_by_company[*idx].1.push((*kind, z));
        }
    }

    let mut scores: Vec<CompanyScore> = Vec::with_capacity(z_by_company.len());
    for (name, z_scores) in z_by_company {
        if z_scores.is_empty() {
            warnings.push(format!("{name}: no scorable multiples; omitted from ranking"));
            continue;
        }
        let composite = z_scores.iter().map(|(_, z)| *z).sum::<Decimal>()
            / Decimal::from(z_scores.len() as u64);
        scores.push(CompanyScore {
            name,
            z_scores,
            composite,
            rank: 0,
        });
    }

    if scores.is_empty() {
        return Err(FairvalError::InsufficientData(
            "No company could be scored on any selected multiple".into(),
        ));
    }

    // Descending composite, ties broken by name for determinism
    scores.sort_by(|a, b| {
        b.composite
            .cmp(&a.composite)
            .then_with(|| a.name.cmp(&b.name))
    });
    for (idx, score) in scores.iter_mut().enumerate() {
        score.rank = idx as u32 + 1;
    }

    let output = ScoringResult {
        multiples: set.multiples.clone(),
        scores,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Z-Score Composite Peer Ranking",
        &serde_json::json!({
            "target": set.target,
            "multiples": set.multiples,
            "companies": set.companies.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
