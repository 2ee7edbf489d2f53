//! Payout sustainability check.
//!
//! Advisory assessment of the dividend payout ratio trend against
//! trailing earnings. Attached to DDM results, never an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::snapshot::FinancialSnapshot;
use crate::types::Rate;

/// Advisory payout-sustainability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutFlag {
    Sustainable,
    Unsustainable,
    /// The snapshot lacks the EPS or dividend history needed to judge.
    NotAssessed,
}

/// Assess whether the current payout looks sustainable.
///
/// The most recent payout ratio (latest dividend / trailing EPS) is
/// flagged `Unsustainable` when it exceeds 100% or sits more than
/// `margin` above the historical average ratio.
pub fn assess_payout(
    snapshot: &FinancialSnapshot,
    margin: Rate,
    warnings: &mut Vec<String>,
) -> PayoutFlag {
    let eps = match snapshot.trailing_eps {
        Some(eps) if eps > Decimal::ZERO => eps,
        Some(_) => {
            warnings.push(format!(
                "{}: non-positive trailing EPS; payout sustainability not assessed",
                snapshot.ticker
            ));
            return PayoutFlag::NotAssessed;
        }
        None => {
            warnings.push(format!(
                "{}: missing trailing EPS; payout sustainability not assessed",
                snapshot.ticker
            ));
            return PayoutFlag::NotAssessed;
        }
    };

    if snapshot.dividend_history.is_empty() {
        warnings.push(format!(
            "{}: no dividend history; payout sustainability not assessed",
            snapshot.ticker
        ));
        return PayoutFlag::NotAssessed;
    }

    let mut history = snapshot.dividend_history.clone();
    history.sort_by_key(|record| record.period);

    let ratios: Vec<Decimal> = history.iter().map(|record| record.amount / eps).collect();
    // Non-empty by the check above
    let latest = ratios[ratios.len() - 1];
    let average = ratios.iter().copied().sum::<Decimal>() / Decimal::from(ratios.len() as u64);

    if latest > Decimal::ONE {
        warnings.push(format!(
            "{}: payout ratio {:.1}% exceeds earnings",
            snapshot.ticker,
            latest * Decimal::ONE_HUNDRED
        ));
        return PayoutFlag::Unsustainable;
    }
    if latest > average + margin {
        warnings.push(format!(
            "{}: payout ratio {:.1}% is well above its historical average {:.1}%",
            snapshot.ticker,
            latest * Decimal::ONE_HUNDRED,
            average * Decimal::ONE_HUNDRED
        ));
        return PayoutFlag::Unsustainable;
    }

    PayoutFlag::Sustainable
}
