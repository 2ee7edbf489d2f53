//! Multi-stage dividend discount model.
//!
//! An ordered sequence of growth phases covers the explicit horizon,
//! followed by a Gordon terminal phase at the final phase's growth rate.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FairvalError;
use crate::snapshot::FinancialSnapshot;
use crate::types::{with_metadata, ComputationOutput, EngineConfig, Money, Rate, ValuationMethod, Verdict};
use crate::FairvalResult;

use super::{
    assess_payout, validate_convergence, validate_required_return, DdmValuation, DividendPeriod,
};

/// A single growth phase in the multi-stage model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthPhase {
    /// Duration of this phase in years.
    pub years: u32,
    /// Dividend growth rate during this phase.
    pub growth_rate: Rate,
}

/// PV detail for a single growth phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseValue {
    /// Phase number (1-indexed).
    pub phase: u32,
    /// Present value of all dividends from this phase.
    pub present_value: Money,
    /// Total undiscounted dividends paid during this phase.
    pub dividends_paid: Money,
}

/// Value a dividend stream through explicit growth phases plus a
/// Gordon terminal at the final phase's growth rate.
pub fn valuate_multistage_ddm(
    snapshot: &FinancialSnapshot,
    required_return: Rate,
    phases: &[GrowthPhase],
    config: &EngineConfig,
) -> FairvalResult<ComputationOutput<DdmValuation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_required_return(required_return)?;
    validate_phases(phases)?;

    // The terminal phase grows at the last explicit phase's rate
    let terminal_growth = phases[phases.len() - 1].growth_rate;
    validate_convergence(required_return, terminal_growth)?;

    let d0 = snapshot.require_dividend_per_share()?;
    if d0 < Decimal::ZERO {
        return Err(FairvalError::InvalidAssumption {
            field: "dividend_per_share".into(),
            reason: "Most recent dividend must be non-negative".into(),
        });
    }
    let market_price = snapshot.require_share_price()?;

    let df_multiplier = Decimal::ONE / (Decimal::ONE + required_return);

    let mut current_dividend = d0;
    let mut discount_factor = Decimal::ONE; // df at t=0
    let mut year_counter: u32 = 0;

    let mut phase_values = Vec::with_capacity(phases.len());
    let mut dividends = Vec::new();
    let mut pv_of_dividends = Decimal::ZERO;

    for (idx, phase) in phases.iter().enumerate() {
        let mut phase_pv = Decimal::ZERO;
        let mut phase_dividends = Decimal::ZERO;

        for _ in 0..phase.years {
            year_counter += 1;
            current_dividend *= Decimal::ONE + phase.growth_rate;
            discount_factor *= df_multiplier;

            let present_value = current_dividend * discount_factor;
            phase_pv += present_value;
            phase_dividends += current_dividend;
            pv_of_dividends += present_value;

            dividends.push(DividendPeriod {
                year: year_counter,
                dividend: current_dividend,
                present_value,
            });
        }

        phase_values.push(PhaseValue {
            phase: (idx + 1) as u32,
            present_value: phase_pv,
            dividends_paid: phase_dividends,
        });
    }

    // TV = D_T * (1 + g) / (r - g), discounted from the end of the horizon
    let terminal_dividend = current_dividend * (Decimal::ONE + terminal_growth);
    let terminal_value =
        terminal_dividend / (required_return - terminal_growth) * discount_factor;

    let fair_value = pv_of_dividends + terminal_value;
    let terminal_pct = if fair_value.is_zero() {
        Decimal::ZERO
    } else {
        terminal_value / fair_value * dec!(100)
    };

    if terminal_pct > dec!(75) {
        warnings.push(format!(
            "Terminal value represents {terminal_pct:.1}% of fair value; consider extending the explicit phases"
        ));
    }

    let payout = assess_payout(snapshot, config.sustainability_margin, &mut warnings);
    let verdict = Verdict::classify(fair_value, market_price, config.verdict_tolerance);

    let output = DdmValuation {
        method: ValuationMethod::Ddm,
        fair_value_per_share: fair_value,
        required_return,
        dividends,
        phase_values,
        terminal_value,
        terminal_pct,
        market_price,
        verdict,
        payout,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Multi-Stage Dividend Discount Model",
        &serde_json::json!({
            "ticker": snapshot.ticker,
            "required_return": required_return,
            "phases": phases,
            "config": config,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_phases(phases: &[GrowthPhase]) -> FairvalResult<()> {
    if phases.is_empty() {
        return Err(FairvalError::InsufficientData(
            "At least one growth phase is required".into(),
        ));
    }
    let total_years: u32 = phases.iter().map(|p| p.years).sum();
    if total_years == 0 {
        return Err(FairvalError::InvalidAssumption {
            field: "phases".into(),
            reason: "Total explicit years across all phases must be at least 1".into(),
        });
    }
    if total_years > 200 {
        return Err(FairvalError::InvalidAssumption {
            field: "phases".into(),
            reason: "Total years exceeds 200, likely an input error".into(),
        });
    }
    for phase in phases {
        if phase.growth_rate <= dec!(-1) {
            return Err(FairvalError::InvalidAssumption {
                field: "phases".into(),
                reason: "Growth rate must be greater than -100%".into(),
            });
        }
    }
    Ok(())
}
