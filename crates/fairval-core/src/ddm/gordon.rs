//! Single-stage (Gordon growth) dividend discount model.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Instant;

use crate::error::FairvalError;
use crate::snapshot::FinancialSnapshot;
use crate::types::{with_metadata, ComputationOutput, EngineConfig, Rate, ValuationMethod, Verdict};
use crate::FairvalResult;

use super::{assess_payout, validate_convergence, validate_required_return, DdmValuation};

/// Value a constant-growth dividend stream as a perpetuity.
///
/// `fair_value = D0 * (1 + g) / (r - g)` where D0 is the most recent
/// dividend per share from the snapshot.
pub fn valuate_gordon_ddm(
    snapshot: &FinancialSnapshot,
    required_return: Rate,
    dividend_growth: Rate,
    config: &EngineConfig,
) -> FairvalResult<ComputationOutput<DdmValuation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_required_return(required_return)?;
    validate_convergence(required_return, dividend_growth)?;

    let d0 = snapshot.require_dividend_per_share()?;
    if d0 < Decimal::ZERO {
        return Err(FairvalError::InvalidAssumption {
            field: "dividend_per_share".into(),
            reason: "Most recent dividend must be non-negative".into(),
        });
    }
    let market_price = snapshot.require_share_price()?;

    let next_dividend = d0 * (Decimal::ONE + dividend_growth);
    let fair_value = next_dividend / (required_return - dividend_growth);

    if fair_value.is_zero() {
        warnings.push("Zero dividend yields a zero fair value; the model is uninformative for non-payers".into());
    }

    let payout = assess_payout(snapshot, config.sustainability_margin, &mut warnings);
    let verdict = Verdict::classify(fair_value, market_price, config.verdict_tolerance);

    let output = DdmValuation {
        method: ValuationMethod::Ddm,
        fair_value_per_share: fair_value,
        required_return,
        dividends: Vec::new(),
        phase_values: Vec::new(),
        // The perpetuity is the entire value in the single-stage model
        terminal_value: fair_value,
        terminal_pct: dec!(100),
        market_price,
        verdict,
        payout,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Gordon Growth Dividend Discount Model",
        &serde_json::json!({
            "ticker": snapshot.ticker,
            "required_return": required_return,
            "dividend_growth": dividend_growth,
            "config": config,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DividendRecord;
    use crate::types::Currency;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    fn dividend_payer() -> FinancialSnapshot {
        let mut snap = FinancialSnapshot::new("DIVCO", Currency::USD);
        snap.dividend_per_share = Some(dec!(2.00));
        snap.share_price = Some(dec!(30));
        snap.trailing_eps = Some(dec!(4.00));
        snap.dividend_history = vec![
            DividendRecord {
                period: NaiveDate::from_ymd_opt(2023, 12, 15).unwrap(),
                amount: dec!(1.80),
            },
            DividendRecord {
                period: NaiveDate::from_ymd_opt(2024, 12, 15).unwrap(),
                amount: dec!(1.90),
            },
            DividendRecord {
                period: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap(),
                amount: dec!(2.00),
            },
        ];
        snap
    }

    #[test]
    fn test_gordon_round_trip() {
        // 2.00 * 1.04 / (0.10 - 0.04) = 34.6667
        let result = valuate_gordon_ddm(
            &dividend_payer(),
            dec!(0.10),
            dec!(0.04),
            &EngineConfig::default(),
        )
        .unwrap();
        assert!(approx_eq(
            result.result.fair_value_per_share,
            dec!(34.67),
            dec!(0.01)
        ));
    }

    #[test]
    fn test_gordon_verdict_undervalued() {
        // Fair value 34.67 vs market 30: above the +5% band
        let result = valuate_gordon_ddm(
            &dividend_payer(),
            dec!(0.10),
            dec!(0.04),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(result.result.verdict, Verdict::Undervalued);
    }

    #[test]
    fn test_gordon_growth_at_required_return_rejected() {
        let result = valuate_gordon_ddm(
            &dividend_payer(),
            dec!(0.10),
            dec!(0.10),
            &EngineConfig::default(),
        );
        assert!(matches!(
            result,
            Err(FairvalError::InvalidAssumption { .. })
        ));
    }

    #[test]
    fn test_gordon_growth_above_required_return_rejected() {
        assert!(valuate_gordon_ddm(
            &dividend_payer(),
            dec!(0.08),
            dec!(0.12),
            &EngineConfig::default(),
        )
        .is_err());
    }

    #[test]
    fn test_gordon_missing_dividend() {
        let mut snap = dividend_payer();
        snap.dividend_per_share = None;
        let err = valuate_gordon_ddm(&snap, dec!(0.10), dec!(0.04), &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, FairvalError::InsufficientData(_)));
    }

    #[test]
    fn test_gordon_terminal_is_entire_value() {
        let result = valuate_gordon_ddm(
            &dividend_payer(),
            dec!(0.10),
            dec!(0.04),
            &EngineConfig::default(),
        )
        .unwrap();
        let out = &result.result;
        assert!(out.dividends.is_empty());
        assert_eq!(out.terminal_value, out.fair_value_per_share);
        assert_eq!(out.terminal_pct, dec!(100));
    }

    #[test]
    fn test_gordon_payout_assessed() {
        let result = valuate_gordon_ddm(
            &dividend_payer(),
            dec!(0.10),
            dec!(0.04),
            &EngineConfig::default(),
        )
        .unwrap();
        // 2.00 / 4.00 = 50% payout against a ~48% historical average
        assert_eq!(result.result.payout, crate::ddm::PayoutFlag::Sustainable);
    }

    #[test]
    fn test_gordon_negative_required_return_rejected() {
        assert!(valuate_gordon_ddm(
            &dividend_payer(),
            dec!(-0.05),
            dec!(-0.10),
            &EngineConfig::default(),
        )
        .is_err());
    }
}
