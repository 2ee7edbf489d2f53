use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FairvalError;
use crate::snapshot::FinancialSnapshot;
use crate::types::Rate;
use crate::FairvalResult;

/// Tolerance for the equity + debt weight sum check.
const WEIGHT_TOLERANCE: Decimal = dec!(0.01);

/// CAPM and capital-structure inputs for the discount rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountRateAssumptions {
    /// Risk-free rate (e.g. 10-year government bond yield)
    pub risk_free_rate: Rate,
    /// Equity risk premium (market return minus risk-free rate)
    pub equity_risk_premium: Rate,
    /// Levered beta override; falls back to the snapshot beta when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    /// Weight of equity in the target capital structure
    pub equity_weight: Rate,
    /// Weight of debt in the target capital structure
    pub debt_weight: Rate,
    /// After-tax cost of debt; derived from the snapshot's interest
    /// expense, total debt and tax rate when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_tax_cost_of_debt: Option<Rate>,
}

/// Discount rates resolved from a snapshot and assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRate {
    /// Cost of equity via CAPM
    pub cost_of_equity: Rate,
    /// After-tax cost of debt used in the blend
    pub after_tax_cost_of_debt: Rate,
    /// Weighted average cost of capital
    pub wacc: Rate,
    /// Beta that fed the CAPM (override or snapshot)
    pub beta_used: Decimal,
}

/// CAPM: Ke = Rf + beta * ERP.
pub fn cost_of_equity(risk_free_rate: Rate, beta: Decimal, equity_risk_premium: Rate) -> Rate {
    risk_free_rate + beta * equity_risk_premium
}

/// WACC = We * Ke + Wd * Kd_after_tax.
///
/// The cost of debt is expected after tax; callers applying a pre-tax
/// rate must shield it with `(1 - tax_rate)` first.
pub fn wacc(
    cost_of_equity: Rate,
    after_tax_cost_of_debt: Rate,
    equity_weight: Rate,
    debt_weight: Rate,
) -> FairvalResult<Rate> {
    if equity_weight < Decimal::ZERO || debt_weight < Decimal::ZERO {
        return Err(FairvalError::InvalidAssumption {
            field: "equity_weight / debt_weight".into(),
            reason: "Capital structure weights cannot be negative".into(),
        });
    }
    let weight_sum = equity_weight + debt_weight;
    if (weight_sum - Decimal::ONE).abs() > WEIGHT_TOLERANCE {
        return Err(FairvalError::InvalidAssumption {
            field: "equity_weight + debt_weight".into(),
            reason: format!("Capital structure weights must sum to 1.0, got {weight_sum}"),
        });
    }
    Ok(equity_weight * cost_of_equity + debt_weight * after_tax_cost_of_debt)
}

/// Resolve the discount rates for a snapshot.
///
/// Beta comes from the assumptions override or the snapshot. The
/// after-tax cost of debt comes from the assumptions, or is derived as
/// `interest_expense / total_debt * (1 - tax_rate)` when the snapshot
/// carries those fields; a zero debt weight needs no cost of debt.
pub fn resolve_discount_rate(
    snapshot: &FinancialSnapshot,
    assumptions: &DiscountRateAssumptions,
    warnings: &mut Vec<String>,
) -> FairvalResult<ResolvedRate> {
    if assumptions.risk_free_rate < Decimal::ZERO {
        return Err(FairvalError::InvalidAssumption {
            field: "risk_free_rate".into(),
            reason: "Risk-free rate cannot be negative".into(),
        });
    }
    if assumptions.equity_risk_premium < Decimal::ZERO {
        return Err(FairvalError::InvalidAssumption {
            field: "equity_risk_premium".into(),
            reason: "Equity risk premium cannot be negative".into(),
        });
    }

    let beta_used = match assumptions.beta {
        Some(b) => b,
        None => snapshot.require_beta()?,
    };
    if beta_used <= Decimal::ZERO {
        return Err(FairvalError::InvalidAssumption {
            field: "beta".into(),
            reason: "Beta must be positive".into(),
        });
    }
    if beta_used > dec!(3.0) {
        warnings.push(format!(
            "High beta ({beta_used}): verify market data; betas above 3.0 are unusual"
        ));
    }
    if assumptions.equity_risk_premium > dec!(0.10) {
        warnings.push(format!(
            "Equity risk premium ({}) exceeds 10%; verify estimate",
            assumptions.equity_risk_premium
        ));
    }

    let ke = cost_of_equity(
        assumptions.risk_free_rate,
        beta_used,
        assumptions.equity_risk_premium,
    );

    let kd_after_tax = match assumptions.after_tax_cost_of_debt {
        Some(kd) => {
            if kd < Decimal::ZERO {
                return Err(FairvalError::InvalidAssumption {
                    field: "after_tax_cost_of_debt".into(),
                    reason: "Cost of debt cannot be negative".into(),
                });
            }
            kd
        }
        None if assumptions.debt_weight.is_zero() => Decimal::ZERO,
        None => derive_after_tax_cost_of_debt(snapshot)?,
    };

    let blended = wacc(
        ke,
        kd_after_tax,
        assumptions.equity_weight,
        assumptions.debt_weight,
    )?;

    if blended > dec!(0.20) {
        warnings.push(format!(
            "WACC of {blended} exceeds 20%; appropriate for high-risk situations only"
        ));
    }

    Ok(ResolvedRate {
        cost_of_equity: ke,
        after_tax_cost_of_debt: kd_after_tax,
        wacc: blended,
        beta_used,
    })
}

fn derive_after_tax_cost_of_debt(snapshot: &FinancialSnapshot) -> FairvalResult<Rate> {
    let interest = snapshot.interest_expense.ok_or_else(|| {
        FairvalError::InsufficientData(format!(
            "{}: missing interest expense for cost-of-debt derivation",
            snapshot.ticker
        ))
    })?;
    let total_debt = snapshot.total_debt.ok_or_else(|| {
        FairvalError::InsufficientData(format!(
            "{}: missing total debt for cost-of-debt derivation",
            snapshot.ticker
        ))
    })?;
    if total_debt <= Decimal::ZERO {
        return Err(FairvalError::InsufficientData(format!(
            "{}: total debt must be positive to derive a cost of debt",
            snapshot.ticker
        )));
    }
    let tax_rate = snapshot.require_tax_rate()?;
    if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE {
        return Err(FairvalError::InvalidAssumption {
            field: "tax_rate".into(),
            reason: "Tax rate must be between 0 and 1".into(),
        });
    }
    Ok(interest / total_debt * (Decimal::ONE - tax_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;
    use rust_decimal_macros::dec;

    fn sample_assumptions() -> DiscountRateAssumptions {
        DiscountRateAssumptions {
            risk_free_rate: dec!(0.042),
            equity_risk_premium: dec!(0.055),
            beta: Some(dec!(1.10)),
            equity_weight: dec!(0.70),
            debt_weight: dec!(0.30),
            after_tax_cost_of_debt: Some(dec!(0.043)),
        }
    }

    fn sample_snapshot() -> FinancialSnapshot {
        let mut snap = FinancialSnapshot::new("ACME", Currency::USD);
        snap.beta = Some(dec!(0.95));
        snap.interest_expense = Some(dec!(55));
        snap.total_debt = Some(dec!(1000));
        snap.tax_rate = Some(dec!(0.21));
        snap
    }

    #[test]
    fn test_capm_zero_beta_is_risk_free() {
        assert_eq!(
            cost_of_equity(dec!(0.042), Decimal::ZERO, dec!(0.055)),
            dec!(0.042)
        );
        assert_eq!(
            cost_of_equity(dec!(0.10), Decimal::ZERO, dec!(0.20)),
            dec!(0.10)
        );
    }

    #[test]
    fn test_capm_basic() {
        // Ke = 0.042 + 1.10 * 0.055 = 0.1025
        assert_eq!(
            cost_of_equity(dec!(0.042), dec!(1.10), dec!(0.055)),
            dec!(0.1025)
        );
    }

    #[test]
    fn test_wacc_reduces_to_cost_of_equity() {
        let w = wacc(dec!(0.1025), dec!(0.043), Decimal::ONE, Decimal::ZERO).unwrap();
        assert_eq!(w, dec!(0.1025));
    }

    #[test]
    fn test_wacc_blend() {
        // 0.70 * 0.1025 + 0.30 * 0.043 = 0.07175 + 0.0129 = 0.08465
        let w = wacc(dec!(0.1025), dec!(0.043), dec!(0.70), dec!(0.30)).unwrap();
        assert_eq!(w, dec!(0.08465));
    }

    #[test]
    fn test_wacc_weights_must_sum_to_one() {
        let result = wacc(dec!(0.10), dec!(0.05), dec!(0.60), dec!(0.50));
        assert!(result.is_err());
        match result.unwrap_err() {
            FairvalError::InvalidAssumption { field, .. } => {
                assert!(field.contains("weight"));
            }
            e => panic!("Expected InvalidAssumption, got {e:?}"),
        }
    }

    #[test]
    fn test_wacc_negative_weight_rejected() {
        assert!(wacc(dec!(0.10), dec!(0.05), dec!(1.30), dec!(-0.30)).is_err());
    }

    #[test]
    fn test_resolve_uses_beta_override() {
        let snap = sample_snapshot();
        let assumptions = sample_assumptions();
        let mut warnings = Vec::new();
        let resolved = resolve_discount_rate(&snap, &assumptions, &mut warnings).unwrap();
        assert_eq!(resolved.beta_used, dec!(1.10));
    }

    #[test]
    fn test_resolve_falls_back_to_snapshot_beta() {
        let snap = sample_snapshot();
        let mut assumptions = sample_assumptions();
        assumptions.beta = None;
        let mut warnings = Vec::new();
        let resolved = resolve_discount_rate(&snap, &assumptions, &mut warnings).unwrap();
        assert_eq!(resolved.beta_used, dec!(0.95));
    }

    #[test]
    fn test_resolve_missing_beta_everywhere() {
        let mut snap = sample_snapshot();
        snap.beta = None;
        let mut assumptions = sample_assumptions();
        assumptions.beta = None;
        let mut warnings = Vec::new();
        assert!(resolve_discount_rate(&snap, &assumptions, &mut warnings).is_err());
    }

    #[test]
    fn test_resolve_derives_cost_of_debt() {
        let snap = sample_snapshot();
        let mut assumptions = sample_assumptions();
        assumptions.after_tax_cost_of_debt = None;
        let mut warnings = Vec::new();
        let resolved = resolve_discount_rate(&snap, &assumptions, &mut warnings).unwrap();
        // 55 / 1000 * (1 - 0.21) = 0.04345
        assert_eq!(resolved.after_tax_cost_of_debt, dec!(0.04345));
    }

    #[test]
    fn test_resolve_all_equity_needs_no_cost_of_debt() {
        let mut snap = sample_snapshot();
        snap.interest_expense = None;
        snap.total_debt = None;
        let mut assumptions = sample_assumptions();
        assumptions.after_tax_cost_of_debt = None;
        assumptions.equity_weight = Decimal::ONE;
        assumptions.debt_weight = Decimal::ZERO;
        let mut warnings = Vec::new();
        let resolved = resolve_discount_rate(&snap, &assumptions, &mut warnings).unwrap();
        assert_eq!(resolved.wacc, resolved.cost_of_equity);
    }

    #[test]
    fn test_resolve_missing_debt_inputs() {
        let mut snap = sample_snapshot();
        snap.interest_expense = None;
        let mut assumptions = sample_assumptions();
        assumptions.after_tax_cost_of_debt = None;
        let mut warnings = Vec::new();
        let err = resolve_discount_rate(&snap, &assumptions, &mut warnings).unwrap_err();
        assert!(err.to_string().contains("interest expense"));
    }

    #[test]
    fn test_high_beta_warning() {
        let snap = sample_snapshot();
        let mut assumptions = sample_assumptions();
        assumptions.beta = Some(dec!(3.5));
        let mut warnings = Vec::new();
        resolve_discount_rate(&snap, &assumptions, &mut warnings).unwrap();
        assert!(warnings.iter().any(|w| w.contains("High beta")));
    }

    #[test]
    fn test_negative_risk_free_rejected() {
        let snap = sample_snapshot();
        let mut assumptions = sample_assumptions();
        assumptions.risk_free_rate = dec!(-0.01);
        let mut warnings = Vec::new();
        assert!(resolve_discount_rate(&snap, &assumptions, &mut warnings).is_err());
    }
}
