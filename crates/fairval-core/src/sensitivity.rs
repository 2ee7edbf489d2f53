use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::dcf::discount_to_equity;
use crate::discount::{resolve_discount_rate, DiscountRateAssumptions};
use crate::error::FairvalError;
use crate::projection::{ProjectionAssumptions, TerminalModel};
use crate::snapshot::FinancialSnapshot;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FairvalResult;

/// 2-way fair-value sensitivity grid over discount rate and the terminal
/// parameter (perpetuity growth or exit multiple, matching the base model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityGrid {
    /// Discount rates swept along the rows
    pub rate_axis: Vec<Rate>,
    /// Terminal parameter values swept along the columns
    pub terminal_axis: Vec<Rate>,
    /// cells[i][j] = fair value per share at (rate_axis[i], terminal_axis[j]),
    /// None where the combination is degenerate (e.g. growth >= rate)
    pub cells: Vec<Vec<Option<Money>>>,
    /// Discount rate resolved from the CAPM/WACC assumptions
    pub base_discount_rate: Rate,
    /// Fair value per share at the base assumptions
    pub base_fair_value: Option<Money>,
    /// Grid coordinates closest to the base assumptions (row, col)
    pub base_case_position: (usize, usize),
}

/// Find the closest index to a target value in an axis.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn require_axis(axis: &[Rate], name: &str) -> FairvalResult<()> {
    if axis.is_empty() {
        return Err(FairvalError::InvalidAssumption {
            field: name.into(),
            reason: "Axis must contain at least one value".into(),
        });
    }
    Ok(())
}

/// Substitute an axis value into the terminal model's swept parameter.
fn terminal_for(base: &TerminalModel, value: Rate) -> TerminalModel {
    match base {
        TerminalModel::GordonGrowth { .. } => TerminalModel::GordonGrowth { rate: value },
        TerminalModel::ExitMultiple { .. } => TerminalModel::ExitMultiple { multiple: value },
    }
}

/// Sweep fair value per share over a discount-rate axis and a terminal axis.
/// The terminal axis is interpreted through the base assumption's model:
/// perpetuity growth rates under Gordon growth, multiples under an exit
/// multiple. Axis order is preserved in the output; cells that cannot be
/// valued are left empty and reported as warnings.
pub fn generate_sensitivity(
    snapshot: &FinancialSnapshot,
    rates: &DiscountRateAssumptions,
    assumptions: &ProjectionAssumptions,
    rate_axis: &[Rate],
    terminal_axis: &[Rate],
) -> FairvalResult<ComputationOutput<SensitivityGrid>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    require_axis(rate_axis, "rate_axis")?;
    require_axis(terminal_axis, "terminal_axis")?;

    let resolved = resolve_discount_rate(snapshot, rates, &mut warnings)?;

    let base_fcf = snapshot.require_free_cash_flow()?;
    let net_debt = snapshot.require_net_debt()?;
    let shares = snapshot.require_shares_outstanding()?;

    let mut cells = Vec::with_capacity(rate_axis.len());
    for rate in rate_axis {
        let mut row = Vec::with_capacity(terminal_axis.len());
        for terminal in terminal_axis {
            let scenario = ProjectionAssumptions {
                horizon: assumptions.horizon,
                growth: assumptions.growth.clone(),
                terminal: terminal_for(&assumptions.terminal, *terminal),
            };
            match discount_to_equity(base_fcf, net_debt, shares, *rate, &scenario) {
                Ok(core) => row.push(Some(core.fair_value_per_share)),
                Err(e) => {
                    warnings.push(format!("Cell ({rate}, {terminal}) skipped: {e}"));
                    row.push(None);
                }
            }
        }
        cells.push(row);
    }

    let base_terminal = match assumptions.terminal {
        TerminalModel::GordonGrowth { rate } => rate,
        TerminalModel::ExitMultiple { multiple } => multiple,
    };
    let base_row = closest_index(rate_axis, resolved.wacc);
    let base_col = closest_index(terminal_axis, base_terminal);

    let base_fair_value =
        match discount_to_equity(base_fcf, net_debt, shares, resolved.wacc, assumptions) {
            Ok(core) => Some(core.fair_value_per_share),
            Err(e) => {
                warnings.push(format!("Base case could not be valued: {e}"));
                None
            }
        };

    let output = SensitivityGrid {
        rate_axis: rate_axis.to_vec(),
        terminal_axis: terminal_axis.to_vec(),
        cells,
        base_discount_rate: resolved.wacc,
        base_fair_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Fair Value Sensitivity (Discount Rate x Terminal Assumption)",
        &serde_json::json!({
            "ticker": snapshot.ticker,
            "rates": rates,
            "projection": assumptions,
            "rate_axis": rate_axis,
            "terminal_axis": terminal_axis,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::GrowthSchedule;
    use crate::types::Currency;
    use rust_decimal_macros::dec;

    fn sample_snapshot() -> FinancialSnapshot {
        let mut snap = FinancialSnapshot::new("ACME", Currency::USD);
        snap.free_cash_flow = Some(dec!(500));
        snap.net_debt = Some(dec!(200));
        snap.shares_outstanding = Some(dec!(100));
        snap.share_price = Some(dec!(40));
        snap.beta = Some(dec!(1.10));
        snap
    }

    fn sample_rates() -> DiscountRateAssumptions {
        DiscountRateAssumptions {
            risk_free_rate: dec!(0.042),
            equity_risk_premium: dec!(0.055),
            beta: None,
            equity_weight: dec!(0.70),
            debt_weight: dec!(0.30),
            after_tax_cost_of_debt: Some(dec!(0.043)),
        }
    }

    fn sample_projection() -> ProjectionAssumptions {
        ProjectionAssumptions {
            horizon: 5,
            growth: GrowthSchedule::Constant(dec!(0.08)),
            terminal: TerminalModel::GordonGrowth { rate: dec!(0.02) },
        }
    }

    #[test]
    fn test_grid_shape_matches_axes() {
        let rate_axis = vec![dec!(0.07), dec!(0.08), dec!(0.09), dec!(0.10)];
        let terminal_axis = vec![dec!(0.01), dec!(0.02), dec!(0.03)];
        let result = generate_sensitivity(
            &sample_snapshot(),
            &sample_rates(),
            &sample_projection(),
            &rate_axis,
            &terminal_axis,
        )
        .unwrap();
        let out = &result.result;

        assert_eq!(out.cells.len(), 4);
        for row in &out.cells {
            assert_eq!(row.len(), 3);
        }
        assert_eq!(out.rate_axis, rate_axis);
        assert_eq!(out.terminal_axis, terminal_axis);
    }

    #[test]
    fn test_monotonic_in_discount_rate() {
        let rate_axis = vec![dec!(0.07), dec!(0.08), dec!(0.09), dec!(0.10)];
        let terminal_axis = vec![dec!(0.02)];
        let result = generate_sensitivity(
            &sample_snapshot(),
            &sample_rates(),
            &sample_projection(),
            &rate_axis,
            &terminal_axis,
        )
        .unwrap();
        let out = &result.result;

        for i in 0..out.cells.len() - 1 {
            let hi = out.cells[i][0].unwrap();
            let lo = out.cells[i + 1][0].unwrap();
            assert!(hi > lo, "fair value should fall down the rate axis");
        }
    }

    #[test]
    fn test_monotonic_in_terminal_growth() {
        let rate_axis = vec![dec!(0.09)];
        let terminal_axis = vec![dec!(0.01), dec!(0.02), dec!(0.03)];
        let result = generate_sensitivity(
            &sample_snapshot(),
            &sample_rates(),
            &sample_projection(),
            &rate_axis,
            &terminal_axis,
        )
        .unwrap();
        let row = &result.result.cells[0];

        for j in 0..row.len() - 1 {
            assert!(row[j].unwrap() < row[j + 1].unwrap());
        }
    }

    #[test]
    fn test_degenerate_cells_are_none() {
        // Growth 0.08 >= rate 0.06: Gordon denominator non-positive
        let rate_axis = vec![dec!(0.06), dec!(0.10)];
        let terminal_axis = vec![dec!(0.02), dec!(0.08)];
        let result = generate_sensitivity(
            &sample_snapshot(),
            &sample_rates(),
            &sample_projection(),
            &rate_axis,
            &terminal_axis,
        )
        .unwrap();
        let out = &result.result;

        assert!(out.cells[0][0].is_some());
        assert!(out.cells[0][1].is_none());
        assert!(out.cells[1][1].is_some());
        assert!(result.warnings.iter().any(|w| w.contains("skipped")));
    }

    #[test]
    fn test_base_case_position() {
        // Base WACC = 0.08465, base growth = 0.02
        let rate_axis = vec![dec!(0.07), dec!(0.08), dec!(0.09), dec!(0.10)];
        let terminal_axis = vec![dec!(0.01), dec!(0.02), dec!(0.03)];
        let result = generate_sensitivity(
            &sample_snapshot(),
            &sample_rates(),
            &sample_projection(),
            &rate_axis,
            &terminal_axis,
        )
        .unwrap();
        let out = &result.result;

        assert_eq!(out.base_case_position, (1, 1));
        assert_eq!(out.base_discount_rate, dec!(0.08465));
        assert!(out.base_fair_value.is_some());
    }

    #[test]
    fn test_exit_multiple_axis_sweeps_multiples() {
        // Under an exit-multiple base case the terminal axis holds multiples,
        // not growth rates, so no cell should trip the Gordon g < r check.
        let projection = ProjectionAssumptions {
            horizon: 5,
            growth: GrowthSchedule::Constant(dec!(0.08)),
            terminal: TerminalModel::ExitMultiple { multiple: dec!(12) },
        };
        let rate_axis = vec![dec!(0.08), dec!(0.10)];
        let terminal_axis = vec![dec!(10), dec!(12), dec!(14)];
        let result = generate_sensitivity(
            &sample_snapshot(),
            &sample_rates(),
            &projection,
            &rate_axis,
            &terminal_axis,
        )
        .unwrap();
        let out = &result.result;

        for row in &out.cells {
            for cell in row {
                assert!(cell.is_some());
            }
            // Fair value rises with the exit multiple
            for j in 0..row.len() - 1 {
                assert!(row[j].unwrap() < row[j + 1].unwrap());
            }
        }
        assert!(!result.warnings.iter().any(|w| w.contains("skipped")));
    }

    #[test]
    fn test_exit_multiple_base_case_position() {
        let projection = ProjectionAssumptions {
            horizon: 5,
            growth: GrowthSchedule::Constant(dec!(0.08)),
            terminal: TerminalModel::ExitMultiple { multiple: dec!(12) },
        };
        let rate_axis = vec![dec!(0.08), dec!(0.10)];
        let terminal_axis = vec![dec!(10), dec!(12), dec!(14)];
        let result = generate_sensitivity(
            &sample_snapshot(),
            &sample_rates(),
            &projection,
            &rate_axis,
            &terminal_axis,
        )
        .unwrap();
        let out = &result.result;

        // Base WACC 0.08465 is closest to 0.08; base multiple 12 is on the axis
        assert_eq!(out.base_case_position, (0, 1));
        assert!(out.base_fair_value.is_some());
    }

    #[test]
    fn test_empty_axis_rejected() {
        let result = generate_sensitivity(
            &sample_snapshot(),
            &sample_rates(),
            &sample_projection(),
            &[],
            &[dec!(0.02)],
        );
        assert!(matches!(
            result,
            Err(FairvalError::InvalidAssumption { .. })
        ));
    }
}
