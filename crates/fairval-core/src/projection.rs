use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::error::FairvalError;
use crate::types::{Money, Multiple, Rate};
use crate::FairvalResult;

/// Growth assumption for the projected metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GrowthSchedule {
    /// Same rate every forecast year
    Constant(Rate),
    /// Year-by-year rates; if shorter than the horizon the last rate is
    /// carried forward
    PerYear(Vec<Rate>),
}

impl GrowthSchedule {
    /// Growth rate for a zero-based forecast year index.
    pub fn rate_for_year(&self, year_idx: usize) -> Option<Rate> {
        match self {
            GrowthSchedule::Constant(g) => Some(*g),
            GrowthSchedule::PerYear(rates) => rates
                .get(year_idx)
                .or_else(|| rates.last())
                .copied(),
        }
    }
}

/// Terminal value model beyond the explicit horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TerminalModel {
    /// Perpetuity: TV = final * (1 + g) / (r - g), requires g < r
    GordonGrowth { rate: Rate },
    /// TV = final * multiple
    ExitMultiple { multiple: Multiple },
}

/// Horizon, growth and terminal assumptions for a projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionAssumptions {
    /// Explicit forecast years (>= 1)
    pub horizon: u32,
    /// Growth applied to the projected metric
    pub growth: GrowthSchedule,
    /// Terminal model applied after the final forecast year
    pub terminal: TerminalModel,
}

/// Project a base value over the horizon by compounding:
/// value[t] = value[t-1] * (1 + growth[t]).
pub fn project(
    base_value: Money,
    horizon: u32,
    growth: &GrowthSchedule,
) -> FairvalResult<Vec<Money>> {
    if horizon == 0 {
        return Err(FairvalError::InvalidAssumption {
            field: "horizon".into(),
            reason: "Projection horizon must be at least 1 year".into(),
        });
    }

    let mut projected = Vec::with_capacity(horizon as usize);
    let mut value = base_value;
    for year_idx in 0..horizon as usize {
        let g = growth.rate_for_year(year_idx).ok_or_else(|| {
            FairvalError::InvalidAssumption {
                field: "growth".into(),
                reason: "Per-year growth schedule must contain at least one rate".into(),
            }
        })?;
        if g <= Decimal::NEGATIVE_ONE {
            return Err(FairvalError::InvalidAssumption {
                field: "growth".into(),
                reason: format!("Growth rate ({g}) must be greater than -100%"),
            });
        }
        value *= Decimal::ONE + g;
        projected.push(value);
    }
    Ok(projected)
}

/// Terminal value from the final forecast-year value.
pub fn terminal_value(
    final_value: Money,
    model: &TerminalModel,
    discount_rate: Rate,
) -> FairvalResult<Money> {
    match model {
        TerminalModel::GordonGrowth { rate } => {
            if *rate >= discount_rate {
                return Err(FairvalError::InvalidAssumption {
                    field: "terminal_growth".into(),
                    reason: format!(
                        "Terminal growth ({rate}) must be strictly less than the discount rate ({discount_rate})"
                    ),
                });
            }
            if *rate <= Decimal::NEGATIVE_ONE {
                return Err(FairvalError::InvalidAssumption {
                    field: "terminal_growth".into(),
                    reason: format!("Terminal growth ({rate}) must be greater than -100%"),
                });
            }
            Ok(final_value * (Decimal::ONE + rate) / (discount_rate - rate))
        }
        TerminalModel::ExitMultiple { multiple } => {
            if *multiple <= Decimal::ZERO {
                return Err(FairvalError::InvalidAssumption {
                    field: "exit_multiple".into(),
                    reason: "Exit multiple must be positive".into(),
                });
            }
            Ok(final_value * multiple)
        }
    }
}

/// Discrete discount factor 1 / (1 + r)^t.
pub fn discount_factor(rate: Rate, period: u32) -> Rate {
    Decimal::ONE / (Decimal::ONE + rate).powd(Decimal::from(period))
}
