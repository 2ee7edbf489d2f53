//! Dividend Discount Models.
//!
//! Single-stage (Gordon) and multi-stage dividend discounting, both
//! returning a per-share fair value with a verdict against the market
//! price and an advisory payout-sustainability flag.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

pub mod gordon;
pub mod multistage;
pub mod payout;

pub use gordon::valuate_gordon_ddm;
pub use multistage::{valuate_multistage_ddm, GrowthPhase, PhaseValue};
pub use payout::{assess_payout, PayoutFlag};

use serde::{Deserialize, Serialize};

use crate::error::FairvalError;
use crate::types::{Money, Rate, ValuationMethod, Verdict};
use crate::FairvalResult;

/// A single projected dividend period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendPeriod {
    /// Year number (1-indexed).
    pub year: u32,
    /// Projected dividend for this year.
    pub dividend: Money,
    /// Present value of this year's dividend.
    pub present_value: Money,
}

/// Output shared by both DDM modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdmValuation {
    pub method: ValuationMethod,
    /// Intrinsic value per share.
    pub fair_value_per_share: Money,
    /// Required rate of return used for discounting.
    pub required_return: Rate,
    /// Explicit-period dividends (empty for the single-stage model,
    /// which values the whole stream as a perpetuity).
    pub dividends: Vec<DividendPeriod>,
    /// PV decomposition by growth phase (multi-stage only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phase_values: Vec<PhaseValue>,
    /// Present value of the terminal (perpetuity) component.
    pub terminal_value: Money,
    /// Terminal component as a percentage of fair value.
    pub terminal_pct: rust_decimal::Decimal,
    /// Market price the verdict was classified against.
    pub market_price: Money,
    pub verdict: Verdict,
    /// Advisory flag; never an error.
    pub payout: PayoutFlag,
}

pub(crate) fn validate_required_return(required_return: Rate) -> FairvalResult<()> {
    if required_return <= rust_decimal::Decimal::ZERO {
        return Err(FairvalError::InvalidAssumption {
            field: "required_return".into(),
            reason: "Required rate of return must be positive".into(),
        });
    }
    Ok(())
}

pub(crate) fn validate_convergence(required_return: Rate, growth: Rate) -> FairvalResult<()> {
    if growth >= required_return {
        return Err(FairvalError::InvalidAssumption {
            field: "dividend_growth".into(),
            reason: format!(
                "Growth rate {growth} must be strictly below the required return {required_return}"
            ),
        });
    }
    Ok(())
}
