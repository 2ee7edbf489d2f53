use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::discount::{resolve_discount_rate, DiscountRateAssumptions};
use crate::error::FairvalError;
use crate::projection::{discount_factor, project, terminal_value, ProjectionAssumptions};
use crate::snapshot::FinancialSnapshot;
use crate::types::{
    with_metadata, ComputationOutput, EngineConfig, Money, Rate, ValuationMethod, Verdict,
};
use crate::FairvalResult;

/// One forecast year of the DCF model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedCashFlow {
    pub year: u32,
    pub cash_flow: Money,
    pub discount_factor: Rate,
    pub present_value: Money,
}

/// Output of the DCF valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfValuation {
    pub method: ValuationMethod,
    /// Year-by-year projected free cash flow and present values
    pub projections: Vec<ProjectedCashFlow>,
    /// Undiscounted terminal value at the horizon
    pub terminal_value: Money,
    /// Sum of present values of explicit-period cash flows
    pub pv_of_cash_flows: Money,
    /// Present value of the terminal value
    pub pv_of_terminal: Money,
    /// Enterprise value = PV(cash flows) + PV(terminal)
    pub enterprise_value: Money,
    /// Equity value = enterprise value - net debt
    pub equity_value: Money,
    /// Equity value / shares outstanding
    pub fair_value_per_share: Money,
    /// WACC used for discounting
    pub discount_rate: Rate,
    /// Cost of equity behind the WACC
    pub cost_of_equity: Rate,
    /// Market price the verdict was classified against
    pub market_price: Money,
    pub verdict: Verdict,
}

/// Explicit-period and terminal discounting down to fair value per share.
/// Shared between the DCF valuation and the sensitivity grid.
#[derive(Debug, Clone)]
pub(crate) struct DiscountedEquity {
    pub projections: Vec<ProjectedCashFlow>,
    pub terminal_value: Money,
    pub pv_of_cash_flows: Money,
    pub pv_of_terminal: Money,
    pub enterprise_value: Money,
    pub equity_value: Money,
    pub fair_value_per_share: Money,
}

/// Run a free-cash-flow DCF valuation against a snapshot.
pub fn valuate_dcf(
    snapshot: &FinancialSnapshot,
    rates: &DiscountRateAssumptions,
    assumptions: &ProjectionAssumptions,
    config: &EngineConfig,
) -> FairvalResult<ComputationOutput<DcfValuation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let resolved = resolve_discount_rate(snapshot, rates, &mut warnings)?;

    let base_fcf = snapshot.require_free_cash_flow()?;
    let net_debt = snapshot.require_net_debt()?;
    let shares = snapshot.require_shares_outstanding()?;
    let market_price = snapshot.require_share_price()?;

    let core = discount_to_equity(base_fcf, net_debt, shares, resolved.wacc, assumptions)?;

    if !core.enterprise_value.is_zero() {
        let tv_pct = core.pv_of_terminal / core.enterprise_value;
        if tv_pct > dec!(0.75) {
            warnings.push(format!(
                "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
                tv_pct * dec!(100)
            ));
        }
    }

    let verdict = Verdict::classify(
        core.fair_value_per_share,
        market_price,
        config.verdict_tolerance,
    );

    let output = DcfValuation {
        method: ValuationMethod::Dcf,
        projections: core.projections,
        terminal_value: core.terminal_value,
        pv_of_cash_flows: core.pv_of_cash_flows,
        pv_of_terminal: core.pv_of_terminal,
        enterprise_value: core.enterprise_value,
        equity_value: core.equity_value,
        fair_value_per_share: core.fair_value_per_share,
        discount_rate: resolved.wacc,
        cost_of_equity: resolved.cost_of_equity,
        market_price,
        verdict,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Free Cash Flow DCF (CAPM/WACC)",
        &serde_json::json!({
            "ticker": snapshot.ticker,
            "rates": rates,
            "projection": assumptions,
            "config": config,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Project, discount and bridge to a per-share equity value.
pub(crate) fn discount_to_equity(
    base_value: Money,
    net_debt: Money,
    shares_outstanding: Decimal,
    discount_rate: Rate,
    assumptions: &ProjectionAssumptions,
) -> FairvalResult<DiscountedEquity> {
    if discount_rate <= Decimal::ZERO {
        return Err(FairvalError::InvalidAssumption {
            field: "discount_rate".into(),
            reason: "Discount rate must be positive".into(),
        });
    }

    let projected = project(base_value, assumptions.horizon, &assumptions.growth)?;

    let mut projections = Vec::with_capacity(projected.len());
    let mut pv_of_cash_flows = Decimal::ZERO;
    for (idx, cash_flow) in projected.iter().enumerate() {
        let year = idx as u32 + 1;
        let df = discount_factor(discount_rate, year);
        let present_value = cash_flow * df;
        pv_of_cash_flows += present_value;
        projections.push(ProjectedCashFlow {
            year,
            cash_flow: *cash_flow,
            discount_factor: df,
            present_value,
        });
    }

    // project() guarantees at least one year
    let final_value = *projected.last().ok_or_else(|| FairvalError::InvalidAssumption {
        field: "horizon".into(),
        reason: "Projection produced no forecast years".into(),
    })?;

    let tv = terminal_value(final_value, &assumptions.terminal, discount_rate)?;
    let pv_of_terminal = tv * discount_factor(discount_rate, assumptions.horizon);

    let enterprise_value = pv_of_cash_flows + pv_of_terminal;
    let equity_value = enterprise_value - net_debt;
    let fair_value_per_share = equity_value / shares_outstanding;

    Ok(DiscountedEquity {
        projections,
        terminal_value: tv,
        pv_of_cash_flows,
        pv_of_terminal,
        enterprise_value,
        equity_value,
        fair_value_per_share,
    })
}
