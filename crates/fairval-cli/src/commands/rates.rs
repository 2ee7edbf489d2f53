use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::Value;

use fairval_core::discount::{self, DiscountRateAssumptions};
use fairval_core::snapshot::FinancialSnapshot;

use crate::input;

/// Arguments for the CAPM cost of equity
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CostOfEquityArgs {
    /// Risk-free rate (e.g. 0.042 for 4.2%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Levered beta
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Equity risk premium (e.g. 0.055 for 5.5%)
    #[arg(long, alias = "erp")]
    pub equity_risk_premium: Option<Decimal>,
}

/// Arguments for the WACC calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct WaccArgs {
    /// Risk-free rate (e.g. 0.042 for 4.2%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Equity risk premium (e.g. 0.055 for 5.5%)
    #[arg(long, alias = "erp")]
    pub equity_risk_premium: Option<Decimal>,

    /// Levered beta
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Equity weight in the capital structure
    #[arg(long)]
    pub equity_weight: Option<Decimal>,

    /// Debt weight in the capital structure
    #[arg(long)]
    pub debt_weight: Option<Decimal>,

    /// After-tax cost of debt
    #[arg(long)]
    pub after_tax_cost_of_debt: Option<Decimal>,

    /// Path to a JSON/YAML file with a snapshot and rate assumptions
    /// (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// File/stdin request: resolve the discount rate against a snapshot.
#[derive(Deserialize)]
struct WaccRequest {
    snapshot: FinancialSnapshot,
    rates: DiscountRateAssumptions,
}

pub fn run_cost_of_equity(args: CostOfEquityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rf = args
        .risk_free_rate
        .ok_or("--risk-free-rate is required")?;
    let beta = args.beta.unwrap_or(dec!(1.0));
    let erp = args
        .equity_risk_premium
        .ok_or("--equity-risk-premium is required")?;

    let ke = discount::cost_of_equity(rf, beta, erp);
    Ok(serde_json::json!({
        "risk_free_rate": rf,
        "beta": beta,
        "equity_risk_premium": erp,
        "cost_of_equity": ke,
    }))
}

pub fn run_wacc(args: WaccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: Option<WaccRequest> = if let Some(ref path) = args.input {
        Some(input::file::read_typed(path)?)
    } else if let Some(data) = input::stdin::read_piped()? {
        Some(serde_json::from_value(data)?)
    } else {
        None
    };

    if let Some(request) = request {
        let mut warnings = Vec::new();
        let resolved =
            discount::resolve_discount_rate(&request.snapshot, &request.rates, &mut warnings)?;
        return Ok(serde_json::json!({
            "result": resolved,
            "warnings": warnings,
        }));
    }

    // Flag route: pure CAPM build-up, no snapshot
    let rf = args
        .risk_free_rate
        .ok_or("--risk-free-rate is required (or provide --input)")?;
    let erp = args
        .equity_risk_premium
        .ok_or("--equity-risk-premium is required (or provide --input)")?;
    let beta = args.beta.unwrap_or(dec!(1.0));
    let equity_weight = args
        .equity_weight
        .ok_or("--equity-weight is required (or provide --input)")?;
    let debt_weight = args
        .debt_weight
        .ok_or("--debt-weight is required (or provide --input)")?;
    let after_tax_cost_of_debt = args.after_tax_cost_of_debt.unwrap_or(Decimal::ZERO);

    let ke = discount::cost_of_equity(rf, beta, erp);
    let wacc = discount::wacc(ke, after_tax_cost_of_debt, equity_weight, debt_weight)?;

    Ok(serde_json::json!({
        "cost_of_equity": ke,
        "after_tax_cost_of_debt": after_tax_cost_of_debt,
        "equity_weight": equity_weight,
        "debt_weight": debt_weight,
        "wacc": wacc,
    }))
}
