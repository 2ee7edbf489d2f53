use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use fairval_core::dcf::valuate_dcf;
use fairval_core::discount::DiscountRateAssumptions;
use fairval_core::projection::ProjectionAssumptions;
use fairval_core::sensitivity::generate_sensitivity;
use fairval_core::snapshot::FinancialSnapshot;
use fairval_core::EngineConfig;

use crate::input;

/// Arguments for a DCF valuation
#[derive(Args)]
pub struct DcfArgs {
    /// Path to a JSON/YAML file with the snapshot and assumptions
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a fair-value sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to a JSON/YAML file with the snapshot, assumptions and axes
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct DcfRequest {
    snapshot: FinancialSnapshot,
    rates: DiscountRateAssumptions,
    projection: ProjectionAssumptions,
    #[serde(default)]
    config: Option<EngineConfig>,
}

#[derive(Deserialize)]
struct SensitivityRequest {
    snapshot: FinancialSnapshot,
    rates: DiscountRateAssumptions,
    projection: ProjectionAssumptions,
    rate_axis: Vec<Decimal>,
    terminal_axis: Vec<Decimal>,
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: DcfRequest = if let Some(ref path) = args.input {
        input::file::read_typed(path)?
    } else if let Some(data) = input::stdin::read_piped()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file (or piped JSON) is required for a DCF valuation".into());
    };

    let config = request.config.unwrap_or_default();
    let result = valuate_dcf(&request.snapshot, &request.rates, &request.projection, &config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SensitivityRequest = if let Some(ref path) = args.input {
        input::file::read_typed(path)?
    } else if let Some(data) = input::stdin::read_piped()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file (or piped JSON) is required for a sensitivity grid".into());
    };

    let result = generate_sensitivity(
        &request.snapshot,
        &request.rates,
        &request.projection,
        &request.rate_axis,
        &request.terminal_axis,
    )?;
    Ok(serde_json::to_value(result)?)
}
