use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use fairval_core::ddm::{valuate_gordon_ddm, valuate_multistage_ddm, GrowthPhase};
use fairval_core::snapshot::FinancialSnapshot;
use fairval_core::EngineConfig;

use crate::input;

#[derive(Debug, Clone, ValueEnum)]
pub enum DdmMode {
    Gordon,
    Multistage,
}

/// Arguments for a dividend discount valuation
#[derive(Args)]
pub struct DdmArgs {
    /// Discounting mode
    #[arg(long, default_value = "gordon")]
    pub mode: DdmMode,

    /// Path to a JSON/YAML file with the snapshot and assumptions
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct DdmRequest {
    snapshot: FinancialSnapshot,
    required_return: Decimal,
    /// Gordon mode only
    #[serde(default)]
    dividend_growth: Option<Decimal>,
    /// Multistage mode only
    #[serde(default)]
    phases: Option<Vec<GrowthPhase>>,
    #[serde(default)]
    config: Option<EngineConfig>,
}

pub fn run_ddm(args: DdmArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: DdmRequest = if let Some(ref path) = args.input {
        input::file::read_typed(path)?
    } else if let Some(data) = input::stdin::read_piped()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file (or piped JSON) is required for a DDM valuation".into());
    };

    let config = request.config.unwrap_or_default();

    let result = match args.mode {
        DdmMode::Gordon => {
            let growth = request
                .dividend_growth
                .ok_or("'dividend_growth' is required for gordon mode")?;
            valuate_gordon_ddm(&request.snapshot, request.required_return, growth, &config)?
        }
        DdmMode::Multistage => {
            let phases = request
                .phases
                .ok_or("'phases' is required for multistage mode")?;
            valuate_multistage_ddm(&request.snapshot, request.required_return, &phases, &config)?
        }
    };

    Ok(serde_json::to_value(result)?)
}
