use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use fairval_core::comps::{build_comparable_set, score_comparables, MultipleKind};
use fairval_core::snapshot::FinancialSnapshot;

use crate::input;

/// Arguments for computing peer multiples
#[derive(Args)]
pub struct CompsArgs {
    /// Path to a JSON/YAML file with the target, peers and multiples
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for ranking a comparable set
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to a JSON/YAML file with the target, peers and multiples
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct CompsRequest {
    target: FinancialSnapshot,
    peers: Vec<FinancialSnapshot>,
    multiples: Vec<MultipleKind>,
}

fn read_request(path: &Option<String>) -> Result<CompsRequest, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        Ok(input::file::read_typed(path)?)
    } else if let Some(data) = input::stdin::read_piped()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("--input file (or piped JSON) is required for comps analysis".into())
    }
}

pub fn run_comps(args: CompsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(&args.input)?;
    let result = build_comparable_set(&request.target, &request.peers, &request.multiples)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_score(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(&args.input)?;
    let set = build_comparable_set(&request.target, &request.peers, &request.multiples)?;

    let scored = score_comparables(&set.result)?;
    // Surface exclusion warnings from the build step alongside scoring output
    let mut value = serde_json::to_value(scored)?;
    if let Some(warnings) = value.get_mut("warnings").and_then(|w| w.as_array_mut()) {
        for w in set.warnings {
            warnings.push(Value::String(w));
        }
    }
    Ok(value)
}
