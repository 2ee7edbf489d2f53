use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use fairval_core::comps::{build_comparable_set, score_comparables, MultipleKind};
use fairval_core::dcf::valuate_dcf;
use fairval_core::ddm::{valuate_gordon_ddm, valuate_multistage_ddm, GrowthPhase};
use fairval_core::discount::DiscountRateAssumptions;
use fairval_core::projection::ProjectionAssumptions;
use fairval_core::sensitivity::generate_sensitivity;
use fairval_core::snapshot::FinancialSnapshot;
use fairval_core::EngineConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

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

#[derive(Deserialize)]
struct GordonRequest {
    snapshot: FinancialSnapshot,
    required_return: Decimal,
    dividend_growth: Decimal,
    #[serde(default)]
    config: Option<EngineConfig>,
}

#[derive(Deserialize)]
struct MultistageRequest {
    snapshot: FinancialSnapshot,
    required_return: Decimal,
    phases: Vec<GrowthPhase>,
    #[serde(default)]
    config: Option<EngineConfig>,
}

#[derive(Deserialize)]
struct CompsRequest {
    target: FinancialSnapshot,
    peers: Vec<FinancialSnapshot>,
    multiples: Vec<MultipleKind>,
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn dcf_valuation(input_json: String) -> NapiResult<String> {
    let request: DcfRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = request.config.unwrap_or_default();
    let output = valuate_dcf(&request.snapshot, &request.rates, &request.projection, &config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn sensitivity_grid(input_json: String) -> NapiResult<String> {
    let request: SensitivityRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = generate_sensitivity(
        &request.snapshot,
        &request.rates,
        &request.projection,
        &request.rate_axis,
        &request.terminal_axis,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn gordon_ddm_valuation(input_json: String) -> NapiResult<String> {
    let request: GordonRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = request.config.unwrap_or_default();
    let output = valuate_gordon_ddm(
        &request.snapshot,
        request.required_return,
        request.dividend_growth,
        &config,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn multistage_ddm_valuation(input_json: String) -> NapiResult<String> {
    let request: MultistageRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = request.config.unwrap_or_default();
    let output = valuate_multistage_ddm(
        &request.snapshot,
        request.required_return,
        &request.phases,
        &config,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparables
// ---------------------------------------------------------------------------

#[napi]
pub fn comparable_multiples(input_json: String) -> NapiResult<String> {
    let request: CompsRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = build_comparable_set(&request.target, &request.peers, &request.multiples)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn comparable_scores(input_json: String) -> NapiResult<String> {
    let request: CompsRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let set = build_comparable_set(&request.target, &request.peers, &request.multiples)
        .map_err(to_napi_error)?;
    let output = score_comparables(&set.result).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
