use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples (e.g., 8.5x EV/EBITDA)
pub type Multiple = Decimal;

/// Currency code. Carried through valuations, never converted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    GBP,
    #[default]
    USD,
    EUR,
    CHF,
    JPY,
    CAD,
    AUD,
    HKD,
    SGD,
    Other(String),
}

/// Valuation method discriminator for fair-value results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationMethod {
    Dcf,
    Ddm,
}

/// Fair-value-vs-market-price classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Undervalued,
    Overvalued,
    FairlyValued,
}

/// Default symmetric tolerance band for `Verdict::FairlyValued` (±5%).
pub const DEFAULT_VERDICT_TOLERANCE: Rate = dec!(0.05);

/// Default margin (in ratio points) by which the latest payout ratio may
/// exceed its historical average before being flagged unsustainable.
pub const DEFAULT_SUSTAINABILITY_MARGIN: Rate = dec!(0.20);

impl Verdict {
    /// Classify a fair value against the market price using a symmetric
    /// tolerance band: within ±tolerance of market is fairly valued.
    pub fn classify(fair_value: Money, market_price: Money, tolerance: Rate) -> Verdict {
        let upper = market_price * (Decimal::ONE + tolerance);
        let lower = market_price * (Decimal::ONE - tolerance);
        if fair_value > upper {
            Verdict::Undervalued
        } else if fair_value < lower {
            Verdict::Overvalued
        } else {
            Verdict::FairlyValued
        }
    }
}

/// Tunable engine parameters. UI-facing defaults, not engine constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tolerance band for the fair-value verdict.
    pub verdict_tolerance: Rate,
    /// Payout-ratio margin for the dividend sustainability flag.
    pub sustainability_margin: Rate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            verdict_tolerance: DEFAULT_VERDICT_TOLERANCE,
            sustainability_margin: DEFAULT_SUSTAINABILITY_MARGIN,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
