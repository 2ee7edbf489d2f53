//! Peer comparables analysis.
//!
//! Builds a set of valuation multiples across a target and its peers,
//! normalizes each multiple via z-scores, and ranks companies by a
//! composite score where higher always means more favorably valued.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

pub mod multiples;
pub mod scoring;

pub use multiples::{
    build_comparable_set, ComparableSet, CompanyMultiples, Exclusion, MultipleKind,
};
pub use scoring::{score_comparables, CompanyScore, ScoringResult};
