use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::FairvalError;
use crate::snapshot::FinancialSnapshot;
use crate::types::{with_metadata, ComputationOutput, Multiple};
use crate::FairvalResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Valuation multiples supported by the comps engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MultipleKind {
    PriceEarnings,
    ForwardPriceEarnings,
    DebtToEquity,
    EvEbitda,
    EvRevenue,
    PriceSales,
}

impl std::fmt::Display for MultipleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultipleKind::PriceEarnings => write!(f, "P/E"),
            MultipleKind::ForwardPriceEarnings => write!(f, "Forward P/E"),
            MultipleKind::DebtToEquity => write!(f, "D/E"),
            MultipleKind::EvEbitda => write!(f, "EV/EBITDA"),
            MultipleKind::EvRevenue => write!(f, "EV/Revenue"),
            MultipleKind::PriceSales => write!(f, "P/S"),
        }
    }
}

impl MultipleKind {
    /// Whether a lower raw value is conventionally better. Scoring
    /// inverts the z-score sign for these so a higher composite always
    /// means more favorably valued.
    pub fn lower_is_better(&self) -> bool {
        match self {
            MultipleKind::PriceEarnings
            | MultipleKind::ForwardPriceEarnings
            | MultipleKind::DebtToEquity
            | MultipleKind::EvEbitda
            | MultipleKind::EvRevenue
            | MultipleKind::PriceSales => true,
        }
    }

    /// Compute this multiple for a snapshot, or the reason it cannot be.
    fn compute(&self, snapshot: &FinancialSnapshot) -> Result<Multiple, String> {
        match self {
            MultipleKind::PriceEarnings => {
                ratio(snapshot.share_price, "share price", snapshot.trailing_eps, "trailing EPS")
            }
            MultipleKind::ForwardPriceEarnings => {
                ratio(snapshot.share_price, "share price", snapshot.forward_eps, "forward EPS")
            }
            MultipleKind::DebtToEquity => {
                ratio(snapshot.total_debt, "total debt", snapshot.total_equity, "total equity")
            }
            MultipleKind::EvEbitda => {
                over(enterprise_value(snapshot)?, snapshot.ebitda, "EBITDA")
            }
            MultipleKind::EvRevenue => {
                over(enterprise_value(snapshot)?, snapshot.revenue, "revenue")
            }
            MultipleKind::PriceSales => {
                ratio(snapshot.market_cap, "market cap", snapshot.revenue, "revenue")
            }
        }
    }
}

fn ratio(
    numerator: Option<Decimal>,
    numerator_label: &str,
    denominator: Option<Decimal>,
    denominator_label: &str,
) -> Result<Multiple, String> {
    let num = numerator.ok_or_else(|| format!("missing {numerator_label}"))?;
    over(num, denominator, denominator_label)
}

fn over(
    numerator: Decimal,
    denominator: Option<Decimal>,
    denominator_label: &str,
) -> Result<Multiple, String> {
    let den = denominator.ok_or_else(|| format!("missing {denominator_label}"))?;
    if den <= Decimal::ZERO {
        return Err(format!("non-positive {denominator_label}"));
    }
    Ok(numerator / den)
}

/// Market cap plus net debt, the numerator shared by the EV multiples.
fn enterprise_value(snapshot: &FinancialSnapshot) -> Result<Decimal, String> {
    let market_cap = snapshot
        .market_cap
        .ok_or_else(|| "missing market cap".to_string())?;
    let net_debt = snapshot
        .net_debt
        .ok_or_else(|| "missing net debt".to_string())?;
    Ok(market_cap + net_debt)
}

/// Multiples computed for one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyMultiples {
    pub name: String,
    /// multiple kind -> value, only for multiples this company supports
    pub values: BTreeMap<MultipleKind, Multiple>,
}

/// A company excluded from one multiple's pool, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exclusion {
    pub company: String,
    pub multiple: MultipleKind,
    pub reason: String,
}

/// Target plus peers with their computed multiples, input order preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparableSet {
    /// Name of the target company (always the first entry of `companies`)
    pub target: String,
    /// Multiples selected for the analysis
    pub multiples: Vec<MultipleKind>,
    /// Target first, then peers in input order
    pub companies: Vec<CompanyMultiples>,
    /// Per-multiple exclusions; never silently coerced to zero
    pub exclusions: Vec<Exclusion>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the selected multiples for the target and each peer.
///
/// A company missing the inputs for a multiple is excluded from that
/// multiple's pool with a recorded reason.
pub fn build_comparable_set(
    target: &FinancialSnapshot,
    peers: &[FinancialSnapshot],
    selected: &[MultipleKind],
) -> FairvalResult<ComputationOutput<ComparableSet>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if selected.is_empty() {
        return Err(FairvalError::InvalidAssumption {
            field: "multiples".into(),
            reason: "At least one multiple must be selected".into(),
        });
    }
    if peers.len() < 3 {
        warnings.push(format!(
            "Only {} peers supplied; consider adding more for statistical significance",
            peers.len()
        ));
    }

    let mut companies = Vec::with_capacity(peers.len() + 1);
    let mut exclusions = Vec::new();

    for snapshot in std::iter::once(target).chain(peers.iter()) {
        let mut values = BTreeMap::new();
        for kind in selected {
            match kind.compute(snapshot) {
                Ok(value) => {
                    values.insert(*kind, value);
                }
                Err(reason) => {
                    warnings.push(format!("{}: excluded from {kind} ({reason})", snapshot.ticker));
                    exclusions.push(Exclusion {
                        company: snapshot.ticker.clone(),
                        multiple: *kind,
                        reason,
                    });
                }
            }
        }
        companies.push(CompanyMultiples {
            name: snapshot.ticker.clone(),
            values,
        });
    }

    if companies.iter().all(|c| c.values.is_empty()) {
        return Err(FairvalError::InsufficientData(
            "No company had sufficient data for any selected multiple".into(),
        ));
    }

    let output = ComparableSet {
        target: target.ticker.clone(),
        multiples: selected.to_vec(),
        companies,
        exclusions,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Peer Multiple Computation",
        &serde_json::json!({
            "target": target.ticker,
            "peers": peers.iter().map(|p| p.ticker.clone()).collect::<Vec<_>>(),
            "multiples": selected,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;
    use rust_decimal_macros::dec;

    fn full_snapshot(ticker: &str) -> FinancialSnapshot {
        let mut snap = FinancialSnapshot::new(ticker, Currency::USD);
        snap.share_price = Some(dec!(50));
        snap.trailing_eps = Some(dec!(4.00));
        snap.forward_eps = Some(dec!(5.00));
        snap.total_debt = Some(dec!(800));
        snap.total_equity = Some(dec!(1600));
        snap.market_cap = Some(dec!(2000));
        snap.net_debt = Some(dec!(500));
        snap.ebitda = Some(dec!(250));
        snap.revenue = Some(dec!(1000));
        snap
    }

    fn all_multiples() -> Vec<MultipleKind> {
        vec![
            MultipleKind::PriceEarnings,
            MultipleKind::ForwardPriceEarnings,
            MultipleKind::DebtToEquity,
            MultipleKind::EvEbitda,
            MultipleKind::EvRevenue,
            MultipleKind::PriceSales,
        ]
    }

    #[test]
    fn test_all_multiples_computed() {
        let target = full_snapshot("TGT");
        let peers = vec![full_snapshot("PEER1"), full_snapshot("PEER2")];
        let result = build_comparable_set(&target, &peers, &all_multiples()).unwrap();
        let set = &result.result;

        assert_eq!(set.companies.len(), 3);
        assert_eq!(set.companies[0].name, "TGT");
        for company in &set.companies {
            assert_eq!(company.values.len(), 6);
        }
        assert!(set.exclusions.is_empty());
    }

    #[test]
    fn test_multiple_values() {
        let target = full_snapshot("TGT");
        let result = build_comparable_set(&target, &[], &all_multiples()).unwrap();
        let values = &result.result.companies[0].values;

        // P/E = 50 / 4 = 12.5
        assert_eq!(values[&MultipleKind::PriceEarnings], dec!(12.5));
        // Forward P/E = 50 / 5 = 10
        assert_eq!(values[&MultipleKind::ForwardPriceEarnings], dec!(10));
        // D/E = 800 / 1600 = 0.5
        assert_eq!(values[&MultipleKind::DebtToEquity], dec!(0.5));
        // EV/EBITDA = (2000 + 500) / 250 = 10
        assert_eq!(values[&MultipleKind::EvEbitda], dec!(10));
        // EV/Revenue = (2000 + 500) / 1000 = 2.5
        assert_eq!(values[&MultipleKind::EvRevenue], dec!(2.5));
        // P/S = 2000 / 1000 = 2
        assert_eq!(values[&MultipleKind::PriceSales], dec!(2));
    }

    #[test]
    fn test_missing_input_excluded_with_reason() {
        let target = full_snapshot("TGT");
        let mut peer = full_snapshot("NOEPS");
        peer.trailing_eps = None;

        let result =
            build_comparable_set(&target, &[peer], &[MultipleKind::PriceEarnings]).unwrap();
        let set = &result.result;

        assert!(!set.companies[1].values.contains_key(&MultipleKind::PriceEarnings));
        assert_eq!(set.exclusions.len(), 1);
        assert_eq!(set.exclusions[0].company, "NOEPS");
        assert!(set.exclusions[0].reason.contains("missing trailing EPS"));
        assert!(result.warnings.iter().any(|w| w.contains("NOEPS")));
    }

    #[test]
    fn test_negative_denominator_excluded() {
        let mut target = full_snapshot("LOSSCO");
        target.trailing_eps = Some(dec!(-2.00));

        let result =
            build_comparable_set(&target, &[], &[MultipleKind::PriceEarnings]);
        // Sole company excluded from the only multiple
        assert!(matches!(result, Err(FairvalError::InsufficientData(_))));
    }

    #[test]
    fn test_negative_ebitda_excluded() {
        let target = full_snapshot("TGT");
        let mut peer = full_snapshot("BURNCO");
        peer.ebitda = Some(dec!(-100));

        let result = build_comparable_set(&target, &[peer], &[MultipleKind::EvEbitda]).unwrap();
        let set = &result.result;
        assert!(set.exclusions.iter().any(|e| {
            e.company == "BURNCO" && e.reason.contains("non-positive EBITDA")
        }));
    }

    #[test]
    fn test_ev_revenue_missing_net_debt_excluded() {
        let target = full_snapshot("TGT");
        let mut peer = full_snapshot("NODEBT");
        peer.net_debt = None;

        let result = build_comparable_set(&target, &[peer], &[MultipleKind::EvRevenue]).unwrap();
        let set = &result.result;
        assert!(set.exclusions.iter().any(|e| {
            e.company == "NODEBT" && e.reason.contains("missing net debt")
        }));
        assert_eq!(set.companies[0].values[&MultipleKind::EvRevenue], dec!(2.5));
    }

    #[test]
    fn test_ev_revenue_lower_is_better() {
        assert!(MultipleKind::EvRevenue.lower_is_better());
    }

    #[test]
    fn test_empty_selection_rejected() {
        let target = full_snapshot("TGT");
        let result = build_comparable_set(&target, &[], &[]);
        assert!(matches!(
            result,
            Err(FairvalError::InvalidAssumption { .. })
        ));
    }

    #[test]
    fn test_few_peers_warning() {
        let target = full_snapshot("TGT");
        let result =
            build_comparable_set(&target, &[], &[MultipleKind::PriceEarnings]).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("peers supplied")));
    }

    #[test]
    fn test_peer_order_preserved() {
        let target = full_snapshot("TGT");
        let peers = vec![
            full_snapshot("ZED"),
            full_snapshot("ALPHA"),
            full_snapshot("MIKE"),
        ];
        let result = build_comparable_set(&target, &peers, &all_multiples()).unwrap();
        let names: Vec<&str> = result
            .result
            .companies
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["TGT", "ZED", "ALPHA", "MIKE"]);
    }
}
