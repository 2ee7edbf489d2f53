use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FairvalError;
use crate::types::{Currency, Money, Rate};
use crate::FairvalResult;

/// One historical dividend payment, per share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendRecord {
    pub period: NaiveDate,
    pub amount: Money,
}

/// Normalized per-company financial facts for a single valuation request.
///
/// Constructed once from external data and read-only thereafter. Every
/// monetary field is in `currency`; no conversion happens downstream.
/// Fields are optional because source statements are ragged; each engine
/// demands the fields it needs via the `require_*` accessors and fails
/// with `InsufficientData` naming the ticker and field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// Company identifier (ticker or name)
    pub ticker: String,
    /// Reporting currency
    pub currency: Currency,
    /// Most recent annual free cash flow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_cash_flow: Option<Money>,
    /// Most recent annual dividend per share
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_per_share: Option<Money>,
    /// Trailing twelve-month earnings per share
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_eps: Option<Decimal>,
    /// Consensus forward earnings per share
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_eps: Option<Decimal>,
    /// Current share price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_price: Option<Money>,
    /// Shares outstanding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<Decimal>,
    /// Net debt (total debt minus cash)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_debt: Option<Money>,
    /// Market capitalisation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Money>,
    /// Annual interest expense (cost-of-debt input)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_expense: Option<Money>,
    /// Total debt (cost-of-debt input)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_debt: Option<Money>,
    /// Book value of equity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_equity: Option<Money>,
    /// Marginal tax rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Rate>,
    /// Levered equity beta
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<Decimal>,
    /// EBITDA
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebitda: Option<Money>,
    /// Total revenue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Money>,
    /// Historical per-share dividends, ordered by period, most recent last
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dividend_history: Vec<DividendRecord>,
}

macro_rules! require_field {
    ($name:ident, $field:ident, $ty:ty, $label:expr) => {
        pub fn $name(&self) -> FairvalResult<$ty> {
            self.$field.ok_or_else(|| {
                FairvalError::InsufficientData(format!(
                    "{}: missing {}",
                    self.ticker, $label
                ))
            })
        }
    };
}

impl FinancialSnapshot {
    /// Empty snapshot for the given company; fields are filled in from
    /// whatever the external data layer managed to parse.
    pub fn new(ticker: impl Into<String>, currency: Currency) -> Self {
        FinancialSnapshot {
            ticker: ticker.into(),
            currency,
            free_cash_flow: None,
            dividend_per_share: None,
            trailing_eps: None,
            forward_eps: None,
            share_price: None,
            shares_outstanding: None,
            net_debt: None,
            market_cap: None,
            interest_expense: None,
            total_debt: None,
            total_equity: None,
            tax_rate: None,
            beta: None,
            ebitda: None,
            revenue: None,
            dividend_history: vec![],
        }
    }

    require_field!(require_free_cash_flow, free_cash_flow, Money, "free cash flow");
    require_field!(require_dividend_per_share, dividend_per_share, Money, "dividend per share");
    require_field!(require_trailing_eps, trailing_eps, Decimal, "trailing EPS");
    require_field!(require_share_price, share_price, Money, "share price");
    require_field!(require_net_debt, net_debt, Money, "net debt");
    require_field!(require_tax_rate, tax_rate, Rate, "tax rate");
    require_field!(require_beta, beta, Decimal, "beta");

    /// Shares outstanding must also be positive to be usable as a divisor.
    pub fn require_shares_outstanding(&self) -> FairvalResult<Decimal> {
        match self.shares_outstanding {
            Some(s) if s > Decimal::ZERO => Ok(s),
            Some(_) => Err(FairvalError::InsufficientData(format!(
                "{}: shares outstanding must be positive",
                self.ticker
            ))),
            None => Err(FairvalError::InsufficientData(format!(
                "{}: missing shares outstanding",
                self.ticker
            ))),
        }
    }

    /// Approximate free cash flow when the statement does not report it
    /// directly: operating cash flow less the magnitude of capex.
    pub fn approximate_free_cash_flow(operating_cash_flow: Money, capex: Money) -> Money {
        operating_cash_flow - capex.abs()
    }
}
