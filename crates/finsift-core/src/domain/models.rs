//! Canonical records exchanged with the provider and the JSON store.

use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime};

/// One entry of the exchange symbol list, as persisted in
/// `symbols_{exchange}.json`.
///
/// Field names mirror the provider's symbol-listing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolListing {
    pub description: String,
    pub display_symbol: String,
    /// ISO 10383 market identifier code.
    #[serde(alias = "mic")]
    pub market_id_code: String,
}

/// Flat fundamentals snapshot for one symbol.
///
/// Metric fields the provider does not report come back as `0.0`; see
/// [`crate::finnhub::metric_fields`] for the sentinel contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub symbol: Symbol,
    pub company_name: String,
    pub as_of: UtcDateTime,
    pub market_cap: f64,
    pub current_price: f64,
    pub pe_ratio: f64,
    pub pb_ratio: f64,
    pub eps: f64,
    pub revenue_per_share: f64,
    pub profit_margin: f64,
    pub roe: f64,
    pub roa: f64,
    pub debt_to_equity: f64,
    pub dividend_yield: f64,
    pub beta: f64,
    pub book_value_per_share: f64,
}

impl Fundamentals {
    /// Price divided by book value per share, defined as `0.0` when book
    /// value is zero so unreported book values never produce infinities.
    pub fn derived_pb_ratio(&self) -> f64 {
        if self.book_value_per_share == 0.0 {
            0.0
        } else {
            self.current_price / self.book_value_per_share
        }
    }
}
