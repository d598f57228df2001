//! Finnhub REST adapter.
//!
//! One fundamentals fetch costs three provider queries (company profile,
//! basic financials, live quote) that are merged into a single
//! [`Fundamentals`] record. Metric extraction goes through the explicit
//! [`metric_fields`] table so a renamed upstream field shows up in exactly
//! one place instead of silently degrading everywhere.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::http::{HttpAuth, HttpClient, HttpRequest};
use crate::{Fundamentals, Symbol, SymbolListing, UtcDateTime};

pub const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Environment variable holding the provider token.
pub const API_KEY_ENV: &str = "FINNHUB_API_KEY";

/// Provider metric names mapped to record fields (metric schema v1).
///
/// Missing or wrong-typed values degrade to the `0.0` sentinel; the store
/// cannot distinguish that sentinel from a true zero, which is inherited
/// provider behavior.
pub mod metric_fields {
    pub const PE_RATIO: &str = "peBasicExclExtraTTM";
    pub const EPS: &str = "epsExclExtraItemsTTM";
    pub const REVENUE_PER_SHARE: &str = "revenuePerShareTTM";
    pub const PROFIT_MARGIN: &str = "netProfitMarginTTM";
    pub const ROE: &str = "roeTTM";
    pub const ROA: &str = "roaTTM";
    pub const DEBT_TO_EQUITY: &str = "totalDebt/totalEquityQuarterly";
    pub const DIVIDEND_YIELD: &str = "currentDividendYieldTTM";
    pub const BETA: &str = "beta";
    pub const BOOK_VALUE_PER_SHARE: &str = "bookValuePerShareQuarterly";
}

/// Errors surfaced by provider calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("environment variable FINNHUB_API_KEY is not set")]
    MissingCredential,

    #[error("transport failure for {endpoint}: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },

    #[error("{endpoint} returned HTTP {status} for '{subject}'")]
    Status {
        endpoint: &'static str,
        status: u16,
        subject: String,
    },

    #[error("could not decode {endpoint} payload: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of fundamentals records, the pipeline's one external collaborator.
pub trait FundamentalsSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Fundamentals, ProviderError>> + Send + 'a>>;
}

/// Finnhub-backed implementation of [`FundamentalsSource`].
#[derive(Clone)]
pub struct FinnhubAdapter {
    http: Arc<dyn HttpClient>,
    auth: HttpAuth,
    base_url: String,
}

impl FinnhubAdapter {
    pub fn new(http: Arc<dyn HttpClient>, token: impl Into<String>) -> Self {
        Self {
            http,
            auth: HttpAuth::Header {
                name: String::from("X-Finnhub-Token"),
                value: token.into(),
            },
            base_url: String::from(DEFAULT_BASE_URL),
        }
    }

    /// Build an adapter from `FINNHUB_API_KEY`; absence is a fatal startup
    /// condition for any mode that talks to the network.
    pub fn from_env(http: Arc<dyn HttpClient>) -> Result<Self, ProviderError> {
        let token = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ProviderError::MissingCredential)?;
        Ok(Self::new(http, token))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the exchange symbol directory.
    pub async fn symbols(&self, exchange: &str) -> Result<Vec<SymbolListing>, ProviderError> {
        let url = format!(
            "{}/stock/symbol?exchange={}",
            self.base_url,
            urlencoding::encode(exchange)
        );
        self.get_json("stock/symbol", url, exchange).await
    }

    async fn fetch_fundamentals(&self, symbol: &Symbol) -> Result<Fundamentals, ProviderError> {
        let encoded = urlencoding::encode(symbol.as_str()).into_owned();

        let profile: CompanyProfile = self
            .get_json(
                "stock/profile2",
                format!("{}/stock/profile2?symbol={encoded}", self.base_url),
                symbol.as_str(),
            )
            .await?;
        let financials: BasicFinancials = self
            .get_json(
                "stock/metric",
                format!("{}/stock/metric?symbol={encoded}&metric=all", self.base_url),
                symbol.as_str(),
            )
            .await?;
        let quote: QuoteResponse = self
            .get_json(
                "quote",
                format!("{}/quote?symbol={encoded}", self.base_url),
                symbol.as_str(),
            )
            .await?;

        let metric = MetricMap(financials.metric);
        let book_value_per_share = metric.get(metric_fields::BOOK_VALUE_PER_SHARE);

        let mut record = Fundamentals {
            symbol: symbol.clone(),
            company_name: profile.name,
            as_of: UtcDateTime::now(),
            market_cap: profile.market_capitalization,
            current_price: quote.current,
            pe_ratio: metric.get(metric_fields::PE_RATIO),
            pb_ratio: 0.0,
            eps: metric.get(metric_fields::EPS),
            revenue_per_share: metric.get(metric_fields::REVENUE_PER_SHARE),
            profit_margin: metric.get(metric_fields::PROFIT_MARGIN),
            roe: metric.get(metric_fields::ROE),
            roa: metric.get(metric_fields::ROA),
            debt_to_equity: metric.get(metric_fields::DEBT_TO_EQUITY),
            dividend_yield: metric.get(metric_fields::DIVIDEND_YIELD),
            beta: metric.get(metric_fields::BETA),
            book_value_per_share,
        };
        record.pb_ratio = record.derived_pb_ratio();

        Ok(record)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: String,
        subject: &str,
    ) -> Result<T, ProviderError> {
        let request = HttpRequest::get(url).with_auth(&self.auth);
        let response =
            self.http
                .execute(request)
                .await
                .map_err(|error| ProviderError::Transport {
                    endpoint,
                    message: error.message().to_owned(),
                })?;

        if !response.is_success() {
            return Err(ProviderError::Status {
                endpoint,
                status: response.status,
                subject: subject.to_owned(),
            });
        }

        serde_json::from_str(&response.body)
            .map_err(|source| ProviderError::Decode { endpoint, source })
    }
}

impl FundamentalsSource for FinnhubAdapter {
    fn fetch<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Fundamentals, ProviderError>> + Send + 'a>> {
        Box::pin(self.fetch_fundamentals(symbol))
    }
}

/// Typed view over the provider's free-form metric map.
struct MetricMap(serde_json::Map<String, Value>);

impl MetricMap {
    /// Look up a metric, degrading missing or non-numeric values to `0.0`.
    fn get(&self, key: &str) -> f64 {
        self.0.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
struct CompanyProfile {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "marketCapitalization")]
    market_capitalization: f64,
}

#[derive(Debug, Deserialize)]
struct BasicFinancials {
    #[serde(default)]
    metric: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default, rename = "c")]
    current: f64,
}
