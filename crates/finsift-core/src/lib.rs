//! Core contracts for finsift.
//!
//! This crate contains:
//! - Canonical domain records and validation
//! - The Finnhub provider adapter behind an HTTP transport seam
//! - The rate-limited concurrent fetch pipeline
//! - The JSON array store and the value screen

pub mod domain;
pub mod error;
pub mod finnhub;
pub mod http;
pub mod pipeline;
pub mod screen;
pub mod store;
pub mod throttle;

pub use domain::{Fundamentals, Symbol, SymbolListing, UtcDateTime};
pub use error::ValidationError;
pub use finnhub::{FinnhubAdapter, FundamentalsSource, ProviderError, API_KEY_ENV};
pub use http::{HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use pipeline::{FetchPipeline, PipelineConfig, PipelineSummary, DEFAULT_QUEUE_CAPACITY};
pub use screen::{recompute_pb_ratios, screen_records, ValueCriteria};
pub use store::{JsonStore, StoreError};
pub use throttle::{Admission, IntervalGate};
