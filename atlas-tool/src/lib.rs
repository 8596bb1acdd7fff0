//! # atlas-tool
//!
//! Web access for the ATLAS research pipeline.
//!
//! - [`DuckDuckGoSearch`] - [`WebSearch`](atlas_core::WebSearch) over DuckDuckGo's HTML
//!   results, with domain blacklist and optional keyword filtering
//! - [`HttpFetcher`] - [`Fetcher`](atlas_core::Fetcher) with browser-like headers and a timeout
//! - [`HtmlExtractor`] - [`Extractor`](atlas_core::Extractor) with a main-content pass and a
//!   whole-page fallback
//! - [`ArtifactStore`] - best-effort `raw_html/` and `cleaned/` copies keyed by URL hash
//!
//! ## Example
//!
//! ```rust,ignore
//! use atlas_tool::{ArtifactStore, HtmlExtractor, HttpFetcher};
//!
//! let artifacts = ArtifactStore::from_config(&config.paths);
//! let fetcher = HttpFetcher::new(&config.fetch)?.with_artifacts(artifacts.clone());
//! let extractor = HtmlExtractor::new()?.with_artifacts(artifacts);
//! ```

pub mod artifact;
pub mod extract;
pub mod fetch;
pub mod search;

pub use artifact::{ArtifactStore, artifact_key};
pub use extract::HtmlExtractor;
pub use fetch::HttpFetcher;
pub use search::{DuckDuckGoSearch, decode_result_url, filter_results, parse_results};
