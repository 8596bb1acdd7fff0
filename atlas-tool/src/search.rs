//! DuckDuckGo web search over the HTML endpoint.
//!
//! Parsing and filtering are pure functions over the response markup so they can be tested
//! without network access. [`DuckDuckGoSearch`] adds the HTTP request around them.

use async_trait::async_trait;
use atlas_core::{AtlasError, Result, SearchConfig, WebResult, WebSearch};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// The JavaScript-free results page.
pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

struct ResultSelectors {
    result: Selector,
    link: Selector,
    snippet: Selector,
}

impl ResultSelectors {
    fn new() -> Result<Self> {
        let parse = |css: &str| {
            Selector::parse(css)
                .map_err(|e| AtlasError::Search(format!("invalid selector '{css}': {e}")))
        };
        Ok(Self {
            result: parse("div.result")?,
            link: parse("a.result__a")?,
            snippet: parse(".result__snippet")?,
        })
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a result link to the target URL.
///
/// DuckDuckGo wraps targets as `//duckduckgo.com/l/?uddg=<encoded target>`; direct absolute
/// links are returned as-is. Anything that is not http(s) yields `None`.
pub fn decode_result_url(href: &str) -> Option<String> {
    let href = href.trim();
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{href}")
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "uddg") {
        let target = Url::parse(&target).ok()?;
        return matches!(target.scheme(), "http" | "https").then(|| target.to_string());
    }
    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}

/// Extract organic results from a results page, skipping ads.
pub fn parse_results(html: &str) -> Result<Vec<WebResult>> {
    let selectors = ResultSelectors::new()?;
    let document = Html::parse_document(html);

    let mut results = Vec::new();
    for block in document.select(&selectors.result) {
        if block.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(link) = block.select(&selectors.link).next() else {
            continue;
        };
        let Some(url) = link.value().attr("href").and_then(decode_result_url) else {
            continue;
        };
        let snippet = block.select(&selectors.snippet).next().map(element_text).unwrap_or_default();
        results.push(WebResult { title: element_text(link), url, snippet });
    }
    Ok(results)
}

fn host_is_blacklisted(url: &str, blacklist: &[String]) -> bool {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default();
    host.is_empty() || blacklist.iter().any(|bad| host.contains(&bad.to_ascii_lowercase()))
}

fn mentions_keyword(result: &WebResult, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = format!("{} {}", result.title, result.snippet).to_lowercase();
    keywords.iter().any(|kw| haystack.contains(&kw.to_lowercase()))
}

/// Apply the domain blacklist and keyword filter, drop duplicate URLs, keep at most
/// `max_results`.
pub fn filter_results(results: Vec<WebResult>, config: &SearchConfig) -> Vec<WebResult> {
    let mut kept: Vec<WebResult> = Vec::new();
    for result in results {
        if kept.len() >= config.max_results {
            break;
        }
        if host_is_blacklisted(&result.url, &config.blacklist_domains) {
            debug!(url = %result.url, "dropping blacklisted result");
            continue;
        }
        if !mentions_keyword(&result, &config.required_keywords) {
            debug!(url = %result.url, "dropping result without required keywords");
            continue;
        }
        if kept.iter().any(|k| k.url == result.url) {
            continue;
        }
        kept.push(result);
    }
    kept
}

/// [`WebSearch`] backed by DuckDuckGo's HTML results page.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: String,
    config: SearchConfig,
}

impl DuckDuckGoSearch {
    /// # Errors
    ///
    /// Returns [`AtlasError::Config`] if the HTTP client cannot be built.
    pub fn new(config: SearchConfig, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AtlasError::Config(format!("failed to build search client: {e}")))?;
        Ok(Self { client, endpoint: DEFAULT_ENDPOINT.to_string(), config })
    }

    /// Point the client at a different results endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self, query: &str) -> Result<Url> {
        Url::parse_with_params(&self.endpoint, &[("q", query), ("kl", self.config.region.as_str())])
            .map_err(|e| AtlasError::Search(format!("invalid search endpoint: {e}")))
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<WebResult>> {
        let response = self
            .client
            .get(self.request_url(query)?)
            .send()
            .await
            .map_err(|e| AtlasError::Search(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "search endpoint returned an error status");
            return Err(AtlasError::Search(format!("search endpoint returned {status}")));
        }
        let html = response
            .text()
            .await
            .map_err(|e| AtlasError::Search(format!("failed to read response: {e}")))?;

        let parsed = parse_results(&html)?;
        let parsed_count = parsed.len();
        let results = filter_results(parsed, &self.config);
        info!(parsed_count, result_count = results.len(), "search completed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
<html><body>
  <div class="result results_links result--ad">
    <a class="result__a" href="https://duckduckgo.com/y.js?ad_provider=x">Sponsored</a>
  </div>
  <div class="result results_links">
    <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FTide&amp;rut=abc">Tide - <b>Wikipedia</b></a></h2>
    <a class="result__snippet" href="#">Tides are the rise and fall of sea levels.</a>
  </div>
  <div class="result results_links">
    <a class="result__a" href="https://oceanservice.noaa.gov/facts/tides.html">What are tides?</a>
    <div class="result__snippet">NOAA explains   tidal forces.</div>
  </div>
  <div class="result results_links">
    <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fzhidao.baidu.com%2Fq%2F1">Q&amp;A</a>
  </div>
  <div class="result"><span>no link here</span></div>
</body></html>"##;

    #[test]
    fn decodes_redirect_links() {
        let wrapped = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1&rut=x";
        assert_eq!(decode_result_url(wrapped).as_deref(), Some("https://example.com/a?b=1"));
        assert_eq!(
            decode_result_url("https://example.com/direct").as_deref(),
            Some("https://example.com/direct")
        );
        assert_eq!(decode_result_url("javascript:void(0)"), None);
    }

    #[test]
    fn parses_organic_results_and_skips_ads() {
        let results = parse_results(PAGE).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].url, "https://en.wikipedia.org/wiki/Tide");
        assert_eq!(results[0].title, "Tide - Wikipedia");
        assert_eq!(results[0].snippet, "Tides are the rise and fall of sea levels.");
        assert_eq!(results[1].snippet, "NOAA explains tidal forces.");
    }

    #[test]
    fn filter_applies_blacklist_and_cap() {
        let config = SearchConfig { max_results: 1, ..Default::default() };
        let results = filter_results(parse_results(PAGE).unwrap(), &config);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://en.wikipedia.org/wiki/Tide");

        let all = filter_results(parse_results(PAGE).unwrap(), &SearchConfig::default());
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| !r.url.contains("baidu")));
    }

    #[test]
    fn filter_requires_keywords_when_configured() {
        let config = SearchConfig { required_keywords: vec!["NOAA".into()], ..Default::default() };
        let results = filter_results(parse_results(PAGE).unwrap(), &config);
        assert_eq!(results.len(), 1);
        assert!(results[0].url.contains("noaa.gov"));
    }

    #[test]
    fn filter_drops_duplicates() {
        let hit = WebResult {
            title: "t".into(),
            url: "https://a.example/".into(),
            snippet: String::new(),
        };
        let results = filter_results(vec![hit.clone(), hit], &SearchConfig::default());
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn request_url_encodes_query() {
        let search = DuckDuckGoSearch::new(SearchConfig::default(), "test-agent").unwrap();
        let url = search.request_url("rust & tides").unwrap();
        assert_eq!(url.as_str(), "https://html.duckduckgo.com/html/?q=rust+%26+tides&kl=wt-wt");
    }
}
