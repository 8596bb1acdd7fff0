//! Readable-text extraction from HTML.
//!
//! Two passes. The main-content pass collects paragraph, heading, list, quote and
//! preformatted blocks under the first `article`, `main` or `[role=main]` element (else
//! `body`) and joins them with blank lines so each block becomes its own paragraph. When that
//! finds nothing, the fallback pass takes every text node in the document outside `script`,
//! `style` and `noscript`, one per line.

use atlas_core::{AtlasError, Extractor, Result};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::artifact::ArtifactStore;

const BLOCK_TAGS: &[&str] =
    &["p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre"];
const IGNORED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

struct ExtractSelectors {
    roots: Vec<Selector>,
    blocks: Selector,
    body: Selector,
}

impl ExtractSelectors {
    fn new() -> Result<Self> {
        let parse = |css: &str| {
            Selector::parse(css)
                .map_err(|e| AtlasError::Config(format!("invalid selector '{css}': {e}")))
        };
        Ok(Self {
            roots: vec![parse("article")?, parse("main")?, parse("[role=main]")?],
            blocks: parse(&BLOCK_TAGS.join(", "))?,
            body: parse("body")?,
        })
    }
}

/// [`Extractor`] for HTML pages.
pub struct HtmlExtractor {
    selectors: ExtractSelectors,
    artifacts: Option<ArtifactStore>,
}

impl HtmlExtractor {
    /// # Errors
    ///
    /// Returns [`AtlasError::Config`] if the built-in selectors fail to compile.
    pub fn new() -> Result<Self> {
        Ok(Self { selectors: ExtractSelectors::new()?, artifacts: None })
    }

    /// Persist every non-empty extraction through `artifacts`.
    pub fn with_artifacts(mut self, artifacts: ArtifactStore) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    fn main_content(&self, document: &Html) -> String {
        let root = self
            .selectors
            .roots
            .iter()
            .find_map(|selector| document.select(selector).next())
            .or_else(|| document.select(&self.selectors.body).next())
            .unwrap_or_else(|| document.root_element());

        root.select(&self.selectors.blocks)
            .filter(|element| !inside_block_or_ignored(*element, root))
            .map(|element| {
                let mut buf = String::new();
                collect_text(element, "", &mut buf);
                normalize_whitespace(&buf)
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn all_text(document: &Html) -> String {
        let mut buf = String::new();
        collect_text(document.root_element(), "\n", &mut buf);
        buf.lines().map(str::trim).filter(|line| !line.is_empty()).collect::<Vec<_>>().join("\n")
    }
}

/// Whether an ancestor below `root` is itself a block or an ignored element. Nested blocks
/// are covered by their outermost block.
fn inside_block_or_ignored(element: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    for ancestor in element.ancestors() {
        if ancestor.id() == root.id() {
            return false;
        }
        if let Some(parent) = ElementRef::wrap(ancestor) {
            let name = parent.value().name();
            if BLOCK_TAGS.contains(&name) || IGNORED_TAGS.contains(&name) {
                return true;
            }
        }
    }
    false
}

/// Append text under `element`, skipping ignored subtrees, with `separator` after each node.
fn collect_text(element: ElementRef<'_>, separator: &str, buf: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                buf.push_str(text);
                buf.push_str(separator);
            }
            Node::Element(el) if IGNORED_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, separator, buf);
                }
            }
            _ => {}
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Extractor for HtmlExtractor {
    fn extract(&self, raw: &str, url: Option<&str>) -> String {
        let document = Html::parse_document(raw);

        let mut text = self.main_content(&document);
        let mut pass = "main";
        if text.trim().is_empty() {
            text = Self::all_text(&document);
            pass = "fallback";
        }
        let text = text.trim().to_string();
        debug!(document.url = url, pass, text_len = text.len(), "extracted text");

        if let (Some(url), Some(artifacts), false) = (url, &self.artifacts, text.is_empty()) {
            artifacts.save_cleaned(url, &text);
        }
        text
    }
}
