//! HTML parser for extracting page content, links and images
//!
//! This module handles parsing HTML content to extract:
//! - The page title
//! - A whitespace-collapsed plaintext rendition of the body
//! - Outbound links together with their anchor text
//! - Embedded image URLs

use crate::TrawlError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text never counts as page content
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// An outbound link and the text it was labelled with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub title: String,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Visible body text, whitespace collapsed
    pub plaintext: String,

    /// Outbound links (absolute URLs, first occurrence wins)
    pub links: Vec<Link>,

    /// Image sources (absolute URLs)
    pub images: Vec<String>,
}

/// Turns a fetched body into a [`ParsedPage`]
pub trait PageParser: Send + Sync {
    fn parse(&self, body: &str, base_url: &str) -> Result<ParsedPage, TrawlError>;
}

/// scraper-backed [`PageParser`]
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlPageParser;

impl PageParser for HtmlPageParser {
    fn parse(&self, body: &str, base_url: &str) -> Result<ParsedPage, TrawlError> {
        let base = Url::parse(base_url).map_err(|e| TrawlError::HtmlParse {
            url: base_url.to_string(),
            message: format!("invalid base URL: {}", e),
        })?;
        Ok(parse_html(body, &base))
    }
}

/// Parses HTML content and extracts title, text, links and images
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` anywhere in the document, resolved against
/// `base_url`, with the fragment removed.
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that is not HTTP(S) after resolution
///
/// # Example
///
/// ```no_run
/// use sumi_trawl::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].title, "Link");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        plaintext: extract_plaintext(&document),
        links: extract_links(&document, base_url),
        images: extract_images(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Collects visible text under <body>, skipping scripts and styles
fn extract_plaintext(document: &Html) -> String {
    let root = body_element(document).unwrap_or_else(|| document.root_element());

    let mut words: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|element| HIDDEN_ELEMENTS.contains(&element.name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ")
}

fn body_element(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("body").ok()?;
    let body = document.select(&selector).next();
    body
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Link> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = resolve_link(href, base_url) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        links.push(Link {
            title: link_title(&element),
            url,
        });
    }

    links
}

/// Anchor text, falling back to the title attribute
fn link_title(element: &ElementRef<'_>) -> String {
    let text = collapse_whitespace(&element.text().collect::<String>());
    if !text.is_empty() {
        return text;
    }

    element
        .value()
        .attr("title")
        .map(collapse_whitespace)
        .unwrap_or_default()
}

/// Extracts image sources from the HTML document
fn extract_images(document: &Html, base_url: &Url) -> Vec<String> {
    let mut images = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(img_selector) = Selector::parse("img[src]") {
        for element in document.select(&img_selector) {
            if let Some(src) = element.value().attr("src") {
                if let Some(absolute_url) = resolve_link(src, base_url) {
                    if seen.insert(absolute_url.clone()) {
                        images.push(absolute_url);
                    }
                }
            }
        }
    }

    images
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);

    Some(absolute_url.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
