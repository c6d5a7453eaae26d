use crate::error::{FetchError, Result};
use crate::locator::{ARTICLE_MARKER, normalize};
use crate::page::{Edge, PageRecord};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// Turns a page locator into its title and outgoing links.
///
/// An empty edge list is a valid answer (the page is a dead end); errors are
/// reserved for network failures, non-2xx responses and pages without an
/// article body.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<PageRecord>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Origin that article links are resolved against.
    pub content_host: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            content_host: "https://en.wikipedia.org".to_string(),
            user_agent: "WikiRacer/1.0 (Educational Project)".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Fetches live Wikipedia articles over HTTP.
pub struct WikiResolver {
    client: Client,
    base_url: Url,
}

impl WikiResolver {
    pub fn new() -> Result<Self> {
        Self::with_config(&ResolverConfig::default())
    }

    pub fn with_config(config: &ResolverConfig) -> Result<Self> {
        let base_url = Url::parse(&config.content_host)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.content_host, e)))?;

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn absolute(&self, url: &str) -> Result<Url> {
        self.base_url
            .join(url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl LinkResolver for WikiResolver {
    async fn resolve(&self, url: &str) -> Result<PageRecord> {
        let target = self.absolute(url)?;
        debug!("Fetching {}", target);

        let start = Instant::now();
        let response = self.client.get(target.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: target.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let page = parse_page(&body, url, &self.base_url)?;

        info!(
            "Found {} links on '{}' in {:?}",
            page.edges.len(),
            page.title,
            start.elapsed()
        );
        Ok(page)
    }
}

/// Extract the heading and the article links from a rendered article.
///
/// Only links inside `#mw-content-text` that point at `/wiki/` pages outside
/// any namespace (no `:` in the href) and carry visible text are kept. Links
/// are deduplicated on their normalized url, first occurrence wins.
pub fn parse_page(html: &str, source_url: &str, base_url: &Url) -> Result<PageRecord> {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("h1.firstHeading").unwrap();
    let content_selector = Selector::parse("div#mw-content-text").unwrap();
    let link_selector = Selector::parse("a[href]").unwrap();

    let title = document
        .select(&title_selector)
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let content = document
        .select(&content_selector)
        .next()
        .ok_or_else(|| FetchError::MissingContent(source_url.to_string()))?;

    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for element in content.select(&link_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.starts_with(ARTICLE_MARKER) || href.contains(':') {
            continue;
        }

        let label = element
            .text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if label.is_empty() {
            continue;
        }

        let Ok(absolute) = base_url.join(href) else {
            debug!("Skipping unresolvable href {}", href);
            continue;
        };

        if seen.insert(normalize(absolute.as_str())) {
            edges.push(Edge::new(label, absolute.to_string()));
        }
    }

    Ok(PageRecord::new(title, source_url.to_string()).with_edges(edges))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://en.wikipedia.org").unwrap()
    }

    #[test]
    fn test_parse_page_extracts_article_links() {
        let html = r#"<html><body>
            <h1 class="firstHeading">Potato</h1>
            <div id="mw-content-text">
                <a href="/wiki/Peru">Peru</a>
                <a href="/wiki/File:Potato.jpg">image</a>
                <a href="https://example.com/">external</a>
                <a href="/wiki/Tuber"><span>Starchy</span> <b>tuber</b></a>
                <a href="/wiki/Empty"></a>
            </div>
            <a href="/wiki/Outside">outside content</a>
        </body></html>"#;

        let page = parse_page(html, "/wiki/Potato", &base()).unwrap();

        assert_eq!(page.title, "Potato");
        assert_eq!(page.source_url, "/wiki/Potato");
        assert_eq!(
            page.edges,
            vec![
                Edge::new("Peru", "https://en.wikipedia.org/wiki/Peru"),
                Edge::new("Starchy tuber", "https://en.wikipedia.org/wiki/Tuber"),
            ]
        );
    }

    #[test]
    fn test_parse_page_deduplicates_on_normalized_url() {
        let html = r#"<h1 class="firstHeading">X</h1><div id="mw-content-text">
            <a href="/wiki/Peru">Peru</a>
            <a href="/wiki/peru#History">history of Peru</a>
            <a href="/wiki/Peru?oldid=1">Peru again</a>
        </div>"#;

        let page = parse_page(html, "/wiki/X", &base()).unwrap();
        assert_eq!(page.edges.len(), 1);
        assert_eq!(page.edges[0].label, "Peru");
    }

    #[test]
    fn test_parse_page_without_content_is_an_error() {
        let html = r#"<h1 class="firstHeading">Nothing</h1><div id="other"></div>"#;
        let err = parse_page(html, "/wiki/Nothing", &base()).unwrap_err();
        assert!(matches!(err, FetchError::MissingContent(_)));
    }

    #[test]
    fn test_parse_page_missing_title_defaults_to_unknown() {
        let html = r#"<div id="mw-content-text"></div>"#;
        let page = parse_page(html, "/wiki/X", &base()).unwrap();
        assert_eq!(page.title, "Unknown");
        assert!(page.is_dead_end());
    }

    #[test]
    fn test_invalid_content_host_is_rejected() {
        let config = ResolverConfig {
            content_host: "not a host".to_string(),
            ..ResolverConfig::default()
        };
        assert!(matches!(
            WikiResolver::with_config(&config),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
