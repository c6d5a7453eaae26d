// Content channel: same-origin HTTP proxy in front of the content host

use crate::cache::{CachedResource, ResourceCache};
use crate::config::{BridgeConfig, authority};
use crate::error::Result;
use crate::rewrite::{client_snippet, inject, rewrite_document};
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, warn};
use url::Url;
use wikiracer_scanner::locator::ARTICLE_MARKER;

const VIEWER_SHELL: &str = include_str!("../assets/viewer.html");
const VIEWER_PATH: &str = "/viewer.html";
const RESOURCE_MAX_AGE: &str = "max-age=3600";
const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// What an inbound proxy path resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyRoute {
    ViewerShell,
    /// Article to fetch, rewrite and inject.
    Document(String),
    /// Anything else, passed through and cached.
    Resource(String),
}

/// Map an inbound path (with query) onto the upstream url it stands for.
pub fn classify(target: &str, content_host: &str, upload_host: &str) -> ProxyRoute {
    let path = target.split('?').next().unwrap_or(target);
    if path == VIEWER_PATH {
        return ProxyRoute::ViewerShell;
    }

    let content_host = content_host.trim_end_matches('/');
    if target.starts_with(ARTICLE_MARKER) {
        return ProxyRoute::Document(format!("{}{}", content_host, target));
    }
    if target.starts_with("/w/") || target.starts_with("/static/") {
        return ProxyRoute::Resource(format!("{}{}", content_host, target));
    }

    let upload_host = upload_host.trim_end_matches('/');
    let upload = authority(upload_host);
    let spellings = [
        format!("//{}", upload),
        format!("/{}", upload),
        format!("/https://{}", upload),
        format!("/http://{}", upload),
    ];
    for prefix in &spellings {
        if let Some(rest) = target.strip_prefix(prefix.as_str())
            && (rest.is_empty() || rest.starts_with('/'))
        {
            return ProxyRoute::Resource(format!("{}{}", upload_host, rest));
        }
    }

    ProxyRoute::Resource(format!("{}{}", content_host, target))
}

/// Same-origin path the viewer should load for a page `url`.
pub fn proxied_path(url: &str, content_host: &str) -> String {
    let content_host = content_host.trim_end_matches('/');
    if let Some(rest) = url.strip_prefix(content_host)
        && rest.starts_with('/')
    {
        return rest.to_string();
    }

    match Url::parse(url) {
        Ok(parsed) if parsed.path().contains(ARTICLE_MARKER) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        _ => url.to_string(),
    }
}

#[derive(Clone)]
pub struct ProxyState {
    client: reqwest::Client,
    cache: Arc<ResourceCache>,
    content_host: String,
    upload_host: String,
    ws_port: u16,
}

impl ProxyState {
    /// `ws_port` is the bound event channel port the injected client dials.
    pub fn new(config: &BridgeConfig, cache: Arc<ResourceCache>, ws_port: u16) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_AGENT)
            .timeout(Duration::from_secs(config.resource_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            cache,
            content_host: config.content_host.clone(),
            upload_host: config.upload_host.clone(),
            ws_port,
        })
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .fallback(proxy_handler)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn proxy_handler(State(state): State<ProxyState>, uri: Uri) -> Response {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    match classify(target, &state.content_host, &state.upload_host) {
        ProxyRoute::ViewerShell => viewer_shell(&state),
        ProxyRoute::Document(url) => proxy_document(&state, &url).await,
        ProxyRoute::Resource(url) => proxy_resource(&state, &url).await,
    }
}

fn viewer_shell(state: &ProxyState) -> Response {
    let body = inject(VIEWER_SHELL, &client_snippet(state.ws_port));
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
}

async fn proxy_document(state: &ProxyState, url: &str) -> Response {
    match fetch_document(state, url).await {
        Ok((status, html)) => {
            let body = rewrite_document(&html, authority(&state.upload_host), state.ws_port);
            (
                status,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response()
        }
        Err(e) => {
            warn!("Proxy error for {}: {}", url, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn fetch_document(state: &ProxyState, url: &str) -> reqwest::Result<(StatusCode, String)> {
    let response = state
        .client
        .get(url)
        .header(
            header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
        .send()
        .await?;

    let status = response.status();
    Ok((status, response.text().await?))
}

async fn proxy_resource(state: &ProxyState, url: &str) -> Response {
    if let Some(cached) = state.cache.get(url) {
        debug!("Cache hit: {}", url);
        return resource_response(StatusCode::OK, cached);
    }

    match fetch_resource(state, url).await {
        Ok((status, resource)) => {
            if status.is_success() && state.cache.insert(url, resource.clone()) {
                debug!("Cached {} ({} bytes)", url, resource.bytes.len());
            }
            resource_response(status, resource)
        }
        Err(e) => {
            debug!("Resource {} unavailable: {}", url, e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn fetch_resource(
    state: &ProxyState,
    url: &str,
) -> reqwest::Result<(StatusCode, CachedResource)> {
    let response = state
        .client
        .get(url)
        .header(header::ACCEPT, "*/*")
        .send()
        .await?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = response.bytes().await?;

    Ok((
        status,
        CachedResource {
            bytes,
            content_type,
        },
    ))
}

fn resource_response(status: StatusCode, resource: CachedResource) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, resource.content_type),
            (header::CACHE_CONTROL, RESOURCE_MAX_AGE.to_string()),
        ],
        resource.bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = "https://en.wikipedia.org";
    const UPLOAD: &str = "https://upload.wikimedia.org";

    fn route(target: &str) -> ProxyRoute {
        classify(target, CONTENT, UPLOAD)
    }

    #[test]
    fn test_viewer_shell() {
        assert_eq!(route("/viewer.html"), ProxyRoute::ViewerShell);
        assert_eq!(route("/viewer.html?t=1"), ProxyRoute::ViewerShell);
    }

    #[test]
    fn test_articles_are_documents() {
        assert_eq!(
            route("/wiki/Peru"),
            ProxyRoute::Document("https://en.wikipedia.org/wiki/Peru".into())
        );
    }

    #[test]
    fn test_site_resources() {
        assert_eq!(
            route("/w/load.php?modules=site"),
            ProxyRoute::Resource("https://en.wikipedia.org/w/load.php?modules=site".into())
        );
        assert_eq!(
            route("/static/images/logo.svg"),
            ProxyRoute::Resource("https://en.wikipedia.org/static/images/logo.svg".into())
        );
    }

    #[test]
    fn test_upload_host_spellings() {
        let expected = ProxyRoute::Resource("https://upload.wikimedia.org/a/b.png".into());
        assert_eq!(route("//upload.wikimedia.org/a/b.png"), expected);
        assert_eq!(route("/upload.wikimedia.org/a/b.png"), expected);
        assert_eq!(route("/https://upload.wikimedia.org/a/b.png"), expected);
    }

    #[test]
    fn test_everything_else_goes_to_content_host() {
        assert_eq!(
            route("/favicon.ico"),
            ProxyRoute::Resource("https://en.wikipedia.org/favicon.ico".into())
        );
        assert_eq!(
            route("/upload.wikimedia.org.evil/x"),
            ProxyRoute::Resource("https://en.wikipedia.org/upload.wikimedia.org.evil/x".into())
        );
    }

    #[test]
    fn test_proxied_path() {
        assert_eq!(proxied_path("https://en.wikipedia.org/wiki/Peru", CONTENT), "/wiki/Peru");
        assert_eq!(proxied_path("/wiki/Peru", CONTENT), "/wiki/Peru");
        assert_eq!(
            proxied_path("https://fr.wikipedia.org/wiki/P%C3%A9rou", CONTENT),
            "/wiki/P%C3%A9rou"
        );
    }
}
