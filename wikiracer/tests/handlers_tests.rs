use std::io::Cursor;
use wikiracer::config::AppConfig;
use wikiracer::handlers::*;
use wikiracer_core::{HashingEmbedder, VectorOracle};
use wikiracer_scanner::{ResolverConfig, WikiResolver};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_validate_wikipedia_url_accepts_articles() {
    assert!(validate_wikipedia_url("https://en.wikipedia.org/wiki/Potato"));
    assert!(validate_wikipedia_url("https://de.wikipedia.org/wiki/Kartoffel"));
    assert!(validate_wikipedia_url("  https://en.wikipedia.org/wiki/Peru\n"));
}

#[test]
fn test_validate_wikipedia_url_rejects_others() {
    assert!(!validate_wikipedia_url("https://example.com/wiki/Potato"));
    assert!(!validate_wikipedia_url("https://en.wikipedia.org/w/index.php?title=Potato"));
    assert!(!validate_wikipedia_url("/wiki/Potato"));
    assert!(!validate_wikipedia_url("potato"));
}

#[test]
fn test_prompt_reasks_until_valid() {
    let mut input = Cursor::new("potato\nhttps://example.com/wiki/Potato\nhttps://en.wikipedia.org/wiki/Potato\n");
    let mut output = Vec::new();

    let url = prompt_until_valid(&mut input, &mut output, "START:").unwrap();
    assert_eq!(url, "https://en.wikipedia.org/wiki/Potato");

    let shown = String::from_utf8(output).unwrap();
    assert_eq!(shown.matches("START:").count(), 3);
    assert_eq!(shown.matches("Invalid Wikipedia URL").count(), 2);
}

#[test]
fn test_prompt_fails_when_input_runs_out() {
    let mut input = Cursor::new("not a url\n");
    let mut output = Vec::new();
    assert!(prompt_until_valid(&mut input, &mut output, "TARGET:").is_err());
}

#[test]
fn test_overrides_take_precedence() {
    let mut config = AppConfig::default();
    RaceOverrides {
        demo: Some(true),
        max_depth: Some(4),
    }
    .apply(&mut config);
    assert!(config.demo);
    assert_eq!(config.navigator.max_depth, 4);

    RaceOverrides::default().apply(&mut config);
    assert!(config.demo);
    assert_eq!(config.navigator.max_depth, 4);
}

#[test]
fn test_write_default_config_creates_parents() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("config.toml");

    write_default_config(&path, false)?;
    let loaded = AppConfig::load(&path)?;
    assert_eq!(loaded.navigator.max_depth, 20);
    assert!(!loaded.demo);

    Ok(())
}

#[test]
fn test_write_default_config_respects_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "demo = true\n").unwrap();

    assert!(write_default_config(&path, false).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "demo = true\n");

    write_default_config(&path, true).unwrap();
    assert!(!AppConfig::load(&path).unwrap().demo);
}

async fn potato_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Potato"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <h1 class="firstHeading">Potato</h1>
                <div id="mw-content-text">
                    <a href="/wiki/Cooking">Cooking</a>
                    <a href="/wiki/Peru">Peru</a>
                    <a href="/wiki/Andes">Andes</a>
                </div>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    server
}

fn resolver_for(server: &MockServer) -> WikiResolver {
    WikiResolver::with_config(&ResolverConfig {
        content_host: server.uri(),
        ..ResolverConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_rank_links_orders_by_similarity() {
    let server = potato_server().await;
    let resolver = resolver_for(&server);
    let oracle = VectorOracle::new(HashingEmbedder::new(512).unwrap());
    let url = format!("{}/wiki/Potato", server.uri());

    let (page, ranked) = rank_links(&resolver, &oracle, &url, Some("Peru"), 2)
        .await
        .unwrap();

    assert_eq!(page.title, "Potato");
    assert_eq!(page.edges.len(), 3);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].label, "Peru");
    assert!(ranked[0].distance <= ranked[1].distance);
}

#[tokio::test]
async fn test_rank_links_without_query_only_lists() {
    let server = potato_server().await;
    let resolver = resolver_for(&server);
    let oracle = VectorOracle::new(HashingEmbedder::new(512).unwrap());
    let url = format!("{}/wiki/Potato", server.uri());

    let (page, ranked) = rank_links(&resolver, &oracle, &url, None, 10).await.unwrap();
    assert_eq!(page.edges.len(), 3);
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn test_rank_links_reports_fetch_failure() {
    let server = MockServer::start().await;
    let resolver = resolver_for(&server);
    let oracle = VectorOracle::new(HashingEmbedder::new(512).unwrap());
    let url = format!("{}/wiki/Nowhere", server.uri());

    let err = rank_links(&resolver, &oracle, &url, Some("Peru"), 5)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to resolve"));
}
