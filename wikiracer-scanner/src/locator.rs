// Page locator helpers shared by the resolver, the navigator and the proxy

use url::Url;

/// Path prefix every article lives under.
pub const ARTICLE_MARKER: &str = "/wiki/";

/// Registrable domain a race url must belong to.
pub const CONTENT_DOMAIN: &str = "wikipedia.org";

/// Parse an absolute url, or a root-relative locator such as `/wiki/Peru`.
fn parse_locator(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) if url.starts_with('/') => {
            Url::parse("http://localhost").ok()?.join(url).ok()
        }
        Err(_) => None,
    }
}

/// Canonical form used for page equality: the path component only,
/// case-folded, with query and fragment dropped.
pub fn normalize(url: &str) -> String {
    match parse_locator(url) {
        Some(parsed) => parsed.path().to_lowercase(),
        None => {
            let end = url.find(['?', '#']).unwrap_or(url.len());
            url[..end].to_lowercase()
        }
    }
}

/// Human-readable page name taken from the last `/wiki/` segment, with
/// underscores turned back into spaces. Locators without the marker are
/// returned unchanged.
pub fn page_name(url: &str) -> String {
    let path = parse_locator(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|| url.to_string());

    match path.rsplit_once(ARTICLE_MARKER) {
        Some((_, name)) => name.replace('_', " "),
        None => url.to_string(),
    }
}

/// True if the locator parses as an absolute url or a root-relative path.
pub fn is_well_formed(url: &str) -> bool {
    parse_locator(url).is_some()
}

/// True for absolute urls on the content domain that point at an article.
pub fn is_article_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    parsed
        .host_str()
        .map(|host| host.contains(CONTENT_DOMAIN))
        .unwrap_or(false)
        && parsed.path().contains(ARTICLE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_host_query_and_fragment() {
        assert_eq!(
            normalize("https://en.wikipedia.org/wiki/Peru?action=view#History"),
            "/wiki/peru"
        );
    }

    #[test]
    fn test_normalize_relative_and_absolute_agree() {
        assert_eq!(
            normalize("/wiki/Peru"),
            normalize("https://en.wikipedia.org/wiki/Peru")
        );
    }

    #[test]
    fn test_normalize_is_case_insensitive_on_path() {
        assert_eq!(normalize("/wiki/POTATO"), normalize("/wiki/potato"));
    }

    #[test]
    fn test_normalize_unparseable_falls_back_to_string() {
        assert_eq!(normalize("Not A Url?x=1"), "not a url");
    }

    #[test]
    fn test_page_name_replaces_underscores() {
        assert_eq!(
            page_name("https://en.wikipedia.org/wiki/Machu_Picchu"),
            "Machu Picchu"
        );
    }

    #[test]
    fn test_page_name_without_marker() {
        assert_eq!(page_name("https://example.com/about"), "https://example.com/about");
    }

    #[test]
    fn test_is_article_url() {
        assert!(is_article_url("https://en.wikipedia.org/wiki/Potato"));
        assert!(is_article_url("https://de.wikipedia.org/wiki/Kartoffel"));
        assert!(!is_article_url("https://example.com/wiki/Potato"));
        assert!(!is_article_url("https://en.wikipedia.org/w/index.php"));
        assert!(!is_article_url("/wiki/Potato"));
        assert!(!is_article_url(""));
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("https://en.wikipedia.org/wiki/Potato"));
        assert!(is_well_formed("/wiki/Potato"));
        assert!(!is_well_formed("wiki/Potato"));
        assert!(!is_well_formed("http://"));
    }
}
