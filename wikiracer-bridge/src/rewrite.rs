// Transforms applied to proxied documents before they reach the viewer

const CLIENT_TEMPLATE: &str = include_str!("../assets/inject.html");
const WS_PORT_PLACEHOLDER: &str = "{{WS_PORT}}";
const BODY_CLOSE: &str = "</body>";

/// Stylesheet and script that connect a page to the event channel on `ws_port`.
pub fn client_snippet(ws_port: u16) -> String {
    CLIENT_TEMPLATE.replace(WS_PORT_PLACEHOLDER, &ws_port.to_string())
}

/// Make a fetched article displayable through the proxy: protocol-relative
/// references to `upload_authority` become same-origin paths, and the
/// viewer client is injected.
pub fn rewrite_document(html: &str, upload_authority: &str, ws_port: u16) -> String {
    let localized = localize_protocol_relative(html, upload_authority);
    inject(&localized, &client_snippet(ws_port))
}

/// `//host/x` becomes `/host/x`. Absolute `https://host/x` is left alone.
fn localize_protocol_relative(html: &str, authority: &str) -> String {
    let needle = format!("//{}", authority);
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find(&needle) {
        let (before, after) = rest.split_at(pos);
        out.push_str(before);
        if before.ends_with(':') {
            out.push_str(&needle);
        } else {
            out.push('/');
            out.push_str(authority);
        }
        rest = &after[needle.len()..];
    }
    out.push_str(rest);
    out
}

/// Insert `snippet` just before the last `</body>`, or append it when the
/// document has none.
pub(crate) fn inject(html: &str, snippet: &str) -> String {
    match html.rfind(BODY_CLOSE) {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + snippet.len());
            out.push_str(&html[..pos]);
            out.push_str(snippet);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{}{}", html, snippet),
    }
}
