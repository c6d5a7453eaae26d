use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the `[bridge]` table of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub bind_host: String,
    /// Content proxy port. 0 picks a free port.
    pub http_port: u16,
    /// Event channel port. 0 picks a free port.
    pub ws_port: u16,
    pub navigate_pacing_ms: u64,
    pub highlight_pacing_ms: u64,
    pub connect_timeout_secs: u64,
    pub open_browser: bool,
    /// Program used to open the viewer instead of the platform default.
    pub display_command: Option<String>,
    pub content_host: String,
    pub upload_host: String,
    pub resource_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            http_port: 8080,
            ws_port: 8765,
            navigate_pacing_ms: 2500,
            highlight_pacing_ms: 2000,
            connect_timeout_secs: 10,
            open_browser: true,
            display_command: None,
            content_host: "https://en.wikipedia.org".to_string(),
            upload_host: "https://upload.wikimedia.org".to_string(),
            resource_timeout_secs: 10,
        }
    }
}

impl BridgeConfig {
    pub fn navigate_pacing(&self) -> Duration {
        Duration::from_millis(self.navigate_pacing_ms)
    }

    pub fn highlight_pacing(&self) -> Duration {
        Duration::from_millis(self.highlight_pacing_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Host (and port, if any) of the upload host, without the scheme.
    pub fn upload_authority(&self) -> &str {
        authority(&self.upload_host)
    }
}

pub(crate) fn authority(host: &str) -> &str {
    let rest = host.split_once("://").map(|(_, rest)| rest).unwrap_or(host);
    rest.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_authority_strips_scheme() {
        let config = BridgeConfig::default();
        assert_eq!(config.upload_authority(), "upload.wikimedia.org");
        assert_eq!(authority("http://127.0.0.1:4000/"), "127.0.0.1:4000");
        assert_eq!(authority("upload.wikimedia.org"), "upload.wikimedia.org");
    }

    #[test]
    fn test_default_pacing() {
        let config = BridgeConfig::default();
        assert_eq!(config.navigate_pacing(), Duration::from_millis(2500));
        assert_eq!(config.highlight_pacing(), Duration::from_secs(2));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }
}
