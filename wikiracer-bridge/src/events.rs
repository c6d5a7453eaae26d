// Event-channel wire format: one JSON object per message, tagged by `type`

use serde::{Deserialize, Serialize};
use wikiracer_core::PathStep;

/// The single pending "next hop" suggestion shown to a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub url: String,
    pub label: String,
}

impl Highlight {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// Server -> viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewerEvent {
    #[serde(rename = "status")]
    Status {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total: Option<usize>,
    },
    /// `url` is a same-origin proxied path, e.g. `/wiki/Peru`.
    #[serde(rename = "navigate")]
    Navigate { url: String },
    #[serde(rename = "highlightLink")]
    HighlightLink { url: String, label: String },
    #[serde(rename = "add_path")]
    AddPath { step: PathStep },
    #[serde(rename = "success")]
    Success { path: Vec<PathStep> },
    #[serde(rename = "failure")]
    Failure { message: String },
}

impl From<Highlight> for ViewerEvent {
    fn from(h: Highlight) -> Self {
        ViewerEvent::HighlightLink {
            url: h.url,
            label: h.label,
        }
    }
}

/// Viewer -> server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewerMessage {
    /// Sent by the injected client once the page it runs in has loaded.
    #[serde(rename = "page_loaded")]
    PageLoaded {
        #[serde(default)]
        url: String,
    },
}
