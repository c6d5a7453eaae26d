use crate::locator::normalize;
use serde::{Deserialize, Serialize};

/// One outgoing link: the anchor text and the absolute url it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub label: String,
    pub url: String,
}

impl Edge {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// A fetched article: its heading and its outgoing links in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub title: String,
    pub source_url: String,
    pub edges: Vec<Edge>,
}

impl PageRecord {
    pub fn new(title: String, source_url: String) -> Self {
        Self {
            title,
            source_url,
            edges: Vec::new(),
        }
    }

    pub fn with_edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = edges;
        self
    }

    /// First edge whose normalized url equals the normalized `url`.
    pub fn find_edge(&self, url: &str) -> Option<&Edge> {
        let wanted = normalize(url);
        self.edges.iter().find(|edge| normalize(&edge.url) == wanted)
    }

    pub fn is_dead_end(&self) -> bool {
        self.edges.is_empty()
    }
}
