use crate::error::{OracleError, RaceError};
use crate::observer::{RaceEvent, RaceObserver};
use crate::oracle::{Neighbor, SimilarityOracle};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use wikiracer_scanner::{
    Edge, FetchError, LinkResolver, PageRecord, is_well_formed, normalize, page_name,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub max_depth: usize,
    pub fetch_timeout_secs: u64,
    pub oracle_timeout_secs: u64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            max_depth: 20,
            fetch_timeout_secs: 30,
            oracle_timeout_secs: 60,
        }
    }
}

/// One entry of the path. Ordinal 0 is the start page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub ordinal: usize,
    pub label: String,
    pub url: String,
    pub is_final: bool,
}

impl PathStep {
    pub fn new(ordinal: usize, label: impl Into<String>, url: impl Into<String>, is_final: bool) -> Self {
        Self {
            ordinal,
            label: label.into(),
            url: url.into(),
            is_final,
        }
    }
}

/// Why a race stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    Reached,
    /// No unvisited candidate left on the current page.
    DeadEnd,
    DepthExceeded { max_depth: usize },
    FetchFailed(String),
    OracleFailed(String),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Reached => write!(f, "target reached"),
            Termination::DeadEnd => write!(f, "dead end: no unvisited links left"),
            Termination::DepthExceeded { max_depth } => {
                write!(f, "max depth ({}) reached without finding target", max_depth)
            }
            Termination::FetchFailed(e) => write!(f, "failed to fetch page: {}", e),
            Termination::OracleFailed(e) => write!(f, "similarity search failed: {}", e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RaceReport {
    pub reached: bool,
    pub termination: Termination,
    pub path: Vec<PathStep>,
}

impl RaceReport {
    /// Hops taken, not counting the start page.
    pub fn steps_taken(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Greedy best-first walker: at every page it takes the single unvisited
/// link whose label is most similar to the target's name and never looks
/// back.
pub struct Navigator {
    resolver: Arc<dyn LinkResolver>,
    oracle: Arc<dyn SimilarityOracle>,
    observers: Vec<Arc<dyn RaceObserver>>,
    config: NavigatorConfig,
}

impl Navigator {
    pub fn new(resolver: Arc<dyn LinkResolver>, oracle: Arc<dyn SimilarityOracle>) -> Self {
        Self {
            resolver,
            oracle,
            observers: Vec::new(),
            config: NavigatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: NavigatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RaceObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Walk from `start_url` towards `target_url`.
    ///
    /// Only malformed locators are errors; every other way a race can end,
    /// including fetch and oracle failures, is reported in the returned
    /// [`RaceReport`].
    pub async fn race(&self, start_url: &str, target_url: &str) -> Result<RaceReport, RaceError> {
        for url in [start_url, target_url] {
            if !is_well_formed(url) {
                return Err(RaceError::InvalidLocator(url.to_string()));
            }
        }

        let target_label = page_name(target_url);
        info!("Racing from {} to {} ('{}')", start_url, target_url, target_label);

        self.emit(RaceEvent::Started {
            start_url: start_url.to_string(),
            target_url: target_url.to_string(),
            target_label: target_label.clone(),
            max_depth: self.config.max_depth,
        })
        .await;

        let mut visited = HashSet::from([normalize(start_url)]);
        let mut path = Vec::new();

        let termination = if normalize(start_url) == normalize(target_url) {
            path.push(PathStep::new(0, page_name(start_url), start_url, true));
            Termination::Reached
        } else {
            path.push(PathStep::new(0, page_name(start_url), start_url, false));
            self.walk(start_url, target_url, &target_label, &mut visited, &mut path)
                .await
        };

        let report = RaceReport {
            reached: termination == Termination::Reached,
            termination,
            path,
        };
        info!(
            "Race finished after {} steps: {}",
            report.steps_taken(),
            report.termination
        );

        self.emit(RaceEvent::Finished {
            report: report.clone(),
        })
        .await;
        Ok(report)
    }

    async fn walk(
        &self,
        start_url: &str,
        target_url: &str,
        target_label: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<PathStep>,
    ) -> Termination {
        let target_key = normalize(target_url);
        let mut current = start_url.to_string();

        for step in 1..=self.config.max_depth {
            self.emit(RaceEvent::Fetching {
                step,
                url: current.clone(),
            })
            .await;

            let page = match self.resolve(&current).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Failed to process {}: {}", current, e);
                    return Termination::FetchFailed(e.to_string());
                }
            };

            self.emit(RaceEvent::PageResolved {
                step,
                title: page.title.clone(),
                edge_count: page.edges.len(),
            })
            .await;

            if let Some(edge) = page.find_edge(target_url) {
                let hop = PathStep::new(step, edge.label.clone(), edge.url.clone(), true);
                self.push_hop(path, hop, None).await;
                return Termination::Reached;
            }

            if page.is_dead_end() {
                debug!("{} has no outgoing links", page.title);
                return Termination::DeadEnd;
            }

            let exclude = excluded_urls(&page, visited);
            let closest = match self.nearest(&page.edges, target_label, &exclude).await {
                Ok(hits) => hits.into_iter().next(),
                Err(e) => {
                    warn!("Similarity search failed on {}: {}", page.title, e);
                    return Termination::OracleFailed(e.to_string());
                }
            };
            let Some(Neighbor {
                label,
                url,
                distance,
            }) = closest
            else {
                info!("No unvisited links on '{}'", page.title);
                return Termination::DeadEnd;
            };

            debug!(
                "Closest match to '{}': '{}' (distance: {:.4})",
                target_label, label, distance
            );

            let key = normalize(&url);
            let reached = key == target_key;
            visited.insert(key);
            current = url.clone();
            self.push_hop(path, PathStep::new(step, label, url, reached), Some(distance))
                .await;

            if reached {
                return Termination::Reached;
            }
        }

        Termination::DepthExceeded {
            max_depth: self.config.max_depth,
        }
    }

    async fn push_hop(&self, path: &mut Vec<PathStep>, hop: PathStep, distance: Option<f32>) {
        path.push(hop.clone());
        self.emit(RaceEvent::HopChosen { hop, distance }).await;
    }

    async fn resolve(&self, url: &str) -> Result<PageRecord, FetchError> {
        let limit = Duration::from_secs(self.config.fetch_timeout_secs);
        match tokio::time::timeout(limit, self.resolver.resolve(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                elapsed: limit,
            }),
        }
    }

    /// Re-index the oracle with exactly this page's edges, then ask for the
    /// single closest one.
    async fn nearest(
        &self,
        edges: &[Edge],
        target_label: &str,
        exclude: &HashSet<String>,
    ) -> Result<Vec<Neighbor>, OracleError> {
        let limit = Duration::from_secs(self.config.oracle_timeout_secs);
        let search = async {
            let handle = self.oracle.index(edges).await?;
            self.oracle.query(&handle, target_label, 1, exclude).await
        };
        tokio::time::timeout(limit, search)
            .await
            .map_err(|_| OracleError::Timeout(limit))?
    }

    async fn emit(&self, event: RaceEvent) {
        for observer in &self.observers {
            observer.on_event(&event).await;
        }
    }
}

/// Urls, as spelled on this page, of edges whose page was already visited.
fn excluded_urls(page: &PageRecord, visited: &HashSet<String>) -> HashSet<String> {
    page.edges
        .iter()
        .filter(|edge| visited.contains(&normalize(&edge.url)))
        .map(|edge| edge.url.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_urls_matches_on_normalized_form() {
        let page = PageRecord::new("Potato".into(), "/wiki/Potato".into()).with_edges(vec![
            Edge::new("Peru", "https://en.wikipedia.org/wiki/PERU#x"),
            Edge::new("Andes", "https://en.wikipedia.org/wiki/Andes"),
        ]);
        let visited = HashSet::from(["/wiki/peru".to_string()]);

        let excluded = excluded_urls(&page, &visited);
        assert_eq!(
            excluded,
            HashSet::from(["https://en.wikipedia.org/wiki/PERU#x".to_string()])
        );
    }

    #[test]
    fn test_termination_display_is_distinct() {
        let kinds = [
            Termination::Reached,
            Termination::DeadEnd,
            Termination::DepthExceeded { max_depth: 20 },
            Termination::FetchFailed("boom".into()),
            Termination::OracleFailed("boom".into()),
        ];
        let rendered: HashSet<String> = kinds.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered.len(), kinds.len());
    }

    #[test]
    fn test_steps_taken_excludes_start() {
        let report = RaceReport {
            reached: false,
            termination: Termination::DeadEnd,
            path: vec![PathStep::new(0, "Potato", "/wiki/Potato", false)],
        };
        assert_eq!(report.steps_taken(), 0);
    }
}
