use crate::embed::Embedder;
use crate::error::{OracleError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::RwLock;
use tracing::debug;
use wikiracer_scanner::Edge;

/// Ticket for the index built by one [`SimilarityOracle::index`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHandle {
    pub generation: u64,
    pub len: usize,
}

/// A ranked search hit. `distance` is a non-negative dissimilarity,
/// smaller is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub label: String,
    pub url: String,
    pub distance: f32,
}

/// Nearest-neighbour search over the labels of one page's edges.
///
/// Only one index is active at a time: `index` replaces whatever was indexed
/// before, and a query made with an older handle is refused so stale edges
/// can never leak into a later page's answer.
#[async_trait]
pub trait SimilarityOracle: Send + Sync {
    async fn ensure_ready(&self) -> Result<()>;

    async fn index(&self, edges: &[Edge]) -> Result<IndexHandle>;

    /// Up to `k` edges closest to `text`, skipping any whose url is in
    /// `exclude`. Exclusion happens before truncation, so an all-excluded
    /// index yields an empty list.
    async fn query(
        &self,
        handle: &IndexHandle,
        text: &str,
        k: usize,
        exclude: &HashSet<String>,
    ) -> Result<Vec<Neighbor>>;
}

struct ActiveIndex {
    generation: u64,
    entries: Vec<(Edge, Vec<f32>)>,
}

/// In-memory oracle ranking edges by cosine distance between embeddings.
pub struct VectorOracle<E> {
    embedder: E,
    active: RwLock<Option<ActiveIndex>>,
    generation: AtomicU64,
}

impl<E: Embedder> VectorOracle<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            active: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }
}

/// `1 - cos(a, b)`, clamped to be non-negative. Zero vectors are maximally distant.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    (1.0 - dot / (norm_a * norm_b)).max(0.0)
}

#[async_trait]
impl<E: Embedder> SimilarityOracle for VectorOracle<E> {
    async fn ensure_ready(&self) -> Result<()> {
        self.embedder.ensure_ready().await
    }

    async fn index(&self, edges: &[Edge]) -> Result<IndexHandle> {
        let labels: Vec<String> = edges.iter().map(|e| e.label.clone()).collect();
        let vectors = if labels.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed(&labels).await?
        };
        if vectors.len() != edges.len() {
            return Err(OracleError::ShapeMismatch {
                expected: edges.len(),
                got: vectors.len(),
            });
        }

        let generation = self.generation.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let entries = edges.iter().cloned().zip(vectors).collect();
        *self.active.write().await = Some(ActiveIndex {
            generation,
            entries,
        });

        debug!("Indexed {} edges (generation {})", edges.len(), generation);
        Ok(IndexHandle {
            generation,
            len: edges.len(),
        })
    }

    async fn query(
        &self,
        handle: &IndexHandle,
        text: &str,
        k: usize,
        exclude: &HashSet<String>,
    ) -> Result<Vec<Neighbor>> {
        let active = self.active.read().await;
        let index = match active.as_ref() {
            Some(index) if index.generation == handle.generation => index,
            other => {
                return Err(OracleError::StaleIndex {
                    handle: handle.generation,
                    active: other.map(|i| i.generation),
                });
            }
        };

        let candidates: Vec<&(Edge, Vec<f32>)> = index
            .entries
            .iter()
            .filter(|(edge, _)| !exclude.contains(&edge.url))
            .collect();
        if candidates.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(OracleError::ShapeMismatch {
                expected: 1,
                got: 0,
            })?;

        let mut scored: Vec<Neighbor> = candidates
            .into_iter()
            .map(|(edge, vector)| Neighbor {
                label: edge.label.clone(),
                url: edge.url.clone(),
                distance: cosine_distance(&query, vector),
            })
            .collect();

        // sort_by is stable: equal distances keep edge order
        scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashingEmbedder;

    fn edges() -> Vec<Edge> {
        vec![
            Edge::new("Cooking", "https://en.wikipedia.org/wiki/Cooking"),
            Edge::new("History of Peru", "https://en.wikipedia.org/wiki/History_of_Peru"),
            Edge::new("Farming", "https://en.wikipedia.org/wiki/Farming"),
        ]
    }

    fn oracle() -> VectorOracle<HashingEmbedder> {
        VectorOracle::new(HashingEmbedder::new(256).unwrap())
    }

    #[test]
    fn test_cosine_distance_bounds() {
        assert_eq!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]), 2.0);
    }

    #[tokio::test]
    async fn test_query_ranks_closest_label_first() {
        let oracle = oracle();
        let handle = oracle.index(&edges()).await.unwrap();
        let hits = oracle.query(&handle, "Peru", 3, &HashSet::new()).await.unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].label, "History of Peru");
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(hits.iter().all(|h| h.distance >= 0.0));
    }

    #[tokio::test]
    async fn test_query_excludes_before_truncating() {
        let oracle = oracle();
        let handle = oracle.index(&edges()).await.unwrap();
        let exclude: HashSet<String> =
            HashSet::from(["https://en.wikipedia.org/wiki/History_of_Peru".to_string()]);

        let hits = oracle.query(&handle, "Peru", 1, &exclude).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_ne!(hits[0].label, "History of Peru");
    }

    #[tokio::test]
    async fn test_query_with_everything_excluded_is_empty() {
        let oracle = oracle();
        let handle = oracle.index(&edges()).await.unwrap();
        let exclude: HashSet<String> = edges().into_iter().map(|e| e.url).collect();

        let hits = oracle.query(&handle, "Peru", 1, &exclude).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_reindex_invalidates_old_handle() {
        let oracle = oracle();
        let old = oracle.index(&edges()).await.unwrap();
        let new = oracle
            .index(&[Edge::new("Llama", "https://en.wikipedia.org/wiki/Llama")])
            .await
            .unwrap();

        let err = oracle
            .query(&old, "Peru", 1, &HashSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::StaleIndex { .. }));

        let hits = oracle.query(&new, "Peru", 5, &HashSet::new()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, "Llama");
    }

    #[tokio::test]
    async fn test_equal_distances_keep_edge_order() {
        let oracle = oracle();
        let twins = vec![
            Edge::new("Alpaca", "https://en.wikipedia.org/wiki/Alpaca_1"),
            Edge::new("Alpaca", "https://en.wikipedia.org/wiki/Alpaca_2"),
        ];
        let handle = oracle.index(&twins).await.unwrap();
        let hits = oracle.query(&handle, "Peru", 2, &HashSet::new()).await.unwrap();

        assert_eq!(hits[0].url, twins[0].url);
        assert_eq!(hits[1].url, twins[1].url);
    }

    #[tokio::test]
    async fn test_empty_index_returns_no_hits() {
        let oracle = oracle();
        let handle = oracle.index(&[]).await.unwrap();
        assert_eq!(handle.len, 0);
        let hits = oracle.query(&handle, "Peru", 1, &HashSet::new()).await.unwrap();
        assert!(hits.is_empty());
    }
}
