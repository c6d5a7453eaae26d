use crate::navigator::{PathStep, RaceReport};
use async_trait::async_trait;

/// Transitions the navigator reports while racing.
#[derive(Debug, Clone)]
pub enum RaceEvent {
    Started {
        start_url: String,
        target_url: String,
        target_label: String,
        max_depth: usize,
    },
    /// About to resolve the page reached at `step - 1`.
    Fetching { step: usize, url: String },
    PageResolved {
        step: usize,
        title: String,
        edge_count: usize,
    },
    /// A hop was appended to the path. `distance` is `None` for a direct hit.
    HopChosen {
        hop: PathStep,
        distance: Option<f32>,
    },
    Finished { report: RaceReport },
}

/// Receives race transitions in order. Implementations may take their time
/// (the navigator awaits each call) but cannot influence the outcome.
#[async_trait]
pub trait RaceObserver: Send + Sync {
    async fn on_event(&self, event: &RaceEvent);
}
