pub mod embed;
pub mod error;
pub mod navigator;
pub mod observer;
pub mod oracle;
pub mod report;

pub use embed::{Embedder, EmbedderConfig, EmbedderKind, HashingEmbedder, RemoteEmbedder};
pub use error::{OracleError, RaceError};
pub use navigator::{Navigator, NavigatorConfig, PathStep, RaceReport, Termination};
pub use observer::{RaceEvent, RaceObserver};
pub use oracle::{IndexHandle, Neighbor, SimilarityOracle, VectorOracle};
pub use report::{render_path_summary, termination_line};
