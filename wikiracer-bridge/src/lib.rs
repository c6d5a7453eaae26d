pub mod bridge;
pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod hub;
pub mod proxy;
pub mod rewrite;
pub mod ws;

pub use bridge::VisualizationBridge;
pub use cache::{CachedResource, MAX_CACHED_BYTES, ResourceCache};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use events::{Highlight, ViewerEvent, ViewerMessage};
pub use hub::EventHub;
pub use proxy::{ProxyRoute, ProxyState, classify, proxied_path};
pub use rewrite::rewrite_document;
