pub mod config;
pub mod console;
pub mod handlers;

pub use config::{AppConfig, DEFAULT_CONFIG_PATH, expand_path};
pub use handlers::{
    RaceOverrides, prompt_until_valid, rank_links, validate_wikipedia_url, write_default_config,
};
