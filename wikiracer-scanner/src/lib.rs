pub mod error;
pub mod locator;
pub mod page;
pub mod resolver;

pub use error::FetchError;
pub use locator::{is_article_url, is_well_formed, normalize, page_name};
pub use page::{Edge, PageRecord};
pub use resolver::{LinkResolver, ResolverConfig, WikiResolver};
