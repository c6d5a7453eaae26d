use bytes::Bytes;
use dashmap::DashMap;

/// Sub-resources at or above this size are always fetched fresh.
pub const MAX_CACHED_BYTES: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct CachedResource {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Process-wide store of proxied sub-resources, keyed by canonical url.
/// Survives bridge resets so later races load faster.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: DashMap<String, CachedResource>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<CachedResource> {
        self.entries.get(url).map(|entry| entry.value().clone())
    }

    /// Store `resource` unless it is too large or `url` is already cached.
    /// Returns true if this call inserted it.
    pub fn insert(&self, url: &str, resource: CachedResource) -> bool {
        if resource.bytes.len() >= MAX_CACHED_BYTES {
            return false;
        }
        let mut inserted = false;
        self.entries.entry(url.to_string()).or_insert_with(|| {
            inserted = true;
            resource
        });
        inserted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn resource(body: &'static [u8]) -> CachedResource {
        CachedResource {
            bytes: Bytes::from_static(body),
            content_type: "text/css".into(),
        }
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = ResourceCache::new();
        assert!(cache.insert("https://en.wikipedia.org/w/load.php", resource(b"a")));
        assert!(!cache.insert("https://en.wikipedia.org/w/load.php", resource(b"b")));
        assert_eq!(
            cache.get("https://en.wikipedia.org/w/load.php").unwrap().bytes,
            Bytes::from_static(b"a")
        );
    }

    #[test]
    fn test_large_resources_are_not_cached() {
        let cache = ResourceCache::new();
        let big = CachedResource {
            bytes: Bytes::from(vec![0u8; MAX_CACHED_BYTES]),
            content_type: "image/png".into(),
        };
        assert!(!cache.insert("https://upload.wikimedia.org/big.png", big));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_store_one_entry() {
        let cache = Arc::new(ResourceCache::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.insert("https://en.wikipedia.org/static/logo.svg", resource(b"svg"))
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(cache.len(), 1);
    }
}
