//! Process-wide cache of loaded transformer models.
//!
//! Loading ModernBERT weights is the slowest thing the demos do, so every
//! pipeline builder goes through [`global_cache`]. A cached model is cloned
//! out; clones share their tensors.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tokio::sync::Mutex;

/// Implemented by model option types to produce a stable cache key.
pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

type CacheStorage = HashMap<(TypeId, String), Arc<dyn Any + Send + Sync>>;

/// Models keyed by their type and an options-derived string.
pub struct ModelCache {
    cache: Arc<Mutex<CacheStorage>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cached model for `key`, running `loader` on a miss.
    pub async fn get_or_create<M, F>(&self, key: &str, loader: F) -> anyhow::Result<M>
    where
        M: Clone + Send + Sync + 'static,
        F: FnOnce() -> anyhow::Result<M>,
    {
        let cache_key = (TypeId::of::<M>(), key.to_string());

        {
            let cache = self.cache.lock().await;
            if let Some(model) = cache
                .get(&cache_key)
                .and_then(|cached| cached.downcast_ref::<M>())
            {
                tracing::debug!(key, "model cache hit");
                return Ok(model.clone());
            }
        }

        tracing::info!(key, "loading model");
        let model = loader()?;

        let mut cache = self.cache.lock().await;
        cache.insert(cache_key, Arc::new(model.clone()) as Arc<dyn Any + Send + Sync>);
        Ok(model)
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The cache shared by every pipeline builder in the process.
pub fn global_cache() -> &'static ModelCache {
    static GLOBAL_MODEL_CACHE: OnceLock<ModelCache> = OnceLock::new();
    GLOBAL_MODEL_CACHE.get_or_init(ModelCache::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct FakeEncoder {
        id: String,
    }

    #[derive(Clone)]
    struct OtherModel;

    #[tokio::test]
    async fn second_lookup_skips_loader() {
        let cache = ModelCache::new();

        let first = cache
            .get_or_create("base", || {
                Ok(FakeEncoder {
                    id: "original".to_string(),
                })
            })
            .await
            .unwrap();
        let second = cache
            .get_or_create::<FakeEncoder, _>("base", || anyhow::bail!("loader must not run"))
            .await
            .unwrap();

        assert_eq!(first.id, "original");
        assert_eq!(second.id, "original");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn same_key_different_type_is_separate() {
        let cache = ModelCache::new();
        cache
            .get_or_create("base", || Ok(FakeEncoder { id: "a".into() }))
            .await
            .unwrap();
        cache.get_or_create("base", || Ok(OtherModel)).await.unwrap();
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn loader_errors_are_not_cached() {
        let cache = ModelCache::new();
        let result = cache
            .get_or_create::<OtherModel, _>("broken", || anyhow::bail!("no weights"))
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);
    }
}
