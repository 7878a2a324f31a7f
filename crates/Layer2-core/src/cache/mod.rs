//! Hash-keyed response cache with a mixed-list refresh strategy
//!
//! Cache keys are sha256 digests over the action name, the canonical JSON
//! serialization of the payload, and the cache-format version. Bumping the
//! version is the only invalidation mechanism: old rows are never deleted,
//! only shadowed by the new key space.
//!
//! Discovery lists get a probabilistic mixed strategy instead of plain
//! lookup/store: most requests blend one recycled cached item with freshly
//! generated ones, amortizing upstream cost while keeping lists novel.

use lumina_foundation::{BackingStore, CacheRecord, DiscoveryConfig, Result};
use rand::Rng;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Response cache over the backing store
#[derive(Clone)]
pub struct ContentCache {
    store: Arc<dyn BackingStore>,
    version: String,
    discovery: DiscoveryConfig,
}

impl ContentCache {
    pub fn new(
        store: Arc<dyn BackingStore>,
        version: impl Into<String>,
        discovery: DiscoveryConfig,
    ) -> Self {
        Self {
            store,
            version: version.into(),
            discovery,
        }
    }

    /// Deterministic cache key for an action and payload.
    ///
    /// serde_json serializes object keys in sorted order, so semantically
    /// equal payloads hash identically regardless of field order.
    pub fn cache_key(&self, action: &str, payload: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(action.as_bytes());
        hasher.update(payload.to_string().as_bytes());
        hasher.update(self.version.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Look up a previously stored result
    pub async fn lookup(&self, action: &str, payload: &Value) -> Result<Option<Value>> {
        let hash = self.cache_key(action, payload);

        match self.store.cache_get(&hash).await? {
            Some(record) => {
                debug!(action, "cache hit");
                Ok(Some(serde_json::from_str(&record.content)?))
            }
            None => {
                debug!(action, "cache miss");
                Ok(None)
            }
        }
    }

    /// Store a generated result under its deterministic key
    pub async fn store(&self, action: &str, payload: &Value, content: &Value) -> Result<()> {
        let record = CacheRecord {
            hash: self.cache_key(action, payload),
            kind: action.to_string(),
            content: content.to_string(),
            inserted_at: chrono::Utc::now().to_rfc3339(),
        };
        self.store.cache_put(&record).await
    }

    /// Mixed-content strategy for discovery lists.
    ///
    /// The key covers the selection criterion only, not the full payload,
    /// so every request for the same category shares one cached list:
    ///
    /// 1. With `reuse_probability`, a cached list is returned unchanged
    ///    (full hit, zero upstream calls).
    /// 2. Otherwise one uniformly random cached item is carried forward and
    ///    the generator is asked for `refresh_count` fresh items (or a full
    ///    list when nothing is cached yet).
    /// 3. If the carried item's identity collides with a fresh item, the
    ///    carried item is dropped; the shorter list is an accepted size
    ///    variance, not an error.
    /// 4. The mixed result is stored back for future reuse.
    pub async fn lookup_or_mix<F, Fut>(
        &self,
        action: &str,
        criterion: &Value,
        generate: F,
    ) -> Result<Vec<Value>>
    where
        F: FnOnce(usize) -> Fut,
        Fut: Future<Output = Result<Vec<Value>>>,
    {
        // A storage hiccup on read degrades to a miss rather than failing
        // the request.
        let cached: Option<Vec<Value>> = match self.lookup(action, criterion).await {
            Ok(value) => value.and_then(|v| v.as_array().cloned()).filter(|l| !l.is_empty()),
            Err(e) => {
                warn!(action, "discovery cache lookup failed: {}", e);
                None
            }
        };

        // Random decisions happen up front; ThreadRng must not be held
        // across an await point.
        let (full_hit, carried) = {
            let mut rng = rand::thread_rng();
            match &cached {
                Some(list) => (
                    rng.gen_bool(self.discovery.reuse_probability),
                    Some(list[rng.gen_range(0..list.len())].clone()),
                ),
                None => (false, None),
            }
        };

        if full_hit {
            debug!(action, "discovery full cache hit");
            return Ok(cached.unwrap_or_default());
        }

        let fresh_count = if carried.is_some() {
            self.discovery.refresh_count
        } else {
            self.discovery.list_len
        };

        let fresh = dedupe_by_identity(generate(fresh_count).await?);

        let mixed = match carried {
            Some(item) => {
                let id = identity_of(&item);
                let collides = id
                    .as_ref()
                    .map(|id| fresh.iter().any(|f| identity_of(f).as_ref() == Some(id)))
                    .unwrap_or(false);

                if collides {
                    debug!(action, "carried-forward item collides with fresh batch, dropping it");
                    fresh
                } else {
                    let mut list = Vec::with_capacity(fresh.len() + 1);
                    list.push(item);
                    list.extend(fresh);
                    list
                }
            }
            None => fresh,
        };

        // Best-effort store-back: a persistence hiccup never blocks the
        // already-computed response.
        if let Err(e) = self
            .store(action, criterion, &Value::Array(mixed.clone()))
            .await
        {
            warn!(action, "failed to store mixed discovery list: {}", e);
        }

        Ok(mixed)
    }
}

/// Natural identity of a discovery item (case-folded name)
fn identity_of(item: &Value) -> Option<String> {
    item.get("name")
        .and_then(|v| v.as_str())
        .map(|s| s.to_lowercase())
}

/// Drop intra-list duplicates by identity; items with no identity are kept
fn dedupe_by_identity(items: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match identity_of(item) {
            Some(id) => seen.insert(id),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_foundation::{Error, Storage};
    use serde_json::json;

    fn cache_with(version: &str, reuse_probability: f64) -> ContentCache {
        let store: Arc<dyn BackingStore> = Arc::new(Storage::in_memory().unwrap());
        ContentCache::new(
            store,
            version,
            DiscoveryConfig {
                reuse_probability,
                ..Default::default()
            },
        )
    }

    fn item(name: &str) -> Value {
        json!({ "name": name, "description": format!("About {}", name) })
    }

    #[test]
    fn test_cache_key_ignores_field_order() {
        let cache = cache_with("v1", 0.3);

        let a: Value = serde_json::from_str(r#"{"field": "physics", "level": 2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"level": 2, "field": "physics"}"#).unwrap();

        assert_eq!(
            cache.cache_key("discoverConcepts", &a),
            cache.cache_key("discoverConcepts", &b)
        );
    }

    #[test]
    fn test_cache_key_varies_with_inputs() {
        let cache = cache_with("v1", 0.3);
        let payload = json!({"field": "physics"});

        let base = cache.cache_key("discoverConcepts", &payload);
        assert_ne!(base, cache.cache_key("discoverProfiles", &payload));
        assert_ne!(base, cache.cache_key("discoverConcepts", &json!({"field": "biology"})));
    }

    #[tokio::test]
    async fn test_lookup_after_store_round_trips() {
        let cache = cache_with("v1", 0.3);
        let payload = json!({"item": {"name": "Gravity"}});
        let content = json!({"title": "Gravity", "humanStory": "An apple fell."});

        assert!(cache.lookup("generateScienceEntry", &payload).await.unwrap().is_none());
        cache.store("generateScienceEntry", &payload, &content).await.unwrap();

        let hit = cache.lookup("generateScienceEntry", &payload).await.unwrap();
        assert_eq!(hit, Some(content));
    }

    #[tokio::test]
    async fn test_version_bump_shadows_old_entries() {
        let store: Arc<dyn BackingStore> = Arc::new(Storage::in_memory().unwrap());
        let v1 = ContentCache::new(store.clone(), "v1", DiscoveryConfig::default());
        let v2 = ContentCache::new(store, "v2", DiscoveryConfig::default());

        let payload = json!({"field": "physics"});
        v1.store("discoverConcepts", &payload, &json!(["old"])).await.unwrap();

        assert!(v1.lookup("discoverConcepts", &payload).await.unwrap().is_some());
        assert!(v2.lookup("discoverConcepts", &payload).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mix_blends_one_cached_with_fresh() {
        let cache = cache_with("v1", 0.0); // never take the full-hit path
        let criterion = json!({"field": "physics"});

        let seeded: Vec<Value> = (1..=5).map(|i| item(&format!("Cached{}", i))).collect();
        cache
            .store("discoverConcepts", &criterion, &Value::Array(seeded.clone()))
            .await
            .unwrap();

        let mixed = cache
            .lookup_or_mix("discoverConcepts", &criterion, |n| async move {
                assert_eq!(n, 2);
                Ok(vec![item("FreshA"), item("FreshB")])
            })
            .await
            .unwrap();

        assert_eq!(mixed.len(), 3);
        // Exactly one carried-forward item, in first position
        assert!(seeded.contains(&mixed[0]));
        assert_eq!(mixed[1], item("FreshA"));
        assert_eq!(mixed[2], item("FreshB"));

        // No duplicate identities
        let ids: HashSet<_> = mixed.iter().map(|i| identity_of(i).unwrap()).collect();
        assert_eq!(ids.len(), 3);

        // The mixed list was stored back under the category key
        let stored = cache.lookup("discoverConcepts", &criterion).await.unwrap().unwrap();
        assert_eq!(stored, Value::Array(mixed));
    }

    #[tokio::test]
    async fn test_mix_drops_carried_item_on_identity_collision() {
        let cache = cache_with("v1", 0.0);
        let criterion = json!({"theme": "ethics"});

        // A single cached item makes the carried pick deterministic
        cache
            .store("discoverPhilosophies", &criterion, &json!([item("Stoicism")]))
            .await
            .unwrap();

        let mixed = cache
            .lookup_or_mix("discoverPhilosophies", &criterion, |_| async {
                Ok(vec![item("stoicism"), item("Taoism")])
            })
            .await
            .unwrap();

        // Only the fresh items survive; size variance is accepted
        assert_eq!(mixed, vec![item("stoicism"), item("Taoism")]);
    }

    #[tokio::test]
    async fn test_mix_generates_full_list_on_empty_cache() {
        let cache = cache_with("v1", 0.0);
        let criterion = json!({"category": "science"});

        let mixed = cache
            .lookup_or_mix("discoverProfiles", &criterion, |n| async move {
                assert_eq!(n, 5);
                Ok((1..=5).map(|i| item(&format!("New{}", i))).collect())
            })
            .await
            .unwrap();

        assert_eq!(mixed.len(), 5);
        assert!(cache.lookup("discoverProfiles", &criterion).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_mix_full_hit_skips_generator() {
        let cache = cache_with("v1", 1.0); // always take the full-hit path
        let criterion = json!({"field": "physics"});

        let seeded = vec![item("A"), item("B")];
        cache
            .store("discoverConcepts", &criterion, &Value::Array(seeded.clone()))
            .await
            .unwrap();

        let result = cache
            .lookup_or_mix("discoverConcepts", &criterion, |_| async {
                Err(Error::Internal("generator must not run".to_string()))
            })
            .await
            .unwrap();

        assert_eq!(result, seeded);
    }

    #[tokio::test]
    async fn test_mix_dedupes_generator_output() {
        let cache = cache_with("v1", 0.0);
        let criterion = json!({"field": "physics"});

        let mixed = cache
            .lookup_or_mix("discoverConcepts", &criterion, |_| async {
                Ok(vec![item("Twin"), item("twin"), item("Other")])
            })
            .await
            .unwrap();

        assert_eq!(mixed, vec![item("Twin"), item("Other")]);
    }
}
