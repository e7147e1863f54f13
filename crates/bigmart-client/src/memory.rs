//! # In-Process Store
//!
//! A [`RemoteStore`] kept entirely in memory, with the same observable
//! behavior as the hosted realtime store: one JSON tree, generated push keys,
//! and live subscriptions that fire on every overlapping write.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         MemoryStore Write                               │
//! │                                                                         │
//! │  append("sales", {..})                                                  │
//! │     │                                                                   │
//! │     ├── offline? ──────────────────────────► Err(Unavailable)          │
//! │     │                                                                   │
//! │     ├── key = PushKeyGenerator::next()        "-NbX1aB2cD3eF4gH5iJ6"   │
//! │     ├── tree["sales"][key] = {..}             (nulls pruned)           │
//! │     │                                                                   │
//! │     └── for each subscriber:                                            │
//! │            receiver dropped? ──► forget it                              │
//! │            path overlaps "sales/key"? ──► send new node value          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Empty objects and `null` values are never stored, so removing the last
//! record of a collection makes the collection itself absent.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::{path_segments, paths_overlap, validate_key, RemoteStore, Subscription};

// =============================================================================
// Push Keys
// =============================================================================

/// Alphabet of push keys, in ascending ASCII order.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Generates chronologically ordered, collision-resistant keys.
///
/// ## Key Layout
/// ```text
///   -NbX1aB2 cD3eF4gH5iJ6
///   ├──────┤ ├──────────┤
///   8 chars  12 chars
///   ms time  random (incremented when the millisecond repeats)
/// ```
///
/// Keys compare in creation order, so lexicographic key order in a
/// snapshot is also insertion order.
#[derive(Debug, Default)]
pub struct PushKeyGenerator {
    last_time: i64,
    last_random: [u8; 12],
}

impl PushKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next key for the current wall-clock time.
    pub fn next_key(&mut self) -> String {
        self.next_key_at(chrono::Utc::now().timestamp_millis())
    }

    /// Next key for `now_ms`. A clock that goes backwards is treated as a
    /// repeat of the last millisecond, so keys stay strictly increasing.
    pub fn next_key_at(&mut self, now_ms: i64) -> String {
        let mut now = now_ms.max(self.last_time);

        if now == self.last_time && self.last_time != 0 {
            if !increment(&mut self.last_random) {
                // All 12 random chars were at their maximum: move to the
                // next millisecond with fresh randomness.
                now += 1;
                self.last_random = random_digits();
            }
        } else {
            self.last_random = random_digits();
        }
        self.last_time = now;

        let mut key = Vec::with_capacity(20);
        let mut time_digits = [0u8; 8];
        let mut t = now;
        for slot in time_digits.iter_mut().rev() {
            *slot = PUSH_CHARS[(t % 64) as usize];
            t /= 64;
        }
        key.extend_from_slice(&time_digits);
        key.extend(self.last_random.iter().map(|&d| PUSH_CHARS[d as usize]));

        String::from_utf8_lossy(&key).into_owned()
    }
}

fn random_digits() -> [u8; 12] {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let mut digits = [0u8; 12];
    for (d, b) in digits.iter_mut().zip(bytes.iter()) {
        *d = b % 64;
    }
    digits
}

/// Adds one to a base-64 digit string. Returns false on overflow.
fn increment(digits: &mut [u8; 12]) -> bool {
    for d in digits.iter_mut().rev() {
        if *d == 63 {
            *d = 0;
        } else {
            *d += 1;
            return true;
        }
    }
    false
}

// =============================================================================
// Tree Operations
// =============================================================================

fn get_at<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = node.as_object()?.get(segment)?;
    }
    match node {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other),
    }
}

/// Drops nulls and empty objects, recursively. Returns `None` when nothing
/// is left.
fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
                .collect();
            if pruned.is_empty() {
                None
            } else {
                Some(Value::Object(pruned))
            }
        }
        other => Some(other),
    }
}

/// Writes `value` at `segments` (`None` removes), creating intermediate
/// objects and pruning emptied ones. Returns true if the node is now empty.
fn set_at(node: &mut Value, segments: &[String], value: Option<Value>) -> bool {
    let Some((head, rest)) = segments.split_first() else {
        *node = value.unwrap_or(Value::Null);
        return node.is_null();
    };

    if !node.is_object() {
        if value.is_none() {
            return node.is_null();
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return false;
    };

    if rest.is_empty() {
        match value {
            Some(v) => {
                map.insert(head.clone(), v);
            }
            None => {
                map.remove(head);
            }
        }
    } else {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        if set_at(child, rest, value) {
            map.remove(head);
        }
    }

    map.is_empty()
}

// =============================================================================
// Memory Store
// =============================================================================

#[derive(Debug)]
struct Subscriber {
    path: Vec<String>,
    tx: watch::Sender<Option<Value>>,
}

#[derive(Debug)]
struct Inner {
    root: Value,
    subscribers: Vec<Subscriber>,
    push_keys: PushKeyGenerator,
    online: bool,
}

impl Inner {
    fn write(&mut self, segments: &[String], value: Option<Value>) {
        self.apply(segments, value);
        self.notify(segments);
    }

    /// Changes the tree without notifying anyone.
    fn apply(&mut self, segments: &[String], value: Option<Value>) {
        if set_at(&mut self.root, segments, value.and_then(prune)) {
            self.root = Value::Object(Map::new());
        }
    }

    fn notify(&mut self, written: &[String]) {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| !s.tx.is_closed());
        let pruned = before - self.subscribers.len();
        if pruned > 0 {
            debug!(pruned, "Dropped cancelled subscribers");
        }

        for sub in &self.subscribers {
            if !paths_overlap(&sub.path, written) {
                continue;
            }
            let current = get_at(&self.root, &sub.path).cloned();
            sub.tx.send_if_modified(|value| {
                if *value == current {
                    false
                } else {
                    *value = current;
                    true
                }
            });
        }
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.online {
            Ok(())
        } else {
            Err(StoreError::Unavailable("client is offline".to_string()))
        }
    }
}

/// In-memory [`RemoteStore`].
///
/// Cloning shares the same tree, like two handles to one database.
///
/// ## Usage
/// ```rust
/// use bigmart_client::memory::MemoryStore;
/// use bigmart_client::store::RemoteStore;
/// use serde_json::json;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = MemoryStore::new();
/// let key = store.append("products", json!({"productName": "Pen"})).await.unwrap();
/// let value = store.get(&format!("products/{}", key)).await.unwrap();
/// assert_eq!(value, Some(json!({"productName": "Pen"})));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty, online store.
    pub fn new() -> Self {
        Self::with_data(Value::Object(Map::new()))
    }

    /// Creates a store pre-loaded with `root`.
    pub fn with_data(root: Value) -> Self {
        MemoryStore {
            inner: Arc::new(RwLock::new(Inner {
                root: prune(root).unwrap_or_else(|| Value::Object(Map::new())),
                subscribers: Vec::new(),
                push_keys: PushKeyGenerator::new(),
                online: true,
            })),
        }
    }

    /// Switches the simulated connection. While offline every read and
    /// write fails with `Unavailable`; subscriptions stay open.
    pub async fn set_online(&self, online: bool) {
        let mut inner = self.inner.write().await;
        if inner.online != online {
            info!(online, "Memory store connectivity changed");
        }
        inner.online = online;
    }

    /// Number of live subscribers (after pruning cancelled ones).
    pub async fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.write().await;
        inner.subscribers.retain(|s| !s.tx.is_closed());
        inner.subscribers.len()
    }

    /// A copy of the whole tree.
    pub async fn dump(&self) -> Value {
        self.inner.read().await.root.clone()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn subscribe(&self, path: &str) -> StoreResult<Subscription> {
        let segments = path_segments(path)?;
        let mut inner = self.inner.write().await;

        let current = get_at(&inner.root, &segments).cloned();
        let (tx, rx) = watch::channel(current);
        inner.subscribers.push(Subscriber {
            path: segments,
            tx,
        });

        debug!(path, subscribers = inner.subscribers.len(), "Subscribed");
        Ok(Subscription::new(path, rx))
    }

    async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        let segments = path_segments(path)?;
        let inner = self.inner.read().await;
        inner.ensure_online()?;
        Ok(get_at(&inner.root, &segments).cloned())
    }

    async fn append(&self, path: &str, record: Value) -> StoreResult<String> {
        let mut segments = path_segments(path)?;
        let mut inner = self.inner.write().await;
        inner.ensure_online()?;

        let key = inner.push_keys.next_key();
        segments.push(key.clone());
        inner.write(&segments, Some(record));

        debug!(path, %key, "Appended record");
        Ok(key)
    }

    async fn set(&self, path: &str, value: Value) -> StoreResult<()> {
        let segments = path_segments(path)?;
        let mut inner = self.inner.write().await;
        inner.ensure_online()?;

        inner.write(&segments, Some(value));
        debug!(path, "Set node");
        Ok(())
    }

    async fn update(&self, path: &str, partial: Value) -> StoreResult<()> {
        let segments = path_segments(path)?;
        let Value::Object(fields) = partial else {
            warn!(path, "Rejected non-object update");
            return Err(StoreError::InvalidPayload(format!(
                "update at '{}' needs an object",
                path
            )));
        };

        // Every key must name one direct child; check all before touching
        // the tree.
        let mut writes = Vec::with_capacity(fields.len());
        for (child, value) in fields {
            if let Err(e) = validate_key(&child) {
                warn!(path, child = %child, "Rejected update with invalid child key");
                return Err(e);
            }
            let mut target = segments.clone();
            target.push(child);
            writes.push((target, value));
        }

        // Subscribers see the whole partial applied at once.
        let mut inner = self.inner.write().await;
        inner.ensure_online()?;
        for (target, value) in writes {
            inner.apply(&target, Some(value));
        }
        inner.notify(&segments);

        debug!(path, "Updated node");
        Ok(())
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        let segments = path_segments(path)?;
        let mut inner = self.inner.write().await;
        inner.ensure_online()?;

        inner.write(&segments, None);
        debug!(path, "Removed node");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_keys_are_strictly_increasing() {
        let mut gen = PushKeyGenerator::new();
        let mut keys = vec![gen.next_key_at(1_700_000_000_000)];
        for _ in 0..50 {
            keys.push(gen.next_key_at(1_700_000_000_000));
        }
        keys.push(gen.next_key_at(1_700_000_000_001));
        keys.push(gen.next_key_at(1_699_999_999_999)); // clock went back

        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
        assert!(keys.iter().all(|k| k.len() == 20));
    }

    #[test]
    fn test_push_key_alphabet() {
        let mut gen = PushKeyGenerator::new();
        let key = gen.next_key_at(1_700_000_000_000);
        assert!(key.bytes().all(|b| PUSH_CHARS.contains(&b)));
        assert_eq!(&key[..8], &gen.next_key_at(1_700_000_000_000)[..8]);
    }

    #[test]
    fn test_increment_carries() {
        let mut digits = [0u8; 12];
        digits[11] = 63;
        assert!(increment(&mut digits));
        assert_eq!(digits[11], 0);
        assert_eq!(digits[10], 1);

        let mut full = [63u8; 12];
        assert!(!increment(&mut full));
    }

    #[tokio::test]
    async fn test_append_get_and_order() {
        let store = MemoryStore::new();
        let k1 = store.append("products", json!({"productName": "Pen"})).await.unwrap();
        let k2 = store.append("products", json!({"productName": "Pad"})).await.unwrap();
        assert!(k1 < k2);

        let all = store.get("products").await.unwrap().unwrap();
        let keys: Vec<&String> = all.as_object().unwrap().keys().collect();
        assert_eq!(keys, [&k1, &k2]);
    }

    #[tokio::test]
    async fn test_subscription_sees_writes() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("products").await.unwrap();
        assert!(sub.current().is_none());

        let key = store.append("products", json!({"productName": "Pen"})).await.unwrap();
        sub.changed().await.unwrap();
        assert_eq!(sub.rows()[0].id, key);

        store
            .update(&format!("products/{}", key), json!({"price": "2.00"}))
            .await
            .unwrap();
        sub.changed().await.unwrap();
        assert_eq!(sub.rows()[0].text("price").unwrap(), "2.00");

        store.remove(&format!("products/{}", key)).await.unwrap();
        sub.changed().await.unwrap();
        assert!(sub.current().is_none());
        assert_eq!(store.dump().await, json!({}));
    }

    #[tokio::test]
    async fn test_unrelated_writes_do_not_notify() {
        let store = MemoryStore::new();
        let sub = store.subscribe("products").await.unwrap();

        store.append("sales", json!({"customer": "c1"})).await.unwrap();
        assert!(!sub.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_set_overwrites_and_null_removes() {
        let store = MemoryStore::new();
        store
            .set("user_locations/u1", json!({"locationId": "l1", "extra": 1}))
            .await
            .unwrap();
        store
            .set("user_locations/u1", json!({"locationId": "l2"}))
            .await
            .unwrap();
        assert_eq!(
            store.get("user_locations/u1").await.unwrap(),
            Some(json!({"locationId": "l2"}))
        );

        store.set("user_locations/u1", Value::Null).await.unwrap();
        assert_eq!(store.get("user_locations").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_rejects_non_object() {
        let store = MemoryStore::new();
        let err = store.update("products/k1", json!("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_keys_that_are_not_one_child() {
        let store = MemoryStore::new();
        store
            .set("products/k1", json!({"productName": "Pen", "unit": "pcs"}))
            .await
            .unwrap();

        for bad in ["", "a/b", "/", "price.usd"] {
            let mut partial = Map::new();
            partial.insert(bad.to_string(), json!({"price": "2"}));
            let err = store
                .update("products/k1", Value::Object(partial))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidPath(_)), "key {:?}", bad);
        }

        // A bad key anywhere in the partial rejects the whole update.
        let err = store
            .update("products/k1", json!({"price": "2", "": {"x": 1}}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
        assert_eq!(
            store.get("products/k1").await.unwrap(),
            Some(json!({"productName": "Pen", "unit": "pcs"}))
        );
    }

    #[tokio::test]
    async fn test_update_is_seen_as_one_change() {
        let store = MemoryStore::with_data(json!({"products": {"k1": {"productName": "Pen"}}}));
        let mut sub = store.subscribe("products/k1").await.unwrap();
        sub.current();

        store
            .update("products/k1", json!({"price": "2.00", "unit": "pcs", "productName": null}))
            .await
            .unwrap();

        assert!(sub.has_changed().unwrap());
        assert_eq!(sub.current(), Some(json!({"price": "2.00", "unit": "pcs"})));
        assert!(!sub.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_offline_writes_fail() {
        let store = MemoryStore::new();
        let sub = store.subscribe("sales").await.unwrap();
        store.set_online(false).await;

        let err = store.append("sales", json!({"customer": "c1"})).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(!sub.has_changed().unwrap());

        store.set_online(true).await;
        assert!(store.append("sales", json!({"customer": "c1"})).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_subscribers_are_pruned() {
        let store = MemoryStore::new();
        let a = store.subscribe("products").await.unwrap();
        let _b = store.subscribe("products").await.unwrap();
        assert_eq!(store.subscriber_count().await, 2);

        a.cancel();
        assert_eq!(store.subscriber_count().await, 1);
    }

    #[tokio::test]
    async fn test_with_data_prunes_nulls() {
        let store = MemoryStore::with_data(json!({
            "products": {"k1": {"productName": "Pen", "description": null}},
            "vendors": {}
        }));
        assert_eq!(
            store.dump().await,
            json!({"products": {"k1": {"productName": "Pen"}}})
        );
    }
}
