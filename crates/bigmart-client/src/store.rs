//! # Remote Collection Store
//!
//! The port to the hosted realtime document store.
//!
//! ## Store Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One JSON Tree, Addressed by Path                     │
//! │                                                                         │
//! │  /                                                                      │
//! │  ├── products/                                                          │
//! │  │   ├── -NbX1...  { productName, quantity, price, unit }              │
//! │  │   └── -NbX2...                                                      │
//! │  ├── sales/ ...                                                         │
//! │  └── user_locations/                                                    │
//! │      └── {uid}     { locationId }                                      │
//! │                                                                         │
//! │  subscribe("products") ──► watch::Receiver ──► latest node value        │
//! │                                                                         │
//! │  Any write at or below (or above) a subscribed path delivers a fresh    │
//! │  value to that subscriber. The snapshot stream is the only source of    │
//! │  truth; a write is observed when its snapshot arrives.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes are last-write-wins. There is no versioning and no transaction.

use async_trait::async_trait;
use bigmart_core::rows::{project_value, Row, Snapshot};
use serde_json::Value;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Store Port
// =============================================================================

/// Port for the hosted realtime document store.
///
/// Paths are `/`-separated (`"products"`, `"user_locations/uid-1"`).
/// Leading and trailing slashes are ignored.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Starts a live subscription. The receiver holds the current value
    /// immediately and every later value until the subscription is dropped.
    async fn subscribe(&self, path: &str) -> StoreResult<Subscription>;

    /// One-shot read. `None` when nothing is stored at `path`.
    async fn get(&self, path: &str) -> StoreResult<Option<Value>>;

    /// Stores `record` under a new generated key and returns the key.
    async fn append(&self, path: &str, record: Value) -> StoreResult<String>;

    /// Overwrites the node at `path`. `null` removes it.
    async fn set(&self, path: &str, value: Value) -> StoreResult<()>;

    /// Merges the fields of `partial` (an object) into the node at `path`.
    async fn update(&self, path: &str, partial: Value) -> StoreResult<()>;

    /// Removes the node at `path`.
    async fn remove(&self, path: &str) -> StoreResult<()>;
}

// =============================================================================
// Paths
// =============================================================================

/// Splits a path into its segments.
///
/// ## Errors
/// - `InvalidPath` for empty segments (`"a//b"`) or characters the hosted
///   store forbids in keys (`. # $ [ ]`)
pub fn path_segments(path: &str) -> StoreResult<Vec<String>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let forbidden = |c: char| matches!(c, '.' | '#' | '$' | '[' | ']');

    trimmed
        .split('/')
        .map(|segment| {
            if segment.is_empty() || segment.contains(forbidden) {
                Err(StoreError::InvalidPath(path.to_string()))
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}

/// Checks a single child key, as used in `update` payloads and record keys.
///
/// ## Errors
/// - `InvalidPath` if the key is empty, contains `/`, or contains a
///   character the hosted store forbids
pub fn validate_key(key: &str) -> StoreResult<()> {
    let forbidden = |c: char| matches!(c, '/' | '.' | '#' | '$' | '[' | ']');
    if key.is_empty() || key.contains(forbidden) {
        return Err(StoreError::InvalidPath(key.to_string()));
    }
    Ok(())
}

/// True when one path is an ancestor of (or equal to) the other.
pub fn paths_overlap(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

// =============================================================================
// Subscription
// =============================================================================

/// A live view of one store path.
///
/// ## Lifecycle
/// ```text
/// subscribe(path) ──► Subscription ──► changed().await ──► current()
///                          │                 ▲      │
///                          │                 └──────┘ (repeat)
///                          ▼
///                  drop / cancel()   store stops delivering
/// ```
///
/// Intermediate values may be coalesced: a slow consumer only ever sees the
/// latest one.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    rx: watch::Receiver<Option<Value>>,
}

impl Subscription {
    /// Wraps the receiving end of a store channel.
    pub fn new(path: impl Into<String>, rx: watch::Receiver<Option<Value>>) -> Self {
        Subscription {
            path: path.into(),
            rx,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Latest value, marking it seen.
    pub fn current(&mut self) -> Option<Value> {
        self.rx.borrow_and_update().clone()
    }

    /// Latest value without marking it seen.
    pub fn peek(&self) -> Option<Value> {
        self.rx.borrow().clone()
    }

    /// Latest value as a collection snapshot.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_value(self.rx.borrow_and_update().as_ref())
    }

    /// Latest value projected into rows.
    pub fn rows(&mut self) -> Vec<Row> {
        project_value(self.rx.borrow_and_update().as_ref())
    }

    /// True if a value arrived that has not been seen yet.
    pub fn has_changed(&self) -> StoreResult<bool> {
        self.rx
            .has_changed()
            .map_err(|_| StoreError::SubscriptionClosed(self.path.clone()))
    }

    /// Waits for the next unseen value.
    ///
    /// ## Errors
    /// - `SubscriptionClosed` once the store side is gone
    pub async fn changed(&mut self) -> StoreResult<()> {
        self.rx
            .changed()
            .await
            .map_err(|_| StoreError::SubscriptionClosed(self.path.clone()))
    }

    /// Cancels the subscription. Dropping it has the same effect.
    pub fn cancel(self) {
        tracing::debug!(path = %self.path, "Subscription cancelled");
    }

    /// Consumes the subscription as a `Stream` of values, starting with the
    /// current one.
    pub fn into_stream(self) -> WatchStream<Option<Value>> {
        WatchStream::new(self.rx)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_stream::StreamExt;

    fn segs(path: &str) -> Vec<String> {
        path_segments(path).unwrap()
    }

    #[test]
    fn test_path_segments() {
        assert_eq!(segs("products"), ["products"]);
        assert_eq!(segs("/user_locations/uid-1/"), ["user_locations", "uid-1"]);
        assert!(segs("").is_empty());
        assert!(path_segments("a//b").is_err());
        assert!(path_segments("products/bad.key").is_err());
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("productName").is_ok());
        assert!(validate_key("-NxYz12").is_ok());
        assert!(matches!(validate_key(""), Err(StoreError::InvalidPath(_))));
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("/").is_err());
        assert!(validate_key("a.b").is_err());
    }

    #[test]
    fn test_paths_overlap() {
        assert!(paths_overlap(&segs("products"), &segs("products/k1")));
        assert!(paths_overlap(&segs("products/k1"), &segs("products")));
        assert!(paths_overlap(&segs(""), &segs("sales")));
        assert!(!paths_overlap(&segs("products"), &segs("purchases")));
        assert!(!paths_overlap(&segs("products/k1"), &segs("products/k2")));
    }

    #[tokio::test]
    async fn test_subscription_tracks_latest_value() {
        let (tx, rx) = watch::channel(None);
        let mut sub = Subscription::new("products", rx);
        assert!(sub.rows().is_empty());
        assert!(!sub.has_changed().unwrap());

        tx.send_replace(Some(json!({"k1": {"productName": "Pen"}})));
        assert!(sub.has_changed().unwrap());
        sub.changed().await.unwrap();
        assert_eq!(sub.rows()[0].id, "k1");

        drop(tx);
        assert!(sub.changed().await.is_err());
    }

    #[tokio::test]
    async fn test_subscription_as_stream() {
        let (tx, rx) = watch::channel(Some(json!({"a": {}})));
        let mut stream = Subscription::new("x", rx).into_stream();

        assert_eq!(stream.next().await, Some(Some(json!({"a": {}}))));
        tx.send_replace(None);
        assert_eq!(stream.next().await, Some(None));
    }
}
