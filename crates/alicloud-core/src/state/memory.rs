// # Eventual Store
//
// In-memory key/value store that behaves like an eventually consistent
// control plane.
//
// ## Purpose
//
// Backs the in-memory RAM and FC APIs. Mutations are authoritative at
// once (a second create of the same id is rejected), but readers keep
// seeing the previous value for a configurable number of reads. This is
// the lag the waiter exists to absorb.
//
// ## Visibility Rules
//
// - `propagation_polls = 0`: every change is visible to the next read
// - `propagation_polls = n`: the next `n` reads still see the previous
//   value; read `n + 1` sees the change
// - Only creations and deletions lag: replacing a value readers already
//   see takes effect at once
// - A newer change replaces a pending one and restarts the countdown
//
// ## When to Use
//
// - Contract and acceptance tests
// - Dry runs of the reconcile binary without cloud access

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Pending<T> {
    /// New value; `None` is a deletion
    value: Option<T>,
    /// Reads that still see the old value
    reads_left: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    /// What readers currently see
    visible: Option<T>,
    /// Change not yet visible to readers
    pending: Option<Pending<T>>,
}

impl<T: Clone> Slot<T> {
    fn latest(&self) -> Option<&T> {
        match self.pending {
            Some(ref pending) => pending.value.as_ref(),
            None => self.visible.as_ref(),
        }
    }
}

/// Eventually consistent in-memory store
///
/// # Example
///
/// ```rust
/// use alicloud_core::EventualStore;
///
/// #[tokio::main]
/// async fn main() {
///     let store = EventualStore::new(1);
///     store.put("user-1", 42u32).await;
///
///     // Authoritative view sees the write at once
///     assert_eq!(store.latest("user-1").await, Some(42));
///
///     // Readers see it one read later
///     assert_eq!(store.get("user-1").await, None);
///     assert_eq!(store.get("user-1").await, Some(42));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct EventualStore<T> {
    inner: Arc<Mutex<HashMap<String, Slot<T>>>>,
    propagation_polls: u32,
}

impl<T: Clone + Send> EventualStore<T> {
    /// Create a new empty store
    ///
    /// # Parameters
    ///
    /// - `propagation_polls`: Reads that keep seeing the previous value after a change
    pub fn new(propagation_polls: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            propagation_polls,
        }
    }

    /// Reads needed before a change becomes visible
    pub fn propagation_polls(&self) -> u32 {
        self.propagation_polls
    }

    /// Write a value
    pub async fn put(&self, id: &str, value: T) {
        self.stage(id, Some(value)).await;
    }

    /// Delete a value
    ///
    /// # Returns
    ///
    /// `true` if the value existed (authoritatively) before the call
    pub async fn remove(&self, id: &str) -> bool {
        let existed = self.latest(id).await.is_some();
        if existed {
            self.stage(id, None).await;
        }
        existed
    }

    /// Read a value the way a lagging replica would
    pub async fn get(&self, id: &str) -> Option<T> {
        let mut inner = self.inner.lock().await;
        let slot = inner.get_mut(id)?;

        if let Some(pending) = slot.pending.as_mut() {
            if pending.reads_left == 0 {
                slot.visible = pending.value.take();
                slot.pending = None;
            } else {
                pending.reads_left -= 1;
            }
        }

        let visible = slot.visible.clone();
        if slot.visible.is_none() && slot.pending.is_none() {
            inner.remove(id);
        }
        visible
    }

    /// Read the authoritative value, ignoring propagation lag
    pub async fn latest(&self, id: &str) -> Option<T> {
        let inner = self.inner.lock().await;
        inner.get(id).and_then(|slot| slot.latest().cloned())
    }

    /// Ids whose authoritative value exists
    pub async fn ids(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut ids: Vec<String> = inner
            .iter()
            .filter(|(_, slot)| slot.latest().is_some())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of values that authoritatively exist
    pub async fn len(&self) -> usize {
        self.ids().await.len()
    }

    /// Check if no value authoritatively exists
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn stage(&self, id: &str, value: Option<T>) {
        let mut inner = self.inner.lock().await;
        let slot = inner.entry(id.to_string()).or_insert_with(|| Slot {
            visible: None,
            pending: None,
        });

        // Existence changes lag; in-place changes of a settled value do not
        let settled = slot.visible.is_some() && slot.pending.is_none();
        if self.propagation_polls == 0 || (settled && value.is_some()) {
            slot.visible = value;
            slot.pending = None;
        } else {
            slot.pending = Some(Pending {
                value,
                reads_left: self.propagation_polls,
            });
        }
    }
}
