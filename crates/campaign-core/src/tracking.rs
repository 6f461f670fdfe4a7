//! Per-instance bookkeeping that never owns the instance.
//!
//! Every aggregate value carries an [`InstanceHandle`]: a process-unique id
//! plus a liveness anchor. Side tables keyed by that id hold only a weak
//! reference to the anchor, so dropping the aggregate is enough for its
//! entry to become unreachable. Two values that share a stream id still get
//! distinct instance ids and never share an entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one in-memory aggregate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// Identity and liveness anchor owned by an aggregate value.
///
/// Deliberately not `Clone`: a clone would keep the anchor alive.
#[derive(Debug)]
pub struct InstanceHandle {
    id: InstanceId,
    anchor: Arc<()>,
}

impl InstanceHandle {
    /// Allocates a fresh instance id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: InstanceId(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)),
            anchor: Arc::new(()),
        }
    }

    /// The instance id.
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// A weak reference that dies with this handle.
    #[must_use]
    pub fn liveness(&self) -> Weak<()> {
        Arc::downgrade(&self.anchor)
    }
}

impl Default for InstanceHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Entry<V> {
    liveness: Weak<()>,
    value: V,
}

impl<V> Entry<V> {
    fn is_alive(&self) -> bool {
        self.liveness.strong_count() > 0
    }
}

/// Side table keyed by aggregate instance.
///
/// Entries whose instance has been dropped are invisible to lookups and are
/// pruned on the next insert.
#[derive(Debug)]
pub struct InstanceRegistry<V> {
    entries: HashMap<InstanceId, Entry<V>>,
}

impl<V> InstanceRegistry<V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Associates `value` with the instance behind `handle`, replacing any
    /// previous value.
    pub fn insert(&mut self, handle: &InstanceHandle, value: V) -> Option<V> {
        self.prune();
        self.entries
            .insert(
                handle.id(),
                Entry {
                    liveness: handle.liveness(),
                    value,
                },
            )
            .map(|entry| entry.value)
    }

    /// Returns the value for a live instance.
    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&V> {
        self.entries
            .get(&id)
            .filter(|entry| entry.is_alive())
            .map(|entry| &entry.value)
    }

    /// Removes and returns the value for an instance.
    pub fn remove(&mut self, id: InstanceId) -> Option<V> {
        self.entries.remove(&id).map(|entry| entry.value)
    }

    /// Drops entries whose instance no longer exists. Returns how many went.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_alive());
        before - self.entries.len()
    }

    /// Number of entries for live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_alive()).count()
    }

    /// Whether no live instance has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for InstanceRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}
