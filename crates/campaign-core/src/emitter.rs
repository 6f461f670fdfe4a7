//! Synchronous in-process event emission.
//!
//! An aggregate owns an [`Observers`] list and publishes each event it
//! records to every registered listener, in registration order. It never
//! learns who is listening, which keeps persistence types out of the domain.

use crate::tracking::{InstanceHandle, InstanceId};

/// A callback invoked for each emitted event.
pub type Listener<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Observer list embedded in an aggregate, tied to that aggregate's
/// instance identity.
pub struct Observers<E> {
    instance: InstanceHandle,
    listeners: Vec<Listener<E>>,
}

impl<E> Observers<E> {
    /// Creates an empty observer list with a fresh instance identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            instance: InstanceHandle::new(),
            listeners: Vec::new(),
        }
    }

    /// The identity of the aggregate owning this list.
    #[must_use]
    pub fn instance(&self) -> &InstanceHandle {
        &self.instance
    }

    /// Registers a listener after the existing ones.
    pub fn listen(&mut self, listener: Listener<E>) {
        self.listeners.push(listener);
    }

    /// Publishes `event` to every listener. No listeners is a no-op.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("instance", &self.instance.id())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Implemented by aggregates that publish their events through an
/// [`Observers`] list.
pub trait EventEmitter {
    /// The event type this aggregate emits.
    type Event;

    /// The aggregate's observer list.
    fn observers(&self) -> &Observers<Self::Event>;

    /// Mutable access to the aggregate's observer list.
    fn observers_mut(&mut self) -> &mut Observers<Self::Event>;

    /// Registers a listener for subsequent events.
    fn listen(&mut self, listener: Listener<Self::Event>) {
        self.observers_mut().listen(listener);
    }

    /// Identity of this in-memory value.
    fn instance_id(&self) -> InstanceId {
        self.observers().instance().id()
    }
}
