//! Per-instance buffers of events an aggregate has emitted but nobody has
//! persisted yet.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::emitter::{EventEmitter, Listener, Observers};
use crate::tracking::{InstanceHandle, InstanceId, InstanceRegistry};

type Buffer<E> = Arc<Mutex<Vec<E>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking listener cannot leave a Vec half-written.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn sink<E: Clone + Send + 'static>(buffer: &Buffer<E>) -> Listener<E> {
    let buffer = Arc::clone(buffer);
    Box::new(move |event: &E| lock(&buffer).push(event.clone()))
}

/// Collects events emitted by tracked aggregates.
///
/// The collector holds no reference to the aggregates themselves. Buffers
/// are keyed by instance and vanish once the aggregate is dropped.
#[derive(Debug)]
pub struct EventCollector<E> {
    buffers: Mutex<InstanceRegistry<Buffer<E>>>,
}

impl<E: Clone + Send + 'static> EventCollector<E> {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffers: Mutex::new(InstanceRegistry::new()),
        }
    }

    /// Returns an observer list that is already being collected.
    ///
    /// Hand it to an aggregate factory so events emitted during construction
    /// land in the buffer.
    pub fn observers(&self) -> Observers<E> {
        let mut observers = Observers::new();
        let buffer = Buffer::default();
        observers.listen(sink(&buffer));
        self.register(observers.instance(), buffer);
        observers
    }

    /// Starts collecting events from `aggregate`. Tracking an aggregate that
    /// is already tracked empties its buffer instead of subscribing twice.
    pub fn track<A: EventEmitter<Event = E>>(&self, aggregate: &mut A) {
        if let Some(buffer) = lock(&self.buffers).get(aggregate.instance_id()) {
            lock(buffer).clear();
            return;
        }
        let buffer = Buffer::default();
        aggregate.listen(sink(&buffer));
        self.register(aggregate.observers().instance(), buffer);
    }

    /// Buffered events in emission order. Empty if `aggregate` is untracked.
    pub fn events<A: EventEmitter<Event = E>>(&self, aggregate: &A) -> Vec<E> {
        lock(&self.buffers)
            .get(aggregate.instance_id())
            .map(|buffer| lock(buffer).clone())
            .unwrap_or_default()
    }

    /// Empties the buffer for `aggregate`. It stays subscribed.
    pub fn clear_events<A: EventEmitter<Event = E>>(&self, aggregate: &A) {
        if let Some(buffer) = lock(&self.buffers).get(aggregate.instance_id()) {
            lock(buffer).clear();
        }
    }

    /// Stops collecting for `aggregate` right away instead of waiting for it
    /// to be dropped.
    pub fn release<A: EventEmitter<Event = E>>(&self, aggregate: &A) {
        self.release_instance(aggregate.instance_id());
    }

    /// Number of live aggregates being collected.
    pub fn tracked_count(&self) -> usize {
        lock(&self.buffers).len()
    }

    fn release_instance(&self, id: InstanceId) {
        lock(&self.buffers).remove(id);
    }

    fn register(&self, handle: &InstanceHandle, buffer: Buffer<E>) {
        lock(&self.buffers).insert(handle, buffer);
    }
}

impl<E: Clone + Send + 'static> Default for EventCollector<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        observers: Observers<u32>,
        value: u32,
    }

    impl Counter {
        fn with_observers(observers: Observers<u32>) -> Self {
            let counter = Self {
                observers,
                value: 0,
            };
            counter.observers.emit(&0);
            counter
        }

        fn bump(&mut self) {
            self.value += 1;
            self.observers.emit(&self.value);
        }
    }

    impl EventEmitter for Counter {
        type Event = u32;

        fn observers(&self) -> &Observers<u32> {
            &self.observers
        }

        fn observers_mut(&mut self) -> &mut Observers<u32> {
            &mut self.observers
        }
    }

    #[test]
    fn test_track_collects_subsequent_events_in_order() {
        // Arrange
        let collector = EventCollector::new();
        let mut counter = Counter::default();
        counter.bump();

        // Act
        collector.track(&mut counter);
        counter.bump();
        counter.bump();

        // Assert
        assert_eq!(collector.events(&counter), vec![2, 3]);
    }

    #[test]
    fn test_events_for_untracked_aggregate_is_empty() {
        let collector = EventCollector::new();
        let mut counter = Counter::default();
        counter.bump();

        assert!(collector.events(&counter).is_empty());
    }

    #[test]
    fn test_retrack_resets_buffer_without_double_subscription() {
        // Arrange
        let collector = EventCollector::new();
        let mut counter = Counter::default();
        collector.track(&mut counter);
        counter.bump();

        // Act
        collector.track(&mut counter);
        counter.bump();

        // Assert
        assert_eq!(collector.events(&counter), vec![2]);
        assert_eq!(counter.observers.len(), 1);
    }

    #[test]
    fn test_clear_events_keeps_subscription() {
        let collector = EventCollector::new();
        let mut counter = Counter::default();
        collector.track(&mut counter);
        counter.bump();

        collector.clear_events(&counter);
        counter.bump();

        assert_eq!(collector.events(&counter), vec![2]);
    }

    #[test]
    fn test_observers_capture_events_emitted_during_construction() {
        let collector = EventCollector::new();

        let counter = Counter::with_observers(collector.observers());

        assert_eq!(collector.events(&counter), vec![0]);
    }

    #[test]
    fn test_instances_never_share_buffers() {
        let collector = EventCollector::new();
        let mut a = Counter::default();
        let mut b = Counter::default();
        collector.track(&mut a);
        collector.track(&mut b);

        a.bump();

        assert_eq!(collector.events(&a), vec![1]);
        assert!(collector.events(&b).is_empty());
    }

    #[test]
    fn test_dropped_aggregates_are_not_kept_alive() {
        // Arrange
        let collector = EventCollector::new();
        let mut kept = Counter::default();
        collector.track(&mut kept);
        {
            let mut dropped = Counter::default();
            collector.track(&mut dropped);
            assert_eq!(collector.tracked_count(), 2);
        }

        // Act
        let count = collector.tracked_count();

        // Assert
        assert_eq!(count, 1);
    }

    #[test]
    fn test_release_stops_collection() {
        let collector = EventCollector::new();
        let mut counter = Counter::default();
        collector.track(&mut counter);

        collector.release(&counter);
        counter.bump();

        assert!(collector.events(&counter).is_empty());
        assert_eq!(collector.tracked_count(), 0);
    }
}
