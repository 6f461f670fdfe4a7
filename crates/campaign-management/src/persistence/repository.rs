//! Event-sourced campaign repository.
//!
//! The repository is the only component that talks to the event store and
//! the event collector. It tracks, per in-memory campaign instance, the
//! stream version and folded state it last observed, and uses them to
//! number new records and to guard appends with an expected version.

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use campaign_core::clock::Clock;
use campaign_core::collector::EventCollector;
use campaign_core::emitter::EventEmitter;
use campaign_core::error::DomainError;
use campaign_core::event::{EventRecord, sequence_records};
use campaign_core::store::{EventStore, StoreError};
use campaign_core::tracking::InstanceRegistry;
use tracing::{debug, info, instrument, warn};

use crate::domain::aggregates::Campaign;
use crate::domain::business_type::BusinessType;
use crate::domain::campaign_id::CampaignId;
use crate::domain::events::CampaignEvent;
use crate::persistence::state::EventSourcedCampaignState;

/// Default number of events between snapshots.
pub const SNAPSHOT_INTERVAL: i64 = 100;

/// Creates, saves and loads campaigns.
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Creates a campaign and appends its `CampaignCreated` event as the
    /// first record of a new stream. The returned campaign is tracked.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyExists` if the stream already has
    /// events, or `DomainError::PersistenceFailure` if the store fails.
    async fn create_campaign(
        &self,
        id: CampaignId,
        name: String,
        business_type: BusinessType,
    ) -> Result<Campaign, DomainError>;

    /// Persists the events `campaign` emitted since it was created, loaded
    /// or last saved.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotTracked` if `campaign` did not come from
    /// this repository, `DomainError::ConcurrencyConflict` if its stream
    /// moved since it was loaded, or `DomainError::PersistenceFailure` if
    /// the store fails.
    async fn save(&self, campaign: &Campaign) -> Result<(), DomainError>;

    /// Rebuilds a campaign from its stream. `None` if the stream has
    /// neither events nor a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PersistenceFailure` if the store fails or the
    /// stream holds data that cannot be folded.
    async fn load(&self, id: &CampaignId) -> Result<Option<Campaign>, DomainError>;
}

#[derive(Debug, Clone)]
struct Tracked {
    version: i64,
    state: EventSourcedCampaignState,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`CampaignRepository`] backed by an [`EventStore`].
pub struct EventSourcedCampaignRepository {
    event_store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    collector: EventCollector<CampaignEvent>,
    tracked: Mutex<InstanceRegistry<Tracked>>,
    snapshot_interval: i64,
}

impl EventSourcedCampaignRepository {
    /// Creates a repository that snapshots every [`SNAPSHOT_INTERVAL`]
    /// events.
    #[must_use]
    pub fn new(event_store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            event_store,
            clock,
            collector: EventCollector::new(),
            tracked: Mutex::new(InstanceRegistry::new()),
            snapshot_interval: SNAPSHOT_INTERVAL,
        }
    }

    /// Overrides the number of events between snapshots.
    #[must_use]
    pub fn with_snapshot_interval(mut self, interval: NonZeroU32) -> Self {
        self.snapshot_interval = i64::from(interval.get());
        self
    }

    /// The number of events between snapshots.
    #[must_use]
    pub fn snapshot_interval(&self) -> i64 {
        self.snapshot_interval
    }

    /// Number of live campaign instances currently tracked.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        lock(&self.tracked).len()
    }

    fn tracked_entry(&self, campaign: &Campaign) -> Option<Tracked> {
        lock(&self.tracked).get(campaign.instance_id()).cloned()
    }

    fn begin_tracking(&self, campaign: &Campaign, tracked: Tracked) {
        lock(&self.tracked).insert(campaign.observers().instance(), tracked);
    }

    fn end_tracking(&self, campaign: &Campaign) {
        lock(&self.tracked).remove(campaign.instance_id());
    }

    async fn write_snapshot(
        &self,
        stream_id: &str,
        state: &EventSourcedCampaignState,
        version: i64,
    ) {
        let value = match state.to_snapshot() {
            Ok(value) => value,
            Err(err) => {
                warn!(stream_id, version, error = %err, "failed to encode snapshot; skipping");
                return;
            }
        };
        match self
            .event_store
            .store_state_as_snapshot(stream_id, value, version)
            .await
        {
            Ok(()) => debug!(stream_id, version, "snapshot written"),
            Err(err) => warn!(stream_id, version, error = %err, "snapshot write failed; continuing"),
        }
    }
}

impl std::fmt::Debug for EventSourcedCampaignRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSourcedCampaignRepository")
            .field("collector", &self.collector)
            .field("snapshot_interval", &self.snapshot_interval)
            .finish_non_exhaustive()
    }
}

fn build_records(
    stream_id: &str,
    events: &[CampaignEvent],
    last_version: i64,
) -> Result<Vec<EventRecord>, DomainError> {
    sequence_records(stream_id, events, last_version).map_err(|e| {
        DomainError::persistence(stream_id, StoreError::internal("failed to encode events", e))
    })
}

fn decode_events(
    base: &EventSourcedCampaignState,
    records: &[EventRecord],
) -> Result<Vec<CampaignEvent>, StoreError> {
    records
        .iter()
        .map(|record| {
            let event = CampaignEvent::from_record(record).map_err(|e| {
                StoreError::corrupted(
                    &record.stream_id,
                    format!("undecodable event at version {}: {e}", record.version),
                )
            })?;
            if !base.belongs_to_stream(&event) {
                return Err(StoreError::corrupted(
                    &record.stream_id,
                    format!("event at version {} names another campaign", record.version),
                ));
            }
            Ok(event)
        })
        .collect()
}

#[async_trait]
impl CampaignRepository for EventSourcedCampaignRepository {
    #[instrument(skip(self, name), fields(campaign_id = %id))]
    async fn create_campaign(
        &self,
        id: CampaignId,
        name: String,
        business_type: BusinessType,
    ) -> Result<Campaign, DomainError> {
        let campaign = Campaign::create_observed(
            id,
            name,
            business_type,
            self.clock.as_ref(),
            self.collector.observers(),
        );
        let stream_id = campaign.id().as_str();
        let events = self.collector.events(&campaign);
        let records = match build_records(stream_id, &events, 0) {
            Ok(records) => records,
            Err(err) => {
                self.collector.release(&campaign);
                return Err(err);
            }
        };

        if let Err(err) = self.event_store.append(stream_id, &records, 0).await {
            self.collector.release(&campaign);
            return Err(match err {
                StoreError::Concurrency(_) => DomainError::AlreadyExists(stream_id.to_owned()),
                other => DomainError::persistence(stream_id, other),
            });
        }

        let version = records.last().map_or(0, |record| record.version);
        let state = EventSourcedCampaignState::initial(campaign.id().clone()).apply_events(&events);
        self.collector.clear_events(&campaign);
        self.begin_tracking(&campaign, Tracked { version, state });

        info!(version, "campaign created");
        Ok(campaign)
    }

    #[instrument(skip(self, campaign), fields(campaign_id = %campaign.id()))]
    async fn save(&self, campaign: &Campaign) -> Result<(), DomainError> {
        let events = self.collector.events(campaign);
        if events.is_empty() {
            debug!("no pending events; nothing to save");
            return Ok(());
        }

        let stream_id = campaign.id().as_str();
        let Some(tracked) = self.tracked_entry(campaign) else {
            return Err(DomainError::NotTracked(stream_id.to_owned()));
        };

        let records = build_records(stream_id, &events, tracked.version)?;
        self.event_store
            .append(stream_id, &records, tracked.version)
            .await
            .map_err(|err| match err {
                StoreError::Concurrency(conflict) => {
                    warn!(
                        expected = conflict.expected,
                        actual = conflict.actual,
                        "stale campaign rejected"
                    );
                    DomainError::ConcurrencyConflict {
                        aggregate_id: conflict.stream_id,
                        expected: conflict.expected,
                        actual: conflict.actual,
                    }
                }
                other => DomainError::persistence(stream_id, other),
            })?;

        let version = records.last().map_or(tracked.version, |record| record.version);
        if version % self.snapshot_interval == 0 {
            let state = tracked.state.apply_events(&events);
            self.write_snapshot(stream_id, &state, version).await;
        }

        self.collector.clear_events(campaign);
        self.end_tracking(campaign);

        info!(version, events_saved = records.len(), "campaign saved");
        Ok(())
    }

    #[instrument(skip(self), fields(campaign_id = %id))]
    async fn load(&self, id: &CampaignId) -> Result<Option<Campaign>, DomainError> {
        let stream_id = id.as_str();
        let initial = EventSourcedCampaignState::initial(id.clone())
            .to_snapshot()
            .map_err(|e| {
                DomainError::persistence(
                    stream_id,
                    StoreError::internal("failed to encode initial state", e),
                )
            })?;

        let slice = self
            .event_store
            .read_stream(stream_id, initial)
            .await
            .map_err(|e| DomainError::persistence(stream_id, e))?;
        if slice.is_empty() {
            debug!("stream has no events");
            return Ok(None);
        }

        let base = EventSourcedCampaignState::from_snapshot(&slice.state).map_err(|e| {
            DomainError::persistence(
                stream_id,
                StoreError::corrupted(stream_id, format!("undecodable snapshot: {e}")),
            )
        })?;
        if base.id != *id {
            return Err(DomainError::persistence(
                stream_id,
                StoreError::corrupted(stream_id, "snapshot names another campaign"),
            ));
        }
        let events =
            decode_events(&base, &slice.events).map_err(|e| DomainError::persistence(stream_id, e))?;

        let version = slice.last_version();
        let state = base.apply_events(&events);
        let mut campaign = Campaign::from_state(state.clone().into());
        self.collector.track(&mut campaign);
        self.begin_tracking(&campaign, Tracked { version, state });

        debug!(version, events_replayed = events.len(), "campaign loaded");
        Ok(Some(campaign))
    }
}
