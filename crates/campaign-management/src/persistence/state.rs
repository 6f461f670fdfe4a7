//! Folds campaign events into campaign state.

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::CampaignState;
use crate::domain::business_type::BusinessType;
use crate::domain::campaign_id::CampaignId;
use crate::domain::events::{CampaignEvent, CampaignEventKind};

/// Campaign state as rebuilt from its event stream. This is also the
/// snapshot format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSourcedCampaignState {
    /// Stream and aggregate identifier.
    pub id: CampaignId,
    /// Display name.
    pub name: String,
    /// Current business type.
    pub business_type: BusinessType,
}

impl EventSourcedCampaignState {
    /// State of a stream before any event has been applied.
    #[must_use]
    pub fn initial(id: CampaignId) -> Self {
        Self {
            id,
            name: String::new(),
            business_type: BusinessType::default(),
        }
    }

    /// Returns the state after `event`.
    #[must_use]
    pub fn apply_event(self, event: &CampaignEvent) -> Self {
        match &event.kind {
            CampaignEventKind::CampaignCreated(payload) => Self {
                id: payload.campaign_id.clone(),
                name: payload.name.clone(),
                business_type: payload.business_type,
            },
            CampaignEventKind::CampaignBusinessTypeChanged(payload) => Self {
                business_type: payload.new_type,
                ..self
            },
            CampaignEventKind::Unknown => self,
        }
    }

    /// Left fold of [`apply_event`](Self::apply_event) over `events`.
    #[must_use]
    pub fn apply_events<'a>(self, events: impl IntoIterator<Item = &'a CampaignEvent>) -> Self {
        events
            .into_iter()
            .fold(self, |state, event| state.apply_event(event))
    }

    /// Whether `event` may be folded into this stream.
    ///
    /// Payloads that do not name a campaign are accepted.
    #[must_use]
    pub fn belongs_to_stream(&self, event: &CampaignEvent) -> bool {
        event.kind.campaign_id().is_none_or(|id| *id == self.id)
    }

    /// Decodes a snapshot state.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `value` is not a campaign state.
    pub fn from_snapshot(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Encodes this state for storage.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the state cannot be represented.
    pub fn to_snapshot(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl From<EventSourcedCampaignState> for CampaignState {
    fn from(state: EventSourcedCampaignState) -> Self {
        Self {
            id: state.id,
            name: state.name,
            business_type: state.business_type,
        }
    }
}
