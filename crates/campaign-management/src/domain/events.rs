//! Domain events for the Campaign Management context.

use campaign_core::event::{DomainEvent, EventRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::business_type::BusinessType;
use super::campaign_id::CampaignId;

/// Event type name of [`CampaignCreated`].
pub const CAMPAIGN_CREATED: &str = "campaign.created";
/// Event type name of [`CampaignBusinessTypeChanged`].
pub const CAMPAIGN_BUSINESS_TYPE_CHANGED: &str = "campaign.business_type_changed";

/// Emitted when a campaign comes into existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCreated {
    /// The new campaign.
    pub campaign_id: CampaignId,
    /// Its display name.
    pub name: String,
    /// Its initial business type.
    pub business_type: BusinessType,
}

/// Emitted when a campaign switches business type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignBusinessTypeChanged {
    /// The campaign that changed.
    pub campaign_id: CampaignId,
    /// The business type before the change.
    pub old_type: BusinessType,
    /// The business type after the change.
    pub new_type: BusinessType,
}

/// Event payload variants for the Campaign Management context.
///
/// Payloads written by a newer release may carry a `type` this build does
/// not know. They decode as `Unknown` and fold as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CampaignEventKind {
    /// A campaign was created.
    CampaignCreated(CampaignCreated),
    /// A campaign's business type changed.
    CampaignBusinessTypeChanged(CampaignBusinessTypeChanged),
    /// A payload this build does not recognise.
    #[serde(other)]
    Unknown,
}

impl CampaignEventKind {
    /// The campaign the payload refers to, if it names one.
    #[must_use]
    pub fn campaign_id(&self) -> Option<&CampaignId> {
        match self {
            Self::CampaignCreated(payload) => Some(&payload.campaign_id),
            Self::CampaignBusinessTypeChanged(payload) => Some(&payload.campaign_id),
            Self::Unknown => None,
        }
    }
}

/// Domain event envelope for the Campaign Management context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignEvent {
    /// When the change happened.
    pub occurred_at: DateTime<Utc>,
    /// Event-specific payload.
    pub kind: CampaignEventKind,
}

impl CampaignEvent {
    /// Decodes a stored record back into a domain event.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload is malformed.
    pub fn from_record(record: &EventRecord) -> Result<Self, serde_json::Error> {
        Ok(Self {
            occurred_at: record.occurred_at,
            kind: serde_json::from_value(record.payload.clone())?,
        })
    }
}

impl DomainEvent for CampaignEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            CampaignEventKind::CampaignCreated(_) => CAMPAIGN_CREATED,
            CampaignEventKind::CampaignBusinessTypeChanged(_) => CAMPAIGN_BUSINESS_TYPE_CHANGED,
            CampaignEventKind::Unknown => "campaign.unknown",
        }
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(&self.kind)
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
