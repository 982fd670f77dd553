// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model and wire types shared across the geomon workspace.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A circular geographic area of interest attached to a campaign message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters. An area with radius 0 is invalid.
    pub radius: u32,
}

impl Area {
    /// An area is valid iff its identifier is non-empty and its radius is positive.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && self.radius > 0
    }

    /// Convert this area into a platform region description carrying the
    /// attachment expiry as its removal deadline.
    pub fn to_region(&self, expiry: Option<DateTime<Utc>>) -> Region {
        Region {
            id: self.id.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            radius: self.radius,
            expiry,
        }
    }
}

/// Geofence transition event type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GeoEventType {
    Entry,
    Exit,
    Dwell,
}

/// Per-event-type trigger setting carried by a geo attachment.
///
/// Presence of a setting enables reporting for that event type; dwell
/// settings additionally carry the dwell duration in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSetting {
    pub event: GeoEventType,
    #[serde(default)]
    pub dwell_minutes: Option<u32>,
}

/// Geofencing metadata attached to a campaign message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    pub campaign_id: String,
    /// `None` means active immediately.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    /// `None` means the attachment never expires.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    pub areas: Vec<Area>,
    #[serde(default)]
    pub triggers: Vec<TriggerSetting>,
}

impl Geo {
    /// Eligible for monitoring iff the campaign is not finished and the start
    /// date has arrived. Expiry is evaluated separately: expired attachments
    /// are excluded from regions but still drive expiry-date cleanup.
    pub fn is_eligible(&self, finished: &HashSet<String>, now: DateTime<Utc>) -> bool {
        if finished.contains(&self.campaign_id) {
            return false;
        }
        self.start.is_none_or(|start| start <= now)
    }

    /// Whether the attachment's expiry date is in the past.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| expiry < now)
    }

    /// Whether the given transition event type should produce a report.
    ///
    /// An empty settings list reports entry events only, mirroring the
    /// platform provider's default initial trigger.
    pub fn triggers_on(&self, event: GeoEventType) -> bool {
        if self.triggers.is_empty() {
            return event == GeoEventType::Entry;
        }
        self.triggers.iter().any(|t| t.event == event)
    }
}

/// A campaign message held by the message store.
///
/// The identifier is unique but mutable: once the backend assigns a canonical
/// id for an SDK-generated message it is rewritten in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub geo: Option<Geo>,
    pub created_at: DateTime<Utc>,
}

/// Device location at the time a geofence transition occurred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// One occurrence of a geofence transition, queued until the backend confirms it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoReport {
    pub campaign_id: String,
    /// SDK-generated id of the message created for this occurrence.
    pub message_id: String,
    /// Id of the signaling message that declared the area.
    pub signaling_message_id: String,
    pub event: GeoEventType,
    /// Snapshot of the triggered area at occurrence time.
    pub area: Area,
    pub occurred_at: DateTime<Utc>,
    pub location: GeoLatLng,
}

/// Platform-level representation of a monitored circular geofence.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: u32,
    /// Removal deadline; `None` means monitor until explicitly removed.
    pub expiry: Option<DateTime<Utc>>,
}

/// Result of a monitoring-set computation: the deduplicated regions to
/// monitor plus the two nearest future instants at which the set must be
/// recomputed. Either instant may be `None` ("no further recompute needed
/// from this cause").
#[derive(Debug, Clone, Default)]
pub struct MonitoringPlan {
    pub regions: Vec<Region>,
    /// Next instant an attachment becomes active.
    pub next_refresh: Option<DateTime<Utc>>,
    /// Next instant an attachment expires (clamped to now for just-expired ones).
    pub next_expiry: Option<DateTime<Utc>>,
}

/// A geofence transition reported by the platform region provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTransition {
    pub area_id: String,
    pub event: GeoEventType,
    pub occurred_at: DateTime<Utc>,
    pub location: GeoLatLng,
}

/// Events delivered by the platform provider adapter over the monitor's channel.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// The provider connection became ready; a pending add/remove is replayed.
    ConnectionReady,
    /// A monitored region was entered, exited, or dwelled in.
    Transition(RegionTransition),
}

/// Notifications published by the SDK over a broadcast channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkEvent {
    /// Geofence events were confirmed by the backend.
    EventsReported(Vec<GeoReport>),
    /// Seen acknowledgements were sent for the given message ids.
    SeenReportsSent(Vec<String>),
}

// --- Wire types for the backend reporting endpoint ---

/// Batch request body for the event reporting endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventReportBody {
    pub messages: Vec<MessagePayload>,
    pub reports: Vec<EventReportEntry>,
}

/// A signaling message referenced by a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub message_id: String,
}

/// One report entry inside a batch request.
///
/// `timestamp_delta` is the occurrence time minus the request-send time in
/// milliseconds, computed independently per entry so absolute clocks never
/// cross the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReportEntry {
    pub event: GeoEventType,
    pub geo_area_id: String,
    pub message_id: String,
    pub sdk_message_id: String,
    pub campaign_id: String,
    pub timestamp_delta: i64,
}

/// Response from the event reporting endpoint. All fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReportResponse {
    /// Mapping of SDK-generated message ids to backend-assigned canonical ids.
    #[serde(default)]
    pub message_ids: HashMap<String, String>,
    #[serde(default)]
    pub finished_campaign_ids: Vec<String>,
    #[serde(default)]
    pub suspended_campaign_ids: Vec<String>,
}

/// Batch request body for the seen reporting endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenReportBody {
    pub messages: Vec<SeenEntry>,
}

/// One seen acknowledgement inside a seen batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeenEntry {
    pub message_id: String,
    pub timestamp_delta: i64,
}
