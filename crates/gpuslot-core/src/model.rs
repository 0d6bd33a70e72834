//! Reservation, status and availability type definitions

use crate::gpu::{Resource, ResourceId};
use crate::window::TimeWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A claim on one resource for a half-open time interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique identifier assigned on creation
    pub id: Uuid,
    /// Reserved resource
    pub resource_id: ResourceId,
    /// Who asked for the slot
    pub requester: String,
    /// What the slot is for
    pub purpose: String,
    /// Inclusive start
    pub start_time: DateTime<Utc>,
    /// Exclusive end
    pub end_time: DateTime<Utc>,
    /// Current status
    pub status: ReservationStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Create a new active reservation with a fresh id
    pub fn new(request: NewReservation) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_id: request.resource_id,
            requester: request.requester,
            purpose: request.purpose,
            start_time: request.window.start(),
            end_time: request.window.end(),
            status: ReservationStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// The reserved interval
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}

/// Reservation status; the only transition is `Active -> Cancelled`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Holds the slot
    Active,
    /// Kept for history, never blocks
    Cancelled,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Active => write!(f, "active"),
            ReservationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A validated create request
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub resource_id: ResourceId,
    pub requester: String,
    pub purpose: String,
    pub window: TimeWindow,
}

/// Create request as received from a client, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservation {
    #[serde(alias = "gpu_id")]
    pub resource_id: ResourceId,
    #[serde(alias = "user", default)]
    pub requester: String,
    #[serde(default)]
    pub purpose: String,
    pub start_time: String,
    pub end_time: String,
}

/// Listing query as received from a client, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationQuery {
    #[serde(alias = "gpu_id")]
    pub resource_id: Option<ResourceId>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Filter for listing reservations
#[derive(Debug, Clone, Copy, Default)]
pub struct ReservationFilter {
    /// Only reservations on this resource
    pub resource_id: Option<ResourceId>,
    /// Only reservations ending after this instant
    pub start: Option<DateTime<Utc>>,
    /// Only reservations starting before this instant
    pub end: Option<DateTime<Utc>>,
}

impl ReservationFilter {
    pub fn for_resource(resource_id: ResourceId) -> Self {
        Self {
            resource_id: Some(resource_id),
            ..Default::default()
        }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.start = Some(window.start());
        self.end = Some(window.end());
        self
    }

    /// Whether a reservation passes the filter, regardless of status
    pub fn matches(&self, reservation: &Reservation) -> bool {
        if let Some(id) = self.resource_id {
            if reservation.resource_id != id {
                return false;
            }
        }
        if let Some(start) = self.start {
            if reservation.end_time <= start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if reservation.start_time >= end {
                return false;
            }
        }
        true
    }
}

/// A resource together with its occupancy at a given instant
#[derive(Debug, Clone, Serialize)]
pub struct ResourceStatus {
    pub resource: Resource,
    pub is_available_now: bool,
    pub current_reservation: Option<Reservation>,
    pub next_reservation: Option<Reservation>,
}

/// Availability of one resource over a queried window
#[derive(Debug, Clone, Serialize)]
pub struct ResourceAvailability {
    pub is_free: bool,
    pub conflicting_reservations: Vec<Reservation>,
}

/// Availability of every resource over a queried window
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub resources: BTreeMap<ResourceId, ResourceAvailability>,
}

impl AvailabilityReport {
    /// Ids of resources that are free over the whole window
    pub fn free_resources(&self) -> Vec<ResourceId> {
        self.resources
            .iter()
            .filter(|(_, a)| a.is_free)
            .map(|(id, _)| *id)
            .collect()
    }
}
