//! Scheduling facade: validation in front of the store and availability service

use gpuslot_core::{
    parse_instant, AvailabilityReport, CreateReservation, NewReservation, Reservation,
    ReservationFilter, ReservationQuery, ResourceId, ResourceStatus, SlotError, SlotResult,
    TimeWindow,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::AvailabilityService;
use crate::clock::{Clock, SystemClock};
use crate::registry::ResourceRegistry;
use crate::store::ReservationStore;

/// Entry point for every reservation operation
pub struct Scheduler {
    /// Provisioned resources
    registry: Arc<ResourceRegistry>,
    /// Reservation records
    store: Arc<ReservationStore>,
    /// Pool-wide availability
    availability: AvailabilityService,
    /// Source of "now" for occupancy projections
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    /// Create a scheduler over a fixed resource pool
    pub fn new(registry: ResourceRegistry) -> Self {
        Self::with_clock(registry, Arc::new(SystemClock))
    }

    /// Create a scheduler with an explicit time source
    pub fn with_clock(registry: ResourceRegistry, clock: Arc<dyn Clock>) -> Self {
        let registry = Arc::new(registry);
        let store = Arc::new(ReservationStore::new(&registry));
        let availability = AvailabilityService::new(registry.clone(), store.clone());

        info!(resources = registry.len(), "Scheduler initialized");

        Self {
            registry,
            store,
            availability,
            clock,
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Every resource with its current occupancy
    pub async fn list_resources(&self) -> SlotResult<Vec<ResourceStatus>> {
        self.availability.statuses(self.clock.now()).await
    }

    /// One resource with its current occupancy
    pub async fn get_resource(&self, id: ResourceId) -> SlotResult<ResourceStatus> {
        self.availability.status(id, self.clock.now()).await
    }

    /// Reservations matching a client query, latest start first
    pub async fn list_reservations(
        &self,
        query: &ReservationQuery,
    ) -> SlotResult<Vec<Reservation>> {
        if let Some(id) = query.resource_id {
            self.registry.get(id)?;
        }

        let start = optional_instant("start", query.start.as_deref())?;
        let end = optional_instant("end", query.end.as_deref())?;
        let filter = match (start, end) {
            (Some(start), Some(end)) => ReservationFilter {
                resource_id: query.resource_id,
                ..Default::default()
            }
            .with_window(TimeWindow::new(start, end)?),
            _ => ReservationFilter {
                resource_id: query.resource_id,
                start,
                end,
            },
        };

        self.store.list(&filter).await
    }

    pub async fn get_reservation(&self, id: Uuid) -> SlotResult<Reservation> {
        self.store.get(id).await
    }

    /// Validate and commit a reservation
    pub async fn create_reservation(&self, request: CreateReservation) -> SlotResult<Reservation> {
        let new = self.validate(request)?;
        let resource_id = new.resource_id;
        let window = new.window;

        self.store.create(new).await.map_err(|e| {
            if let SlotError::Conflict { .. } = e {
                warn!(
                    resource_id = resource_id,
                    window = %window,
                    "Reservation rejected: interval already taken"
                );
            }
            e
        })
    }

    /// Cancel a reservation, returning it in its cancelled state
    pub async fn cancel_reservation(&self, id: Uuid) -> SlotResult<Reservation> {
        self.store.cancel(id).await
    }

    /// Free/busy state of every resource over `[start, end)`
    pub async fn query_availability(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> SlotResult<AvailabilityReport> {
        let window = TimeWindow::parse(
            start.ok_or_else(|| SlotError::Validation("start is required".to_string()))?,
            end.ok_or_else(|| SlotError::Validation("end is required".to_string()))?,
        )?;
        self.availability.query(window).await
    }

    /// Whether `[start, end)` on `resource_id` collides with an active reservation
    pub async fn has_conflict(
        &self,
        resource_id: ResourceId,
        window: &TimeWindow,
        excluding: Option<Uuid>,
    ) -> SlotResult<bool> {
        self.registry.get(resource_id)?;
        self.store.has_conflict(resource_id, window, excluding).await
    }

    fn validate(&self, request: CreateReservation) -> SlotResult<NewReservation> {
        self.registry.get(request.resource_id)?;

        let window = TimeWindow::parse(&request.start_time, &request.end_time)?;

        let requester = request.requester.trim();
        if requester.is_empty() {
            return Err(SlotError::Validation("requester must not be empty".to_string()));
        }
        let purpose = request.purpose.trim();
        if purpose.is_empty() {
            return Err(SlotError::Validation("purpose must not be empty".to_string()));
        }

        Ok(NewReservation {
            resource_id: request.resource_id,
            requester: requester.to_string(),
            purpose: purpose.to_string(),
            window,
        })
    }
}

fn optional_instant(
    field: &str,
    value: Option<&str>,
) -> SlotResult<Option<chrono::DateTime<chrono::Utc>>> {
    value.map(|v| parse_instant(field, v)).transpose()
}
