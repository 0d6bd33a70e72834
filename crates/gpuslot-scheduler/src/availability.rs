//! Availability queries across the whole resource pool

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use gpuslot_core::{
    AvailabilityReport, ResourceAvailability, ResourceId, ResourceStatus, SlotResult, TimeWindow,
};
use std::sync::Arc;
use tracing::debug;

use crate::registry::ResourceRegistry;
use crate::store::ReservationStore;

/// Read-only fan-out of conflict checks over every registered resource
pub struct AvailabilityService {
    registry: Arc<ResourceRegistry>,
    store: Arc<ReservationStore>,
}

impl AvailabilityService {
    pub fn new(registry: Arc<ResourceRegistry>, store: Arc<ReservationStore>) -> Self {
        Self { registry, store }
    }

    /// Which resources are free over `window`, and what blocks the others
    pub async fn query(&self, window: TimeWindow) -> SlotResult<AvailabilityReport> {
        let checks = self.registry.ids().map(|id| self.check(id, window));
        let resources = try_join_all(checks).await?.into_iter().collect();

        let report = AvailabilityReport {
            start_time: window.start(),
            end_time: window.end(),
            resources,
        };

        debug!(
            window = %window,
            free = report.free_resources().len(),
            total = self.registry.len(),
            "Availability queried"
        );

        Ok(report)
    }

    async fn check(
        &self,
        resource_id: ResourceId,
        window: TimeWindow,
    ) -> SlotResult<(ResourceId, ResourceAvailability)> {
        let conflicting_reservations = self.store.conflicts(resource_id, &window).await?;
        Ok((
            resource_id,
            ResourceAvailability {
                is_free: conflicting_reservations.is_empty(),
                conflicting_reservations,
            },
        ))
    }

    /// Occupancy of one resource at `now`
    pub async fn status(
        &self,
        resource_id: ResourceId,
        now: DateTime<Utc>,
    ) -> SlotResult<ResourceStatus> {
        let resource = self.registry.get(resource_id)?.clone();
        let (current_reservation, next_reservation) =
            self.store.occupancy_at(resource_id, now).await?;

        Ok(ResourceStatus {
            resource,
            is_available_now: current_reservation.is_none(),
            current_reservation,
            next_reservation,
        })
    }

    /// Occupancy of every resource at `now`, in registry order
    pub async fn statuses(&self, now: DateTime<Utc>) -> SlotResult<Vec<ResourceStatus>> {
        try_join_all(self.registry.ids().map(|id| self.status(id, now))).await
    }
}
