//! Reservation store with per-resource write serialization

use chrono::{DateTime, Utc};
use gpuslot_core::{
    NewReservation, Reservation, ReservationFilter, ResourceId, SlotError, SlotResult, TimeWindow,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::registry::ResourceRegistry;
use crate::schedule::ResourceSchedule;

type ReservationIndex = HashMap<Uuid, ResourceId>;

/// Owner of every reservation record.
///
/// Each resource has its own lock, so a create on one GPU never waits on
/// another. A create holds its resource's write lock across the conflict
/// check and the insert. When both are needed the schedule lock is always
/// taken before the index lock.
pub struct ReservationStore {
    /// One schedule per registered resource, fixed at construction
    schedules: HashMap<ResourceId, RwLock<ResourceSchedule>>,
    /// Reservation id to owning resource
    index: RwLock<ReservationIndex>,
}

impl ReservationStore {
    /// Create an empty store with a schedule for every registered resource
    pub fn new(registry: &ResourceRegistry) -> Self {
        let schedules = registry
            .ids()
            .map(|id| (id, RwLock::new(ResourceSchedule::new(id))))
            .collect();

        Self {
            schedules,
            index: RwLock::new(HashMap::new()),
        }
    }

    fn schedule(&self, resource_id: ResourceId) -> SlotResult<&RwLock<ResourceSchedule>> {
        self.schedules
            .get(&resource_id)
            .ok_or(SlotError::ResourceNotFound(resource_id))
    }

    /// Whether an active reservation other than `excluding` overlaps `window`
    pub async fn has_conflict(
        &self,
        resource_id: ResourceId,
        window: &TimeWindow,
        excluding: Option<Uuid>,
    ) -> SlotResult<bool> {
        let schedule = self.schedule(resource_id)?.read().await;
        Ok(schedule.has_conflict(window, excluding))
    }

    /// Active reservations overlapping `window`, earliest first
    pub async fn conflicts(
        &self,
        resource_id: ResourceId,
        window: &TimeWindow,
    ) -> SlotResult<Vec<Reservation>> {
        let schedule = self.schedule(resource_id)?.read().await;
        Ok(schedule.conflicts(window, None))
    }

    /// Commit a new active reservation, or fail with `Conflict` leaving no trace
    pub async fn create(&self, request: NewReservation) -> SlotResult<Reservation> {
        let mut schedule = self.schedule(request.resource_id)?.write().await;

        let reservation = schedule.insert(Reservation::new(request))?;
        self.index
            .write()
            .await
            .insert(reservation.id, reservation.resource_id);

        info!(
            reservation_id = %reservation.id,
            resource_id = reservation.resource_id,
            start = %reservation.start_time,
            end = %reservation.end_time,
            requester = %reservation.requester,
            "Reservation created"
        );

        Ok(reservation)
    }

    /// Fetch a reservation by id, whatever its status
    pub async fn get(&self, id: Uuid) -> SlotResult<Reservation> {
        let resource_id = self.owner(id).await?;
        let schedule = self.schedule(resource_id)?.read().await;
        schedule
            .get(id)
            .cloned()
            .ok_or(SlotError::ReservationNotFound(id))
    }

    /// Reservations matching `filter`, latest start first
    pub async fn list(&self, filter: &ReservationFilter) -> SlotResult<Vec<Reservation>> {
        let resource_ids: Vec<ResourceId> = match filter.resource_id {
            Some(id) => {
                self.schedule(id)?;
                vec![id]
            }
            None => self.schedules.keys().copied().collect(),
        };

        let mut found = Vec::new();
        for resource_id in resource_ids {
            let schedule = self.schedule(resource_id)?.read().await;
            found.extend(schedule.iter().filter(|r| filter.matches(r)).cloned());
        }

        found.sort_by(|a, b| {
            b.start_time
                .cmp(&a.start_time)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!(
            resource_id = ?filter.resource_id,
            count = found.len(),
            "Listed reservations"
        );

        Ok(found)
    }

    /// Cancel an active reservation; unknown or already cancelled ids are `NotFound`
    pub async fn cancel(&self, id: Uuid) -> SlotResult<Reservation> {
        let resource_id = self.owner(id).await?;
        let cancelled = self.schedule(resource_id)?.write().await.cancel(id)?;

        info!(
            reservation_id = %id,
            resource_id = resource_id,
            "Reservation cancelled"
        );

        Ok(cancelled)
    }

    /// The reservation covering `instant` and the next one after it
    pub async fn occupancy_at(
        &self,
        resource_id: ResourceId,
        instant: DateTime<Utc>,
    ) -> SlotResult<(Option<Reservation>, Option<Reservation>)> {
        let schedule = self.schedule(resource_id)?.read().await;
        Ok((
            schedule.current_at(instant).cloned(),
            schedule.next_after(instant).cloned(),
        ))
    }

    async fn owner(&self, id: Uuid) -> SlotResult<ResourceId> {
        self.index
            .read()
            .await
            .get(&id)
            .copied()
            .ok_or(SlotError::ReservationNotFound(id))
    }
}
