//! Per-resource reservation schedule and conflict detection
//!
//! Active reservations on one resource never overlap, so their start times are
//! unique and their end times increase in start order. The active set is kept
//! in a `BTreeMap` keyed by start time; every reservation whose start lies
//! before the end of a query window is a candidate, and walking those
//! candidates backwards can stop at the first one that ends at or before the
//! window start. Overlap queries are therefore `O(log k + m)`.

use chrono::{DateTime, Utc};
use gpuslot_core::{
    Reservation, ReservationStatus, ResourceId, SlotError, SlotResult, TimeWindow,
};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use tracing::debug;
use uuid::Uuid;

/// Every reservation ever made on one resource, with an index of the active ones
#[derive(Debug)]
pub struct ResourceSchedule {
    resource_id: ResourceId,
    /// All reservations, active and cancelled
    reservations: HashMap<Uuid, Reservation>,
    /// Active reservations by start time
    active: BTreeMap<DateTime<Utc>, Uuid>,
}

impl ResourceSchedule {
    pub fn new(resource_id: ResourceId) -> Self {
        Self {
            resource_id,
            reservations: HashMap::new(),
            active: BTreeMap::new(),
        }
    }

    /// Number of active reservations
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Active reservations overlapping `window`, latest start first
    fn overlapping<'a>(
        &'a self,
        window: &'a TimeWindow,
    ) -> impl Iterator<Item = &'a Reservation> + 'a {
        self.active
            .range(..window.end())
            .rev()
            .filter_map(|(_, id)| self.reservations.get(id))
            .take_while(|r| r.window().overlaps(window))
    }

    /// Whether any active reservation other than `excluding` overlaps `window`
    pub fn has_conflict(&self, window: &TimeWindow, excluding: Option<Uuid>) -> bool {
        self.overlapping(window)
            .any(|r| Some(r.id) != excluding)
    }

    /// Active reservations overlapping `window`, earliest start first
    pub fn conflicts(&self, window: &TimeWindow, excluding: Option<Uuid>) -> Vec<Reservation> {
        let mut found: Vec<Reservation> = self
            .overlapping(window)
            .filter(|r| Some(r.id) != excluding)
            .cloned()
            .collect();
        found.reverse();
        found
    }

    /// Insert an active reservation unless it overlaps an existing one
    pub fn insert(&mut self, reservation: Reservation) -> SlotResult<Reservation> {
        if reservation.resource_id != self.resource_id {
            return Err(SlotError::Internal(format!(
                "reservation for resource {} routed to schedule {}",
                reservation.resource_id, self.resource_id
            )));
        }

        let window = reservation.window();
        if self.has_conflict(&window, None) {
            return Err(SlotError::Conflict {
                resource_id: self.resource_id,
                start: window.start(),
                end: window.end(),
            });
        }

        debug!(
            resource_id = self.resource_id,
            reservation_id = %reservation.id,
            active = self.active.len() + 1,
            "Reservation indexed"
        );

        self.active.insert(reservation.start_time, reservation.id);
        self.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    /// Mark an active reservation cancelled and drop it from the active index
    pub fn cancel(&mut self, id: Uuid) -> SlotResult<Reservation> {
        let reservation = self
            .reservations
            .get_mut(&id)
            .filter(|r| r.is_active())
            .ok_or(SlotError::ReservationNotFound(id))?;

        reservation.status = ReservationStatus::Cancelled;
        self.active.remove(&reservation.start_time);
        Ok(reservation.clone())
    }

    pub fn get(&self, id: Uuid) -> Option<&Reservation> {
        self.reservations.get(&id)
    }

    /// All reservations, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.values()
    }

    /// The active reservation covering `instant`, if any
    pub fn current_at(&self, instant: DateTime<Utc>) -> Option<&Reservation> {
        self.active
            .range(..=instant)
            .next_back()
            .and_then(|(_, id)| self.reservations.get(id))
            .filter(|r| r.window().contains(instant))
    }

    /// The earliest active reservation starting strictly after `instant`
    pub fn next_after(&self, instant: DateTime<Utc>) -> Option<&Reservation> {
        self.active
            .range((Bound::Excluded(instant), Bound::Unbounded))
            .next()
            .and_then(|(_, id)| self.reservations.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gpuslot_core::NewReservation;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    fn window(sh: u32, sm: u32, eh: u32, em: u32) -> TimeWindow {
        TimeWindow::new(at(sh, sm), at(eh, em)).unwrap()
    }

    fn reservation(resource_id: ResourceId, w: TimeWindow) -> Reservation {
        Reservation::new(NewReservation {
            resource_id,
            requester: "alice".to_string(),
            purpose: "training".to_string(),
            window: w,
        })
    }

    #[test]
    fn test_touching_boundary_is_not_a_conflict() {
        let mut schedule = ResourceSchedule::new(1);
        schedule.insert(reservation(1, window(10, 0, 11, 0))).unwrap();
        schedule.insert(reservation(1, window(11, 0, 12, 0))).unwrap();
        schedule.insert(reservation(1, window(9, 0, 10, 0))).unwrap();
        assert_eq!(schedule.active_count(), 3);
    }

    #[test]
    fn test_nested_interval_conflicts() {
        let mut schedule = ResourceSchedule::new(1);
        schedule.insert(reservation(1, window(10, 0, 11, 0))).unwrap();

        let err = schedule
            .insert(reservation(1, window(10, 30, 10, 45)))
            .unwrap_err();
        assert!(matches!(err, SlotError::Conflict { resource_id: 1, .. }));
        assert_eq!(schedule.active_count(), 1);
    }

    #[test]
    fn test_enclosing_interval_conflicts() {
        let mut schedule = ResourceSchedule::new(1);
        schedule.insert(reservation(1, window(10, 0, 11, 0))).unwrap();
        schedule.insert(reservation(1, window(13, 0, 14, 0))).unwrap();

        assert!(schedule.has_conflict(&window(9, 0, 15, 0), None));
        assert!(schedule.has_conflict(&window(10, 59, 11, 30), None));
        assert!(!schedule.has_conflict(&window(11, 0, 13, 0), None));
        assert!(!schedule.has_conflict(&window(14, 0, 15, 0), None));
    }

    #[test]
    fn test_conflicts_sorted_ascending() {
        let mut schedule = ResourceSchedule::new(1);
        let late = schedule.insert(reservation(1, window(13, 0, 14, 0))).unwrap();
        let early = schedule.insert(reservation(1, window(10, 0, 11, 0))).unwrap();
        schedule.insert(reservation(1, window(16, 0, 17, 0))).unwrap();

        let found = schedule.conflicts(&window(10, 30, 13, 30), None);
        let ids: Vec<Uuid> = found.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
    }

    #[test]
    fn test_excluding_skips_own_reservation() {
        let mut schedule = ResourceSchedule::new(1);
        let r = schedule.insert(reservation(1, window(10, 0, 11, 0))).unwrap();

        assert!(schedule.has_conflict(&window(10, 0, 11, 30), None));
        assert!(!schedule.has_conflict(&window(10, 0, 11, 30), Some(r.id)));
    }

    #[test]
    fn test_cancel_frees_interval_and_keeps_history() {
        let mut schedule = ResourceSchedule::new(1);
        let r = schedule.insert(reservation(1, window(10, 0, 11, 0))).unwrap();

        let cancelled = schedule.cancel(r.id).unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert_eq!(schedule.active_count(), 0);
        assert_eq!(schedule.iter().count(), 1);

        schedule.insert(reservation(1, window(10, 0, 11, 0))).unwrap();
        assert_eq!(schedule.active_count(), 1);
        assert_eq!(schedule.iter().count(), 2);
    }

    #[test]
    fn test_cancel_twice_is_not_found() {
        let mut schedule = ResourceSchedule::new(1);
        let r = schedule.insert(reservation(1, window(10, 0, 11, 0))).unwrap();
        schedule.cancel(r.id).unwrap();

        let err = schedule.cancel(r.id).unwrap_err();
        assert!(matches!(err, SlotError::ReservationNotFound(id) if id == r.id));
    }

    #[test]
    fn test_wrong_resource_rejected() {
        let mut schedule = ResourceSchedule::new(1);
        let err = schedule
            .insert(reservation(2, window(10, 0, 11, 0)))
            .unwrap_err();
        assert!(matches!(err, SlotError::Internal(_)));
    }

    #[test]
    fn test_current_and_next() {
        let mut schedule = ResourceSchedule::new(1);
        let current = schedule.insert(reservation(1, window(10, 0, 11, 0))).unwrap();
        let next = schedule.insert(reservation(1, window(12, 0, 13, 0))).unwrap();

        assert_eq!(schedule.current_at(at(10, 0)).map(|r| r.id), Some(current.id));
        assert_eq!(schedule.current_at(at(10, 30)).map(|r| r.id), Some(current.id));
        assert!(schedule.current_at(at(11, 0)).is_none());
        assert!(schedule.current_at(at(9, 0)).is_none());

        assert_eq!(schedule.next_after(at(10, 0)).map(|r| r.id), Some(next.id));
        assert_eq!(schedule.next_after(at(9, 0)).map(|r| r.id), Some(current.id));
        assert!(schedule.next_after(at(12, 0)).is_none());
    }
}
