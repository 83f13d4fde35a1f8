//! Capacity checks against existing bookings.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::TimeWindow;
use crate::store::{Resource, SchedulingStore};

/// Result of comparing overlapping bookings with a resource's ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLoad {
    pub booked: u32,
    pub capacity: u32,
}

impl SlotLoad {
    /// Capacity is a hard ceiling: at `booked == capacity` nothing more fits.
    pub fn has_room(&self) -> bool {
        self.booked < self.capacity
    }

    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.booked)
    }
}

pub struct ConflictDetector<S> {
    store: Arc<S>,
}

impl<S: SchedulingStore> ConflictDetector<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Count bookings on `resource` that overlap `window` and compare them
    /// with `capacity`.
    ///
    /// `exclude` leaves one appointment out of the count, so an appointment
    /// being edited never collides with itself.
    pub fn load(
        &self,
        resource: Resource,
        window: &TimeWindow,
        capacity: u32,
        exclude: Option<Uuid>,
    ) -> Result<SlotLoad, StorageError> {
        let booked = self
            .store
            .count_overlapping_appointments(resource, window, exclude)?;
        let load = SlotLoad { booked, capacity };

        if !load.has_room() {
            debug!(?resource, booked, capacity, start = %window.start, "slot at capacity");
        }
        Ok(load)
    }

    /// Load of a room; a missing or inactive room has zero capacity.
    pub fn room_load(
        &self,
        room_id: Uuid,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> Result<SlotLoad, StorageError> {
        let capacity = self
            .store
            .room(room_id)?
            .map(|room| room.effective_capacity())
            .unwrap_or(0);
        self.load(Resource::Room(room_id), window, capacity, exclude)
    }
}
