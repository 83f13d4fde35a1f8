/// Doctor working-hours checks for the appointment scheduler.
///
/// This module answers whether a doctor is theoretically open for a window
/// according to the weekly template, without looking at existing bookings.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{DoctorSchedule, TimeWindow};
use crate::store::SchedulingStore;

pub struct AvailabilityCalculator<S> {
    store: Arc<S>,
}

impl<S: SchedulingStore> AvailabilityCalculator<S> {
    pub fn new(store: Arc<S>) -> Self {
        AvailabilityCalculator { store }
    }

    /// Find the active schedule row that covers the whole window.
    ///
    /// Rows are tried in start-time order; the window is evaluated against
    /// the calendar day of its own start only.
    pub fn covering_schedule(
        &self,
        doctor_id: Uuid,
        window: &TimeWindow,
    ) -> Result<Option<DoctorSchedule>, StorageError> {
        let day = window.day_of_week();
        let rows = self.store.doctor_schedules(doctor_id, day)?;

        let schedule = rows
            .into_iter()
            .filter(|row| row.is_active)
            .find(|row| row.covers(window));

        if schedule.is_none() {
            debug!(
                doctor_id = %doctor_id,
                day,
                start = %window.start,
                end = %window.end,
                "no working hours cover the requested window"
            );
        }
        Ok(schedule)
    }

    /// Check if the doctor works during the whole window.
    pub fn is_available(&self, doctor_id: Uuid, window: &TimeWindow) -> Result<bool, StorageError> {
        Ok(self.covering_schedule(doctor_id, window)?.is_some())
    }
}
