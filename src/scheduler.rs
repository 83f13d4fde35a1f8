/// Appointment admission with working-hours and capacity checks.
///
/// This module provides the AppointmentScheduler struct which validates a
/// proposed appointment against the doctor's weekly template, the doctor's
/// per-slot patient limit and the room's concurrent capacity, and books it
/// only when every check passes.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calendar::AvailabilityCalculator;
use crate::config::SchedulingConfig;
use crate::conflict::ConflictDetector;
use crate::error::{Result, SchedulingError};
use crate::locks::{LockKey, ResourceLocks};
use crate::models::{
    Appointment, AppointmentStatus, RescheduleAppointmentRequest, ScheduleAppointmentRequest,
    TimeWindow,
};
use crate::store::{Change, ChangeSet, Resource, SchedulingStore};

/// Books, edits and closes outpatient appointments.
///
/// Check and insert for one doctor (and room) run under that resource's
/// lock, so two requests for the same slot cannot both pass the capacity
/// check before either is stored.
pub struct AppointmentScheduler<S> {
    store: Arc<S>,
    locks: Arc<ResourceLocks>,
    availability: AvailabilityCalculator<S>,
    conflicts: ConflictDetector<S>,
    default_duration: i64,
}

impl<S: SchedulingStore> AppointmentScheduler<S> {
    /// Initialize the scheduler.
    pub fn new(store: Arc<S>, locks: Arc<ResourceLocks>, config: &SchedulingConfig) -> Self {
        AppointmentScheduler {
            availability: AvailabilityCalculator::new(Arc::clone(&store)),
            conflicts: ConflictDetector::new(Arc::clone(&store)),
            store,
            locks,
            default_duration: config.default_appointment_minutes,
        }
    }

    /// Build a request with the configured default length and no room.
    pub fn draft_request(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        start: NaiveDateTime,
    ) -> ScheduleAppointmentRequest {
        ScheduleAppointmentRequest {
            patient_id,
            doctor_id,
            room_id: None,
            start,
            duration_minutes: self.default_duration,
            notes: String::new(),
        }
    }

    /// Run every admission check for a doctor/room/window triple.
    fn check_slot(
        &self,
        doctor_id: Uuid,
        room_id: Option<Uuid>,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> Result<()> {
        let schedule = self
            .availability
            .covering_schedule(doctor_id, window)?
            .ok_or(SchedulingError::DoctorUnavailable { doctor_id })?;

        let doctor_load = self.conflicts.load(
            Resource::Doctor(doctor_id),
            window,
            schedule.max_patients,
            exclude,
        )?;
        if !doctor_load.has_room() {
            return Err(SchedulingError::DoctorFullyBooked { doctor_id });
        }

        if let Some(room_id) = room_id {
            let room_load = self.conflicts.room_load(room_id, window, exclude)?;
            if !room_load.has_room() {
                return Err(SchedulingError::RoomUnavailable { room_id });
            }
        }

        Ok(())
    }

    fn slot_keys(doctor_id: Uuid, room_id: Option<Uuid>) -> Vec<LockKey> {
        let mut keys = vec![LockKey::Doctor(doctor_id)];
        keys.extend(room_id.map(LockKey::Room));
        keys
    }

    /// Validate and book a new appointment.
    pub fn schedule(&self, request: ScheduleAppointmentRequest) -> Result<Appointment> {
        let window = TimeWindow::new(request.start, request.duration_minutes)?;
        let _guard = self
            .locks
            .acquire(&Self::slot_keys(request.doctor_id, request.room_id));

        if let Err(e) = self.check_slot(request.doctor_id, request.room_id, &window, None) {
            warn!(
                doctor_id = %request.doctor_id,
                start = %request.start,
                error = %e,
                "appointment rejected"
            );
            return Err(e);
        }

        let appointment = Appointment {
            appointment_id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            room_id: request.room_id,
            scheduled_time: request.start,
            duration: request.duration_minutes,
            status: AppointmentStatus::Scheduled,
            notes: request.notes,
        };
        self.store
            .commit(ChangeSet::new().with(Change::InsertAppointment(appointment.clone())))?;

        info!(
            appointment_id = %appointment.appointment_id,
            doctor_id = %appointment.doctor_id,
            start = %appointment.scheduled_time,
            "appointment scheduled"
        );
        Ok(appointment)
    }

    fn open_appointment(&self, appointment_id: Uuid) -> Result<Appointment> {
        let appointment = self
            .store
            .appointment(appointment_id)?
            .ok_or(SchedulingError::AppointmentNotFound(appointment_id))?;

        if appointment.status != AppointmentStatus::Scheduled {
            return Err(SchedulingError::AppointmentClosed {
                appointment_id,
                status: appointment.status,
            });
        }
        Ok(appointment)
    }

    /// Move or otherwise edit a scheduled appointment.
    ///
    /// The checks run against the new values, with the appointment itself
    /// left out of every overlap count.
    pub fn reschedule(&self, request: RescheduleAppointmentRequest) -> Result<Appointment> {
        let window = TimeWindow::new(request.start, request.duration_minutes)?;
        let mut keys = Self::slot_keys(request.doctor_id, request.room_id);
        keys.push(LockKey::Appointment(request.appointment_id));
        let _guard = self.locks.acquire(&keys);

        let current = self.open_appointment(request.appointment_id)?;
        self.check_slot(
            request.doctor_id,
            request.room_id,
            &window,
            Some(current.appointment_id),
        )?;

        let updated = Appointment {
            doctor_id: request.doctor_id,
            room_id: request.room_id,
            scheduled_time: request.start,
            duration: request.duration_minutes,
            notes: request.notes,
            ..current
        };
        self.store
            .commit(ChangeSet::new().with(Change::UpdateAppointment(updated.clone())))?;

        info!(
            appointment_id = %updated.appointment_id,
            start = %updated.scheduled_time,
            "appointment rescheduled"
        );
        Ok(updated)
    }

    fn close(&self, appointment_id: Uuid, status: AppointmentStatus) -> Result<Appointment> {
        let _guard = self.locks.acquire(&[LockKey::Appointment(appointment_id)]);

        let mut appointment = self.open_appointment(appointment_id)?;
        appointment.status = status;
        self.store
            .commit(ChangeSet::new().with(Change::UpdateAppointment(appointment.clone())))?;

        info!(appointment_id = %appointment_id, status = %status, "appointment closed");
        Ok(appointment)
    }

    /// Cancel an appointment. The row is kept and its slot is free at once.
    pub fn cancel(&self, appointment_id: Uuid) -> Result<Appointment> {
        self.close(appointment_id, AppointmentStatus::Cancelled)
    }

    /// Mark an appointment as completed.
    pub fn complete(&self, appointment_id: Uuid) -> Result<Appointment> {
        self.close(appointment_id, AppointmentStatus::Completed)
    }
}
