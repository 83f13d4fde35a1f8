/// Data models for the scheduling and placement core.
///
/// This module defines the records the core reads and writes:
/// - DoctorSchedule: recurring weekly availability template
/// - TimeWindow: a concrete [start, end) interval on the wall clock
/// - Appointment: outpatient booking of a doctor and optionally a room
/// - Room: outpatient consulting room with concurrent capacity
/// - Ward / RoomClass / WardRoom / WardRoomClassAssignment / Bed: inpatient topology
/// - Admission: one stay in one bed
/// - Request structs for each public operation

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SchedulingError;

/// Status of an outpatient appointment.
///
/// Only `Scheduled` appointments can be edited; the other two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn name(&self) -> &str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A doctor's recurring availability for one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub schedule_id: Uuid,
    pub doctor_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration: i64,
    pub max_patients: u32,
    pub is_active: bool,
}

impl DoctorSchedule {
    /// Create an active schedule row with validation.
    pub fn new(
        doctor_id: Uuid,
        day_of_week: u32,
        start_time: NaiveTime,
        end_time: NaiveTime,
        slot_duration: i64,
        max_patients: u32,
    ) -> Result<Self, String> {
        if day_of_week > 6 {
            return Err(format!("Day of week must be 0-6, got {}", day_of_week));
        }
        if start_time >= end_time {
            return Err("Schedule start time must be before end time".to_string());
        }
        if slot_duration <= 0 {
            return Err("Slot duration must be positive".to_string());
        }

        Ok(DoctorSchedule {
            schedule_id: Uuid::new_v4(),
            doctor_id,
            day_of_week,
            start_time,
            end_time,
            slot_duration,
            max_patients,
            is_active: true,
        })
    }

    /// Check whether a window lies entirely within this row's working hours.
    ///
    /// The window must start and end on the same calendar day.
    pub fn covers(&self, window: &TimeWindow) -> bool {
        if window.crosses_midnight() {
            return false;
        }
        window.start.time() >= self.start_time && window.end.time() <= self.end_time
    }
}

/// A concrete [start, end) interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Build a window from a start and a duration in minutes.
    pub fn new(start: NaiveDateTime, duration_minutes: i64) -> Result<Self, SchedulingError> {
        if duration_minutes <= 0 {
            return Err(SchedulingError::InvalidDuration {
                minutes: duration_minutes,
            });
        }

        let end = Duration::try_minutes(duration_minutes)
            .and_then(|length| start.checked_add_signed(length))
            .ok_or(SchedulingError::InvalidDuration {
                minutes: duration_minutes,
            })?;

        Ok(TimeWindow { start, end })
    }

    /// Check if this window overlaps with another.
    pub fn overlaps_with(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Weekday of the start, 0 = Sunday.
    pub fn day_of_week(&self) -> u32 {
        self.start.weekday().num_days_from_sunday()
    }

    /// True when the end falls on a later calendar day than the start.
    ///
    /// Ending exactly at midnight also counts, since 00:00 belongs to the next day.
    pub fn crosses_midnight(&self) -> bool {
        self.end.date() != self.start.date()
    }
}

/// Represents an outpatient appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub room_id: Option<Uuid>,
    pub scheduled_time: NaiveDateTime,
    /// Minutes, always positive.
    pub duration: i64,
    pub status: AppointmentStatus,
    pub notes: String,
}

impl Appointment {
    /// The booked interval.
    ///
    /// A duration past the end of the calendar is clamped to `NaiveDateTime::MAX`.
    pub fn window(&self) -> TimeWindow {
        let end = Duration::try_minutes(self.duration)
            .and_then(|length| self.scheduled_time.checked_add_signed(length))
            .unwrap_or(NaiveDateTime::MAX);
        TimeWindow {
            start: self.scheduled_time,
            end,
        }
    }

    /// Whether this appointment holds capacity on its doctor and room.
    pub fn holds_capacity(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    /// Check whether this appointment competes with a proposed window.
    pub fn conflicts_with(&self, window: &TimeWindow) -> bool {
        self.holds_capacity() && self.window().overlaps_with(window)
    }
}

/// An outpatient consulting room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    pub capacity: u32,
    pub is_active: bool,
}

impl Room {
    pub fn new(clinic_id: Uuid, name: &str, capacity: u32) -> Self {
        Room {
            room_id: Uuid::new_v4(),
            clinic_id,
            name: name.to_string(),
            capacity,
            is_active: true,
        }
    }

    /// Concurrent appointments this room admits; an inactive room admits none.
    pub fn effective_capacity(&self) -> u32 {
        if self.is_active {
            self.capacity
        } else {
            0
        }
    }
}

/// A category of inpatient room (ICU, General, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomClass {
    pub room_class_id: Uuid,
    pub name: String,
    pub code: String,
    pub care_level: Option<String>,
    pub specialty: Option<String>,
    pub daily_rate: f64,
    pub is_active: bool,
}

impl RoomClass {
    pub fn new(name: &str, code: &str, care_level: Option<&str>, specialty: Option<&str>) -> Self {
        RoomClass {
            room_class_id: Uuid::new_v4(),
            name: name.to_string(),
            code: code.to_string(),
            care_level: care_level.map(str::to_string),
            specialty: specialty.map(str::to_string),
            daily_rate: 0.0,
            is_active: true,
        }
    }

    pub fn with_daily_rate(mut self, daily_rate: f64) -> Self {
        self.daily_rate = daily_rate;
        self
    }

    /// True only when a care level was required and this class carries it.
    pub fn matches_care_level(&self, required: Option<&str>) -> bool {
        matches!((required, self.care_level.as_deref()), (Some(r), Some(c)) if r == c)
    }

    /// True only when a specialty was required and this class carries it.
    pub fn matches_specialty(&self, required: Option<&str>) -> bool {
        matches!((required, self.specialty.as_deref()), (Some(r), Some(s)) if r == s)
    }
}

/// An inpatient ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ward {
    pub ward_id: Uuid,
    pub hospital_id: Uuid,
    pub name: String,
    pub code: String,
    pub preferred_room_class_id: Option<Uuid>,
    pub is_active: bool,
}

impl Ward {
    pub fn new(hospital_id: Uuid, name: &str, code: &str) -> Self {
        Ward {
            ward_id: Uuid::new_v4(),
            hospital_id,
            name: name.to_string(),
            code: code.to_string(),
            preferred_room_class_id: None,
            is_active: true,
        }
    }

    pub fn with_preferred_class(mut self, room_class_id: Uuid) -> Self {
        self.preferred_room_class_id = Some(room_class_id);
        self
    }
}

/// A physical room inside a ward, tagged with one room class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardRoom {
    pub ward_room_id: Uuid,
    pub ward_id: Uuid,
    pub room_class_id: Uuid,
    pub name: String,
    pub code: String,
}

impl WardRoom {
    pub fn new(ward_id: Uuid, room_class_id: Uuid, name: &str, code: &str) -> Self {
        WardRoom {
            ward_room_id: Uuid::new_v4(),
            ward_id,
            room_class_id,
            name: name.to_string(),
            code: code.to_string(),
        }
    }
}

/// Ranked preference of a ward for a room class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardRoomClassAssignment {
    pub assignment_id: Uuid,
    pub ward_id: Uuid,
    pub room_class_id: Uuid,
    /// Added to the ward score as-is.
    pub priority: i64,
    pub min_capacity: u32,
    pub max_capacity: Option<u32>,
    pub is_active: bool,
}

impl WardRoomClassAssignment {
    pub fn new(ward_id: Uuid, room_class_id: Uuid, priority: i64) -> Self {
        WardRoomClassAssignment {
            assignment_id: Uuid::new_v4(),
            ward_id,
            room_class_id,
            priority,
            min_capacity: 0,
            max_capacity: None,
            is_active: true,
        }
    }

    pub fn with_capacity_bounds(mut self, min_capacity: u32, max_capacity: Option<u32>) -> Self {
        self.min_capacity = min_capacity;
        self.max_capacity = max_capacity;
        self
    }
}

/// A single bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub bed_id: Uuid,
    pub ward_room_id: Uuid,
    pub name: String,
    pub code: String,
    pub is_occupied: bool,
    pub is_active: bool,
}

impl Bed {
    pub fn new(ward_room_id: Uuid, name: &str, code: &str) -> Self {
        Bed {
            bed_id: Uuid::new_v4(),
            ward_room_id,
            name: name.to_string(),
            code: code.to_string(),
            is_occupied: false,
            is_active: true,
        }
    }

    /// Free and in service.
    pub fn is_available(&self) -> bool {
        self.is_active && !self.is_occupied
    }
}

/// An available bed together with the room that classifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableBed {
    pub bed: Bed,
    pub room: WardRoom,
}

/// Status of an admission row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdmissionStatus {
    Admitted,
    Discharged,
    Transferred,
}

impl AdmissionStatus {
    pub fn name(&self) -> &str {
        match self {
            AdmissionStatus::Admitted => "Admitted",
            AdmissionStatus::Discharged => "Discharged",
            AdmissionStatus::Transferred => "Transferred",
        }
    }
}

impl std::fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One stay of one patient in one bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub admission_id: Uuid,
    pub patient_id: Uuid,
    pub bed_id: Uuid,
    pub admitted_by: Uuid,
    pub admission_date: NaiveDateTime,
    pub discharge_date: Option<NaiveDateTime>,
    pub status: AdmissionStatus,
}

impl Admission {
    /// Open a new admission in the Admitted state.
    pub fn open(patient_id: Uuid, bed_id: Uuid, admitted_by: Uuid, at: NaiveDateTime) -> Self {
        Admission {
            admission_id: Uuid::new_v4(),
            patient_id,
            bed_id,
            admitted_by,
            admission_date: at,
            discharge_date: None,
            status: AdmissionStatus::Admitted,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AdmissionStatus::Admitted
    }
}

/// Clinical needs a placement should honour. Both fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareRequirement {
    pub care_level: Option<String>,
    pub specialty: Option<String>,
}

impl CareRequirement {
    pub fn new(care_level: Option<&str>, specialty: Option<&str>) -> Self {
        CareRequirement {
            care_level: care_level.map(str::to_string),
            specialty: specialty.map(str::to_string),
        }
    }

    pub fn care_level(&self) -> Option<&str> {
        self.care_level.as_deref()
    }

    pub fn specialty(&self) -> Option<&str> {
        self.specialty.as_deref()
    }
}

/// Input to `AppointmentScheduler::schedule`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub room_id: Option<Uuid>,
    pub start: NaiveDateTime,
    pub duration_minutes: i64,
    pub notes: String,
}

/// Input to `AppointmentScheduler::reschedule`: the full edited appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleAppointmentRequest {
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub room_id: Option<Uuid>,
    pub start: NaiveDateTime,
    pub duration_minutes: i64,
    pub notes: String,
}
