//! Data-access interface consumed by the scheduling core.
//!
//! Components never reach for ambient state; they are handed an
//! `Arc<S: SchedulingStore>` and go through the methods below. Reads are
//! plain queries. All writes go through [`SchedulingStore::commit`], which
//! applies a [`ChangeSet`] as a single atomic unit.

mod memory;

pub use memory::MemoryStore;

use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{
    Admission, Appointment, AvailableBed, Bed, DoctorSchedule, Room, RoomClass, TimeWindow, Ward,
    WardRoomClassAssignment,
};

/// A bookable outpatient resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Doctor(Uuid),
    Room(Uuid),
}

/// One row-level mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    InsertAppointment(Appointment),
    UpdateAppointment(Appointment),
    InsertAdmission(Admission),
    UpdateAdmission(Admission),
    /// Flip a bed's occupancy. The store rejects the write with
    /// `StorageError::OccupancyConflict` if the bed is already `occupied`.
    SetBedOccupancy { bed_id: Uuid, occupied: bool },
}

/// Ordered mutations that commit together or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}

pub trait SchedulingStore: Send + Sync {
    /// Active and inactive schedule rows for a doctor on a weekday (0 = Sunday).
    fn doctor_schedules(
        &self,
        doctor_id: Uuid,
        day_of_week: u32,
    ) -> Result<Vec<DoctorSchedule>, StorageError>;

    fn room(&self, room_id: Uuid) -> Result<Option<Room>, StorageError>;

    fn appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StorageError>;

    /// Count non-cancelled appointments on `resource` overlapping `window`,
    /// skipping `exclude` if given.
    fn count_overlapping_appointments(
        &self,
        resource: Resource,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> Result<u32, StorageError>;

    /// Active wards in stable retrieval order.
    fn active_wards(&self) -> Result<Vec<Ward>, StorageError>;

    fn active_assignments(&self) -> Result<Vec<WardRoomClassAssignment>, StorageError>;

    fn room_class(&self, room_class_id: Uuid) -> Result<Option<RoomClass>, StorageError>;

    /// Free, active beds in a ward, optionally restricted to one room class.
    fn count_available_beds(
        &self,
        ward_id: Uuid,
        room_class_id: Option<Uuid>,
    ) -> Result<u32, StorageError>;

    fn available_beds(&self, ward_id: Uuid) -> Result<Vec<AvailableBed>, StorageError>;

    fn bed(&self, bed_id: Uuid) -> Result<Option<Bed>, StorageError>;

    fn active_admission_for_bed(&self, bed_id: Uuid) -> Result<Option<Admission>, StorageError>;

    fn active_admission_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Option<Admission>, StorageError>;

    /// Every admission row for a patient, oldest first.
    fn admissions_for_patient(&self, patient_id: Uuid) -> Result<Vec<Admission>, StorageError>;

    /// Apply all changes or none of them.
    fn commit(&self, changes: ChangeSet) -> Result<(), StorageError>;
}
