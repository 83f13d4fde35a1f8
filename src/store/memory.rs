use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};
use uuid::Uuid;

use super::{Change, ChangeSet, Resource, SchedulingStore};
use crate::error::StorageError;
use crate::models::{
    Admission, Appointment, AvailableBed, Bed, DoctorSchedule, Room, RoomClass, TimeWindow, Ward,
    WardRoom, WardRoomClassAssignment,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    schedules: Vec<DoctorSchedule>,
    rooms: Vec<Room>,
    appointments: Vec<Appointment>,
    room_classes: Vec<RoomClass>,
    wards: Vec<Ward>,
    ward_rooms: Vec<WardRoom>,
    assignments: Vec<WardRoomClassAssignment>,
    beds: Vec<Bed>,
    admissions: Vec<Admission>,
}

impl Tables {
    fn ward_room(&self, ward_room_id: Uuid) -> Option<&WardRoom> {
        self.ward_rooms
            .iter()
            .find(|r| r.ward_room_id == ward_room_id)
    }

    fn available_beds_in(&self, ward_id: Uuid) -> impl Iterator<Item = (&Bed, &WardRoom)> + '_ {
        self.beds.iter().filter(|b| b.is_available()).filter_map(move |bed| {
            self.ward_room(bed.ward_room_id)
                .filter(|room| room.ward_id == ward_id)
                .map(|room| (bed, room))
        })
    }

    fn apply(&mut self, change: Change) -> Result<(), StorageError> {
        match change {
            Change::InsertAppointment(appointment) => {
                if self
                    .appointments
                    .iter()
                    .any(|a| a.appointment_id == appointment.appointment_id)
                {
                    return Err(StorageError::DuplicateRow {
                        entity: "appointment",
                        id: appointment.appointment_id,
                    });
                }
                self.appointments.push(appointment);
            }
            Change::UpdateAppointment(appointment) => {
                let slot = self
                    .appointments
                    .iter_mut()
                    .find(|a| a.appointment_id == appointment.appointment_id)
                    .ok_or(StorageError::MissingRow {
                        entity: "appointment",
                        id: appointment.appointment_id,
                    })?;
                *slot = appointment;
            }
            Change::InsertAdmission(admission) => {
                if self
                    .admissions
                    .iter()
                    .any(|a| a.admission_id == admission.admission_id)
                {
                    return Err(StorageError::DuplicateRow {
                        entity: "admission",
                        id: admission.admission_id,
                    });
                }
                self.admissions.push(admission);
            }
            Change::UpdateAdmission(admission) => {
                let slot = self
                    .admissions
                    .iter_mut()
                    .find(|a| a.admission_id == admission.admission_id)
                    .ok_or(StorageError::MissingRow {
                        entity: "admission",
                        id: admission.admission_id,
                    })?;
                *slot = admission;
            }
            Change::SetBedOccupancy { bed_id, occupied } => {
                let bed = self
                    .beds
                    .iter_mut()
                    .find(|b| b.bed_id == bed_id)
                    .ok_or(StorageError::MissingRow { entity: "bed", id: bed_id })?;
                if bed.is_occupied == occupied {
                    return Err(StorageError::OccupancyConflict { bed_id });
                }
                bed.is_occupied = occupied;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: Tables,
    /// One-shot fault: fail the next commit before applying this step (0-based).
    fail_commit_at: Option<usize>,
}

/// In-process `SchedulingStore`.
///
/// All tables sit behind one mutex, so every read sees a consistent
/// snapshot and `commit` is serializable. A commit stages its changes on a
/// copy of the tables and swaps the copy in only after every change has
/// applied.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StorageError> {
        let inner = self.lock()?;
        Ok(f(&inner.tables))
    }

    fn seed(&self, f: impl FnOnce(&mut Tables)) {
        if let Ok(mut inner) = self.inner.lock() {
            f(&mut inner.tables);
        }
    }

    pub fn add_doctor_schedule(&self, schedule: DoctorSchedule) {
        self.seed(|t| t.schedules.push(schedule));
    }

    pub fn add_room(&self, room: Room) {
        self.seed(|t| t.rooms.push(room));
    }

    pub fn add_room_class(&self, room_class: RoomClass) {
        self.seed(|t| t.room_classes.push(room_class));
    }

    pub fn add_ward(&self, ward: Ward) {
        self.seed(|t| t.wards.push(ward));
    }

    pub fn add_ward_room(&self, ward_room: WardRoom) {
        self.seed(|t| t.ward_rooms.push(ward_room));
    }

    pub fn add_assignment(&self, assignment: WardRoomClassAssignment) {
        self.seed(|t| t.assignments.push(assignment));
    }

    pub fn add_bed(&self, bed: Bed) {
        self.seed(|t| t.beds.push(bed));
    }

    /// Toggle a room in or out of service.
    pub fn set_room_active(&self, room_id: Uuid, is_active: bool) {
        self.seed(|t| {
            if let Some(room) = t.rooms.iter_mut().find(|r| r.room_id == room_id) {
                room.is_active = is_active;
            }
        });
    }

    /// Arm a one-shot failure: the next commit aborts before applying the
    /// change at index `step`, as a backend error would.
    pub fn fail_commit_at(&self, step: usize) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_commit_at = Some(step);
        }
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.read(|t| t.appointments.clone()).unwrap_or_default()
    }

    pub fn admissions(&self) -> Vec<Admission> {
        self.read(|t| t.admissions.clone()).unwrap_or_default()
    }
}

impl SchedulingStore for MemoryStore {
    fn doctor_schedules(
        &self,
        doctor_id: Uuid,
        day_of_week: u32,
    ) -> Result<Vec<DoctorSchedule>, StorageError> {
        self.read(|t| {
            let mut rows: Vec<DoctorSchedule> = t
                .schedules
                .iter()
                .filter(|s| s.doctor_id == doctor_id && s.day_of_week == day_of_week)
                .cloned()
                .collect();
            rows.sort_by_key(|s| s.start_time);
            rows
        })
    }

    fn room(&self, room_id: Uuid) -> Result<Option<Room>, StorageError> {
        self.read(|t| t.rooms.iter().find(|r| r.room_id == room_id).cloned())
    }

    fn appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StorageError> {
        self.read(|t| {
            t.appointments
                .iter()
                .find(|a| a.appointment_id == appointment_id)
                .cloned()
        })
    }

    fn count_overlapping_appointments(
        &self,
        resource: Resource,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> Result<u32, StorageError> {
        self.read(|t| {
            t.appointments
                .iter()
                .filter(|a| Some(a.appointment_id) != exclude)
                .filter(|a| match resource {
                    Resource::Doctor(id) => a.doctor_id == id,
                    Resource::Room(id) => a.room_id == Some(id),
                })
                .filter(|a| a.conflicts_with(window))
                .count() as u32
        })
    }

    fn active_wards(&self) -> Result<Vec<Ward>, StorageError> {
        self.read(|t| t.wards.iter().filter(|w| w.is_active).cloned().collect())
    }

    fn active_assignments(&self) -> Result<Vec<WardRoomClassAssignment>, StorageError> {
        self.read(|t| {
            t.assignments
                .iter()
                .filter(|a| a.is_active)
                .cloned()
                .collect()
        })
    }

    fn room_class(&self, room_class_id: Uuid) -> Result<Option<RoomClass>, StorageError> {
        self.read(|t| {
            t.room_classes
                .iter()
                .find(|c| c.room_class_id == room_class_id)
                .cloned()
        })
    }

    fn count_available_beds(
        &self,
        ward_id: Uuid,
        room_class_id: Option<Uuid>,
    ) -> Result<u32, StorageError> {
        self.read(|t| {
            t.available_beds_in(ward_id)
                .filter(|(_, room)| room_class_id.map_or(true, |id| room.room_class_id == id))
                .count() as u32
        })
    }

    fn available_beds(&self, ward_id: Uuid) -> Result<Vec<AvailableBed>, StorageError> {
        self.read(|t| {
            t.available_beds_in(ward_id)
                .map(|(bed, room)| AvailableBed {
                    bed: bed.clone(),
                    room: room.clone(),
                })
                .collect()
        })
    }

    fn bed(&self, bed_id: Uuid) -> Result<Option<Bed>, StorageError> {
        self.read(|t| t.beds.iter().find(|b| b.bed_id == bed_id).cloned())
    }

    fn active_admission_for_bed(&self, bed_id: Uuid) -> Result<Option<Admission>, StorageError> {
        self.read(|t| {
            t.admissions
                .iter()
                .find(|a| a.bed_id == bed_id && a.is_active())
                .cloned()
        })
    }

    fn active_admission_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Option<Admission>, StorageError> {
        self.read(|t| {
            t.admissions
                .iter()
                .find(|a| a.patient_id == patient_id && a.is_active())
                .cloned()
        })
    }

    fn admissions_for_patient(&self, patient_id: Uuid) -> Result<Vec<Admission>, StorageError> {
        self.read(|t| {
            t.admissions
                .iter()
                .filter(|a| a.patient_id == patient_id)
                .cloned()
                .collect()
        })
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), StorageError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut inner = self.lock()?;
        let fault = inner.fail_commit_at.take();
        let mut staged = inner.tables.clone();
        let total = changes.len();

        for (step, change) in changes.into_changes().into_iter().enumerate() {
            if fault == Some(step) {
                warn!(step, total, "injected commit failure, rolling back");
                return Err(StorageError::Backend(format!(
                    "injected failure at step {}",
                    step
                )));
            }
            staged.apply(change)?;
        }

        inner.tables = staged;
        debug!(changes = total, "commit applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdmissionStatus, AppointmentStatus};
    use chrono::NaiveDate;

    fn seeded_bed(store: &MemoryStore) -> (Ward, Bed) {
        let class = RoomClass::new("General", "GEN", Some("General"), None);
        let ward = Ward::new(Uuid::new_v4(), "Ward A", "WA");
        let room = WardRoom::new(ward.ward_id, class.room_class_id, "A1", "A1");
        let bed = Bed::new(room.ward_room_id, "A1-1", "A1-1");
        store.add_room_class(class);
        store.add_ward(ward.clone());
        store.add_ward_room(room);
        store.add_bed(bed.clone());
        (ward, bed)
    }

    #[test]
    fn occupancy_write_rejects_no_op_flip() {
        let store = MemoryStore::new();
        let (_, bed) = seeded_bed(&store);

        let release = ChangeSet::new().with(Change::SetBedOccupancy {
            bed_id: bed.bed_id,
            occupied: false,
        });
        assert_eq!(
            store.commit(release),
            Err(StorageError::OccupancyConflict { bed_id: bed.bed_id })
        );
    }

    #[test]
    fn failed_change_discards_earlier_changes_in_the_set() {
        let store = MemoryStore::new();
        let (ward, bed) = seeded_bed(&store);
        let admission = Admission::open(
            Uuid::new_v4(),
            bed.bed_id,
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 6, 2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        );

        let changes = ChangeSet::new()
            .with(Change::InsertAdmission(admission))
            .with(Change::SetBedOccupancy {
                bed_id: bed.bed_id,
                occupied: true,
            })
            .with(Change::SetBedOccupancy {
                bed_id: bed.bed_id,
                occupied: true,
            });

        assert!(store.commit(changes).is_err());
        assert!(store.admissions().is_empty());
        assert_eq!(store.count_available_beds(ward.ward_id, None).unwrap(), 1);
    }

    #[test]
    fn injected_fault_is_one_shot() {
        let store = MemoryStore::new();
        let (_, bed) = seeded_bed(&store);
        let occupy = ChangeSet::new().with(Change::SetBedOccupancy {
            bed_id: bed.bed_id,
            occupied: true,
        });

        store.fail_commit_at(0);
        assert!(matches!(
            store.commit(occupy.clone()),
            Err(StorageError::Backend(_))
        ));
        assert!(!store.bed(bed.bed_id).unwrap().unwrap().is_occupied);

        store.commit(occupy).unwrap();
        assert!(store.bed(bed.bed_id).unwrap().unwrap().is_occupied);
    }

    #[test]
    fn overlap_count_skips_cancelled_and_excluded_rows() {
        let store = MemoryStore::new();
        let doctor_id = Uuid::new_v4();
        let start = NaiveDate::from_ymd_opt(2024, 6, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let make = |status| Appointment {
            appointment_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id,
            room_id: None,
            scheduled_time: start,
            duration: 30,
            status,
            notes: String::new(),
        };
        let kept = make(AppointmentStatus::Scheduled);
        let also_kept = make(AppointmentStatus::Completed);
        let cancelled = make(AppointmentStatus::Cancelled);

        store
            .commit(
                ChangeSet::new()
                    .with(Change::InsertAppointment(kept.clone()))
                    .with(Change::InsertAppointment(also_kept))
                    .with(Change::InsertAppointment(cancelled)),
            )
            .unwrap();

        let window = TimeWindow::new(start, 15).unwrap();
        let resource = Resource::Doctor(doctor_id);
        assert_eq!(
            store
                .count_overlapping_appointments(resource, &window, None)
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .count_overlapping_appointments(resource, &window, Some(kept.appointment_id))
                .unwrap(),
            1
        );
    }

    #[test]
    fn admission_history_keeps_insertion_order() {
        let store = MemoryStore::new();
        let (_, bed) = seeded_bed(&store);
        let patient = Uuid::new_v4();
        let at = NaiveDate::from_ymd_opt(2024, 6, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mut first = Admission::open(patient, bed.bed_id, Uuid::new_v4(), at);
        first.status = AdmissionStatus::Discharged;
        let second = Admission::open(patient, bed.bed_id, Uuid::new_v4(), at);

        store
            .commit(
                ChangeSet::new()
                    .with(Change::InsertAdmission(first.clone()))
                    .with(Change::InsertAdmission(second.clone())),
            )
            .unwrap();

        let history = store.admissions_for_patient(patient).unwrap();
        assert_eq!(history, vec![first, second.clone()]);
        assert_eq!(
            store.active_admission_for_bed(bed.bed_id).unwrap(),
            Some(second)
        );
    }
}
