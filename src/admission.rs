//! Admission lifecycle: admit, transfer and discharge.
//!
//! Each operation reads the current bed and admission state under the
//! locks of the beds and patient involved, then writes every row it
//! touches in one `ChangeSet`. Bed occupancy and the Admitted row always
//! move together.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::error::{Result, SchedulingError, StorageError};
use crate::locks::{LockKey, ResourceLocks};
use crate::models::{Admission, AdmissionStatus, Bed, CareRequirement};
use crate::placement::{Placement, PlacementEngine};
use crate::store::{Change, ChangeSet, SchedulingStore};

pub struct AdmissionManager<S> {
    store: Arc<S>,
    locks: Arc<ResourceLocks>,
    placement: PlacementEngine<S>,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl<S: SchedulingStore> AdmissionManager<S> {
    pub fn new(store: Arc<S>, locks: Arc<ResourceLocks>, config: &SchedulingConfig) -> Self {
        Self {
            placement: PlacementEngine::new(Arc::clone(&store), config.placement.clone()),
            store,
            locks,
        }
    }

    pub fn placement(&self) -> &PlacementEngine<S> {
        &self.placement
    }

    fn existing_bed(&self, bed_id: Uuid) -> Result<Bed> {
        self.store
            .bed(bed_id)?
            .ok_or(SchedulingError::BedNotFound(bed_id))
    }

    /// Commit, turning a lost occupancy race into the caller-facing error.
    fn commit(
        &self,
        changes: ChangeSet,
        on_conflict: impl FnOnce(Uuid) -> SchedulingError,
    ) -> Result<()> {
        self.store.commit(changes).map_err(|e| match e {
            StorageError::OccupancyConflict { bed_id } => {
                warn!(bed_id = %bed_id, "bed occupancy changed before commit");
                on_conflict(bed_id)
            }
            other => SchedulingError::Storage(other),
        })
    }

    /// Admit a patient into a specific free bed.
    pub fn assign_bed(
        &self,
        patient_id: Uuid,
        bed_id: Uuid,
        admitted_by: Uuid,
    ) -> Result<Admission> {
        let _guard = self
            .locks
            .acquire(&[LockKey::Bed(bed_id), LockKey::Patient(patient_id)]);

        let bed = self.existing_bed(bed_id)?;
        if bed.is_occupied {
            return Err(SchedulingError::BedAlreadyOccupied(bed_id));
        }
        if !bed.is_active {
            return Err(SchedulingError::BedInactive(bed_id));
        }
        if self.store.active_admission_for_patient(patient_id)?.is_some() {
            return Err(SchedulingError::PatientAlreadyAdmitted(patient_id));
        }

        let admission = Admission::open(patient_id, bed_id, admitted_by, now());
        self.commit(
            ChangeSet::new()
                .with(Change::InsertAdmission(admission.clone()))
                .with(Change::SetBedOccupancy {
                    bed_id,
                    occupied: true,
                }),
            SchedulingError::BedAlreadyOccupied,
        )?;

        info!(
            admission_id = %admission.admission_id,
            patient_id = %patient_id,
            bed = %bed.code,
            "patient admitted"
        );
        Ok(admission)
    }

    /// Place a patient and admit them into the suggested bed.
    ///
    /// The placement is only a hint; if the bed is taken between scoring and
    /// commit the call fails with `BedAlreadyOccupied`.
    pub fn admit_with_placement(
        &self,
        patient_id: Uuid,
        requirement: &CareRequirement,
        admitted_by: Uuid,
    ) -> Result<(Placement, Admission)> {
        let placement = self.placement.place(patient_id, requirement)?;
        let admission = self.assign_bed(patient_id, placement.bed.bed.bed_id, admitted_by)?;
        Ok((placement, admission))
    }

    fn close(&self, mut admission: Admission) -> Result<Admission> {
        admission.status = AdmissionStatus::Discharged;
        admission.discharge_date = Some(now());
        let bed_id = admission.bed_id;

        self.commit(
            ChangeSet::new()
                .with(Change::UpdateAdmission(admission.clone()))
                .with(Change::SetBedOccupancy {
                    bed_id,
                    occupied: false,
                }),
            |bed_id| {
                SchedulingError::Storage(StorageError::OccupancyConflict { bed_id })
            },
        )?;

        info!(
            admission_id = %admission.admission_id,
            patient_id = %admission.patient_id,
            bed_id = %bed_id,
            "patient discharged"
        );
        Ok(admission)
    }

    /// Discharge whoever holds the bed.
    pub fn discharge_bed(&self, bed_id: Uuid) -> Result<Admission> {
        let _guard = self.locks.acquire(&[LockKey::Bed(bed_id)]);

        let admission = self
            .store
            .active_admission_for_bed(bed_id)?
            .ok_or(SchedulingError::NoActiveAdmission)?;
        self.close(admission)
    }

    /// Discharge a patient, provided they are the one admitted to `bed_id`.
    pub fn discharge_patient(&self, patient_id: Uuid, bed_id: Uuid) -> Result<Admission> {
        let _guard = self
            .locks
            .acquire(&[LockKey::Bed(bed_id), LockKey::Patient(patient_id)]);

        let admission = self
            .store
            .active_admission_for_bed(bed_id)?
            .filter(|a| a.patient_id == patient_id)
            .ok_or(SchedulingError::NoActiveAdmission)?;
        self.close(admission)
    }

    /// Move a patient between beds.
    ///
    /// The source admission becomes Transferred and a new Admitted row is
    /// opened for the destination; both beds and both rows change in one
    /// commit. Returns the new admission.
    pub fn transfer(
        &self,
        patient_id: Uuid,
        source_bed_id: Uuid,
        dest_bed_id: Uuid,
        transferred_by: Uuid,
    ) -> Result<Admission> {
        if source_bed_id == dest_bed_id {
            return Err(SchedulingError::SameBed);
        }
        let _guard = self.locks.acquire(&[
            LockKey::Bed(source_bed_id),
            LockKey::Bed(dest_bed_id),
            LockKey::Patient(patient_id),
        ]);

        let dest = self.existing_bed(dest_bed_id)?;
        if dest.is_occupied {
            return Err(SchedulingError::DestinationOccupied(dest_bed_id));
        }
        if !dest.is_active {
            return Err(SchedulingError::BedInactive(dest_bed_id));
        }

        let mut current = self
            .store
            .active_admission_for_bed(source_bed_id)?
            .filter(|a| a.patient_id == patient_id)
            .ok_or(SchedulingError::NoActiveAdmission)?;

        let at = now();
        current.status = AdmissionStatus::Transferred;
        current.discharge_date = Some(at);
        let next = Admission::open(patient_id, dest_bed_id, transferred_by, at);

        self.commit(
            ChangeSet::new()
                .with(Change::UpdateAdmission(current.clone()))
                .with(Change::SetBedOccupancy {
                    bed_id: source_bed_id,
                    occupied: false,
                })
                .with(Change::InsertAdmission(next.clone()))
                .with(Change::SetBedOccupancy {
                    bed_id: dest_bed_id,
                    occupied: true,
                }),
            |bed_id| {
                if bed_id == dest_bed_id {
                    SchedulingError::DestinationOccupied(bed_id)
                } else {
                    SchedulingError::Storage(StorageError::OccupancyConflict { bed_id })
                }
            },
        )?;

        info!(
            patient_id = %patient_id,
            from = %source_bed_id,
            to = %dest.code,
            admission_id = %next.admission_id,
            "patient transferred"
        );
        Ok(next)
    }

    pub fn active_admission(&self, patient_id: Uuid) -> Result<Option<Admission>> {
        Ok(self.store.active_admission_for_patient(patient_id)?)
    }

    /// Every stay of a patient, oldest first.
    pub fn history(&self, patient_id: Uuid) -> Result<Vec<Admission>> {
        Ok(self.store.admissions_for_patient(patient_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomClass, Ward, WardRoom};
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        manager: AdmissionManager<MemoryStore>,
        beds: Vec<Bed>,
        clerk: Uuid,
    }

    fn fixture(bed_count: usize) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let class = RoomClass::new("General", "GEN", Some("General"), None);
        let ward = Ward::new(Uuid::new_v4(), "Ward 1", "W1");
        let room = WardRoom::new(ward.ward_id, class.room_class_id, "R1", "R1");
        store.add_room_class(class);
        store.add_ward(ward);
        store.add_ward_room(room.clone());
        let beds = (0..bed_count)
            .map(|i| {
                let bed = Bed::new(room.ward_room_id, &format!("B{i}"), &format!("B{i}"));
                store.add_bed(bed.clone());
                bed
            })
            .collect();

        let manager = AdmissionManager::new(
            Arc::clone(&store),
            Arc::new(ResourceLocks::new()),
            &SchedulingConfig::default(),
        );
        Fixture {
            store,
            manager,
            beds,
            clerk: Uuid::new_v4(),
        }
    }

    fn occupied(store: &MemoryStore, bed: &Bed) -> bool {
        store.bed(bed.bed_id).unwrap().unwrap().is_occupied
    }

    #[test]
    fn assign_marks_bed_and_opens_admission() {
        let fx = fixture(1);
        let patient = Uuid::new_v4();

        let admission = fx
            .manager
            .assign_bed(patient, fx.beds[0].bed_id, fx.clerk)
            .unwrap();

        assert_eq!(admission.status, AdmissionStatus::Admitted);
        assert_eq!(admission.admitted_by, fx.clerk);
        assert!(occupied(&fx.store, &fx.beds[0]));
        assert_eq!(fx.manager.active_admission(patient).unwrap(), Some(admission));
    }

    #[test]
    fn assign_rejects_taken_unknown_and_inactive_beds() {
        let fx = fixture(1);
        fx.manager
            .assign_bed(Uuid::new_v4(), fx.beds[0].bed_id, fx.clerk)
            .unwrap();

        assert_eq!(
            fx.manager
                .assign_bed(Uuid::new_v4(), fx.beds[0].bed_id, fx.clerk),
            Err(SchedulingError::BedAlreadyOccupied(fx.beds[0].bed_id))
        );

        let ghost = Uuid::new_v4();
        assert_eq!(
            fx.manager.assign_bed(Uuid::new_v4(), ghost, fx.clerk),
            Err(SchedulingError::BedNotFound(ghost))
        );

        let mut retired = Bed::new(fx.beds[0].ward_room_id, "X", "X");
        retired.is_active = false;
        fx.store.add_bed(retired.clone());
        assert_eq!(
            fx.manager.assign_bed(Uuid::new_v4(), retired.bed_id, fx.clerk),
            Err(SchedulingError::BedInactive(retired.bed_id))
        );
    }

    #[test]
    fn a_patient_holds_one_bed_at_a_time() {
        let fx = fixture(2);
        let patient = Uuid::new_v4();
        fx.manager
            .assign_bed(patient, fx.beds[0].bed_id, fx.clerk)
            .unwrap();

        assert_eq!(
            fx.manager.assign_bed(patient, fx.beds[1].bed_id, fx.clerk),
            Err(SchedulingError::PatientAlreadyAdmitted(patient))
        );
        assert!(!occupied(&fx.store, &fx.beds[1]));
    }

    #[test]
    fn discharge_frees_bed_and_stamps_admission() {
        let fx = fixture(1);
        let patient = Uuid::new_v4();
        fx.manager
            .assign_bed(patient, fx.beds[0].bed_id, fx.clerk)
            .unwrap();

        let closed = fx.manager.discharge_bed(fx.beds[0].bed_id).unwrap();
        assert_eq!(closed.status, AdmissionStatus::Discharged);
        assert!(closed.discharge_date.is_some());
        assert!(!occupied(&fx.store, &fx.beds[0]));

        assert_eq!(
            fx.manager.discharge_bed(fx.beds[0].bed_id),
            Err(SchedulingError::NoActiveAdmission)
        );
    }

    #[test]
    fn discharge_patient_requires_matching_bed() {
        let fx = fixture(2);
        let patient = Uuid::new_v4();
        fx.manager
            .assign_bed(patient, fx.beds[0].bed_id, fx.clerk)
            .unwrap();

        assert_eq!(
            fx.manager.discharge_patient(patient, fx.beds[1].bed_id),
            Err(SchedulingError::NoActiveAdmission)
        );
        assert_eq!(
            fx.manager.discharge_patient(Uuid::new_v4(), fx.beds[0].bed_id),
            Err(SchedulingError::NoActiveAdmission)
        );
        fx.manager
            .discharge_patient(patient, fx.beds[0].bed_id)
            .unwrap();
        assert!(fx.manager.active_admission(patient).unwrap().is_none());
    }

    #[test]
    fn transfer_moves_patient_and_keeps_history() {
        let fx = fixture(2);
        let patient = Uuid::new_v4();
        let first = fx
            .manager
            .assign_bed(patient, fx.beds[0].bed_id, fx.clerk)
            .unwrap();

        let nurse = Uuid::new_v4();
        let second = fx
            .manager
            .transfer(patient, fx.beds[0].bed_id, fx.beds[1].bed_id, nurse)
            .unwrap();

        assert_eq!(second.bed_id, fx.beds[1].bed_id);
        assert_eq!(second.admitted_by, nurse);
        assert!(!occupied(&fx.store, &fx.beds[0]));
        assert!(occupied(&fx.store, &fx.beds[1]));

        let history = fx.manager.history(patient).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].admission_id, first.admission_id);
        assert_eq!(history[0].bed_id, fx.beds[0].bed_id);
        assert_eq!(history[0].status, AdmissionStatus::Transferred);
        assert_eq!(history[1], second);
    }

    #[test]
    fn transfer_precondition_order() {
        let fx = fixture(3);
        let patient = Uuid::new_v4();
        let (a, b, c) = (fx.beds[0].bed_id, fx.beds[1].bed_id, fx.beds[2].bed_id);
        fx.manager.assign_bed(patient, a, fx.clerk).unwrap();
        fx.manager
            .assign_bed(Uuid::new_v4(), b, fx.clerk)
            .unwrap();

        assert_eq!(
            fx.manager.transfer(patient, a, a, fx.clerk),
            Err(SchedulingError::SameBed)
        );
        assert_eq!(
            fx.manager.transfer(patient, a, b, fx.clerk),
            Err(SchedulingError::DestinationOccupied(b))
        );
        assert_eq!(
            fx.manager.transfer(Uuid::new_v4(), a, c, fx.clerk),
            Err(SchedulingError::NoActiveAdmission)
        );
        assert!(occupied(&fx.store, &fx.beds[0]));
        assert!(!occupied(&fx.store, &fx.beds[2]));
    }
}
