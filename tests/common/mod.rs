#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;
use wardplan::models::{Bed, RoomClass, Ward, WardRoom};
use wardplan::{
    AdmissionManager, AppointmentScheduler, MemoryStore, ResourceLocks, SchedulingConfig,
};

pub struct Hospital {
    pub store: Arc<MemoryStore>,
    pub scheduler: AppointmentScheduler<MemoryStore>,
    pub admissions: AdmissionManager<MemoryStore>,
}

impl Hospital {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(ResourceLocks::new());
        let config = SchedulingConfig::default();
        Hospital {
            scheduler: AppointmentScheduler::new(Arc::clone(&store), Arc::clone(&locks), &config),
            admissions: AdmissionManager::new(Arc::clone(&store), locks, &config),
            store,
        }
    }

    pub fn room_class(&self, name: &str, care_level: &str) -> RoomClass {
        let class = RoomClass::new(name, name, Some(care_level), None);
        self.store.add_room_class(class.clone());
        class
    }

    pub fn ward(&self, code: &str, preferred: Option<&RoomClass>) -> Ward {
        let mut ward = Ward::new(Uuid::new_v4(), code, code);
        if let Some(class) = preferred {
            ward = ward.with_preferred_class(class.room_class_id);
        }
        self.store.add_ward(ward.clone());
        ward
    }

    pub fn beds(&self, ward: &Ward, class: &RoomClass, count: usize) -> Vec<Bed> {
        let code = format!("{}-{}", ward.code, class.code);
        let room = WardRoom::new(ward.ward_id, class.room_class_id, &code, &code);
        self.store.add_ward_room(room.clone());
        (0..count)
            .map(|i| {
                let label = format!("{code}-{i}");
                let bed = Bed::new(room.ward_room_id, &label, &label);
                self.store.add_bed(bed.clone());
                bed
            })
            .collect()
    }
}

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// 2024-06-02 is a Sunday.
pub fn sunday(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 2).unwrap().and_time(hm(hour, minute))
}
