/// Command-line demo for the scheduling and placement core.
///
/// Seeds an in-memory hospital, then walks through booking outpatient
/// appointments and admitting, transferring and discharging inpatients,
/// printing each decision.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use wardplan::models::{
    Bed, CareRequirement, DoctorSchedule, Room, RoomClass, Ward, WardRoom,
    WardRoomClassAssignment,
};
use wardplan::{
    AdmissionManager, AppointmentScheduler, MemoryStore, ResourceLocks, SchedulingConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Demo {
    Clinic,
    Ward,
    All,
}

#[derive(Debug, Parser)]
#[command(name = "wardplan", about = "Appointment and bed placement demo")]
struct Args {
    /// TOML file overriding durations and placement weights.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Demo::All)]
    demo: Demo,
}

struct WardplanCli {
    store: Arc<MemoryStore>,
    scheduler: AppointmentScheduler<MemoryStore>,
    admissions: AdmissionManager<MemoryStore>,
}

impl WardplanCli {
    fn new(config: &SchedulingConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(ResourceLocks::new());
        WardplanCli {
            scheduler: AppointmentScheduler::new(Arc::clone(&store), Arc::clone(&locks), config),
            admissions: AdmissionManager::new(Arc::clone(&store), locks, config),
            store,
        }
    }

    fn print_header(&self, title: &str) {
        println!("\n{}", "=".repeat(60));
        println!("       {}", title);
        println!("{}", "=".repeat(60));
    }

    fn run_clinic_demo(&self) {
        self.print_header("OUTPATIENT SCHEDULING");

        let doctor = Uuid::new_v4();
        let schedule = DoctorSchedule::new(
            doctor,
            0,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            30,
            1,
        )
        .unwrap();
        self.store.add_doctor_schedule(schedule);
        let room = Room::new(Uuid::new_v4(), "Consult 1", 1);
        let room_id = room.room_id;
        self.store.add_room(room);

        println!("Dr. Demo works Sundays 09:00-12:00, one patient per slot");

        // 2024-06-02 is a Sunday.
        let sunday = |hour, minute| -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 6, 2)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap()
        };

        let mut first = self
            .scheduler
            .draft_request(Uuid::new_v4(), doctor, sunday(9, 0));
        first.room_id = Some(room_id);
        first.notes = "Annual checkup".to_string();
        let booked = match self.scheduler.schedule(first) {
            Ok(apt) => {
                println!("  [OK]   09:00 booked ({})", apt.notes);
                Some(apt)
            }
            Err(e) => {
                println!("  [FAIL] 09:00: {}", e);
                None
            }
        };

        let second = self
            .scheduler
            .draft_request(Uuid::new_v4(), doctor, sunday(9, 15));
        match self.scheduler.schedule(second.clone()) {
            Ok(_) => println!("  [OK]   09:15 booked"),
            Err(e) => println!("  [FAIL] 09:15: {}", e),
        }

        if let Some(apt) = booked {
            match self.scheduler.cancel(apt.appointment_id) {
                Ok(_) => println!("  09:00 appointment cancelled, slot released"),
                Err(e) => println!("  cancel failed: {}", e),
            }
        }

        match self.scheduler.schedule(second) {
            Ok(apt) => println!(
                "  [OK]   09:15 booked on retry ({} minutes)",
                apt.duration
            ),
            Err(e) => println!("  [FAIL] 09:15 retry: {}", e),
        }

        let late = self
            .scheduler
            .draft_request(Uuid::new_v4(), doctor, sunday(11, 45));
        match self.scheduler.schedule(late) {
            Ok(_) => println!("  [OK]   11:45 booked"),
            Err(e) => println!("  [FAIL] 11:45: {}", e),
        }
    }

    fn run_ward_demo(&self) {
        self.print_header("INPATIENT PLACEMENT");

        let hospital = Uuid::new_v4();
        let icu = RoomClass::new("Intensive Care", "ICU", Some("ICU"), Some("Critical Care"))
            .with_daily_rate(2400.0);
        let general =
            RoomClass::new("General", "GEN", Some("General"), None).with_daily_rate(450.0);
        self.store.add_room_class(icu.clone());
        self.store.add_room_class(general.clone());

        let ward_a = Ward::new(hospital, "Critical Care Unit", "CCU")
            .with_preferred_class(icu.room_class_id);
        let ward_b = Ward::new(hospital, "Medical Ward", "MED");
        self.store.add_ward(ward_a.clone());
        self.store.add_ward(ward_b.clone());
        self.store.add_assignment(
            WardRoomClassAssignment::new(ward_b.ward_id, general.room_class_id, 1)
                .with_capacity_bounds(1, Some(10)),
        );

        let mut beds = Vec::new();
        for (ward, class, code, count) in [
            (&ward_a, &icu, "CCU-1", 1),
            (&ward_b, &general, "MED-1", 2),
        ] {
            let room = WardRoom::new(ward.ward_id, class.room_class_id, code, code);
            self.store.add_ward_room(room.clone());
            for i in 0..count {
                let label = format!("{}-{}", code, i + 1);
                let bed = Bed::new(room.ward_room_id, &label, &label);
                self.store.add_bed(bed.clone());
                beds.push(bed);
            }
        }

        let clerk = Uuid::new_v4();
        let critical = CareRequirement::new(Some("ICU"), None);

        match self.admissions.placement().explain(&critical) {
            Ok(report) => {
                println!("\nWard ranking for care level ICU:");
                for scored in &report.wards {
                    println!("  {:4} score {:3}", scored.ward.code, scored.card.total);
                    for hit in &scored.card.hits {
                        println!("         +{:<3} {}", hit.points, hit.rule);
                    }
                }
            }
            Err(e) => println!("  ranking failed: {}", e),
        }

        let patient = Uuid::new_v4();
        let admitted = match self.admissions.admit_with_placement(patient, &critical, clerk) {
            Ok((placement, admission)) => {
                println!(
                    "\n  [OK]   admitted to {} / {}",
                    placement.ward.code, placement.bed.bed.code
                );
                Some(admission)
            }
            Err(e) => {
                println!("\n  [FAIL] admission: {}", e);
                None
            }
        };

        let second_patient = Uuid::new_v4();
        match self.admissions.admit_with_placement(second_patient, &critical, clerk) {
            Ok((placement, _)) => println!("  [OK]   admitted to {}", placement.bed.bed.code),
            Err(e) => println!("  [FAIL] second ICU admission: {}", e),
        }

        if let Some(admission) = admitted {
            let dest = &beds[1];
            match self
                .admissions
                .transfer(patient, admission.bed_id, dest.bed_id, clerk)
            {
                Ok(_) => println!("  [OK]   transferred to {}", dest.code),
                Err(e) => println!("  [FAIL] transfer: {}", e),
            }
            match self.admissions.discharge_patient(patient, dest.bed_id) {
                Ok(closed) => {
                    println!("  [OK]   discharged");
                    for stay in self.admissions.history(closed.patient_id).unwrap_or_default() {
                        println!("         {} {}", stay.admission_date, stay.status);
                    }
                }
                Err(e) => println!("  [FAIL] discharge: {}", e),
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => match SchedulingConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        },
        None => SchedulingConfig::default(),
    };

    let cli = WardplanCli::new(&config);
    if matches!(args.demo, Demo::Clinic | Demo::All) {
        cli.run_clinic_demo();
    }
    if matches!(args.demo, Demo::Ward | Demo::All) {
        cli.run_ward_demo();
    }
}
