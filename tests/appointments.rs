mod common;

use std::sync::Arc;
use std::thread;

use common::{hm, sunday, Hospital};
use uuid::Uuid;
use wardplan::models::{DoctorSchedule, Room, ScheduleAppointmentRequest};
use wardplan::store::Resource;
use wardplan::{SchedulingError, SchedulingStore};

fn request(doctor: Uuid, hour: u32, minute: u32, minutes: i64) -> ScheduleAppointmentRequest {
    ScheduleAppointmentRequest {
        patient_id: Uuid::new_v4(),
        doctor_id: doctor,
        room_id: None,
        start: sunday(hour, minute),
        duration_minutes: minutes,
        notes: String::new(),
    }
}

#[test]
fn sunday_clinic_cancel_and_retry() {
    let h = Hospital::new();
    let doctor = Uuid::new_v4();
    h.store
        .add_doctor_schedule(DoctorSchedule::new(doctor, 0, hm(9, 0), hm(12, 0), 30, 1).unwrap());

    let first = h.scheduler.schedule(request(doctor, 9, 0, 30)).unwrap();

    let second = request(doctor, 9, 15, 30);
    assert_eq!(
        h.scheduler.schedule(second.clone()),
        Err(SchedulingError::DoctorFullyBooked { doctor_id: doctor })
    );

    h.scheduler.cancel(first.appointment_id).unwrap();
    let retried = h.scheduler.schedule(second).unwrap();
    assert_eq!(retried.scheduled_time, sunday(9, 15));
}

#[test]
fn cancelled_slot_can_be_rebooked_identically() {
    let h = Hospital::new();
    let doctor = Uuid::new_v4();
    h.store
        .add_doctor_schedule(DoctorSchedule::new(doctor, 0, hm(9, 0), hm(12, 0), 30, 1).unwrap());

    let slot = request(doctor, 10, 0, 30);
    let booked = h.scheduler.schedule(slot.clone()).unwrap();
    h.scheduler.cancel(booked.appointment_id).unwrap();
    h.scheduler.schedule(slot).unwrap();
}

#[test]
fn oversized_duration_is_rejected_not_panicking() {
    let h = Hospital::new();
    let doctor = Uuid::new_v4();
    h.store
        .add_doctor_schedule(DoctorSchedule::new(doctor, 0, hm(9, 0), hm(12, 0), 30, 1).unwrap());

    for minutes in [1_000_000_000_000, i64::MAX] {
        assert_eq!(
            h.scheduler.schedule(request(doctor, 9, 0, minutes)),
            Err(SchedulingError::InvalidDuration { minutes })
        );
    }
    assert!(h.store.appointments().is_empty());
}

#[test]
fn every_overlapping_active_booking_counts() {
    let h = Hospital::new();
    let doctor = Uuid::new_v4();
    h.store
        .add_doctor_schedule(DoctorSchedule::new(doctor, 0, hm(9, 0), hm(12, 0), 30, 3).unwrap());

    h.scheduler.schedule(request(doctor, 9, 0, 60)).unwrap();
    h.scheduler.schedule(request(doctor, 9, 30, 30)).unwrap();

    let window = wardplan::models::TimeWindow::new(sunday(9, 45), 10).unwrap();
    assert_eq!(
        h.store
            .count_overlapping_appointments(Resource::Doctor(doctor), &window, None)
            .unwrap(),
        2
    );
}

#[test]
fn room_checked_after_doctor() {
    let h = Hospital::new();
    let doctor = Uuid::new_v4();
    h.store
        .add_doctor_schedule(DoctorSchedule::new(doctor, 0, hm(9, 0), hm(12, 0), 30, 4).unwrap());
    let room = Room::new(Uuid::new_v4(), "Procedure", 1);
    h.store.add_room(room.clone());

    let mut with_room = request(doctor, 9, 0, 30);
    with_room.room_id = Some(room.room_id);
    h.scheduler.schedule(with_room.clone()).unwrap();

    assert_eq!(
        h.scheduler.schedule(with_room),
        Err(SchedulingError::RoomUnavailable {
            room_id: room.room_id
        })
    );

    // A doctor outside hours is reported as such even when the room is also full.
    let mut early = request(doctor, 8, 30, 30);
    early.room_id = Some(room.room_id);
    assert_eq!(
        h.scheduler.schedule(early),
        Err(SchedulingError::DoctorUnavailable { doctor_id: doctor })
    );
}

#[test]
fn concurrent_requests_never_overbook() {
    let h = Arc::new(Hospital::new());
    let doctor = Uuid::new_v4();
    h.store
        .add_doctor_schedule(DoctorSchedule::new(doctor, 0, hm(9, 0), hm(12, 0), 30, 2).unwrap());

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let h = Arc::clone(&h);
            thread::spawn(move || h.scheduler.schedule(request(doctor, 10, 0, 30)))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();
    let booked = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(SchedulingError::DoctorFullyBooked { .. })))
        .count();

    assert_eq!(booked, 2);
    assert_eq!(refused, 10);
    assert_eq!(h.store.appointments().len(), 2);
}
