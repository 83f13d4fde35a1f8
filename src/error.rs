//! Error types returned by the scheduling core.

use uuid::Uuid;

use crate::models::AppointmentStatus;

/// Failure reported by a `SchedulingStore`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A bed occupancy write found the bed already in the target state.
    #[error("bed {bed_id} occupancy changed concurrently")]
    OccupancyConflict { bed_id: Uuid },
    #[error("{entity} {id} does not exist")]
    MissingRow { entity: &'static str, id: Uuid },
    #[error("{entity} {id} already exists")]
    DuplicateRow { entity: &'static str, id: Uuid },
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Outcome of a rejected scheduling, placement or lifecycle request.
///
/// Every variant is an expected result for the caller to present; none of
/// them indicates a bug in the core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("appointment duration must be positive, got {minutes} minutes")]
    InvalidDuration { minutes: i64 },
    #[error("doctor {doctor_id} is not available at the requested time")]
    DoctorUnavailable { doctor_id: Uuid },
    #[error("doctor {doctor_id} is fully booked for the requested slot")]
    DoctorFullyBooked { doctor_id: Uuid },
    #[error("room {room_id} is not available at the requested time")]
    RoomUnavailable { room_id: Uuid },
    #[error("appointment {0} not found")]
    AppointmentNotFound(Uuid),
    #[error("appointment {appointment_id} is {status} and can no longer change")]
    AppointmentClosed {
        appointment_id: Uuid,
        status: AppointmentStatus,
    },
    #[error("no ward or bed satisfies the placement request")]
    PlacementNotFound,
    #[error("bed {0} not found")]
    BedNotFound(Uuid),
    #[error("bed {0} is out of service")]
    BedInactive(Uuid),
    #[error("bed {0} is already occupied")]
    BedAlreadyOccupied(Uuid),
    #[error("destination bed {0} is occupied")]
    DestinationOccupied(Uuid),
    #[error("source and destination bed are the same")]
    SameBed,
    #[error("no active admission found")]
    NoActiveAdmission,
    #[error("patient {0} already has an active admission")]
    PatientAlreadyAdmitted(Uuid),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T, E = SchedulingError> = std::result::Result<T, E>;
