//! Appointment scheduling and inpatient bed placement.
//!
//! The crate is library-shaped: callers construct an [`AppointmentScheduler`]
//! and an [`AdmissionManager`] over a shared [`SchedulingStore`] and
//! [`ResourceLocks`], and receive either a record or a [`SchedulingError`].

pub mod admission;
pub mod calendar;
pub mod config;
pub mod conflict;
pub mod error;
pub mod locks;
pub mod models;
pub mod placement;
pub mod scheduler;
pub mod store;

pub use admission::AdmissionManager;
pub use config::{PlacementWeights, SchedulingConfig};
pub use error::{SchedulingError, StorageError};
pub use locks::ResourceLocks;
pub use placement::{Placement, PlacementEngine};
pub use scheduler::AppointmentScheduler;
pub use store::{MemoryStore, SchedulingStore};
