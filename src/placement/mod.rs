//! Inpatient ward and bed placement.
//!
//! [`PlacementScorer`] ranks wards and beds with the rule tables in
//! [`rules`]; [`PlacementEngine`] turns the ranking into one decision.

mod engine;
pub mod rules;
mod scorer;

pub use engine::{Placement, PlacementEngine, PlacementReport};
pub use rules::{RuleHit, ScoreCard};
pub use scorer::{BedScore, PlacementScorer, WardScore};
