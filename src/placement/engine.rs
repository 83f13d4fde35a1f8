use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::rules::ScoreCard;
use super::scorer::{BedScore, PlacementScorer, WardScore};
use crate::config::PlacementWeights;
use crate::error::{Result, SchedulingError};
use crate::models::{AvailableBed, CareRequirement, Ward};
use crate::store::SchedulingStore;

/// The chosen ward and bed for a patient.
///
/// This is advisory: occupancy may change before the caller commits an
/// admission, which is why `AssignBed` re-checks the bed at write time.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub patient_id: Uuid,
    pub ward: Ward,
    pub bed: AvailableBed,
    pub ward_score: ScoreCard,
    pub bed_score: ScoreCard,
}

/// Full ranking behind a placement decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementReport {
    pub wards: Vec<WardScore>,
    /// Beds of the top-ranked ward only.
    pub beds: Vec<BedScore>,
}

pub struct PlacementEngine<S> {
    scorer: PlacementScorer<S>,
}

impl<S: SchedulingStore> PlacementEngine<S> {
    pub fn new(store: Arc<S>, weights: PlacementWeights) -> Self {
        Self {
            scorer: PlacementScorer::new(store, weights),
        }
    }

    /// Pick the best ward, then the best bed within it.
    ///
    /// If the top ward has no free bed the request fails; the next-ranked
    /// ward is not tried.
    pub fn place(&self, patient_id: Uuid, requirement: &CareRequirement) -> Result<Placement> {
        let Some(best) = self.scorer.best_ward(requirement)? else {
            debug!(patient_id = %patient_id, "no ward scored above zero");
            return Err(SchedulingError::PlacementNotFound);
        };

        let Some(top_bed) = self
            .scorer
            .rank_beds(&best.ward, requirement)?
            .into_iter()
            .next()
        else {
            debug!(patient_id = %patient_id, ward = %best.ward.code, "top ward has no free bed");
            return Err(SchedulingError::PlacementNotFound);
        };

        info!(
            patient_id = %patient_id,
            ward = %best.ward.code,
            bed = %top_bed.bed.bed.code,
            ward_score = best.card.total,
            bed_score = top_bed.card.total,
            "placement found"
        );
        Ok(Placement {
            patient_id,
            ward: best.ward,
            bed: top_bed.bed,
            ward_score: best.card,
            bed_score: top_bed.card,
        })
    }

    /// Rank everything `place` would look at, without choosing.
    pub fn explain(&self, requirement: &CareRequirement) -> Result<PlacementReport> {
        let wards = self.scorer.rank_wards(requirement)?;
        let beds = match wards.first() {
            Some(top) => self.scorer.rank_beds(&top.ward, requirement)?,
            None => Vec::new(),
        };
        Ok(PlacementReport { wards, beds })
    }
}
