use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::rules::{
    assignment_rules, bed_rules, ward_rules, AssignmentContext, BedContext, ScoreCard,
    WardContext,
};
use crate::config::PlacementWeights;
use crate::error::StorageError;
use crate::models::{AvailableBed, CareRequirement, RoomClass, Ward, WardRoomClassAssignment};
use crate::store::SchedulingStore;

#[derive(Debug, Clone, PartialEq)]
pub struct WardScore {
    pub ward: Ward,
    pub card: ScoreCard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BedScore {
    pub bed: AvailableBed,
    pub card: ScoreCard,
}

/// Scores wards and beds against a care requirement.
pub struct PlacementScorer<S> {
    store: Arc<S>,
    weights: PlacementWeights,
}

impl<S: SchedulingStore> PlacementScorer<S> {
    pub fn new(store: Arc<S>, weights: PlacementWeights) -> Self {
        Self { store, weights }
    }

    fn room_class_cached(
        &self,
        cache: &mut HashMap<Uuid, Option<RoomClass>>,
        room_class_id: Uuid,
    ) -> Result<Option<RoomClass>, StorageError> {
        if let Some(hit) = cache.get(&room_class_id) {
            return Ok(hit.clone());
        }
        let class = self.store.room_class(room_class_id)?;
        cache.insert(room_class_id, class.clone());
        Ok(class)
    }

    fn score_ward(
        &self,
        ward: &Ward,
        requirement: &CareRequirement,
        assignments: &[WardRoomClassAssignment],
        classes: &mut HashMap<Uuid, Option<RoomClass>>,
    ) -> Result<ScoreCard, StorageError> {
        let preferred_class = match ward.preferred_room_class_id {
            Some(id) => self.room_class_cached(classes, id)?,
            None => None,
        };
        let preferred_class_beds = match &preferred_class {
            Some(class) => self
                .store
                .count_available_beds(ward.ward_id, Some(class.room_class_id))?,
            None => 0,
        };
        let available_beds = self.store.count_available_beds(ward.ward_id, None)?;

        let mut card = ScoreCard::default();
        card.apply(
            &ward_rules(),
            &WardContext {
                requirement,
                preferred_class: preferred_class.as_ref(),
                preferred_class_beds,
                available_beds,
            },
            &self.weights,
        );

        for assignment in assignments {
            // Assignments pointing at a missing class contribute nothing.
            let Some(room_class) = self.room_class_cached(classes, assignment.room_class_id)?
            else {
                continue;
            };
            card.apply(
                &assignment_rules(),
                &AssignmentContext {
                    requirement,
                    assignment,
                    room_class: &room_class,
                    ward_available_beds: available_beds,
                },
                &self.weights,
            );
        }

        Ok(card)
    }

    /// Score every active ward, drop those at or below zero, best first.
    ///
    /// Equal scores fall back to ward code, then ward id.
    pub fn rank_wards(
        &self,
        requirement: &CareRequirement,
    ) -> Result<Vec<WardScore>, StorageError> {
        let wards = self.store.active_wards()?;

        let mut by_ward: HashMap<Uuid, Vec<WardRoomClassAssignment>> = HashMap::new();
        for assignment in self.store.active_assignments()? {
            by_ward
                .entry(assignment.ward_id)
                .or_default()
                .push(assignment);
        }

        let mut classes = HashMap::new();
        let mut ranked = Vec::with_capacity(wards.len());
        for ward in wards {
            let assignments = by_ward.get(&ward.ward_id).map(Vec::as_slice).unwrap_or(&[]);
            let card = self.score_ward(&ward, requirement, assignments, &mut classes)?;
            debug!(ward = %ward.code, score = card.total, "ward scored");
            if card.total > 0 {
                ranked.push(WardScore { ward, card });
            }
        }

        ranked.sort_by(|a, b| {
            b.card
                .total
                .cmp(&a.card.total)
                .then_with(|| a.ward.code.cmp(&b.ward.code))
                .then_with(|| a.ward.ward_id.cmp(&b.ward.ward_id))
        });
        Ok(ranked)
    }

    pub fn best_ward(
        &self,
        requirement: &CareRequirement,
    ) -> Result<Option<WardScore>, StorageError> {
        Ok(self.rank_wards(requirement)?.into_iter().next())
    }

    /// Score the available beds of one ward, best first.
    ///
    /// A bed whose room class cannot be found still ranks, with score zero.
    pub fn rank_beds(
        &self,
        ward: &Ward,
        requirement: &CareRequirement,
    ) -> Result<Vec<BedScore>, StorageError> {
        let mut classes = HashMap::new();
        let mut ranked = Vec::new();

        for candidate in self.store.available_beds(ward.ward_id)? {
            let mut card = ScoreCard::default();
            if let Some(room_class) =
                self.room_class_cached(&mut classes, candidate.room.room_class_id)?
            {
                card.apply(
                    &bed_rules(),
                    &BedContext {
                        requirement,
                        room_class: &room_class,
                        is_preferred_class: ward.preferred_room_class_id
                            == Some(room_class.room_class_id),
                    },
                    &self.weights,
                );
            }
            ranked.push(BedScore {
                bed: candidate,
                card,
            });
        }

        ranked.sort_by(|a, b| {
            b.card
                .total
                .cmp(&a.card.total)
                .then_with(|| a.bed.bed.code.cmp(&b.bed.bed.code))
                .then_with(|| a.bed.bed.bed_id.cmp(&b.bed.bed.bed_id))
        });
        Ok(ranked)
    }
}
