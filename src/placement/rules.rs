//! Named scoring rules for ward and bed placement.
//!
//! Each rule is a predicate plus a weight. A score is the sum of the
//! weights of the rules whose predicate holds, and the hits are kept so a
//! placement can be explained rule by rule.

use crate::config::PlacementWeights;
use crate::models::{CareRequirement, RoomClass, WardRoomClassAssignment};

pub struct ScoringRule<C> {
    pub name: &'static str,
    pub applies: fn(&C) -> bool,
    pub weight: fn(&C, &PlacementWeights) -> i64,
}

impl<C> ScoringRule<C> {
    pub fn evaluate(&self, ctx: &C, weights: &PlacementWeights) -> Option<RuleHit> {
        (self.applies)(ctx).then(|| RuleHit {
            rule: self.name,
            points: (self.weight)(ctx, weights),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub rule: &'static str,
    pub points: i64,
}

/// Total score plus the rules that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreCard {
    pub total: i64,
    pub hits: Vec<RuleHit>,
}

impl ScoreCard {
    pub fn apply<C>(&mut self, rules: &[ScoringRule<C>], ctx: &C, weights: &PlacementWeights) {
        for hit in rules.iter().filter_map(|rule| rule.evaluate(ctx, weights)) {
            self.total += hit.points;
            self.hits.push(hit);
        }
    }

    pub fn points_for(&self, rule: &str) -> i64 {
        self.hits
            .iter()
            .filter(|hit| hit.rule == rule)
            .map(|hit| hit.points)
            .sum()
    }
}

/// Ward-level facts.
pub struct WardContext<'a> {
    pub requirement: &'a CareRequirement,
    pub preferred_class: Option<&'a RoomClass>,
    /// Available beds in the preferred class; 0 without one.
    pub preferred_class_beds: u32,
    /// Available beds across the whole ward.
    pub available_beds: u32,
}

/// Facts for one active ward/room-class assignment.
pub struct AssignmentContext<'a> {
    pub requirement: &'a CareRequirement,
    pub assignment: &'a WardRoomClassAssignment,
    pub room_class: &'a RoomClass,
    pub ward_available_beds: u32,
}

pub struct BedContext<'a> {
    pub requirement: &'a CareRequirement,
    pub room_class: &'a RoomClass,
    pub is_preferred_class: bool,
}

pub fn ward_rules<'a>() -> Vec<ScoringRule<WardContext<'a>>> {
    vec![
        ScoringRule {
            name: "preferred_class_care_level",
            applies: |c| {
                c.preferred_class
                    .map_or(false, |class| class.matches_care_level(c.requirement.care_level()))
            },
            weight: |_, w| w.preferred_care_level,
        },
        ScoringRule {
            name: "preferred_class_specialty",
            applies: |c| {
                c.preferred_class
                    .map_or(false, |class| class.matches_specialty(c.requirement.specialty()))
            },
            weight: |_, w| w.preferred_specialty,
        },
        ScoringRule {
            name: "preferred_class_has_bed",
            applies: |c| c.preferred_class.is_some() && c.preferred_class_beds > 0,
            weight: |_, w| w.preferred_class_has_bed,
        },
        ScoringRule {
            name: "ward_has_bed",
            applies: |c| c.available_beds > 0,
            weight: |_, w| w.ward_has_bed,
        },
    ]
}

pub fn assignment_rules<'a>() -> Vec<ScoringRule<AssignmentContext<'a>>> {
    vec![
        ScoringRule {
            name: "assignment_priority",
            applies: |_| true,
            weight: |c, _| c.assignment.priority,
        },
        ScoringRule {
            name: "assignment_care_level",
            applies: |c| c.room_class.matches_care_level(c.requirement.care_level()),
            weight: |_, w| w.assignment_care_level,
        },
        ScoringRule {
            name: "assignment_specialty",
            applies: |c| c.room_class.matches_specialty(c.requirement.specialty()),
            weight: |_, w| w.assignment_specialty,
        },
        // A min_capacity of 0 counts as met, so an unbounded row still earns this.
        ScoringRule {
            name: "assignment_min_capacity",
            applies: |c| c.ward_available_beds >= c.assignment.min_capacity,
            weight: |_, w| w.assignment_min_capacity,
        },
        ScoringRule {
            name: "assignment_max_capacity",
            applies: |c| {
                c.assignment
                    .max_capacity
                    .map_or(false, |max| c.ward_available_beds <= max)
            },
            weight: |_, w| w.assignment_max_capacity,
        },
    ]
}

pub fn bed_rules<'a>() -> Vec<ScoringRule<BedContext<'a>>> {
    vec![
        ScoringRule {
            name: "bed_care_level",
            applies: |c| c.room_class.matches_care_level(c.requirement.care_level()),
            weight: |_, w| w.bed_care_level,
        },
        ScoringRule {
            name: "bed_specialty",
            applies: |c| c.room_class.matches_specialty(c.requirement.specialty()),
            weight: |_, w| w.bed_specialty,
        },
        ScoringRule {
            name: "bed_preferred_class",
            applies: |c| c.is_preferred_class,
            weight: |_, w| w.bed_preferred_class,
        },
    ]
}
