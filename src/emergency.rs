//! The emergency policy: a discrete level, recomputed once per day from the share of the
//! population that is infectious, that drives remote school and work, capacity limits, social
//! distancing and mask mandates.
//!
//! Levels are derived from configurable prevalence thresholds (5%, 10% and 20% by default). A
//! level that has been raised never falls straight back to zero: when prevalence drops under the
//! first threshold the level settles at [`EmergencyLevel::LOW`] instead.
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::context::{Context, ContextBase};
use crate::define_data_plugin;
use crate::log::{debug, info};
use crate::parameters::ContextParametersExt;
use crate::people::{ContextPeopleExt, ContextPeopleMutExt, InfectionStatus, PersonId};
use crate::routine::ContextRoutineExt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EmergencyLevel(u8);

impl EmergencyLevel {
    pub const NONE: EmergencyLevel = EmergencyLevel(0);
    pub const LOW: EmergencyLevel = EmergencyLevel(1);
    pub const MEDIUM: EmergencyLevel = EmergencyLevel(2);
    pub const HIGH: EmergencyLevel = EmergencyLevel(3);

    pub const ALL: [EmergencyLevel; 4] = [
        EmergencyLevel::NONE,
        EmergencyLevel::LOW,
        EmergencyLevel::MEDIUM,
        EmergencyLevel::HIGH,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Display for EmergencyLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The level called for by `prevalence` (percent infectious), given the level currently in
/// force.
#[must_use]
pub fn compute_emergency_level(
    prevalence: f64,
    thresholds: &[f64; 3],
    current: EmergencyLevel,
) -> EmergencyLevel {
    let crossed = thresholds
        .iter()
        .take_while(|threshold| prevalence >= **threshold)
        .count();
    let level = EmergencyLevel(crossed as u8);
    if level == EmergencyLevel::NONE && current > EmergencyLevel::NONE {
        EmergencyLevel::LOW
    } else {
        level
    }
}

define_data_plugin!(EmergencyPlugin, EmergencyLevel, EmergencyLevel::NONE);

pub trait ContextEmergencyExt {
    fn get_emergency_level(&self) -> EmergencyLevel;

    /// The level the current prevalence calls for, without applying it.
    fn evaluate_emergency_level(&self) -> EmergencyLevel;

    /// Re-evaluates the level. If it changed, every person whose routine is not pinned by a
    /// hospital stay or home isolation gets an active routine re-derived from their default
    /// routine. Returns whether the level changed.
    fn update_emergency_level(&mut self) -> bool;

    /// Forces the level to `level`, regenerating routines if it differs from the current one.
    /// Returns whether the level changed.
    fn set_emergency_level(&mut self, level: EmergencyLevel) -> bool;
}

impl ContextEmergencyExt for Context {
    fn get_emergency_level(&self) -> EmergencyLevel {
        self.try_get_data(EmergencyPlugin)
            .copied()
            .unwrap_or_default()
    }

    fn evaluate_emergency_level(&self) -> EmergencyLevel {
        let prevalence = self.status_prevalence(InfectionStatus::Infectious);
        compute_emergency_level(
            prevalence,
            &self.get_params().policy.emergency_thresholds,
            self.get_emergency_level(),
        )
    }

    fn update_emergency_level(&mut self) -> bool {
        let level = self.evaluate_emergency_level();
        self.set_emergency_level(level)
    }

    fn set_emergency_level(&mut self, level: EmergencyLevel) -> bool {
        let current = self.get_emergency_level();
        if level == current {
            return false;
        }
        info!(
            "day {}: emergency level {current} -> {level}",
            self.get_current_day()
        );
        *self.get_data_mut(EmergencyPlugin) = level;

        let mut regenerated = 0;
        for index in 0..self.get_current_population() {
            let person_id = PersonId(index);
            let person = self.get_person(person_id);
            if person.has_pinned_routine() {
                continue;
            }
            let routine =
                self.derive_routine(person.default_routine(), person.household(), level);
            if self.get_person_mut(person_id).set_active_routine(routine) {
                regenerated += 1;
            }
        }
        debug!("{regenerated} routines changed under emergency level {level}");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::parameters::Params;
    use crate::people::{AgeGroup, PersonFactors};
    use crate::routine::Routine;
    use crate::town::{ContextTownExt, LocationCategory, LocationRef};

    const THRESHOLDS: [f64; 3] = [5.0, 10.0, 20.0];

    #[test]
    fn level_from_prevalence() {
        let none = EmergencyLevel::NONE;
        assert_eq!(compute_emergency_level(0.0, &THRESHOLDS, none), none);
        assert_eq!(compute_emergency_level(4.99, &THRESHOLDS, none), none);
        assert_eq!(
            compute_emergency_level(5.0, &THRESHOLDS, none),
            EmergencyLevel::LOW
        );
        assert_eq!(
            compute_emergency_level(10.0, &THRESHOLDS, none),
            EmergencyLevel::MEDIUM
        );
        assert_eq!(
            compute_emergency_level(19.99, &THRESHOLDS, none),
            EmergencyLevel::MEDIUM
        );
        assert_eq!(
            compute_emergency_level(20.0, &THRESHOLDS, none),
            EmergencyLevel::HIGH
        );
        assert_eq!(
            compute_emergency_level(100.0, &THRESHOLDS, none),
            EmergencyLevel::HIGH
        );
    }

    #[test]
    fn never_falls_straight_to_zero() {
        for current in [
            EmergencyLevel::LOW,
            EmergencyLevel::MEDIUM,
            EmergencyLevel::HIGH,
        ] {
            assert_eq!(
                compute_emergency_level(0.0, &THRESHOLDS, current),
                EmergencyLevel::LOW
            );
        }
        // Higher levels can still come down to medium directly.
        assert_eq!(
            compute_emergency_level(12.0, &THRESHOLDS, EmergencyLevel::HIGH),
            EmergencyLevel::MEDIUM
        );
    }

    #[test]
    fn level_ordering_and_display() {
        assert!(EmergencyLevel::LOW < EmergencyLevel::MEDIUM);
        assert_eq!(EmergencyLevel::HIGH.index(), 3);
        assert_eq!(EmergencyLevel::MEDIUM.to_string(), "2");
        assert_eq!(serde_json::to_string(&EmergencyLevel::HIGH).unwrap(), "3");
    }

    fn worker_context() -> Context {
        let mut context = Context::new();
        context
            .init_parameters(Params {
                population: 4,
                ..Params::default()
            })
            .unwrap();
        context.init_town(4).unwrap();
        for household in 0..4 {
            let mut routine = Routine::filled(LocationRef::house(household));
            routine.set_block(9..18, LocationRef::new(LocationCategory::Workplace, 0));
            context.add_person(
                household,
                AgeGroup::Adult,
                PersonFactors {
                    health: 1.0,
                    hygiene: 1.0,
                    legality: 1.0,
                },
                routine,
            );
        }
        context
    }

    #[test]
    fn raising_level_sends_workers_home() {
        let mut context = worker_context();
        assert_eq!(context.get_emergency_level(), EmergencyLevel::NONE);

        assert!(context.set_emergency_level(EmergencyLevel::HIGH));
        for person in context.people() {
            assert_eq!(
                *person.active_routine(),
                Routine::filled(LocationRef::house(person.household()))
            );
            assert_eq!(
                person.default_routine().at(10).category,
                LocationCategory::Workplace
            );
        }

        assert!(context.set_emergency_level(EmergencyLevel::LOW));
        for person in context.people() {
            assert_eq!(person.active_routine(), person.default_routine());
        }
    }

    #[test]
    fn pinned_routines_are_left_alone() {
        let mut context = worker_context();
        let hospital = Routine::filled(LocationRef::hospital());
        let person = context.get_person_mut(PersonId(1));
        person.set_hospitalized(true);
        person.set_active_routine(hospital);

        context.set_emergency_level(EmergencyLevel::HIGH);
        assert_eq!(*context.get_person(PersonId(1)).active_routine(), hospital);
    }

    #[test]
    fn unchanged_level_is_a_noop() {
        let mut context = worker_context();
        context.set_emergency_level(EmergencyLevel::MEDIUM);
        let routines: Vec<Routine> = context
            .people()
            .iter()
            .map(|person| *person.active_routine())
            .collect();

        assert!(!context.set_emergency_level(EmergencyLevel::MEDIUM));
        let after: Vec<Routine> = context
            .people()
            .iter()
            .map(|person| *person.active_routine())
            .collect();
        assert_eq!(routines, after);
    }

    #[test]
    fn update_follows_prevalence() {
        let mut context = worker_context();
        // No one is infectious: the level stays at zero.
        assert!(!context.update_emergency_level());

        context.set_infection_status(PersonId(0), InfectionStatus::Infectious);
        assert_eq!(context.evaluate_emergency_level(), EmergencyLevel::HIGH);
        assert!(context.update_emergency_level());
        assert_eq!(context.get_emergency_level(), EmergencyLevel::HIGH);

        context.set_infection_status(PersonId(0), InfectionStatus::Recovered);
        assert!(context.update_emergency_level());
        assert_eq!(context.get_emergency_level(), EmergencyLevel::LOW);
    }

    #[test]
    fn thresholds_apply_to_unrounded_prevalence() {
        let population = 25_000;
        let mut context = Context::new();
        context
            .init_parameters(Params {
                population,
                ..Params::default()
            })
            .unwrap();
        let factors = PersonFactors {
            health: 1.0,
            hygiene: 1.0,
            legality: 1.0,
        };
        for household in 0..population {
            context.add_person(
                household,
                AgeGroup::Adult,
                factors,
                Routine::filled(LocationRef::house(household)),
            );
        }
        for index in 0..1249 {
            context.set_infection_status(PersonId(index), InfectionStatus::Infectious);
        }

        // 4.996% reports as 5.00 but is still below the first threshold.
        assert_almost_eq!(
            context.status_percentage(InfectionStatus::Infectious),
            5.0,
            1e-12
        );
        assert_eq!(context.evaluate_emergency_level(), EmergencyLevel::NONE);

        context.set_infection_status(PersonId(1249), InfectionStatus::Infectious);
        assert_eq!(context.evaluate_emergency_level(), EmergencyLevel::LOW);
    }
}
