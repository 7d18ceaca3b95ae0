//! Contacts and transmission within a location.
//!
//! Each hour every infectious person meets a number of the other occupants of the location
//! they are in:
//!
//! `contacts = ceil(expected_interactions[hour] * (1 - step * level) * legality)`
//!
//! sampled without replacement, or everyone present if there are not that many. A susceptible
//! contact is infected with probability
//!
//! `r0 / (daily_interactions * D) * hygiene(infected) * hygiene(contact)`
//!
//! further multiplied by the mask multiplier for each participant who wears a mask. Masks are
//! worn where the emergency level mandates them, always by people with a legality factor of at
//! least 1 and otherwise with probability equal to the legality factor.
//!
//! The people who are infectious at the start of the hour are the ones who transmit; anyone
//! infected during the hour starts transmitting the next hour.
use serde::{Deserialize, Serialize};

use crate::context::{Context, ContextBase};
use crate::define_data_plugin;
use crate::define_rng;
use crate::emergency::{ContextEmergencyExt, EmergencyLevel};
use crate::infection_manager::ContextInfectionExt;
use crate::log::trace;
use crate::occupancy::ContextOccupancyExt;
use crate::parameters::ContextParametersExt;
use crate::people::{ContextPeopleExt, InfectionStatus, Person, PersonId};
use crate::rand::Rng;
use crate::random::ContextRandomExt;
use crate::report::{define_report, ContextReportExt};
use crate::town::{ContextTownExt, LocationCategory};

define_rng!(TransmissionRng);

/// One row of the incidence report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionEvent {
    pub day: usize,
    pub hour: usize,
    pub source: PersonId,
    pub target: PersonId,
    pub location_category: LocationCategory,
    pub location_id: usize,
}

define_report!(TransmissionEvent);

define_data_plugin!(
    TransmissionPlugin,
    [usize; LocationCategory::COUNT],
    [0; LocationCategory::COUNT]
);

/// How many people an infectious person meets this hour.
#[must_use]
pub fn contact_count(
    expected_interactions: f64,
    level: EmergencyLevel,
    social_distancing_step: f64,
    legality: f64,
) -> usize {
    let distancing = (1.0 - social_distancing_step * f64::from(level.value())).max(0.0);
    (expected_interactions * distancing * legality).ceil() as usize
}

/// Chance of transmission between `infected` and `contact` before masks. Zero when the
/// infected person has no expected contacts at all.
#[must_use]
pub fn base_transmission_chance(
    r0: f64,
    infectious_duration_days: usize,
    infected: &Person,
    contact: &Person,
) -> f64 {
    let total_interactions = infected.daily_interactions() * infectious_duration_days as f64;
    if total_interactions <= 0.0 {
        return 0.0;
    }
    r0 / total_interactions * infected.factors().hygiene * contact.factors().hygiene
}

pub trait ContextTransmissionExt {
    /// Whether `person_id` wears a mask at a location of `category` right now.
    fn wears_mask(&self, person_id: PersonId, category: LocationCategory) -> bool;

    /// Chance that `source` infects `target` during a contact at a location of `category`,
    /// with a mask draw for the source and then the target.
    fn transmission_chance(
        &self,
        source: PersonId,
        target: PersonId,
        category: LocationCategory,
    ) -> f64;

    /// Runs one hour of contacts for everyone infectious at the start of the hour. Returns the
    /// people newly infected.
    fn run_transmission(&mut self) -> Vec<PersonId>;

    /// Transmissions so far, indexed by `LocationCategory::index()`.
    fn infections_by_location(&self) -> [usize; LocationCategory::COUNT];
}

impl ContextTransmissionExt for Context {
    fn wears_mask(&self, person_id: PersonId, category: LocationCategory) -> bool {
        if !category.requires_mask(self.get_emergency_level()) {
            return false;
        }
        let legality = self.get_person(person_id).factors().legality;
        legality >= 1.0 || self.sample_bool(TransmissionRng, legality)
    }

    fn transmission_chance(
        &self,
        source: PersonId,
        target: PersonId,
        category: LocationCategory,
    ) -> f64 {
        let params = self.get_params();
        let mask_multiplier = params.policy.mask_transmission_multiplier;
        let mut chance = base_transmission_chance(
            params.r0,
            params.infectious_duration_days,
            self.get_person(source),
            self.get_person(target),
        );
        if self.wears_mask(source, category) {
            chance *= mask_multiplier;
        }
        if self.wears_mask(target, category) {
            chance *= mask_multiplier;
        }
        chance
    }

    fn run_transmission(&mut self) -> Vec<PersonId> {
        let day = self.get_current_day();
        let hour = self.get_current_hour();
        let level = self.get_emergency_level();
        let distancing_step = self.get_params().policy.social_distancing_step;

        let infectious = self.people_with_status(InfectionStatus::Infectious).to_vec();
        let mut infected = Vec::new();
        for source in infectious {
            let Some(location) = self.current_location(source) else {
                continue;
            };
            let others: Vec<PersonId> = self
                .get_town()
                .location(location)
                .occupants()
                .iter()
                .copied()
                .filter(|occupant| *occupant != source)
                .collect();
            if others.is_empty() {
                continue;
            }

            let person = self.get_person(source);
            let wanted = contact_count(
                person.interactions()[hour],
                level,
                distancing_step,
                person.factors().legality,
            );
            let contacts = if others.len() > wanted {
                self.sample_without_replacement(TransmissionRng, &others, wanted)
            } else {
                others
            };

            for target in contacts {
                if self.get_infection_status(target) != InfectionStatus::Susceptible {
                    continue;
                }
                let chance = self.transmission_chance(source, target, location.category);
                let draw: f64 = self.sample(TransmissionRng, |rng| rng.random());
                if chance > 0.0 && draw <= chance && self.infect(target) {
                    trace!("day {day} hour {hour}: {source:?} infected {target:?} at {location}");
                    self.get_data_mut(TransmissionPlugin)[location.category.index()] += 1;
                    self.send_report(TransmissionEvent {
                        day,
                        hour,
                        source,
                        target,
                        location_category: location.category,
                        location_id: location.id,
                    });
                    infected.push(target);
                }
            }
        }
        infected
    }

    fn infections_by_location(&self) -> [usize; LocationCategory::COUNT] {
        self.try_get_data(TransmissionPlugin)
            .copied()
            .unwrap_or([0; LocationCategory::COUNT])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::infection_manager;
    use crate::parameters::{ModelType, Params, PolicyParams};
    use crate::people::{AgeGroup, PersonFactors};
    use crate::routine::Routine;
    use crate::town::LocationRef;

    fn person(hygiene: f64, legality: f64, routine: Routine) -> Person {
        Person::new(
            PersonId(0),
            0,
            AgeGroup::Adult,
            PersonFactors {
                health: 1.0,
                hygiene,
                legality,
            },
            routine,
        )
    }

    #[test]
    fn contact_counts() {
        assert_eq!(contact_count(8.0, EmergencyLevel::NONE, 0.2, 1.0), 8);
        assert_eq!(contact_count(0.448, EmergencyLevel::NONE, 0.2, 1.0), 1);
        // 10 * 0.6 * 0.5 = 3
        assert_eq!(contact_count(10.0, EmergencyLevel::MEDIUM, 0.2, 0.5), 3);
        assert_eq!(contact_count(0.0, EmergencyLevel::NONE, 0.2, 2.0), 0);
        assert_eq!(contact_count(5.0, EmergencyLevel::HIGH, 0.5, 1.0), 0);
    }

    #[test]
    fn transmission_chance() {
        let at_home = Routine::filled(LocationRef::house(0));
        let infected = person(2.0, 1.0, at_home);
        let contact = person(0.5, 1.0, at_home);
        // 24 * 0.448 = 10.752 interactions a day, over 5 days.
        assert_almost_eq!(
            base_transmission_chance(2.0, 5, &infected, &contact),
            2.0 / (10.752 * 5.0),
            1e-12
        );
    }

    #[test]
    fn no_interactions_means_no_transmission() {
        let hospital = Routine::filled(LocationRef::hospital());
        let infected = person(1.0, 1.0, hospital);
        let contact = person(1.0, 1.0, hospital);
        assert_eq!(base_transmission_chance(3.0, 5, &infected, &contact), 0.0);
    }

    // Everyone shares one workplace at hour 10; person 0 is infectious.
    fn office(size: usize, r0: f64, hygiene: f64, legality: f64) -> Context {
        let mut context = Context::new();
        context
            .init_parameters(Params {
                population: size,
                r0,
                infectious_duration_days: 1,
                model_type: ModelType::SIR,
                policy: PolicyParams {
                    hospitalization_base_rate: 0.0,
                    ..PolicyParams::default()
                },
                ..Params::default()
            })
            .unwrap();
        context.init_town(size).unwrap();
        infection_manager::init(&mut context).unwrap();
        for household in 0..size {
            let mut routine = Routine::filled(LocationRef::house(household));
            routine.set(10, LocationRef::new(LocationCategory::Workplace, 0));
            context.add_person(
                household,
                AgeGroup::Adult,
                PersonFactors {
                    health: 1.0,
                    hygiene,
                    legality,
                },
                routine,
            );
        }
        context.infect(PersonId(0));
        context.set_current_hour(10);
        context.update_occupancy();
        context
    }

    #[test]
    fn certain_transmission_reaches_sampled_contacts() {
        // The chance is far above 1, so every susceptible contact is infected.
        let mut context = office(20, 1000.0, 1.0, 1.0);
        let infected = context.run_transmission();
        // Workplace expects 8 contacts an hour.
        assert_eq!(infected.len(), 8);
        assert_eq!(context.count_status(InfectionStatus::Infectious), 9);
        assert_eq!(
            context.infections_by_location()[LocationCategory::Workplace.index()],
            8
        );
        context.check_conservation().unwrap();
    }

    #[test]
    fn small_rooms_meet_everyone() {
        let mut context = office(4, 1000.0, 1.0, 1.0);
        let infected = context.run_transmission();
        assert_eq!(infected.len(), 3);
    }

    #[test]
    fn newly_infected_wait_for_next_hour() {
        let mut context = office(30, 1000.0, 1.0, 1.0);
        let first = context.run_transmission();
        assert_eq!(first.len(), 8);
        // Only the nine infectious at the start of this hour transmit, and each meets at most
        // eight others.
        let second = context.run_transmission();
        assert!(second.len() <= 9 * 8);
        assert_eq!(
            context.count_status(InfectionStatus::Infectious),
            9 + second.len()
        );
    }

    #[test]
    fn zero_chance_infects_nobody() {
        let mut context = office(10, 1e-300, 1e-150, 1.0);
        assert!(context.run_transmission().is_empty());
        assert_eq!(context.infections_by_location(), [0; LocationCategory::COUNT]);
    }

    #[test]
    fn people_alone_infect_nobody() {
        let mut context = office(3, 1000.0, 1.0, 1.0);
        context.set_current_hour(2);
        context.update_occupancy();
        assert!(context.run_transmission().is_empty());
    }

    #[test]
    fn masks_follow_mandate_and_legality() {
        let mut context = office(3, 1.0, 1.0, 1.0);
        assert!(!context.wears_mask(PersonId(0), LocationCategory::Workplace));
        context.set_emergency_level(EmergencyLevel::LOW);
        assert!(context.wears_mask(PersonId(0), LocationCategory::Workplace));
        assert!(!context.wears_mask(PersonId(0), LocationCategory::Outdoors));
        assert!(!context.wears_mask(PersonId(0), LocationCategory::House));
        context.set_emergency_level(EmergencyLevel::MEDIUM);
        assert!(context.wears_mask(PersonId(0), LocationCategory::Outdoors));
    }

    #[test]
    fn masks_scale_the_chance_once_per_wearer() {
        let mut context = office(3, 2.0, 1.0, 1.0);
        let unmasked = context.transmission_chance(
            PersonId(0),
            PersonId(1),
            LocationCategory::Workplace,
        );
        let base = base_transmission_chance(
            2.0,
            1,
            context.get_person(PersonId(0)),
            context.get_person(PersonId(1)),
        );
        assert_almost_eq!(unmasked, base, 1e-12);
        assert!(unmasked > 0.04 && unmasked < 1.0);

        context.set_emergency_level(EmergencyLevel::LOW);
        let masked = context.transmission_chance(
            PersonId(0),
            PersonId(1),
            LocationCategory::Workplace,
        );
        assert_almost_eq!(masked, unmasked * 0.04, 1e-12);
        // No mandate at home.
        assert_almost_eq!(
            context.transmission_chance(PersonId(0), PersonId(1), LocationCategory::House),
            unmasked,
            1e-12
        );
    }

    // 400 coworkers at level 1, the first 100 infectious. Unmasked, each contact has an even
    // chance of transmission.
    fn masked_office(mask_multiplier: f64) -> Context {
        let size = 400;
        let mut context = Context::new();
        context
            .init_parameters(Params {
                population: size,
                // 23 house hours at 0.448 plus one workplace hour at 8.
                r0: 0.5 * 18.304,
                infectious_duration_days: 1,
                model_type: ModelType::SIR,
                policy: PolicyParams {
                    hospitalization_base_rate: 0.0,
                    mask_transmission_multiplier: mask_multiplier,
                    ..PolicyParams::default()
                },
                ..Params::default()
            })
            .unwrap();
        context.init_town(size).unwrap();
        infection_manager::init(&mut context).unwrap();
        for household in 0..size {
            let mut routine = Routine::filled(LocationRef::house(household));
            routine.set(10, LocationRef::new(LocationCategory::Workplace, 0));
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
        for index in 0..100 {
            context.infect(PersonId(index));
        }
        context.set_emergency_level(EmergencyLevel::LOW);
        context.set_current_hour(10);
        context.update_occupancy();
        context
    }

    #[test]
    fn masks_cut_infections() {
        let unmasked = masked_office(1.0).run_transmission().len();
        let masked = masked_office(0.2).run_transmission().len();
        // Expected roughly 175 against 10.
        assert!(unmasked > 100, "unmasked: {unmasked}");
        assert!(masked < 40, "masked: {masked}");
        assert!(masked * 4 < unmasked);
    }

    #[test]
    fn partial_legality_masks_some_of_the_time() {
        let mut context = office(3, 1.0, 1.0, 0.5);
        assert!(!context.wears_mask(PersonId(0), LocationCategory::Workplace));
        context.set_emergency_level(EmergencyLevel::LOW);
        let trials = 4000;
        let masked = (0..trials)
            .filter(|_| context.wears_mask(PersonId(0), LocationCategory::Workplace))
            .count();
        // Two thousand expected, with a standard deviation near 32.
        assert!((1800..=2200).contains(&masked), "masked {masked} of {trials}");
    }

    #[test]
    fn incidence_report_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut context = office(4, 1000.0, 1.0, 1.0);
        context
            .report_options()
            .directory(temp_dir.path().to_path_buf());
        context
            .add_report::<TransmissionEvent>("transmissions")
            .unwrap();
        context.run_transmission();

        let mut reader =
            csv::Reader::from_path(temp_dir.path().join("transmissions.csv")).unwrap();
        let rows: Vec<TransmissionEvent> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row.source, PersonId(0));
            assert_eq!(row.hour, 10);
            assert_eq!(row.location_category, LocationCategory::Workplace);
            assert_eq!(row.location_id, 0);
        }
    }
}
