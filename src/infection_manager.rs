//! The epidemic state machine.
//!
//! `Susceptible -> Infectious -> Recovered` under SIR, or back to `Susceptible` under SIS, plus
//! an orthogonal hospitalization flag. Infecting someone queues their recovery for
//! `day + D + 1` (D being the infectious period) and, with probability
//! `hospitalization_base_rate * health_factor`, a hospital admission for `day + ceil(D / 3)`.
//! Both queues are drained once per day after the hourly loop, recoveries first.
//!
//! An admission when the hospital is already at capacity sends the person home instead: they
//! stay home-isolated until they recover.
use crate::context::{Context, ContextBase};
use crate::define_data_plugin;
use crate::define_rng;
use crate::emergency::ContextEmergencyExt;
use crate::error::EpiError;
use crate::event_log::EventLog;
use crate::log::{debug, trace};
use crate::parameters::{ContextParametersExt, ModelType};
use crate::people::{ContextPeopleExt, ContextPeopleMutExt, InfectionStatus, PersonId};
use crate::random::ContextRandomExt;
use crate::routine::{ContextRoutineExt, Routine};
use crate::town::LocationRef;

define_rng!(InfectionRng);
define_rng!(SeedingRng);

struct InfectionData {
    recoveries: EventLog,
    hospitalizations: EventLog,
    hospitalized: usize,
    turned_away: usize,
}

define_data_plugin!(
    InfectionPlugin,
    InfectionData,
    InfectionData {
        recoveries: EventLog::default(),
        hospitalizations: EventLog::default(),
        hospitalized: 0,
        turned_away: 0,
    }
);

/// Sizes the event logs to cover every day an event can be scheduled on.
///
/// # Errors
///
/// Returns an `EpiError` if the logs were already sized.
pub fn init(context: &mut Context) -> Result<(), EpiError> {
    let params = context.get_params();
    let days = params.simulation_days + params.infectious_duration_days + 2;
    let data = context.get_data_mut(InfectionPlugin);
    if data.recoveries.capacity() > 0 {
        return Err(EpiError::EpiError(
            "infection manager already initialized".to_string(),
        ));
    }
    data.recoveries = EventLog::with_days(days);
    data.hospitalizations = EventLog::with_days(days);
    trace!("infection event logs cover {days} days");
    Ok(())
}

pub trait ContextInfectionExt {
    /// Makes a susceptible person infectious on the current day and queues their recovery and
    /// possible hospitalization. Returns `false`, doing nothing, if the person is not
    /// susceptible.
    fn infect(&mut self, person_id: PersonId) -> bool;

    /// Infects the configured starting share of the population, chosen uniformly without
    /// replacement.
    fn seed_infections(&mut self) -> Vec<PersonId>;

    /// Ends a person's infection: they become recovered (SIR) or susceptible again (SIS). A
    /// person who was hospitalized or isolated at home gets a routine derived from their
    /// default routine under the current emergency level. Does nothing for a person who is not
    /// infectious.
    fn recover(&mut self, person_id: PersonId);

    /// Admits an infectious person to hospital, or isolates them at home when the hospital is
    /// full. Skips people who recovered in the meantime or are already admitted.
    fn hospitalize(&mut self, person_id: PersonId);

    /// Runs every recovery queued for `day`. Returns how many people were processed.
    fn process_recoveries(&mut self, day: usize) -> usize;

    /// Runs every admission queued for `day`. Returns how many people were processed.
    fn process_hospitalizations(&mut self, day: usize) -> usize;

    fn scheduled_recoveries(&self, day: usize) -> &[PersonId];

    fn scheduled_hospitalizations(&self, day: usize) -> &[PersonId];

    /// People currently in hospital.
    fn hospitalized_count(&self) -> usize;

    /// Admissions refused so far because the hospital was full.
    fn turned_away_count(&self) -> usize;
}

impl ContextInfectionExt for Context {
    fn infect(&mut self, person_id: PersonId) -> bool {
        if self.get_infection_status(person_id) != InfectionStatus::Susceptible {
            return false;
        }
        self.set_infection_status(person_id, InfectionStatus::Infectious);

        let day = self.get_current_day();
        let params = self.get_params();
        let duration = params.infectious_duration_days;
        let probability =
            (params.policy.hospitalization_base_rate * self.get_person(person_id).factors().health)
                .min(1.0);
        let hospitalized = self.sample_bool(InfectionRng, probability);

        let data = self.get_data_mut(InfectionPlugin);
        data.recoveries.schedule(day + duration + 1, person_id);
        if hospitalized {
            data.hospitalizations
                .schedule(day + duration.div_ceil(3), person_id);
        }
        trace!(
            "day {day}: {person_id:?} infected{}",
            if hospitalized {
                ", will need hospital care"
            } else {
                ""
            }
        );
        true
    }

    fn seed_infections(&mut self) -> Vec<PersonId> {
        let count = self.get_params().starting_infectious_count();
        let population: Vec<PersonId> = self.people().iter().map(|person| person.id()).collect();
        let seeded = self.sample_without_replacement(SeedingRng, &population, count);
        for person_id in &seeded {
            self.infect(*person_id);
        }
        debug!("seeded {} infections", seeded.len());
        seeded
    }

    fn recover(&mut self, person_id: PersonId) {
        if self.get_infection_status(person_id) != InfectionStatus::Infectious {
            return;
        }
        let status = match self.get_params().model_type {
            ModelType::SIR => InfectionStatus::Recovered,
            ModelType::SIS => InfectionStatus::Susceptible,
        };
        self.set_infection_status(person_id, status);

        let person = self.get_person(person_id);
        if !person.has_pinned_routine() {
            return;
        }
        let was_hospitalized = person.is_hospitalized();
        let routine = self.derive_routine(
            person.default_routine(),
            person.household(),
            self.get_emergency_level(),
        );
        let person = self.get_person_mut(person_id);
        person.set_hospitalized(false);
        person.set_home_isolated(false);
        person.set_active_routine(routine);
        if was_hospitalized {
            self.get_data_mut(InfectionPlugin).hospitalized -= 1;
            debug!("{person_id:?} discharged from hospital");
        }
    }

    fn hospitalize(&mut self, person_id: PersonId) {
        let person = self.get_person(person_id);
        if person.has_pinned_routine()
            || self.get_infection_status(person_id) != InfectionStatus::Infectious
        {
            return;
        }
        let household = person.household();
        let capacity = self.get_params().policy.hospital_capacity;
        let data = self.get_data_mut(InfectionPlugin);
        if data.hospitalized >= capacity {
            data.turned_away += 1;
            let person = self.get_person_mut(person_id);
            person.set_home_isolated(true);
            person.set_active_routine(Routine::filled(LocationRef::house(household)));
            debug!("hospital full: {person_id:?} isolated at home");
        } else {
            data.hospitalized += 1;
            let person = self.get_person_mut(person_id);
            person.set_hospitalized(true);
            person.set_active_routine(Routine::filled(LocationRef::hospital()));
            debug!("{person_id:?} admitted to hospital");
        }
    }

    fn process_recoveries(&mut self, day: usize) -> usize {
        let due = self.get_data_mut(InfectionPlugin).recoveries.take(day);
        for person_id in &due {
            self.recover(*person_id);
        }
        due.len()
    }

    fn process_hospitalizations(&mut self, day: usize) -> usize {
        let due = self.get_data_mut(InfectionPlugin).hospitalizations.take(day);
        for person_id in &due {
            self.hospitalize(*person_id);
        }
        due.len()
    }

    fn scheduled_recoveries(&self, day: usize) -> &[PersonId] {
        self.try_get_data(InfectionPlugin)
            .map(|data| data.recoveries.pending(day))
            .unwrap_or_default()
    }

    fn scheduled_hospitalizations(&self, day: usize) -> &[PersonId] {
        self.try_get_data(InfectionPlugin)
            .map(|data| data.hospitalizations.pending(day))
            .unwrap_or_default()
    }

    fn hospitalized_count(&self) -> usize {
        self.try_get_data(InfectionPlugin)
            .map_or(0, |data| data.hospitalized)
    }

    fn turned_away_count(&self) -> usize {
        self.try_get_data(InfectionPlugin)
            .map_or(0, |data| data.turned_away)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emergency::EmergencyLevel;
    use crate::parameters::{Params, PolicyParams};
    use crate::people::{AgeGroup, PersonFactors};
    use crate::town::{ContextTownExt, LocationCategory};

    fn setup(size: usize, model_type: ModelType, policy: PolicyParams) -> Context {
        let mut context = Context::new();
        context
            .init_parameters(Params {
                population: size,
                starting_infectious_percentage: 20.0,
                infectious_duration_days: 5,
                simulation_days: 10,
                model_type,
                policy,
                ..Params::default()
            })
            .unwrap();
        context.init_town(size).unwrap();
        init(&mut context).unwrap();
        for household in 0..size {
            let mut routine = Routine::filled(LocationRef::house(household));
            routine.set_block(9..18, LocationRef::new(LocationCategory::Workplace, 0));
            context.add_person(
                household,
                AgeGroup::MiddleAged,
                PersonFactors {
                    health: 3.0,
                    hygiene: 1.0,
                    legality: 1.0,
                },
                routine,
            );
        }
        context
    }

    fn always_hospitalized() -> PolicyParams {
        PolicyParams {
            hospitalization_base_rate: 1.0,
            ..PolicyParams::default()
        }
    }

    fn never_hospitalized() -> PolicyParams {
        PolicyParams {
            hospitalization_base_rate: 0.0,
            ..PolicyParams::default()
        }
    }

    #[test]
    fn init_twice_fails() {
        let mut context = setup(2, ModelType::SIR, never_hospitalized());
        assert!(init(&mut context).is_err());
    }

    #[test]
    fn infect_schedules_recovery() {
        let mut context = setup(3, ModelType::SIR, never_hospitalized());
        context.set_current_day(2);
        assert!(context.infect(PersonId(1)));
        assert_eq!(
            context.get_infection_status(PersonId(1)),
            InfectionStatus::Infectious
        );
        assert_eq!(context.scheduled_recoveries(8), &[PersonId(1)]);
        assert!(context.scheduled_hospitalizations(4).is_empty());

        // Infecting again does nothing.
        assert!(!context.infect(PersonId(1)));
        assert_eq!(context.scheduled_recoveries(8).len(), 1);
    }

    #[test]
    fn hospitalization_is_scheduled_a_third_into_the_infection() {
        let mut context = setup(3, ModelType::SIR, always_hospitalized());
        context.set_current_day(1);
        context.infect(PersonId(0));
        // ceil(5 / 3) = 2
        assert_eq!(context.scheduled_hospitalizations(3), &[PersonId(0)]);
    }

    #[test]
    fn sir_recovery() {
        let mut context = setup(3, ModelType::SIR, never_hospitalized());
        context.infect(PersonId(0));
        assert_eq!(context.process_recoveries(5), 0);
        assert_eq!(context.process_recoveries(6), 1);
        assert_eq!(
            context.get_infection_status(PersonId(0)),
            InfectionStatus::Recovered
        );
        assert!(!context.infect(PersonId(0)));
        context.check_conservation().unwrap();
    }

    #[test]
    fn sis_recovery_returns_to_susceptible() {
        let mut context = setup(3, ModelType::SIS, never_hospitalized());
        context.infect(PersonId(2));
        context.process_recoveries(6);
        assert_eq!(
            context.get_infection_status(PersonId(2)),
            InfectionStatus::Susceptible
        );
        assert_eq!(context.count_status(InfectionStatus::Recovered), 0);
        assert!(context.infect(PersonId(2)));
    }

    #[test]
    fn hospital_stay_and_discharge() {
        let mut context = setup(3, ModelType::SIR, always_hospitalized());
        context.infect(PersonId(0));
        assert_eq!(context.process_hospitalizations(2), 1);

        let person = context.get_person(PersonId(0));
        assert!(person.is_hospitalized());
        assert_eq!(
            *person.active_routine(),
            Routine::filled(LocationRef::hospital())
        );
        assert_eq!(context.hospitalized_count(), 1);

        context.process_recoveries(6);
        let person = context.get_person(PersonId(0));
        assert!(!person.is_hospitalized());
        assert_eq!(person.active_routine(), person.default_routine());
        assert_eq!(context.hospitalized_count(), 0);
    }

    #[test]
    fn discharge_follows_current_emergency_level() {
        let mut context = setup(3, ModelType::SIR, always_hospitalized());
        context.infect(PersonId(0));
        context.process_hospitalizations(2);
        context.set_emergency_level(EmergencyLevel::HIGH);
        // Still in hospital despite the level change.
        assert!(context.get_person(PersonId(0)).is_hospitalized());

        context.process_recoveries(6);
        assert_eq!(
            *context.get_person(PersonId(0)).active_routine(),
            Routine::filled(LocationRef::house(0))
        );
    }

    #[test]
    fn full_hospital_isolates_at_home() {
        let mut context = setup(
            3,
            ModelType::SIR,
            PolicyParams {
                hospital_capacity: 1,
                ..always_hospitalized()
            },
        );
        context.infect(PersonId(0));
        context.infect(PersonId(1));
        context.process_hospitalizations(2);

        assert!(context.get_person(PersonId(0)).is_hospitalized());
        let isolated = context.get_person(PersonId(1));
        assert!(!isolated.is_hospitalized());
        assert!(isolated.is_home_isolated());
        assert_eq!(
            *isolated.active_routine(),
            Routine::filled(LocationRef::house(1))
        );
        assert_eq!(context.hospitalized_count(), 1);
        assert_eq!(context.turned_away_count(), 1);

        context.process_recoveries(6);
        assert!(!context.get_person(PersonId(1)).is_home_isolated());
    }

    #[test]
    fn recovered_people_are_not_admitted() {
        let mut context = setup(3, ModelType::SIR, always_hospitalized());
        context.infect(PersonId(0));
        context.recover(PersonId(0));
        context.process_hospitalizations(2);
        assert!(!context.get_person(PersonId(0)).is_hospitalized());
        assert_eq!(context.hospitalized_count(), 0);
    }

    #[test]
    fn seeding_infects_the_starting_share() {
        let mut context = setup(10, ModelType::SIR, never_hospitalized());
        let seeded = context.seed_infections();
        assert_eq!(seeded.len(), 2);
        assert_ne!(seeded[0], seeded[1]);
        assert_eq!(context.count_status(InfectionStatus::Infectious), 2);
        assert_eq!(context.scheduled_recoveries(6).len(), 2);
    }
}
