use crate::context::{Context, ContextBase};
use crate::error::EpiError;
use crate::log::trace;
use crate::numeric::{percentage, share_percent};
use crate::people::{
    AgeGroup, InfectionStatus, PeoplePlugin, Person, PersonFactors, PersonId,
};
use crate::routine::Routine;

/// A trait extension for [`Context`] that exposes the people
/// functionality.
pub trait ContextPeopleExt {
    /// Returns the current population size
    fn get_current_population(&self) -> usize;

    /// Creates a new, susceptible person whose active routine starts out as `default_routine`.
    fn add_person(
        &mut self,
        household: usize,
        age_group: AgeGroup,
        factors: PersonFactors,
        default_routine: Routine,
    ) -> PersonId;

    /// # Panics
    ///
    /// Panics if `person_id` does not exist.
    fn get_person(&self, person_id: PersonId) -> &Person;

    /// Everyone, in id order.
    fn people(&self) -> &[Person];

    fn get_infection_status(&self, person_id: PersonId) -> InfectionStatus;

    /// Members of a compartment. The order is an implementation detail but is stable for a
    /// given sequence of transitions.
    fn people_with_status(&self, status: InfectionStatus) -> &[PersonId];

    fn count_status(&self, status: InfectionStatus) -> usize;

    /// Share of the population in `status`, in percent rounded to two decimals.
    fn status_percentage(&self, status: InfectionStatus) -> f64;

    /// Share of the population in `status`, in percent, unrounded.
    fn status_prevalence(&self, status: InfectionStatus) -> f64;

    /// Verifies that every person is in exactly one compartment.
    ///
    /// # Errors
    ///
    /// Returns [`EpiError::InvariantViolation`] describing the first inconsistency found.
    fn check_conservation(&self) -> Result<(), EpiError>;
}

/// Mutations reserved for the components that own them (infection state machine, emergency
/// policy).
pub(crate) trait ContextPeopleMutExt {
    fn get_person_mut(&mut self, person_id: PersonId) -> &mut Person;

    /// Moves a person between compartments and returns the previous status.
    fn set_infection_status(
        &mut self,
        person_id: PersonId,
        status: InfectionStatus,
    ) -> InfectionStatus;
}

impl ContextPeopleExt for Context {
    fn get_current_population(&self) -> usize {
        self.try_get_data(PeoplePlugin)
            .map_or(0, |data| data.people.len())
    }

    fn add_person(
        &mut self,
        household: usize,
        age_group: AgeGroup,
        factors: PersonFactors,
        default_routine: Routine,
    ) -> PersonId {
        let data = self.get_data_mut(PeoplePlugin);
        let person_id = PersonId(data.people.len());
        data.people.push(Person::new(
            person_id,
            household,
            age_group,
            factors,
            default_routine,
        ));
        data.registry.insert(person_id);
        trace!("added {person_id:?} ({age_group:?}) to household {household}");
        person_id
    }

    fn get_person(&self, person_id: PersonId) -> &Person {
        &self.get_data(PeoplePlugin).people[person_id.0]
    }

    fn people(&self) -> &[Person] {
        self.try_get_data(PeoplePlugin)
            .map(|data| data.people.as_slice())
            .unwrap_or_default()
    }

    fn get_infection_status(&self, person_id: PersonId) -> InfectionStatus {
        self.get_data(PeoplePlugin).registry.status(person_id)
    }

    fn people_with_status(&self, status: InfectionStatus) -> &[PersonId] {
        self.try_get_data(PeoplePlugin)
            .map(|data| data.registry.members(status))
            .unwrap_or_default()
    }

    fn count_status(&self, status: InfectionStatus) -> usize {
        self.people_with_status(status).len()
    }

    fn status_percentage(&self, status: InfectionStatus) -> f64 {
        percentage(self.count_status(status), self.get_current_population())
    }

    fn status_prevalence(&self, status: InfectionStatus) -> f64 {
        share_percent(self.count_status(status), self.get_current_population())
    }

    fn check_conservation(&self) -> Result<(), EpiError> {
        let Some(data) = self.try_get_data(PeoplePlugin) else {
            return Ok(());
        };
        if data.registry.len() != data.people.len() {
            return Err(EpiError::InvariantViolation(format!(
                "{} people are registered but {} exist",
                data.registry.len(),
                data.people.len()
            )));
        }
        data.registry
            .check()
            .map_err(EpiError::InvariantViolation)
    }
}

impl ContextPeopleMutExt for Context {
    fn get_person_mut(&mut self, person_id: PersonId) -> &mut Person {
        &mut self.get_data_mut(PeoplePlugin).people[person_id.0]
    }

    fn set_infection_status(
        &mut self,
        person_id: PersonId,
        status: InfectionStatus,
    ) -> InfectionStatus {
        self.get_data_mut(PeoplePlugin)
            .registry
            .transition(person_id, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_almost_eq;
    use crate::town::LocationRef;

    const FACTORS: PersonFactors = PersonFactors {
        health: 1.0,
        hygiene: 1.0,
        legality: 1.0,
    };

    fn add_people(context: &mut Context, count: usize) -> Vec<PersonId> {
        (0..count)
            .map(|i| {
                context.add_person(
                    i,
                    AgeGroup::Elderly,
                    FACTORS,
                    Routine::filled(LocationRef::house(i)),
                )
            })
            .collect()
    }

    #[test]
    fn empty_population() {
        let context = Context::new();
        assert_eq!(context.get_current_population(), 0);
        assert!(context.people().is_empty());
        assert_eq!(context.count_status(InfectionStatus::Infectious), 0);
        assert_eq!(context.status_percentage(InfectionStatus::Infectious), 0.0);
        context.check_conservation().unwrap();
    }

    #[test]
    fn add_person_assigns_sequential_ids() {
        let mut context = Context::new();
        let ids = add_people(&mut context, 3);
        assert_eq!(ids, vec![PersonId(0), PersonId(1), PersonId(2)]);
        assert_eq!(context.get_current_population(), 3);
        assert_eq!(context.get_person(PersonId(2)).household(), 2);
        assert_eq!(
            context.get_infection_status(PersonId(1)),
            InfectionStatus::Susceptible
        );
    }

    #[test]
    fn status_counts_and_percentages() {
        let mut context = Context::new();
        add_people(&mut context, 3);
        context.set_infection_status(PersonId(0), InfectionStatus::Infectious);
        assert_eq!(context.count_status(InfectionStatus::Infectious), 1);
        assert_almost_eq!(
            context.status_percentage(InfectionStatus::Infectious),
            33.33,
            1e-12
        );
        assert_almost_eq!(
            context.status_percentage(InfectionStatus::Susceptible),
            66.67,
            1e-12
        );

        let previous = context.set_infection_status(PersonId(0), InfectionStatus::Recovered);
        assert_eq!(previous, InfectionStatus::Infectious);
        assert_eq!(
            context.people_with_status(InfectionStatus::Recovered),
            &[PersonId(0)]
        );
        context.check_conservation().unwrap();
    }

    #[test]
    fn mutable_access_changes_person() {
        let mut context = Context::new();
        add_people(&mut context, 1);
        context.get_person_mut(PersonId(0)).set_hospitalized(true);
        assert!(context.get_person(PersonId(0)).is_hospitalized());
    }

    #[test]
    #[should_panic(expected = "has not been initialized")]
    fn get_person_without_people() {
        let context = Context::new();
        let _ = context.get_person(PersonId(0));
    }
}
