use crate::people::{InfectionStatus, PersonId};

/// Compartment membership for every person.
///
/// Each compartment is a dense `Vec` of ids, and each person records which compartment they
/// are in and at which position. Moving a person swap-removes them from their old
/// compartment (patching the position of whoever was swapped in) and pushes them onto the
/// new one.
#[derive(Debug, Default)]
pub(crate) struct StateRegistry {
    members: [Vec<PersonId>; 3],
    slots: Vec<(InfectionStatus, usize)>,
}

impl StateRegistry {
    /// Registers the next person as susceptible.
    ///
    /// # Panics
    ///
    /// Panics if ids are not registered in creation order.
    pub(crate) fn insert(&mut self, person_id: PersonId) {
        assert_eq!(
            person_id.0,
            self.slots.len(),
            "people must be registered in creation order"
        );
        let members = &mut self.members[InfectionStatus::Susceptible.index()];
        self.slots
            .push((InfectionStatus::Susceptible, members.len()));
        members.push(person_id);
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn status(&self, person_id: PersonId) -> InfectionStatus {
        self.slots[person_id.0].0
    }

    pub(crate) fn members(&self, status: InfectionStatus) -> &[PersonId] {
        &self.members[status.index()]
    }

    pub(crate) fn count(&self, status: InfectionStatus) -> usize {
        self.members[status.index()].len()
    }

    /// Moves a person to `status` and returns their previous status.
    pub(crate) fn transition(
        &mut self,
        person_id: PersonId,
        status: InfectionStatus,
    ) -> InfectionStatus {
        let (previous, position) = self.slots[person_id.0];
        if previous == status {
            return previous;
        }

        let old_members = &mut self.members[previous.index()];
        old_members.swap_remove(position);
        if let Some(moved) = old_members.get(position) {
            self.slots[moved.0].1 = position;
        }

        let new_members = &mut self.members[status.index()];
        self.slots[person_id.0] = (status, new_members.len());
        new_members.push(person_id);
        previous
    }

    /// Checks that the compartments partition the population and agree with the per-person
    /// slots.
    pub(crate) fn check(&self) -> Result<(), String> {
        let total: usize = self.members.iter().map(Vec::len).sum();
        if total != self.slots.len() {
            return Err(format!(
                "compartments hold {total} people but the population is {}",
                self.slots.len()
            ));
        }
        for status in InfectionStatus::ALL {
            for (position, person_id) in self.members(status).iter().enumerate() {
                if self.slots[person_id.0] != (status, position) {
                    return Err(format!(
                        "{person_id:?} is listed as {status:?} at {position} but recorded as {:?}",
                        self.slots[person_id.0]
                    ));
                }
            }
        }
        Ok(())
    }
}
