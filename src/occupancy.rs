//! Hourly occupancy: who is where.
//!
//! Every hour each location's occupant list is rebuilt from scratch by walking the population
//! in id order and placing each person at the location their active routine names for that
//! hour. Capacity-bearing categories turn people away once full: an overcrowded transportation
//! instance sends the rider to walk outdoors, and a full entertainment venue sends the person
//! home. The location a person actually ends up in is remembered for the interaction phase.
use crate::context::{Context, ContextBase};
use crate::define_data_plugin;
use crate::emergency::ContextEmergencyExt;
use crate::log::trace;
use crate::people::{ContextPeopleExt, PersonId};
use crate::town::{ContextTownExt, LocationCategory, LocationRef};

struct OccupancyData {
    // Indexed by person; empty until the first fill.
    current: Vec<LocationRef>,
    redirected: usize,
}

define_data_plugin!(
    OccupancyPlugin,
    OccupancyData,
    OccupancyData {
        current: Vec::new(),
        redirected: 0,
    }
);

pub trait ContextOccupancyExt {
    /// Empties every location.
    fn clear_locations(&mut self);

    /// Places everyone according to their active routine for the current hour.
    fn fill_locations(&mut self);

    /// Clears and refills every location for the current hour.
    fn update_occupancy(&mut self);

    /// Where `person_id` is this hour, after any capacity redirection. `None` before the first
    /// fill.
    fn current_location(&self, person_id: PersonId) -> Option<LocationRef>;

    /// People turned away from a full location during the last fill.
    fn redirected_count(&self) -> usize;
}

impl ContextOccupancyExt for Context {
    fn clear_locations(&mut self) {
        self.get_town_mut().clear_occupants();
    }

    fn fill_locations(&mut self) {
        let hour = self.get_current_hour();
        let level = self.get_emergency_level();
        let targets: Vec<(LocationRef, usize)> = self
            .people()
            .iter()
            .map(|person| (person.active_routine().at(hour), person.household()))
            .collect();

        let town = self.get_town_mut();
        let mut current = Vec::with_capacity(targets.len());
        let mut redirected = 0;
        for (index, (target, household)) in targets.into_iter().enumerate() {
            let location = match target.category {
                LocationCategory::Transportation if town.location(target).is_full(level) => {
                    redirected += 1;
                    LocationRef::outdoors()
                }
                LocationCategory::Entertainment if town.location(target).is_full(level) => {
                    redirected += 1;
                    LocationRef::house(household)
                }
                _ => target,
            };
            town.location_mut(location).add_occupant(PersonId(index));
            current.push(location);
        }
        if redirected > 0 {
            trace!(
                "day {} hour {hour}: {redirected} people redirected from full locations",
                self.get_current_day()
            );
        }

        let data = self.get_data_mut(OccupancyPlugin);
        data.current = current;
        data.redirected = redirected;
    }

    fn update_occupancy(&mut self) {
        self.clear_locations();
        self.fill_locations();
    }

    fn current_location(&self, person_id: PersonId) -> Option<LocationRef> {
        self.try_get_data(OccupancyPlugin)?
            .current
            .get(person_id.0)
            .copied()
    }

    fn redirected_count(&self) -> usize {
        self.try_get_data(OccupancyPlugin)
            .map_or(0, |data| data.redirected)
    }
}
