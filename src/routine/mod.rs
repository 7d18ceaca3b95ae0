//! Daily routines: where a person is during each of the 24 hours of a day.
//!
//! Every person has a *default* routine, generated once from their age group, and an *active*
//! routine that is what the occupancy engine actually follows. The active routine is always
//! derived from the default one ([`derive_active_routine`]) or pinned to a single location
//! during hospitalization; the default routine is never modified.
mod generator;

use std::ops::Range;

pub use generator::{derive_active_routine, generate_routine};

use crate::context::Context;
use crate::define_rng;
use crate::emergency::EmergencyLevel;
use crate::parameters::ContextParametersExt;
use crate::people::AgeGroup;
use crate::random::ContextRandomExt;
use crate::town::{ContextTownExt, LocationRef};

pub const HOURS_PER_DAY: usize = 24;

define_rng!(RoutineRng);
define_rng!(RemoteWorkRng);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routine([LocationRef; HOURS_PER_DAY]);

impl Routine {
    /// A routine that spends every hour at `location`.
    #[must_use]
    pub fn filled(location: LocationRef) -> Self {
        Routine([location; HOURS_PER_DAY])
    }

    #[must_use]
    pub fn at(&self, hour: usize) -> LocationRef {
        self.0[hour]
    }

    pub fn set(&mut self, hour: usize, location: LocationRef) {
        self.0[hour] = location;
    }

    pub fn set_block(&mut self, hours: Range<usize>, location: LocationRef) {
        for hour in hours {
            self.set(hour, location);
        }
    }

    #[must_use]
    pub fn slots(&self) -> &[LocationRef; HOURS_PER_DAY] {
        &self.0
    }

    /// Expected contacts in each hour, determined by the category of the location.
    #[must_use]
    pub fn expected_interactions(&self) -> [f64; HOURS_PER_DAY] {
        self.0.map(|slot| slot.category.expected_interactions())
    }
}

pub trait ContextRoutineExt {
    /// Generates a default routine for a member of `age_group` living in `household`, choosing
    /// locations among the town's instances.
    fn generate_default_routine(&self, age_group: AgeGroup, household: usize) -> Routine;

    /// Derives the routine to follow at `level` from a default routine.
    fn derive_routine(&self, default: &Routine, household: usize, level: EmergencyLevel)
        -> Routine;
}

impl ContextRoutineExt for Context {
    fn generate_default_routine(&self, age_group: AgeGroup, household: usize) -> Routine {
        let sizes = self.get_town().sizes();
        let probabilities = &self.get_params().routines;
        self.sample(RoutineRng, |rng| {
            generate_routine(age_group, household, sizes, probabilities, rng)
        })
    }

    fn derive_routine(
        &self,
        default: &Routine,
        household: usize,
        level: EmergencyLevel,
    ) -> Routine {
        let remote_work_probability = self.get_params().routines.remote_work_probability;
        self.sample(RemoteWorkRng, |rng| {
            derive_active_routine(default, household, level, remote_work_probability, rng)
        })
    }
}
