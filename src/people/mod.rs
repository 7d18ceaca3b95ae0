//! The residents of the town.
//!
//! People are indexed by [`PersonId`], which is their position in creation order. Each person
//! carries fixed demographic and behavioral factors, a default routine, and the active routine
//! currently in force. Epidemic state is not stored on the person: a [`StateRegistry`] holds
//! the membership of every compartment so that each person belongs to exactly one of them and
//! moving between compartments is O(1).
mod context_extension;
mod registry;

use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

pub use context_extension::ContextPeopleExt;
pub(crate) use context_extension::ContextPeopleMutExt;
use registry::StateRegistry;

use crate::define_data_plugin;
use crate::routine::{Routine, HOURS_PER_DAY};

struct PeopleData {
    people: Vec<Person>,
    registry: StateRegistry,
}

define_data_plugin!(
    PeoplePlugin,
    PeopleData,
    PeopleData {
        people: Vec::new(),
        registry: StateRegistry::default(),
    }
);

/// Represents a unique person: their index in the range 0 to population - 1.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(pub usize);

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Person {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    /// 18 and under
    Underage,
    /// 19 to 25
    YoungAdult,
    /// 26 to 40
    Adult,
    /// 41 to 65
    MiddleAged,
    /// 66 and over
    Elderly,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 5] = [
        AgeGroup::Underage,
        AgeGroup::YoungAdult,
        AgeGroup::Adult,
        AgeGroup::MiddleAged,
        AgeGroup::Elderly,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfectionStatus {
    Susceptible,
    Infectious,
    Recovered,
}

impl InfectionStatus {
    pub const ALL: [InfectionStatus; 3] = [
        InfectionStatus::Susceptible,
        InfectionStatus::Infectious,
        InfectionStatus::Recovered,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Per-person multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonFactors {
    /// Scales the chance of being hospitalized when infected.
    pub health: f64,
    /// Scales the chance of transmitting and of catching the disease.
    pub hygiene: f64,
    /// Compliance with protective measures; also scales how many contacts a person makes.
    pub legality: f64,
}

#[derive(Debug, Clone)]
pub struct Person {
    id: PersonId,
    household: usize,
    age_group: AgeGroup,
    factors: PersonFactors,
    hospitalized: bool,
    home_isolated: bool,
    default_routine: Routine,
    active_routine: Routine,
    interactions: [f64; HOURS_PER_DAY],
}

impl Person {
    pub(crate) fn new(
        id: PersonId,
        household: usize,
        age_group: AgeGroup,
        factors: PersonFactors,
        default_routine: Routine,
    ) -> Person {
        Person {
            id,
            household,
            age_group,
            factors,
            hospitalized: false,
            home_isolated: false,
            default_routine,
            active_routine: default_routine,
            interactions: default_routine.expected_interactions(),
        }
    }

    #[must_use]
    pub fn id(&self) -> PersonId {
        self.id
    }

    #[must_use]
    pub fn household(&self) -> usize {
        self.household
    }

    #[must_use]
    pub fn age_group(&self) -> AgeGroup {
        self.age_group
    }

    #[must_use]
    pub fn factors(&self) -> PersonFactors {
        self.factors
    }

    #[must_use]
    pub fn is_hospitalized(&self) -> bool {
        self.hospitalized
    }

    /// Turned away from a full hospital and staying home until recovery.
    #[must_use]
    pub fn is_home_isolated(&self) -> bool {
        self.home_isolated
    }

    /// Hospitalized and home-isolated people keep their pinned routine regardless of the
    /// emergency level.
    #[must_use]
    pub fn has_pinned_routine(&self) -> bool {
        self.hospitalized || self.home_isolated
    }

    #[must_use]
    pub fn default_routine(&self) -> &Routine {
        &self.default_routine
    }

    #[must_use]
    pub fn active_routine(&self) -> &Routine {
        &self.active_routine
    }

    /// Expected contacts per hour under the active routine.
    #[must_use]
    pub fn interactions(&self) -> &[f64; HOURS_PER_DAY] {
        &self.interactions
    }

    /// Sum of the expected contacts over a whole day.
    #[must_use]
    pub fn daily_interactions(&self) -> f64 {
        self.interactions.iter().sum()
    }

    /// Replaces the active routine and recomputes the hourly interaction rates. Returns
    /// whether anything changed.
    pub(crate) fn set_active_routine(&mut self, routine: Routine) -> bool {
        if self.active_routine == routine {
            return false;
        }
        self.active_routine = routine;
        self.interactions = routine.expected_interactions();
        true
    }

    pub(crate) fn set_hospitalized(&mut self, hospitalized: bool) {
        self.hospitalized = hospitalized;
    }

    pub(crate) fn set_home_isolated(&mut self, home_isolated: bool) {
        self.home_isolated = home_isolated;
    }
}
