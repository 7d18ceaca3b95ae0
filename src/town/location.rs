use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::emergency::EmergencyLevel;
use crate::parameters::PolicyParams;
use crate::people::PersonId;

/// The kinds of place a person can spend an hour in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocationCategory {
    House,
    School,
    Workplace,
    Transportation,
    Extracurricular,
    Entertainment,
    Outdoors,
    Hospital,
}

impl LocationCategory {
    pub const COUNT: usize = 8;

    pub const ALL: [LocationCategory; LocationCategory::COUNT] = [
        LocationCategory::House,
        LocationCategory::School,
        LocationCategory::Workplace,
        LocationCategory::Transportation,
        LocationCategory::Extracurricular,
        LocationCategory::Entertainment,
        LocationCategory::Outdoors,
        LocationCategory::Hospital,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Expected number of people met during one hour spent here.
    #[must_use]
    pub fn expected_interactions(self) -> f64 {
        match self {
            LocationCategory::House => 0.448,
            LocationCategory::School | LocationCategory::Extracurricular => 5.0,
            LocationCategory::Workplace => 8.0,
            LocationCategory::Transportation => 10.0,
            LocationCategory::Entertainment => 7.0,
            LocationCategory::Outdoors => 2.0,
            LocationCategory::Hospital => 0.0,
        }
    }

    /// Masks are mandatory in shared indoor places from level 1 and outdoors from level 2.
    /// Houses and the hospital never require them.
    #[must_use]
    pub fn requires_mask(self, level: EmergencyLevel) -> bool {
        match self {
            LocationCategory::Transportation
            | LocationCategory::School
            | LocationCategory::Workplace
            | LocationCategory::Extracurricular
            | LocationCategory::Entertainment => level >= EmergencyLevel::LOW,
            LocationCategory::Outdoors => level >= EmergencyLevel::MEDIUM,
            LocationCategory::House | LocationCategory::Hospital => false,
        }
    }

    #[must_use]
    pub fn capacity_policy(self, policy: &PolicyParams) -> CapacityPolicy {
        match self {
            LocationCategory::Entertainment => {
                CapacityPolicy::ByLevel(policy.entertainment_capacity)
            }
            LocationCategory::Transportation => CapacityPolicy::Declining {
                base: policy.transportation_capacity,
                step: policy.transportation_capacity_step,
            },
            LocationCategory::Hospital => CapacityPolicy::Fixed(policy.hospital_capacity),
            _ => CapacityPolicy::Unbounded,
        }
    }
}

impl Display for LocationCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// How many occupants a location admits, possibly depending on the emergency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPolicy {
    Unbounded,
    /// One capacity per emergency level.
    ByLevel([usize; 4]),
    /// `base - step * level`, floored at zero.
    Declining { base: usize, step: usize },
    Fixed(usize),
}

impl CapacityPolicy {
    #[must_use]
    pub fn capacity(&self, level: EmergencyLevel) -> Option<usize> {
        match *self {
            CapacityPolicy::Unbounded => None,
            CapacityPolicy::ByLevel(capacities) => Some(capacities[level.index()]),
            CapacityPolicy::Declining { base, step } => {
                Some(base.saturating_sub(step * level.index()))
            }
            CapacityPolicy::Fixed(capacity) => Some(capacity),
        }
    }
}

/// A specific location: its category and its index within that category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationRef {
    pub category: LocationCategory,
    pub id: usize,
}

impl LocationRef {
    #[must_use]
    pub fn new(category: LocationCategory, id: usize) -> Self {
        LocationRef { category, id }
    }

    #[must_use]
    pub fn house(household: usize) -> Self {
        LocationRef::new(LocationCategory::House, household)
    }

    #[must_use]
    pub fn outdoors() -> Self {
        LocationRef::new(LocationCategory::Outdoors, 0)
    }

    #[must_use]
    pub fn hospital() -> Self {
        LocationRef::new(LocationCategory::Hospital, 0)
    }
}

impl Display for LocationRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.category, self.id)
    }
}

#[derive(Debug, Clone)]
pub struct Location {
    category: LocationCategory,
    capacity: CapacityPolicy,
    occupants: Vec<PersonId>,
}

impl Location {
    #[must_use]
    pub fn new(category: LocationCategory, capacity: CapacityPolicy) -> Self {
        Location {
            category,
            capacity,
            occupants: Vec::new(),
        }
    }

    #[must_use]
    pub fn category(&self) -> LocationCategory {
        self.category
    }

    #[must_use]
    pub fn occupants(&self) -> &[PersonId] {
        &self.occupants
    }

    pub(crate) fn add_occupant(&mut self, person_id: PersonId) {
        self.occupants.push(person_id);
    }

    pub(crate) fn clear(&mut self) {
        self.occupants.clear();
    }

    #[must_use]
    pub fn capacity(&self, level: EmergencyLevel) -> Option<usize> {
        self.capacity.capacity(level)
    }

    /// A location is full once its occupant count reaches its capacity.
    #[must_use]
    pub fn is_full(&self, level: EmergencyLevel) -> bool {
        self.capacity(level)
            .is_some_and(|capacity| self.occupants.len() >= capacity)
    }
}
