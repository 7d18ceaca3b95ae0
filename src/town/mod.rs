//! The town: every location instance, grouped by category.
//!
//! Location counts are fixed when the town is built. Houses match the number of households,
//! Hospital and Outdoors are singletons, and the remaining categories get one instance per
//! `ratio` residents (rounded up), so even a tiny town has at least one of each.
mod location;

pub use location::{CapacityPolicy, Location, LocationCategory, LocationRef};

use crate::context::{Context, ContextBase};
use crate::define_data_plugin;
use crate::error::EpiError;
use crate::log::trace;
use crate::parameters::{ContextParametersExt, PolicyParams, TownRatios};

/// Number of instances of each location category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TownSizes([usize; LocationCategory::COUNT]);

impl TownSizes {
    #[must_use]
    pub fn get(&self, category: LocationCategory) -> usize {
        self.0[category.index()]
    }
}

#[derive(Debug, Clone)]
pub struct Town {
    locations: [Vec<Location>; LocationCategory::COUNT],
}

fn location_count(population: usize, ratio: usize) -> usize {
    population.div_ceil(ratio).max(1)
}

impl Town {
    #[must_use]
    pub fn new(
        population: usize,
        households: usize,
        ratios: &TownRatios,
        policy: &PolicyParams,
    ) -> Town {
        let locations = LocationCategory::ALL.map(|category| {
            let count = match category {
                LocationCategory::House => households,
                LocationCategory::School => location_count(population, ratios.school),
                LocationCategory::Workplace => location_count(population, ratios.workplace),
                LocationCategory::Transportation => {
                    location_count(population, ratios.transportation)
                }
                LocationCategory::Extracurricular => {
                    location_count(population, ratios.extracurricular)
                }
                LocationCategory::Entertainment => {
                    location_count(population, ratios.entertainment)
                }
                LocationCategory::Outdoors | LocationCategory::Hospital => 1,
            };
            let capacity = category.capacity_policy(policy);
            (0..count)
                .map(|_| Location::new(category, capacity))
                .collect::<Vec<_>>()
        });
        Town { locations }
    }

    #[must_use]
    pub fn sizes(&self) -> TownSizes {
        TownSizes(self.locations.each_ref().map(Vec::len))
    }

    #[must_use]
    pub fn count(&self, category: LocationCategory) -> usize {
        self.locations[category.index()].len()
    }

    #[must_use]
    pub fn locations(&self, category: LocationCategory) -> &[Location] {
        &self.locations[category.index()]
    }

    /// # Panics
    ///
    /// Panics if `location.id` is out of range for its category.
    #[must_use]
    pub fn location(&self, location: LocationRef) -> &Location {
        &self.locations[location.category.index()][location.id]
    }

    pub(crate) fn location_mut(&mut self, location: LocationRef) -> &mut Location {
        &mut self.locations[location.category.index()][location.id]
    }

    pub(crate) fn clear_occupants(&mut self) {
        for location in self.locations.iter_mut().flatten() {
            location.clear();
        }
    }

    /// Total occupants across every location.
    #[must_use]
    pub fn total_occupants(&self) -> usize {
        self.locations
            .iter()
            .flatten()
            .map(|location| location.occupants().len())
            .sum()
    }
}

define_data_plugin!(TownPlugin, Option<Town>, None);

pub trait ContextTownExt {
    /// Builds the town for the configured population with one house per household.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` if the town was already built or there are no households.
    fn init_town(&mut self, households: usize) -> Result<(), EpiError>;

    /// # Panics
    ///
    /// Panics if the town has not been built.
    fn get_town(&self) -> &Town;

    fn get_town_mut(&mut self) -> &mut Town;
}

impl ContextTownExt for Context {
    fn init_town(&mut self, households: usize) -> Result<(), EpiError> {
        if households == 0 {
            return Err(EpiError::ConfigurationError(
                "a town needs at least one household".to_string(),
            ));
        }
        if matches!(self.try_get_data(TownPlugin), Some(Some(_))) {
            return Err(EpiError::EpiError("town already initialized".to_string()));
        }
        let params = self.get_params();
        let town = Town::new(params.population, households, &params.town, &params.policy);
        trace!("initializing town with {:?}", town.sizes());
        *self.get_data_mut(TownPlugin) = Some(town);
        Ok(())
    }

    fn get_town(&self) -> &Town {
        self.get_data(TownPlugin)
            .as_ref()
            .expect("town has not been initialized")
    }

    fn get_town_mut(&mut self) -> &mut Town {
        self.get_data_mut(TownPlugin)
            .as_mut()
            .expect("town has not been initialized")
    }
}
