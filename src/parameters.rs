//! Model parameters.
//!
//! Every tunable constant of the model lives in [`Params`], which is stored in the `Context` as
//! the global property [`Parameters`] and validated when it is set. Every field has a default,
//! so a JSON file only needs to name the values it changes:
//!
//! ```json
//! {
//!     "epitown.Parameters": {
//!         "population": 1000,
//!         "r0": 2.5,
//!         "model_type": "SIS",
//!         "policy": { "hospital_capacity": 50 }
//!     }
//! }
//! ```
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_global_property;
use crate::error::EpiError;
use crate::global_properties::ContextGlobalPropertiesExt;
use crate::random::TruncatedNormal;

/// What happens to an infectious person at the end of their infectious period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum ModelType {
    /// Recovery confers permanent immunity.
    SIR,
    /// Recovered people become susceptible again.
    SIS,
}

impl FromStr for ModelType {
    type Err = EpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SIR" => Ok(ModelType::SIR),
            "SIS" => Ok(ModelType::SIS),
            _ => Err(EpiError::ConfigurationError(format!(
                "unknown model type {s:?}, expected SIR or SIS"
            ))),
        }
    }
}

impl Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Residents per location instance, for the categories whose count scales with population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TownRatios {
    pub school: usize,
    pub workplace: usize,
    pub entertainment: usize,
    pub extracurricular: usize,
    pub transportation: usize,
}

impl Default for TownRatios {
    fn default() -> Self {
        TownRatios {
            school: 1500,
            workplace: 50,
            entertainment: 500,
            extracurricular: 500,
            transportation: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Demographics {
    /// Weight of a family of size `i + 1`.
    pub family_size_weights: Vec<f64>,
    /// Indexed by `AgeGroup::index()`.
    pub age_group_weights: [f64; 5],
    pub hygiene: TruncatedNormal,
    pub legality: TruncatedNormal,
    /// Relative hospitalization propensity, indexed by `AgeGroup::index()`.
    pub health_factors: [f64; 5],
}

impl Default for Demographics {
    fn default() -> Self {
        Demographics {
            family_size_weights: vec![0.325, 0.312, 0.163, 0.136, 0.064],
            age_group_weights: [0.2035, 0.054, 0.192, 0.349, 0.2015],
            hygiene: TruncatedNormal {
                mean: 1.0,
                std_dev: 0.7,
                lower: 0.1,
                upper: 5.0,
            },
            legality: TruncatedNormal {
                mean: 1.0,
                std_dev: 0.3,
                lower: 0.5,
                upper: 2.0,
            },
            health_factors: [1.0, 1.0, 1.5, 3.0, 9.67],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutineProbabilities {
    pub extracurricular_probability: f64,
    pub young_adult_school_probability: f64,
    pub adult_entertainment_probability: f64,
    pub middle_aged_entertainment_probability: f64,
    /// Chance that a workplace hour is spent at home at emergency level 2.
    pub remote_work_probability: f64,
}

impl Default for RoutineProbabilities {
    fn default() -> Self {
        RoutineProbabilities {
            extracurricular_probability: 0.83,
            young_adult_school_probability: 0.63,
            adult_entertainment_probability: 0.8,
            middle_aged_entertainment_probability: 0.5,
            remote_work_probability: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyParams {
    /// Infectious prevalence, in percent, at which levels 1, 2 and 3 begin.
    pub emergency_thresholds: [f64; 3],
    /// Contacts are scaled by `1 - step * level`.
    pub social_distancing_step: f64,
    /// Transmission multiplier applied once per masked participant.
    pub mask_transmission_multiplier: f64,
    /// Hospitalization probability is `base_rate * health_factor`.
    pub hospitalization_base_rate: f64,
    /// Indexed by emergency level.
    pub entertainment_capacity: [usize; 4],
    pub transportation_capacity: usize,
    /// Capacity lost per emergency level.
    pub transportation_capacity_step: usize,
    pub hospital_capacity: usize,
}

impl Default for PolicyParams {
    fn default() -> Self {
        PolicyParams {
            emergency_thresholds: [5.0, 10.0, 20.0],
            social_distancing_step: 0.2,
            mask_transmission_multiplier: 0.2,
            hospitalization_base_rate: 0.01,
            entertainment_capacity: [500, 100, 50, 0],
            transportation_capacity: 80,
            transportation_capacity_step: 20,
            hospital_capacity: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    pub population: usize,
    pub starting_infectious_percentage: f64,
    pub infectious_duration_days: usize,
    pub simulation_days: usize,
    pub r0: f64,
    pub model_type: ModelType,
    pub seed: u64,
    pub town: TownRatios,
    pub demographics: Demographics,
    pub routines: RoutineProbabilities,
    pub policy: PolicyParams,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            population: 500,
            starting_infectious_percentage: 10.0,
            infectious_duration_days: 5,
            simulation_days: 7,
            r0: 1.0,
            model_type: ModelType::SIR,
            seed: 0,
            town: TownRatios::default(),
            demographics: Demographics::default(),
            routines: RoutineProbabilities::default(),
            policy: PolicyParams::default(),
        }
    }
}

impl Params {
    /// Number of people infected on day zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn starting_infectious_count(&self) -> usize {
        (self.population as f64 * self.starting_infectious_percentage / 100.0).round() as usize
    }
}

fn configuration_error(message: String) -> EpiError {
    EpiError::ConfigurationError(message)
}

fn check_probability(name: &str, p: f64) -> Result<(), EpiError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(configuration_error(format!(
            "{name} must be a probability in [0, 1], got {p}"
        )));
    }
    Ok(())
}

fn check_weights(name: &str, weights: &[f64]) -> Result<(), EpiError> {
    if weights.is_empty()
        || weights.iter().any(|w| !w.is_finite() || *w < 0.0)
        || weights.iter().sum::<f64>() <= 0.0
    {
        return Err(configuration_error(format!(
            "{name} must be non-negative with a positive sum, got {weights:?}"
        )));
    }
    Ok(())
}

fn check_factor_distribution(name: &str, distribution: &TruncatedNormal) -> Result<(), EpiError> {
    distribution.validate()?;
    if distribution.std_dev <= 0.0
        || distribution.lower <= 0.0
        || distribution.lower >= distribution.upper
        || !(distribution.lower..=distribution.upper).contains(&distribution.mean)
    {
        return Err(configuration_error(format!(
            "{name} needs sd > 0 and 0 < lower <= mean <= upper with lower < upper, got {distribution:?}"
        )));
    }
    Ok(())
}

/// Checks that `params` describe a runnable simulation.
///
/// # Errors
///
/// Returns `EpiError::ConfigurationError` naming the first offending value.
pub fn validate_params(params: &Params) -> Result<(), EpiError> {
    if params.population < 1 {
        return Err(configuration_error(
            "population must be at least 1".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&params.starting_infectious_percentage) {
        return Err(configuration_error(format!(
            "starting infectious percentage must be in [0, 100], got {}",
            params.starting_infectious_percentage
        )));
    }
    if params.infectious_duration_days < 1 {
        return Err(configuration_error(
            "infectious duration must be at least 1 day".to_string(),
        ));
    }
    if params.simulation_days < 1 {
        return Err(configuration_error(
            "simulation length must be at least 1 day".to_string(),
        ));
    }
    if !(params.r0.is_finite() && params.r0 > 0.0) {
        return Err(configuration_error(format!(
            "r0 must be a positive number, got {}",
            params.r0
        )));
    }
    if params.starting_infectious_count() > params.population {
        return Err(configuration_error(format!(
            "cannot seed {} infectious people in a population of {}",
            params.starting_infectious_count(),
            params.population
        )));
    }

    let ratios = &params.town;
    for (name, ratio) in [
        ("school", ratios.school),
        ("workplace", ratios.workplace),
        ("entertainment", ratios.entertainment),
        ("extracurricular", ratios.extracurricular),
        ("transportation", ratios.transportation),
    ] {
        if ratio < 1 {
            return Err(configuration_error(format!(
                "{name} ratio must be at least 1 resident per location"
            )));
        }
    }

    let demographics = &params.demographics;
    check_weights("family size weights", &demographics.family_size_weights)?;
    check_weights("age group weights", &demographics.age_group_weights)?;
    check_factor_distribution("hygiene", &demographics.hygiene)?;
    check_factor_distribution("legality", &demographics.legality)?;
    if demographics
        .health_factors
        .iter()
        .any(|h| !h.is_finite() || *h < 0.0)
    {
        return Err(configuration_error(format!(
            "health factors must be non-negative, got {:?}",
            demographics.health_factors
        )));
    }

    let routines = &params.routines;
    check_probability(
        "extracurricular probability",
        routines.extracurricular_probability,
    )?;
    check_probability(
        "young adult school probability",
        routines.young_adult_school_probability,
    )?;
    check_probability(
        "adult entertainment probability",
        routines.adult_entertainment_probability,
    )?;
    check_probability(
        "middle aged entertainment probability",
        routines.middle_aged_entertainment_probability,
    )?;
    check_probability("remote work probability", routines.remote_work_probability)?;

    let policy = &params.policy;
    let thresholds = policy.emergency_thresholds;
    if !(thresholds[0] >= 0.0 && thresholds[0] < thresholds[1] && thresholds[1] < thresholds[2]) {
        return Err(configuration_error(format!(
            "emergency thresholds must be non-negative and strictly increasing, got {thresholds:?}"
        )));
    }
    if !(0.0..=1.0 / 3.0).contains(&policy.social_distancing_step) {
        return Err(configuration_error(format!(
            "social distancing step must be in [0, 1/3], got {}",
            policy.social_distancing_step
        )));
    }
    check_probability(
        "mask transmission multiplier",
        policy.mask_transmission_multiplier,
    )?;
    check_probability(
        "hospitalization base rate",
        policy.hospitalization_base_rate,
    )?;
    Ok(())
}

define_global_property!(Parameters, Params, validate_params);

pub trait ContextParametersExt {
    /// Validates and stores `params`, and seeds the random streams from `params.seed`.
    ///
    /// # Errors
    ///
    /// Returns `EpiError::ConfigurationError` if the parameters are invalid.
    fn init_parameters(&mut self, params: Params) -> Result<(), EpiError>;

    /// # Panics
    ///
    /// Panics if the parameters have not been set.
    fn get_params(&self) -> &Params;
}

impl ContextParametersExt for Context {
    fn init_parameters(&mut self, params: Params) -> Result<(), EpiError> {
        use crate::random::ContextRandomExt;

        let seed = params.seed;
        self.set_global_property_value(Parameters, params)?;
        self.init_random(seed);
        Ok(())
    }

    fn get_params(&self) -> &Params {
        self.get_global_property_value(Parameters)
            .expect("model parameters have not been set")
    }
}
