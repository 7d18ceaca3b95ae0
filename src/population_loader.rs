//! Builds the population and the town it lives in.
//!
//! Families are generated one after another until the target headcount is reached. Each family
//! draws a size from the family size weights (capped at the number of people still to place)
//! and gets its own house; each member draws an age group and hygiene and legality factors,
//! and takes the health factor of their age group. Once the number of households is known the
//! town is built, and everyone gets a default routine among its locations.
use crate::context::Context;
use crate::define_rng;
use crate::error::EpiError;
use crate::log::{debug, trace};
use crate::parameters::ContextParametersExt;
use crate::people::{AgeGroup, ContextPeopleExt, PersonFactors};
use crate::random::ContextRandomExt;
use crate::routine::ContextRoutineExt;
use crate::town::ContextTownExt;

define_rng!(PopulationRng);

struct Resident {
    household: usize,
    age_group: AgeGroup,
    factors: PersonFactors,
}

fn generate_residents(context: &Context) -> (Vec<Resident>, usize) {
    let params = context.get_params();
    let demographics = &params.demographics;
    let mut residents = Vec::with_capacity(params.population);
    let mut households = 0;

    while residents.len() < params.population {
        let remaining = params.population - residents.len();
        let drawn = context.sample_weighted(PopulationRng, &demographics.family_size_weights) + 1;
        let family_size = drawn.min(remaining);
        for _ in 0..family_size {
            let age_group = AgeGroup::ALL
                [context.sample_weighted(PopulationRng, &demographics.age_group_weights)];
            let factors = PersonFactors {
                health: demographics.health_factors[age_group.index()],
                hygiene: context.sample_distr(PopulationRng, demographics.hygiene),
                legality: context.sample_distr(PopulationRng, demographics.legality),
            };
            residents.push(Resident {
                household: households,
                age_group,
                factors,
            });
        }
        households += 1;
    }
    (residents, households)
}

/// Generates every person and builds the town.
///
/// # Errors
///
/// Returns an `EpiError` if the town or the population were already built.
pub fn init(context: &mut Context) -> Result<(), EpiError> {
    if context.get_current_population() > 0 {
        return Err(EpiError::EpiError(
            "population already initialized".to_string(),
        ));
    }
    let (residents, households) = generate_residents(context);
    context.init_town(households)?;
    trace!(
        "built town for {} people in {households} households: {:?}",
        residents.len(),
        context.get_town().sizes()
    );

    for resident in residents {
        let routine = context.generate_default_routine(resident.age_group, resident.household);
        context.add_person(
            resident.household,
            resident.age_group,
            resident.factors,
            routine,
        );
    }
    debug!(
        "generated {} people in {households} households",
        context.get_current_population()
    );
    Ok(())
}
