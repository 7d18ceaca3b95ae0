use crate::emergency::EmergencyLevel;
use crate::parameters::RoutineProbabilities;
use crate::people::AgeGroup;
use crate::rand::Rng;
use crate::routine::Routine;
use crate::town::{LocationCategory, LocationRef, TownSizes};

// A uniformly chosen instance of `category`.
fn pick<R: Rng + ?Sized>(
    rng: &mut R,
    sizes: TownSizes,
    category: LocationCategory,
) -> LocationRef {
    LocationRef::new(category, rng.random_range(0..sizes.get(category)))
}

// One end of the activity window [start, end) becomes an Outdoors hour, the other a ride on a
// random transportation instance.
fn transport<R: Rng + ?Sized>(
    routine: &mut Routine,
    rng: &mut R,
    sizes: TownSizes,
    start: usize,
    end: usize,
) {
    let (outdoors_hour, transportation_hour) = if rng.random_bool(0.5) {
        (start, end)
    } else {
        (end, start)
    };
    routine.set(outdoors_hour, LocationRef::outdoors());
    routine.set(
        transportation_hour,
        pick(rng, sizes, LocationCategory::Transportation),
    );
}

fn underage<R: Rng + ?Sized>(
    routine: &mut Routine,
    rng: &mut R,
    sizes: TownSizes,
    probabilities: &RoutineProbabilities,
) {
    routine.set(8, LocationRef::outdoors());
    let school = pick(rng, sizes, LocationCategory::School);
    routine.set_block(9..15, school);
    routine.set(15, LocationRef::outdoors());

    if rng.random_bool(probabilities.extracurricular_probability) {
        let activity = pick(rng, sizes, LocationCategory::Extracurricular);
        let start = rng.random_range(16..20);
        routine.set(start - 1, pick(rng, sizes, LocationCategory::Transportation));
        routine.set(start + 3, pick(rng, sizes, LocationCategory::Transportation));
        routine.set_block(start..start + 3, activity);
    }
}

fn young_adult<R: Rng + ?Sized>(
    routine: &mut Routine,
    rng: &mut R,
    sizes: TownSizes,
    probabilities: &RoutineProbabilities,
) {
    let last_hour = if rng.random_bool(probabilities.young_adult_school_probability) {
        routine.set_block(9..15, pick(rng, sizes, LocationCategory::School));
        14
    } else {
        routine.set_block(9..18, pick(rng, sizes, LocationCategory::Workplace));
        17
    };
    transport(routine, rng, sizes, 8, last_hour + 1);

    let entertainment = pick(rng, sizes, LocationCategory::Entertainment);
    let start = rng.random_range(18..=20);
    routine.set_block(start..start + 3, entertainment);
}

fn adult<R: Rng + ?Sized>(
    routine: &mut Routine,
    rng: &mut R,
    sizes: TownSizes,
    probabilities: &RoutineProbabilities,
) {
    routine.set_block(9..18, pick(rng, sizes, LocationCategory::Workplace));
    transport(routine, rng, sizes, 8, 18);

    if rng.random_bool(probabilities.adult_entertainment_probability) {
        let entertainment = pick(rng, sizes, LocationCategory::Entertainment);
        let start = rng.random_range(19..=20);
        routine.set_block(start..start + 3, entertainment);
        transport(routine, rng, sizes, start - 1, start + 3);
    }
}

fn middle_aged<R: Rng + ?Sized>(
    routine: &mut Routine,
    rng: &mut R,
    sizes: TownSizes,
    probabilities: &RoutineProbabilities,
) {
    routine.set_block(9..18, pick(rng, sizes, LocationCategory::Workplace));
    transport(routine, rng, sizes, 8, 18);

    if rng.random_bool(probabilities.middle_aged_entertainment_probability) {
        let entertainment = pick(rng, sizes, LocationCategory::Entertainment);
        let start = rng.random_range(19..=22);
        routine.set_block(start..start + 2, entertainment);
    }
}

fn elderly<R: Rng + ?Sized>(routine: &mut Routine, rng: &mut R, sizes: TownSizes) {
    let start = rng.random_range(10..=18);
    routine.set_block(start..start + 4, LocationRef::outdoors());
    transport(routine, rng, sizes, start - 1, start + 4);
}

/// Generates the default routine of a person. Every hour not claimed by an activity is spent
/// at home.
pub fn generate_routine<R: Rng + ?Sized>(
    age_group: AgeGroup,
    household: usize,
    sizes: TownSizes,
    probabilities: &RoutineProbabilities,
    rng: &mut R,
) -> Routine {
    let mut routine = Routine::filled(LocationRef::house(household));
    match age_group {
        AgeGroup::Underage => underage(&mut routine, rng, sizes, probabilities),
        AgeGroup::YoungAdult => young_adult(&mut routine, rng, sizes, probabilities),
        AgeGroup::Adult => adult(&mut routine, rng, sizes, probabilities),
        AgeGroup::MiddleAged => middle_aged(&mut routine, rng, sizes, probabilities),
        AgeGroup::Elderly => elderly(&mut routine, rng, sizes),
    }
    routine
}

/// The routine a person follows at `level`, derived slot by slot from their default routine.
///
/// School and extracurricular hours move home at level 3. Workplace hours move home at level
/// 3, and each one independently with `remote_work_probability` at level 2. Levels 0 and 1
/// return the default routine unchanged and draw nothing from `rng`.
pub fn derive_active_routine<R: Rng + ?Sized>(
    default: &Routine,
    household: usize,
    level: EmergencyLevel,
    remote_work_probability: f64,
    rng: &mut R,
) -> Routine {
    if level < EmergencyLevel::MEDIUM {
        return *default;
    }
    let home = LocationRef::house(household);
    let mut routine = *default;
    for (hour, slot) in default.slots().iter().enumerate() {
        let stays_home = match slot.category {
            LocationCategory::School | LocationCategory::Extracurricular => {
                level == EmergencyLevel::HIGH
            }
            LocationCategory::Workplace => {
                level == EmergencyLevel::HIGH || rng.random_bool(remote_work_probability)
            }
            _ => false,
        };
        if stays_home {
            routine.set(hour, home);
        }
    }
    routine
}
