//! Named, independently seeded random number streams.
//!
//! Every consumer of randomness declares its own stream with [`define_rng!`]. Each stream is
//! seeded from the base seed given to [`ContextRandomExt::init_random`] combined with a hash of
//! the stream's name, so adding draws to one stream never perturbs another. Two runs with the
//! same base seed produce identical results.
mod context_ext;
mod macros;
mod sampling_algorithms;
mod truncated_normal;

use std::any::{Any, TypeId};
use std::cell::RefCell;

pub use context_ext::ContextRandomExt;
pub use macros::define_rng;
pub use sampling_algorithms::sample_without_replacement;
pub use truncated_normal::TruncatedNormal;

use crate::rand::SeedableRng;
use crate::{define_data_plugin, HashMap, HashMapExt};

pub trait RngId: Copy + Clone {
    type RngType: SeedableRng;
    fn get_name() -> &'static str;
}

// Type-erased so that streams of different generator types can share one map.
struct RngHolder {
    rng: Box<dyn Any>,
}

struct RngData {
    base_seed: u64,
    rng_holders: RefCell<HashMap<TypeId, RngHolder>>,
}

// The holders live in a RefCell so that sampling needs only a shared borrow of the Context.
define_data_plugin!(
    RngPlugin,
    RngData,
    RngData {
        base_seed: 0,
        rng_holders: RefCell::new(HashMap::new()),
    }
);
