use std::any::TypeId;
use std::cell::RefMut;

use log::trace;

use crate::context::{Context, ContextBase};
use crate::hashing::hash_str;
use crate::rand::distr::uniform::{SampleRange, SampleUniform};
use crate::rand::distr::weighted::WeightedIndex;
use crate::rand::distr::Distribution;
use crate::rand::{Rng, SeedableRng};
use crate::random::sampling_algorithms::sample_without_replacement;
use crate::random::{RngHolder, RngId, RngPlugin};

/// Gets a mutable reference to the random number generator associated with the given
/// [`RngId`]. If the Rng has not been used before, one will be created with the base seed
/// you defined in `init_random`. Note that this will panic if `init_random` was not called yet.
fn get_rng<R: RngId + 'static>(context: &impl ContextBase) -> RefMut<R::RngType> {
    let data_container = context.get_data(RngPlugin);

    let rng_holders = data_container
        .rng_holders
        .try_borrow_mut()
        .expect("random streams are already borrowed; nested sampling is not supported");
    RefMut::map(rng_holders, |holders| {
        holders
            .entry(TypeId::of::<R>())
            .or_insert_with(|| {
                trace!(
                    "creating new RNG {} (base seed={})",
                    R::get_name(),
                    data_container.base_seed
                );
                let seed_offset = hash_str(R::get_name());
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(
                        data_container.base_seed.wrapping_add(seed_offset),
                    )),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .expect("rng holder has the wrong type")
    })
}

// Random number generation on Context.
pub trait ContextRandomExt: ContextBase {
    /// Initializes the `RngPlugin` data container with a base seed. Streams are created
    /// lazily on first use. Calling this again reseeds every stream.
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module with seed {base_seed}");
        let data_container = self.get_data_mut(RngPlugin);
        data_container.base_seed = base_seed;
        data_container.rng_holders.borrow_mut().clear();
    }

    /// Gets a random sample from the generator associated with the given [`RngId`] by
    /// applying the specified sampler function.
    fn sample<R: RngId + 'static, T>(
        &self,
        _rng_type: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T {
        let mut rng = get_rng::<R>(self);
        sampler(&mut rng)
    }

    /// Gets a random sample from the specified distribution.
    fn sample_distr<R: RngId + 'static, T>(
        &self,
        _rng_type: R,
        distribution: impl Distribution<T>,
    ) -> T
    where
        R::RngType: Rng,
    {
        let mut rng = get_rng::<R>(self);
        distribution.sample::<R::RngType>(&mut rng)
    }

    /// Gets a random sample within the range provided by `range`.
    fn sample_range<R: RngId + 'static, S, T>(&self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }

    /// Gets a random boolean value which is true with probability `p`. Values of `p` outside
    /// `[0, 1]` are clamped.
    fn sample_bool<R: RngId + 'static>(&self, rng_id: R, p: f64) -> bool
    where
        R::RngType: Rng,
    {
        let p = p.clamp(0.0, 1.0);
        self.sample(rng_id, |rng| rng.random_bool(p))
    }

    /// Draws the index of a random entry out of `weights`.
    ///
    /// # Panics
    ///
    /// Panics if the weights are empty, negative or all zero.
    fn sample_weighted<R: RngId + 'static>(&self, _rng_id: R, weights: &[f64]) -> usize
    where
        R::RngType: Rng,
    {
        let index = WeightedIndex::new(weights).expect("invalid sampling weights");
        let mut rng = get_rng::<R>(self);
        index.sample(&mut *rng)
    }

    /// Draws `requested` distinct items from `items`, uniformly. Asking for more items than
    /// there are returns all of them in a random order.
    fn sample_without_replacement<R: RngId + 'static, T: Clone>(
        &self,
        _rng_id: R,
        items: &[T],
        requested: usize,
    ) -> Vec<T>
    where
        R::RngType: Rng,
    {
        let mut rng = get_rng::<R>(self);
        sample_without_replacement(&mut *rng, items, requested)
    }
}

impl ContextRandomExt for Context {}
