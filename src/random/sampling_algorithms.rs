//! Uniform sampling without replacement.

use crate::rand::seq::index::sample as choose_range;
use crate::rand::Rng;

/// Sample `requested` distinct elements uniformly from `items`. The values are cloned.
///
/// If more elements are requested than `items` holds, every element is returned, in random
/// order. The indices are chosen by `rand`'s index sampler, which picks between Floyd's
/// algorithm and a partial shuffle depending on the ratio of `requested` to the length.
pub fn sample_without_replacement<R, T>(rng: &mut R, items: &[T], requested: usize) -> Vec<T>
where
    R: Rng + ?Sized,
    T: Clone,
{
    let amount = requested.min(items.len());
    if amount == 0 {
        return Vec::new();
    }
    choose_range(rng, items.len(), amount)
        .into_iter()
        .map(|index| items[index].clone())
        .collect()
}
