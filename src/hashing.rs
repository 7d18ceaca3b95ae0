//! Deterministic hashing data structures.
//!
//! The standard library `HashMap` seeds its hasher randomly on every run, which would make
//! iteration order (and therefore any random draw that depends on it) differ between two runs
//! with the same seed. Everything in this crate uses the `FxHash` variants below instead.
//!
//! `HashMap<K, V, S>` has no `new` method for a non-default hasher; the `HashMapExt` and
//! `HashSetExt` traits provide `new` and `with_capacity` so call sites read the same as with the
//! standard library. The traits need only be in scope.

use std::hash::{BuildHasher, Hasher};

use rustc_hash::{FxBuildHasher, FxHasher};

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;

pub trait HashMapExt {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

impl<K, V> HashMapExt for HashMap<K, V> {
    fn new() -> Self {
        HashMap::with_hasher(FxBuildHasher)
    }

    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, FxBuildHasher)
    }
}

pub trait HashSetExt {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

impl<T> HashSetExt for HashSet<T> {
    fn new() -> Self {
        HashSet::with_hasher(FxBuildHasher)
    }

    fn with_capacity(capacity: usize) -> Self {
        HashSet::with_capacity_and_hasher(capacity, FxBuildHasher)
    }
}

/// A convenience method to compute the hash of a `&str`. Used to derive the seed of each named
/// random stream from the base seed.
pub fn hash_str(data: &str) -> u64 {
    let mut hasher: FxHasher = FxBuildHasher.build_hasher();
    hasher.write(data.as_bytes());
    hasher.finish()
}
