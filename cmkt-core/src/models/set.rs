/// An insertion-ordered set, used for demand sets.
///
/// Iteration order of a demand set decides nothing in the engines (ties are
/// always broken by index), but a stable order keeps serialized markets
/// identical across round trips.
pub type Set<T> = indexmap::IndexSet<T, rustc_hash::FxBuildHasher>;
