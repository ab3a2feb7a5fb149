/// IndexMap with a default `AHasher`, used for ordered column lookups.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, core::hash::BuildHasherDefault<ahash::AHasher>>;
