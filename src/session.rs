//! Session identity: which world and dimension the cache belongs to.
//!
//! Unrelated worlds must never share cached terrain, so every on-disk root
//! is scoped by a key derived from (world identity, dimension identity).
//! The directory name is a one-way hash of the pair: stable length, safe
//! characters, and no way for two different servers with hostile names to
//! collide by construction of the path string.

/// Fallback world identity when the caller cannot name one.
pub const DEFAULT_WORLD: &str = "default_world";

/// Fallback dimension identity.
pub const DEFAULT_DIMENSION: &str = "unknown_dimension";

/// Identity of one cache scope: (world/server, dimension).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionKey {
    world: String,
    dimension: String,
}

impl SessionKey {
    /// Build a key, substituting the fixed defaults for blank identities so
    /// identity failure degrades isolation instead of failing the session.
    pub fn new(world: &str, dimension: &str) -> Self {
        let world = world.trim();
        let dimension = dimension.trim();
        Self {
            world: if world.is_empty() {
                DEFAULT_WORLD.to_string()
            } else {
                world.to_string()
            },
            dimension: if dimension.is_empty() {
                DEFAULT_DIMENSION.to_string()
            } else {
                dimension.to_string()
            },
        }
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    /// Stable 32-hex-character directory name for this session.
    pub fn root_name(&self) -> String {
        let composite = format!("{}|{}", self.world, self.dimension);
        let bytes = composite.as_bytes();
        format!(
            "{:016x}{:016x}",
            hash_lane(0x6a09_e667_f3bc_c908, bytes),
            hash_lane(0xbb67_ae85_84ca_a73b, bytes)
        )
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::new(DEFAULT_WORLD, DEFAULT_DIMENSION)
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.world, self.dimension)
    }
}

/// One 64-bit lane of the root hash, splitmix64-style mixing per byte.
fn hash_lane(seed: u64, bytes: &[u8]) -> u64 {
    let mut hash = seed;
    for &b in bytes {
        hash = hash.wrapping_add(b as u64 + 1);
        hash ^= hash >> 30;
        hash = hash.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        hash ^= hash >> 27;
        hash = hash.wrapping_mul(0x94d0_49bb_1331_11eb);
        hash ^= hash >> 31;
    }
    hash
}
