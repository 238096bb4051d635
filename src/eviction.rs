//! Eviction policy for the in-memory tile store.
//!
//! The store itself never drops tiles; without a policy a long session over
//! a large world grows without bound. This module is the policy, kept apart
//! from the store so it can be swapped or disabled: drop every tile outside
//! a Chebyshev radius of the viewer. Captured data stays on disk, so an
//! evicted tile is one seek away if the viewer returns.

use std::collections::HashMap;

use crate::coords::TileCoord;
use crate::tile::Tile;

/// Remove tiles farther than `keep_radius` (Chebyshev, in tiles) from
/// `center`. Returns the number of tiles dropped.
pub fn prune_distant(
    tiles: &mut HashMap<TileCoord, Tile>,
    center: TileCoord,
    keep_radius: i32,
) -> usize {
    let before = tiles.len();
    tiles.retain(|coord, _| coord.chebyshev_distance(center) <= keep_radius);
    before - tiles.len()
}
