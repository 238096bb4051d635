//! Terrain data provider boundary.
//!
//! The cache never owns ground truth; it pulls it through this trait, and
//! only for tiles the provider currently reports as loaded. Results for
//! unloaded tiles are undefined — callers must gate every query behind
//! [`TerrainProvider::tile_loaded`].

use crate::coords::TileCoord;

/// Color and material classification for one ground probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroundProbe {
    /// Raw material color, 0x00RRGGBB.
    pub rgb: u32,
    /// True when the probed material is water (enables the water tint).
    pub is_water: bool,
}

/// Source of ground truth for a shifting, caller-controlled subset of space.
pub trait TerrainProvider {
    /// Whether ground truth is currently available for this tile.
    fn tile_loaded(&self, tile: TileCoord) -> bool;

    /// Surface elevation (highest solid point + 1) at a world column.
    fn surface_elevation(&self, world_x: i32, world_z: i32) -> i32;

    /// Material probe at a specific elevation of a world column.
    fn ground(&self, world_x: i32, world_z: i32, elevation: i32) -> GroundProbe;

    /// Lowest valid elevation; probes below the surface are clamped to this.
    fn min_elevation(&self) -> i32 {
        0
    }
}
