//! Synthetic terrain provider backed by layered noise.
//!
//! Stands in for a real game world in the demo viewer, the headless export
//! mode and integration-style tests. Elevation comes from multi-octave
//! Perlin noise; the "loaded" subset is a movable window around an anchor,
//! so incremental reveal behaves like a real client streaming terrain in.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::coords::TileCoord;
use crate::provider::{GroundProbe, TerrainProvider};

/// Horizontal noise frequency per world column.
const ELEVATION_FREQ: f64 = 0.004;

/// Base terrain elevation.
const BASE_ELEVATION: f64 = 72.0;

/// Elevation swing above/below the base.
const ELEVATION_AMPLITUDE: f64 = 46.0;

/// Noise-driven world with a movable loaded window.
pub struct NoiseTerrain {
    elevation_noise: Fbm<Perlin>,
    sea_level: i32,
    anchor: TileCoord,
    loaded_radius: i32,
}

impl NoiseTerrain {
    pub fn new(seed: u32) -> Self {
        Self {
            elevation_noise: Fbm::<Perlin>::new(seed)
                .set_octaves(5)
                .set_frequency(ELEVATION_FREQ)
                .set_persistence(0.55),
            sea_level: 64,
            anchor: TileCoord::new(0, 0),
            loaded_radius: 10,
        }
    }

    /// Move the loaded window (the "player" walked somewhere).
    pub fn set_anchor(&mut self, anchor: TileCoord) {
        self.anchor = anchor;
    }

    pub fn anchor(&self) -> TileCoord {
        self.anchor
    }

    pub fn set_loaded_radius(&mut self, radius: i32) {
        self.loaded_radius = radius;
    }

    fn terrain_height(&self, world_x: i32, world_z: i32) -> i32 {
        let n = self
            .elevation_noise
            .get([world_x as f64, world_z as f64]);
        (BASE_ELEVATION + n * ELEVATION_AMPLITUDE).round() as i32
    }
}

impl TerrainProvider for NoiseTerrain {
    fn tile_loaded(&self, tile: TileCoord) -> bool {
        tile.chebyshev_distance(self.anchor) <= self.loaded_radius
    }

    fn surface_elevation(&self, world_x: i32, world_z: i32) -> i32 {
        // water surface counts as the surface, like a real heightmap would
        self.terrain_height(world_x, world_z).max(self.sea_level)
    }

    fn ground(&self, world_x: i32, world_z: i32, _elevation: i32) -> GroundProbe {
        let terrain = self.terrain_height(world_x, world_z);
        if terrain < self.sea_level {
            let depth = (self.sea_level - terrain).min(24) as u32;
            return GroundProbe {
                // deeper water reads darker
                rgb: (0x20u32 << 16) | ((0x50 - depth) << 8) | 0x90,
                is_water: true,
            };
        }
        GroundProbe {
            rgb: band_color(terrain - self.sea_level),
            is_water: false,
        }
    }

    fn min_elevation(&self) -> i32 {
        0
    }
}

/// Land color by height above sea level.
fn band_color(rise: i32) -> u32 {
    if rise < 2 {
        0x00D2_BE8C // beach
    } else if rise < 12 {
        0x0050_A03C // lowland
    } else if rise < 24 {
        0x0028_7832 // forest
    } else if rise < 34 {
        0x006E_8C46 // hills
    } else if rise < 42 {
        0x0078_6E5A // mountain
    } else {
        0x00F0_F0F5 // snow
    }
}
