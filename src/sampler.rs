//! Surface sampling and the shade pipeline.
//!
//! One sample per world column: the shaded material color at the highest
//! solid point plus its elevation. Sampling is a pure function of provider
//! output — it never touches cache state, so captured tiles are
//! reproducible from the provider alone.

use crate::color;
use crate::provider::{GroundProbe, TerrainProvider};

/// Sentinel color meaning "no data yet".
pub const UNKNOWN_ARGB: u32 = 0xFF0C_0F14;

/// Sentinel elevation meaning "no data yet".
pub const ELEVATION_NONE: i16 = i16::MIN;

/// Blue the water tint blends toward.
pub const WATER_TINT_RGB: u32 = 0x002A_4DFF;

/// Blend ratio of the water tint.
pub const WATER_TINT_RATIO: f32 = 0.35;

/// Height-band shade step, added per channel.
const HEIGHT_SHADE_COEFF: f32 = 0.008;

/// One cached surface sample: shaded color plus elevation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSample {
    /// Shaded, tinted, brightened color, 0xAARRGGBB.
    pub argb: u32,
    /// Surface elevation, clamped to the representable range.
    pub elevation: i16,
}

impl SurfaceSample {
    /// The "no data yet" sample.
    pub const UNKNOWN: SurfaceSample = SurfaceSample {
        argb: UNKNOWN_ARGB,
        elevation: ELEVATION_NONE,
    };

    /// Whether this sample carries real data (neither sentinel present).
    pub fn is_known(&self) -> bool {
        self.argb != UNKNOWN_ARGB && self.elevation != ELEVATION_NONE
    }
}

/// Deterministic color pipeline applied to every captured column.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceSampler {
    brightness: f32,
    water_tint: bool,
}

impl SurfaceSampler {
    pub fn new(brightness: f32, water_tint: bool) -> Self {
        Self {
            brightness,
            water_tint,
        }
    }

    /// Sample one world column.
    ///
    /// Defined only when the provider reports the owning tile as loaded;
    /// the caller is responsible for that gate.
    pub fn sample<P: TerrainProvider + ?Sized>(
        &self,
        provider: &P,
        world_x: i32,
        world_z: i32,
    ) -> SurfaceSample {
        let elevation = provider.surface_elevation(world_x, world_z);
        let probe_y = (elevation - 1).max(provider.min_elevation());
        let probe = provider.ground(world_x, world_z, probe_y);

        let argb = self.shade(probe, elevation);
        SurfaceSample {
            argb,
            elevation: clamp_elevation(elevation),
        }
    }

    /// Apply the full shade pipeline to a raw probe.
    pub fn shade(&self, probe: GroundProbe, elevation: i32) -> u32 {
        let mut rgb = shade_by_height(probe.rgb, elevation);
        if self.water_tint && probe.is_water {
            rgb = color::mix(rgb, WATER_TINT_RGB, WATER_TINT_RATIO);
        }
        rgb = color::brighten(rgb, self.brightness);
        0xFF00_0000 | (rgb & 0x00FF_FFFF)
    }
}

impl Default for SurfaceSampler {
    fn default() -> Self {
        Self::new(1.10, true)
    }
}

/// Height-banding shade: breaks up flat color runs on slopes by nudging the
/// brightness with the elevation's position inside its 32-step band.
fn shade_by_height(rgb: u32, elevation: i32) -> u32 {
    let shade = (elevation & 31) - 16;
    color::shift(rgb, shade as f32 * HEIGHT_SHADE_COEFF)
}

fn clamp_elevation(v: i32) -> i16 {
    v.clamp(i16::MIN as i32 + 1, i16::MAX as i32) as i16
}
