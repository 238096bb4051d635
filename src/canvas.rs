//! Incremental, double-buffered raster builder.
//!
//! Owns a fixed 256×256 sample grid representing the viewport and rebuilds
//! it from the surface cache a few rows per tick. The front plane is always
//! one complete prior build; the back plane is the in-progress target. The
//! display plane is what a consumer blits: completed rows are staged into
//! it at a fixed cadence, with the seeded frame published up front so a
//! rebuild never blanks the screen.
//!
//! A rebuild trigger while a build is in flight supersedes it: progress is
//! discarded and the build restarts at row 0 with the new seed. Rows in
//! 0..build_row therefore always belong to a single build.

use std::mem;

use log::debug;

use crate::cache::SurfaceCache;
use crate::color;
use crate::config::EngineConfig;
use crate::coords::TileCoord;
use crate::overlay::{ClaimOverlay, CLAIM_TINT_ALPHA};
use crate::sampler::UNKNOWN_ARGB;

/// Canvas edge length in samples, independent of zoom.
pub const SAMPLE_SIZE: usize = 256;

/// Working sentinel for "no elevation" in the build planes.
const ELEVATION_UNSET: i32 = i32::MIN;

/// Slope shade clamp, in elevation steps.
const SLOPE_CLAMP: i32 = 6;

/// Shade strength per clamped elevation step.
const SLOPE_SHADE_COEFF: f32 = 0.035;

/// Double-buffered viewport raster.
pub struct MapCanvas {
    front: Vec<u32>,
    front_elev: Vec<i32>,
    back: Vec<u32>,
    back_elev: Vec<i32>,
    /// Published pixels; the only plane a consumer reads.
    display: Vec<u32>,

    rebuilding: bool,
    build_row: usize,
    /// First back row staged but not yet published.
    publish_from: usize,

    has_center: bool,
    center_x: i32,
    center_z: i32,

    blocks_per_pixel: i32,

    min_bpp: i32,
    max_bpp: i32,
    rows_per_tick: usize,
    boost_rows_per_tick: usize,
    publish_every_rows: usize,
}

impl MapCanvas {
    pub fn new(config: &EngineConfig) -> Self {
        let area = SAMPLE_SIZE * SAMPLE_SIZE;
        Self {
            front: vec![UNKNOWN_ARGB; area],
            front_elev: vec![ELEVATION_UNSET; area],
            back: vec![UNKNOWN_ARGB; area],
            back_elev: vec![ELEVATION_UNSET; area],
            display: vec![UNKNOWN_ARGB; area],
            rebuilding: false,
            build_row: 0,
            publish_from: 0,
            has_center: false,
            center_x: 0,
            center_z: 0,
            blocks_per_pixel: config.min_blocks_per_pixel.max(1),
            min_bpp: config.min_blocks_per_pixel.max(1),
            max_bpp: config.max_blocks_per_pixel.max(config.min_blocks_per_pixel),
            rows_per_tick: config.rows_per_tick.max(1),
            boost_rows_per_tick: config.boost_rows_per_tick.max(1),
            publish_every_rows: config.publish_every_rows.max(1),
        }
    }

    pub fn sample_size(&self) -> usize {
        SAMPLE_SIZE
    }

    /// World distance covered by one canvas sample.
    pub fn blocks_per_pixel(&self) -> i32 {
        self.blocks_per_pixel
    }

    /// Whether a rebuild is in flight (UI shows a "building" hint).
    pub fn is_rebuilding(&self) -> bool {
        self.rebuilding
    }

    /// Published pixel plane, 0xAARRGGBB, row-major 256×256.
    pub fn display(&self) -> &[u32] {
        &self.display
    }

    /// Last completed build's sample plane.
    pub fn front(&self) -> &[u32] {
        &self.front
    }

    /// Center of the last requested build, if any.
    pub fn center(&self) -> Option<(i32, i32)> {
        self.has_center.then_some((self.center_x, self.center_z))
    }

    /// Drop everything, including the front plane, and publish the blank
    /// frame. For session switches: nothing from the old world may survive.
    pub fn discard(&mut self) {
        self.front.fill(UNKNOWN_ARGB);
        self.front_elev.fill(ELEVATION_UNSET);
        self.back.fill(UNKNOWN_ARGB);
        self.back_elev.fill(ELEVATION_UNSET);
        self.display.fill(UNKNOWN_ARGB);
        self.rebuilding = false;
        self.build_row = 0;
        self.publish_from = 0;
        self.has_center = false;
        debug!("canvas discarded");
    }

    /// One scheduling quantum: decide whether a (re)build is needed for the
    /// requested zoom/center, then process up to the row budget.
    pub fn tick(
        &mut self,
        cache: &mut SurfaceCache,
        overlay: Option<&ClaimOverlay>,
        desired_bpp: i32,
        center_x: i32,
        center_z: i32,
        boost: bool,
    ) {
        let requested = desired_bpp.clamp(self.min_bpp, self.max_bpp);

        if requested != self.blocks_per_pixel {
            // zoom change: stale pixels would be at the wrong scale, so the
            // back plane starts from sentinels instead of the front copy
            self.blocks_per_pixel = requested;
            self.start_rebuild(center_x, center_z, false);
        } else if !self.has_center {
            self.start_rebuild(center_x, center_z, false);
        } else {
            let threshold = self.blocks_per_pixel.max(2);
            let dx = (center_x - self.center_x).abs();
            let dz = (center_z - self.center_z).abs();
            if dx >= threshold || dz >= threshold {
                // pan: seed from the front frame for visual continuity
                self.start_rebuild(center_x, center_z, true);
            }
        }

        if self.rebuilding {
            let budget = if boost {
                self.boost_rows_per_tick
            } else {
                self.rows_per_tick
            };
            self.step_build(cache, overlay, budget);
        }
    }

    /// Begin a build toward (center_x, center_z). Supersedes any build in
    /// flight; prior progress is discarded (discard-all policy).
    fn start_rebuild(&mut self, center_x: i32, center_z: i32, seed_from_front: bool) {
        if self.rebuilding {
            debug!("rebuild superseded at row {}", self.build_row);
        }
        self.center_x = center_x;
        self.center_z = center_z;
        self.has_center = true;
        self.rebuilding = true;
        self.build_row = 0;
        self.publish_from = 0;

        if seed_from_front {
            self.back.copy_from_slice(&self.front);
            self.back_elev.copy_from_slice(&self.front_elev);
        } else {
            self.back.fill(UNKNOWN_ARGB);
            self.back_elev.fill(ELEVATION_UNSET);
        }

        // publish the seeded frame immediately so the view never blanks
        self.display.copy_from_slice(&self.back);
    }

    fn step_build(
        &mut self,
        cache: &mut SurfaceCache,
        overlay: Option<&ClaimOverlay>,
        rows_budget: usize,
    ) {
        let half = (SAMPLE_SIZE / 2) as i32;
        let mut rows = 0;

        while rows < rows_budget && self.build_row < SAMPLE_SIZE {
            let sy = self.build_row;
            let world_z = self.center_z + (sy as i32 - half) * self.blocks_per_pixel;
            let base = sy * SAMPLE_SIZE;

            for sx in 0..SAMPLE_SIZE {
                let world_x = self.center_x + (sx as i32 - half) * self.blocks_per_pixel;
                match cache.read(world_x, world_z) {
                    Some(sample) => {
                        self.back[base + sx] = sample.argb;
                        self.back_elev[base + sx] = sample.elevation as i32;
                    }
                    None => {
                        self.back[base + sx] = UNKNOWN_ARGB;
                        self.back_elev[base + sx] = ELEVATION_UNSET;
                    }
                }
            }

            self.shade_slopes_for_row(sy);
            if let Some(overlay) = overlay {
                self.tint_claims_for_row(overlay, sy);
            }

            self.build_row += 1;
            rows += 1;

            if self.build_row - self.publish_from >= self.publish_every_rows {
                self.publish_pending();
            }
        }

        // never yield with completed rows unpublished
        self.publish_pending();

        if self.build_row >= SAMPLE_SIZE {
            mem::swap(&mut self.front, &mut self.back);
            mem::swap(&mut self.front_elev, &mut self.back_elev);
            self.rebuilding = false;
        }
    }

    /// Stage rows completed since the last publish into the display plane.
    fn publish_pending(&mut self) {
        if self.publish_from >= self.build_row {
            return;
        }
        let a = self.publish_from * SAMPLE_SIZE;
        let b = self.build_row * SAMPLE_SIZE;
        self.display[a..b].copy_from_slice(&self.back[a..b]);
        self.publish_from = self.build_row;
    }

    /// Relief shading: darken samples that face away from the north-west,
    /// comparing each sample's elevation against its west and north
    /// neighbors. Missing neighbors count as flat, so edges and unknown
    /// samples get zero gradient.
    fn shade_slopes_for_row(&mut self, sy: usize) {
        let base = sy * SAMPLE_SIZE;
        for sx in 0..SAMPLE_SIZE {
            let idx = base + sx;
            let h = self.back_elev[idx];
            if h == ELEVATION_UNSET {
                continue;
            }

            let mut west = if sx > 0 { self.back_elev[idx - 1] } else { h };
            let mut north = if sy > 0 {
                self.back_elev[idx - SAMPLE_SIZE]
            } else {
                h
            };
            if west == ELEVATION_UNSET {
                west = h;
            }
            if north == ELEVATION_UNSET {
                north = h;
            }

            let dh = ((west - h) + (north - h)).clamp(-SLOPE_CLAMP, SLOPE_CLAMP);
            if dh == 0 {
                continue;
            }
            let shade = -(dh as f32) * SLOPE_SHADE_COEFF;
            let rgb = color::shift(self.back[idx], shade);
            self.back[idx] = 0xFF00_0000 | (rgb & 0x00FF_FFFF);
        }
    }

    /// Blend claim ownership tints over a completed row.
    fn tint_claims_for_row(&mut self, overlay: &ClaimOverlay, sy: usize) {
        let half = (SAMPLE_SIZE / 2) as i32;
        let world_z = self.center_z + (sy as i32 - half) * self.blocks_per_pixel;
        let base = sy * SAMPLE_SIZE;

        for sx in 0..SAMPLE_SIZE {
            let world_x = self.center_x + (sx as i32 - half) * self.blocks_per_pixel;
            let tile = TileCoord::from_world(world_x, world_z);
            if let Some(cell) = overlay.get(tile) {
                self.back[base + sx] = color::tint(
                    self.back[base + sx],
                    cell.kind.tint_argb(),
                    CLAIM_TINT_ALPHA,
                );
            }
        }
    }
}
