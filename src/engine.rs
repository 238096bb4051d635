//! The long-lived map engine.
//!
//! One explicit object owns the whole pipeline — surface cache, raster
//! canvas, optional claim overlay — and is ticked by the host's frame loop.
//! There is no process-wide state anywhere: constructing two engines gives
//! two fully independent maps.

use std::path::Path;

use log::info;

use crate::cache::{CacheStats, SurfaceCache};
use crate::canvas::MapCanvas;
use crate::config::EngineConfig;
use crate::coords::TileCoord;
use crate::overlay::ClaimOverlay;
use crate::provider::TerrainProvider;

/// Surface cache + raster builder behind a single tick entry point.
pub struct MapEngine {
    cache: SurfaceCache,
    canvas: MapCanvas,
    overlay: Option<ClaimOverlay>,
    config: EngineConfig,
    ticks: u64,
}

impl MapEngine {
    /// Engine with its cache rooted at `base_dir`, in the default session
    /// until [`MapEngine::ensure_session`] names a real one.
    pub fn new<P: AsRef<Path>>(base_dir: P, config: EngineConfig) -> Self {
        Self {
            cache: SurfaceCache::new(base_dir, &config),
            canvas: MapCanvas::new(&config),
            overlay: None,
            config,
            ticks: 0,
        }
    }

    /// Adopt the session for (world, dimension). On a switch the canvas is
    /// discarded wholesale so nothing from the old world stays visible.
    pub fn ensure_session(&mut self, world: &str, dimension: &str) -> bool {
        let switched = self.cache.ensure_session(world, dimension);
        if switched {
            self.canvas.discard();
            if let Some(overlay) = self.overlay.as_mut() {
                overlay.clear();
            }
            info!("engine session now {}", self.cache.session());
        }
        switched
    }

    /// One cooperative tick: advance the background scan by one candidate,
    /// then give the raster builder its row budget for this frame.
    pub fn tick<P: TerrainProvider + ?Sized>(
        &mut self,
        provider: &P,
        desired_blocks_per_pixel: i32,
        center_x: i32,
        center_z: i32,
        boost: bool,
    ) {
        let viewer = TileCoord::from_world(center_x, center_z);

        self.cache.scan_step(provider, viewer);
        self.canvas.tick(
            &mut self.cache,
            self.overlay.as_ref(),
            desired_blocks_per_pixel,
            center_x,
            center_z,
            boost,
        );

        self.ticks += 1;
        if self.config.evict_every_ticks > 0 && self.ticks % self.config.evict_every_ticks == 0 {
            self.cache.evict_distant(viewer, self.config.keep_radius_tiles);
            if let Some(overlay) = self.overlay.as_mut() {
                overlay.prune_outside(viewer, self.config.keep_radius_tiles);
            }
        }
    }

    /// Event entry point: the provider reports a tile freshly loaded.
    pub fn notify_tile_loaded<P: TerrainProvider + ?Sized>(
        &mut self,
        provider: &P,
        tile: TileCoord,
    ) {
        self.cache.on_tile_loaded(provider, tile);
    }

    /// Attach (or replace) the claim overlay used for ownership tinting.
    pub fn set_overlay(&mut self, overlay: ClaimOverlay) {
        self.overlay = Some(overlay);
    }

    pub fn overlay_mut(&mut self) -> Option<&mut ClaimOverlay> {
        self.overlay.as_mut()
    }

    /// Published pixel plane for display, 0xAARRGGBB row-major.
    pub fn display(&self) -> &[u32] {
        self.canvas.display()
    }

    pub fn is_rebuilding(&self) -> bool {
        self.canvas.is_rebuilding()
    }

    pub fn blocks_per_pixel(&self) -> i32 {
        self.canvas.blocks_per_pixel()
    }

    pub fn canvas(&self) -> &MapCanvas {
        &self.canvas
    }

    pub fn cache(&self) -> &SurfaceCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SurfaceCache {
        &mut self.cache
    }

    pub fn stats(&self) -> &CacheStats {
        self.cache.stats()
    }
}
