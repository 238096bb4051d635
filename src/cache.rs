//! Persistent per-session surface cache.
//!
//! Orchestrates the in-memory tile store, the region persistence layer and
//! the sampler. Reads are pure lookups; captures are driven by the caller,
//! either from a "tile freshly loaded" event or from the round-robin scan
//! that sweeps a window around the viewer one candidate per tick.
//!
//! Every persistence failure is absorbed here: an I/O error or corrupt
//! record becomes a cache miss, counted in [`CacheStats`] and logged, and
//! the render loop never sees it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::coords::{local_index, TileCoord, TILE_SIZE};
use crate::eviction;
use crate::provider::TerrainProvider;
use crate::sampler::{SurfaceSample, SurfaceSampler};
use crate::session::SessionKey;
use crate::storage::{RegionStore, StorageError};
use crate::tile::Tile;

/// Counters for cache behavior, reset on session switch.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheStats {
    /// Point reads that returned data.
    pub hits: usize,
    /// Point reads that returned "no data".
    pub misses: usize,
    /// Tiles captured from the provider this session.
    pub captures: usize,
    /// Tiles adopted from disk.
    pub disk_loads: usize,
    /// Tile records written to disk.
    pub disk_saves: usize,
    /// Persistence failures absorbed as misses.
    pub io_errors: usize,
    /// Corrupt records absorbed as misses.
    pub corrupt_records: usize,
    /// Tiles dropped by the eviction policy.
    pub evictions: usize,
}

impl CacheStats {
    /// Hit rate over point reads (0.0 to 1.0).
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }

    /// Format as human-readable string.
    pub fn summary(&self) -> String {
        format!(
            "Hits: {} | Misses: {} | Rate: {:.1}% | Captures: {} | Disk: {}r/{}w | Errors: {}",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.captures,
            self.disk_loads,
            self.disk_saves,
            self.io_errors + self.corrupt_records,
        )
    }
}

/// Session-scoped cache of captured surface tiles.
pub struct SurfaceCache {
    base_dir: PathBuf,
    key: SessionKey,
    store: RegionStore,
    tiles: HashMap<TileCoord, Tile>,
    sampler: SurfaceSampler,
    scan_radius: i32,
    scan_cursor: (i32, i32),
    stats: CacheStats,
}

impl SurfaceCache {
    /// Cache rooted at `base_dir`, starting in the default session.
    pub fn new<P: AsRef<Path>>(base_dir: P, config: &EngineConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let key = SessionKey::default();
        let store = RegionStore::new(&base_dir, &key);
        Self {
            base_dir,
            key,
            store,
            tiles: HashMap::with_capacity(4096),
            sampler: SurfaceSampler::new(config.brightness, config.water_tint),
            scan_radius: config.scan_radius,
            scan_cursor: (0, 0),
            stats: CacheStats::default(),
        }
    }

    /// Current session identity.
    pub fn session(&self) -> &SessionKey {
        &self.key
    }

    /// Session root directory on disk.
    pub fn session_root(&self) -> &Path {
        self.store.root()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of tiles currently held in memory.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Whether a tile is in memory and fully captured.
    pub fn is_built(&self, tile: TileCoord) -> bool {
        self.tiles.get(&tile).map(Tile::is_built).unwrap_or(false)
    }

    /// Adopt the session for (world, dimension), switching scope if it
    /// differs from the active one. Returns true on a switch so the caller
    /// can discard any screen state seeded from the old world.
    pub fn ensure_session(&mut self, world: &str, dimension: &str) -> bool {
        let key = SessionKey::new(world, dimension);
        if key == self.key {
            return false;
        }
        info!("surface cache session switch: {} -> {}", self.key, key);

        // captures are durable the moment they happen, so a switch flushes
        // nothing: drop the hot map, re-root the store, restart the scan
        self.tiles.clear();
        self.store = RegionStore::new(&self.base_dir, &key);
        self.key = key;
        self.scan_cursor = (0, 0);
        self.stats = CacheStats::default();
        true
    }

    /// Read the cached sample for world column (x, z). Pure lookup: never
    /// samples the provider, but will adopt the tile's record from disk on
    /// first touch.
    pub fn read(&mut self, world_x: i32, world_z: i32) -> Option<SurfaceSample> {
        let tile_coord = TileCoord::from_world(world_x, world_z);
        let sample = self
            .tile_or_load(tile_coord)
            .sample_at(local_index(world_x, world_z));
        match sample {
            Some(s) => {
                self.stats.hits += 1;
                Some(s)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Capture a tile unless it is already built, in memory or on disk.
    ///
    /// Idempotent: a built tile costs one map lookup and zero sampler
    /// calls. Returns true only when the provider was actually sampled.
    pub fn capture_if_needed<P: TerrainProvider + ?Sized>(
        &mut self,
        provider: &P,
        tile_coord: TileCoord,
    ) -> bool {
        if let Some(tile) = self.tiles.get(&tile_coord) {
            if tile.is_built() {
                return false;
            }
        } else {
            match self.store.read_record(tile_coord) {
                Ok(Some(tile)) => {
                    // already captured in a previous run
                    self.tiles.insert(tile_coord, tile);
                    self.stats.disk_loads += 1;
                    return false;
                }
                Ok(None) => {}
                Err(e) => self.note_storage_error(&e),
            }
        }

        if !provider.tile_loaded(tile_coord) {
            return false;
        }

        let mut tile = Tile::new();
        let (base_x, base_z) = tile_coord.base_world();
        for lz in 0..TILE_SIZE {
            for lx in 0..TILE_SIZE {
                let sample = self.sampler.sample(provider, base_x + lx, base_z + lz);
                tile.set(((lz << 4) | lx) as usize, sample);
            }
        }

        // persist before marking built: a failed write leaves the tile
        // unbuilt so a later scan pass captures it again
        match self.store.write_record(tile_coord, &tile.encode_record()) {
            Ok(()) => {
                tile.mark_built();
                self.stats.disk_saves += 1;
                self.stats.captures += 1;
                debug!("captured tile {}", tile_coord);
            }
            Err(e) => self.note_storage_error(&e),
        }
        let captured = tile.is_built();
        self.tiles.insert(tile_coord, tile);
        captured
    }

    /// Event entry point: the provider reports a tile freshly loaded.
    pub fn on_tile_loaded<P: TerrainProvider + ?Sized>(
        &mut self,
        provider: &P,
        tile_coord: TileCoord,
    ) {
        self.capture_if_needed(provider, tile_coord);
    }

    /// Round-robin scan fallback: inspect one candidate tile in the
    /// (2R+1)² window around the viewer and capture it if loaded. The
    /// cursor wraps, so the whole window is revisited every (2R+1)² ticks
    /// at a fixed per-tick cost.
    pub fn scan_step<P: TerrainProvider + ?Sized>(&mut self, provider: &P, viewer: TileCoord) {
        let r = self.scan_radius;
        let (ox, oz) = self.scan_cursor;
        let candidate = TileCoord::new(viewer.x + ox - r, viewer.z + oz - r);

        self.scan_cursor.0 += 1;
        if self.scan_cursor.0 > 2 * r {
            self.scan_cursor.0 = 0;
            self.scan_cursor.1 += 1;
            if self.scan_cursor.1 > 2 * r {
                self.scan_cursor.1 = 0;
            }
        }

        if provider.tile_loaded(candidate) {
            self.capture_if_needed(provider, candidate);
        }
    }

    /// Apply the distance eviction policy around the viewer.
    pub fn evict_distant(&mut self, center: TileCoord, keep_radius: i32) {
        let dropped = eviction::prune_distant(&mut self.tiles, center, keep_radius);
        if dropped > 0 {
            self.stats.evictions += dropped;
            debug!("evicted {} tiles beyond {} of {}", dropped, keep_radius, center);
        }
    }

    fn tile_or_load(&mut self, tile_coord: TileCoord) -> &Tile {
        if !self.tiles.contains_key(&tile_coord) {
            let tile = match self.store.read_record(tile_coord) {
                Ok(Some(tile)) => {
                    self.stats.disk_loads += 1;
                    tile
                }
                Ok(None) => Tile::new(),
                Err(e) => {
                    self.note_storage_error(&e);
                    Tile::new()
                }
            };
            // an empty placeholder also caches the disk miss, so cold
            // points don't re-probe the filesystem every frame
            self.tiles.insert(tile_coord, tile);
        }
        &self.tiles[&tile_coord]
    }

    fn note_storage_error(&mut self, e: &StorageError) {
        match e {
            StorageError::Io(_) => self.stats.io_errors += 1,
            StorageError::Corrupt { .. } => self.stats.corrupt_records += 1,
        }
        warn!("surface cache: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::GroundProbe;
    use std::cell::Cell;
    use tempfile::tempdir;

    /// Fully loaded world with a solid color and a sampler call counter.
    struct CountingWorld {
        loaded: bool,
        rgb: u32,
        elevation: i32,
        samples: Cell<usize>,
    }

    impl CountingWorld {
        fn new(rgb: u32, elevation: i32) -> Self {
            Self {
                loaded: true,
                rgb,
                elevation,
                samples: Cell::new(0),
            }
        }
    }

    impl TerrainProvider for CountingWorld {
        fn tile_loaded(&self, _tile: TileCoord) -> bool {
            self.loaded
        }
        fn surface_elevation(&self, _x: i32, _z: i32) -> i32 {
            self.samples.set(self.samples.get() + 1);
            self.elevation
        }
        fn ground(&self, _x: i32, _z: i32, _elevation: i32) -> GroundProbe {
            GroundProbe {
                rgb: self.rgb,
                is_water: false,
            }
        }
    }

    fn new_cache(dir: &std::path::Path) -> SurfaceCache {
        let mut cache = SurfaceCache::new(dir, &EngineConfig::default());
        cache.ensure_session("test_world", "overworld");
        cache
    }

    #[test]
    fn test_capture_then_read() {
        let dir = tempdir().unwrap();
        let mut cache = new_cache(dir.path());
        let world = CountingWorld::new(0x0022_4466, 64);

        let tile = TileCoord::new(5, 5);
        assert!(cache.capture_if_needed(&world, tile));
        assert_eq!(world.samples.get(), 256);

        let (bx, bz) = tile.base_world();
        let sample = cache.read(bx, bz).unwrap();
        assert_eq!(sample.elevation, 64);
        assert_eq!(sample.argb & 0xFF00_0000, 0xFF00_0000);
    }

    #[test]
    fn test_capture_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut cache = new_cache(dir.path());
        let world = CountingWorld::new(0x0022_4466, 64);

        let tile = TileCoord::new(2, -3);
        assert!(cache.capture_if_needed(&world, tile));
        let after_first = world.samples.get();

        assert!(!cache.capture_if_needed(&world, tile));
        assert_eq!(world.samples.get(), after_first);
        assert_eq!(cache.stats().captures, 1);
    }

    #[test]
    fn test_disk_record_short_circuits_capture() {
        let dir = tempdir().unwrap();
        let tile = TileCoord::new(1, 1);
        let world = CountingWorld::new(0x0011_2233, 30);

        {
            let mut cache = new_cache(dir.path());
            assert!(cache.capture_if_needed(&world, tile));
        }

        // fresh instance, same session: record adopted, sampler untouched
        let mut cache = new_cache(dir.path());
        let before = world.samples.get();
        assert!(!cache.capture_if_needed(&world, tile));
        assert_eq!(world.samples.get(), before);
        assert_eq!(cache.stats().disk_loads, 1);
        assert!(cache.is_built(tile));
    }

    #[test]
    fn test_read_misses_on_never_captured() {
        let dir = tempdir().unwrap();
        let mut cache = new_cache(dir.path());
        assert!(cache.read(1000, -1000).is_none());
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_unloaded_tile_is_not_captured() {
        let dir = tempdir().unwrap();
        let mut cache = new_cache(dir.path());
        let mut world = CountingWorld::new(0x0011_2233, 30);
        world.loaded = false;

        assert!(!cache.capture_if_needed(&world, TileCoord::new(0, 0)));
        assert_eq!(world.samples.get(), 0);
        assert!(cache.read(0, 0).is_none());
    }

    #[test]
    fn test_built_flag_is_monotonic() {
        let dir = tempdir().unwrap();
        let mut cache = new_cache(dir.path());
        let world = CountingWorld::new(0x0022_4466, 64);

        let tile = TileCoord::new(0, 0);
        cache.capture_if_needed(&world, tile);
        assert!(cache.is_built(tile));

        // reads, scans and repeat captures never clear it
        cache.read(0, 0);
        cache.scan_step(&world, tile);
        cache.capture_if_needed(&world, tile);
        assert!(cache.is_built(tile));
    }

    #[test]
    fn test_session_switch_isolates_worlds() {
        let dir = tempdir().unwrap();
        let mut cache = new_cache(dir.path());
        let world = CountingWorld::new(0x0022_4466, 64);

        cache.capture_if_needed(&world, TileCoord::new(0, 0));
        assert!(cache.read(0, 0).is_some());

        assert!(cache.ensure_session("other_world", "overworld"));
        assert_eq!(cache.tile_count(), 0);
        assert!(cache.read(0, 0).is_none());

        // switching back finds the durable capture again
        assert!(cache.ensure_session("test_world", "overworld"));
        assert!(cache.read(0, 0).is_some());
    }

    #[test]
    fn test_ensure_session_same_key_is_noop() {
        let dir = tempdir().unwrap();
        let mut cache = new_cache(dir.path());
        let world = CountingWorld::new(0x0022_4466, 64);
        cache.capture_if_needed(&world, TileCoord::new(0, 0));

        assert!(!cache.ensure_session("test_world", "overworld"));
        assert_eq!(cache.tile_count(), 1);
    }

    #[test]
    fn test_scan_step_covers_window_and_wraps() {
        let dir = tempdir().unwrap();
        let mut config = EngineConfig::default();
        config.scan_radius = 1;
        let mut cache = SurfaceCache::new(dir.path(), &config);
        cache.ensure_session("test_world", "overworld");

        let world = CountingWorld::new(0x0011_2233, 10);
        let viewer = TileCoord::new(0, 0);

        // 3x3 window: nine steps capture all nine tiles
        for _ in 0..9 {
            cache.scan_step(&world, viewer);
        }
        for dz in -1..=1 {
            for dx in -1..=1 {
                assert!(cache.is_built(TileCoord::new(dx, dz)), "({}, {})", dx, dz);
            }
        }
        assert_eq!(cache.stats().captures, 9);

        // wrapped: further steps revisit built tiles without sampling
        let before = world.samples.get();
        for _ in 0..9 {
            cache.scan_step(&world, viewer);
        }
        assert_eq!(world.samples.get(), before);
    }

    #[test]
    fn test_scan_step_is_bounded_per_tick() {
        let dir = tempdir().unwrap();
        let mut cache = new_cache(dir.path());
        let world = CountingWorld::new(0x0011_2233, 10);

        cache.scan_step(&world, TileCoord::new(0, 0));
        // exactly one candidate per step: at most one tile's worth of samples
        assert!(world.samples.get() <= 256);
    }

    #[test]
    fn test_evict_distant_keeps_disk_copy() {
        let dir = tempdir().unwrap();
        let mut cache = new_cache(dir.path());
        let world = CountingWorld::new(0x0022_4466, 64);

        let far = TileCoord::new(200, 200);
        cache.capture_if_needed(&world, far);
        cache.evict_distant(TileCoord::new(0, 0), 96);
        assert_eq!(cache.tile_count(), 0);
        assert_eq!(cache.stats().evictions, 1);

        // evicted from memory, still durable
        let (bx, bz) = far.base_world();
        assert!(cache.read(bx, bz).is_some());
    }

    #[test]
    fn test_corrupt_record_is_a_miss_and_counted() {
        let dir = tempdir().unwrap();
        let tile = TileCoord::new(0, 0);
        let world = CountingWorld::new(0x0022_4466, 64);

        let path = {
            let mut cache = new_cache(dir.path());
            cache.capture_if_needed(&world, tile);
            cache.session_root().join("r.0.0.gmr")
        };

        // stamp a bad built byte over the record
        use std::io::{Seek, SeekFrom, Write};
        let mut file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.write_all(&[0xEE]).unwrap();
        drop(file);

        let mut cache = new_cache(dir.path());
        assert!(cache.read(0, 0).is_none());
        assert_eq!(cache.stats().corrupt_records, 1);
    }
}
