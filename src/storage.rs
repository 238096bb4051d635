//! Region persistence: one flat file of fixed records per 32×32-tile region.
//!
//! A region file is a sparse array of 1537-byte records addressed by the
//! tile's local index — no header, no directory, no compaction. Files are
//! created and extended lazily on the first write that needs them. Reads
//! and writes are a single seek plus one transfer, so the caller can do
//! them synchronously inside a frame tick.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::coords::{RegionCoord, TileCoord};
use crate::session::SessionKey;
use crate::tile::{Tile, RECORD_BYTES};

/// File extension for region files.
pub const REGION_EXT: &str = "gmr";

/// Durable store for one session's captured tiles.
pub struct RegionStore {
    root: PathBuf,
}

impl RegionStore {
    /// Store rooted at `<base_dir>/<session hash>`. The directory is not
    /// created until the first write.
    pub fn new<P: AsRef<Path>>(base_dir: P, key: &SessionKey) -> Self {
        Self {
            root: base_dir.as_ref().join(key.root_name()),
        }
    }

    /// Session root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing a region.
    pub fn region_path(&self, region: RegionCoord) -> PathBuf {
        self.root
            .join(format!("r.{}.{}.{}", region.x, region.z, REGION_EXT))
    }

    /// Write a tile's record at its fixed offset, creating or extending the
    /// region file as needed. The write is durable when this returns.
    pub fn write_record(
        &self,
        tile: TileCoord,
        record: &[u8; RECORD_BYTES],
    ) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let path = self.region_path(tile.region());
        let offset = record_offset(tile);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(record)?;
        Ok(())
    }

    /// Read a tile's record.
    ///
    /// `Ok(None)` when the file is missing, too short to contain the slot,
    /// or the slot was never written. `Err(StorageError::Corrupt)` when the
    /// slot holds a structurally invalid record.
    pub fn read_record(&self, tile: TileCoord) -> Result<Option<Tile>, StorageError> {
        let path = self.region_path(tile.region());
        let offset = record_offset(tile);

        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata()?.len();
        if len < offset + RECORD_BYTES as u64 {
            return Ok(None);
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut buf = [0u8; RECORD_BYTES];
        file.read_exact(&mut buf)?;

        Tile::decode_record(&buf).map_err(|e| StorageError::Corrupt {
            region: tile.region(),
            detail: e.to_string(),
        })
    }

    /// Total bytes of this session's region files.
    pub fn total_size(&self) -> io::Result<u64> {
        if !self.root.exists() {
            return Ok(0);
        }
        let mut total = 0;
        for entry in fs::read_dir(&self.root)? {
            total += entry?.metadata()?.len();
        }
        Ok(total)
    }

    /// Delete every region file of this session.
    pub fn clear(&self) -> io::Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

fn record_offset(tile: TileCoord) -> u64 {
    tile.region_local_index() as u64 * RECORD_BYTES as u64
}

/// Errors from the persistence layer.
///
/// Callers above the store treat every variant as a cache miss; the split
/// exists so the miss can be counted and logged by cause.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying filesystem failure (permissions, disk, truncation race).
    Io(io::Error),
    /// A record that is present but structurally invalid.
    Corrupt {
        region: RegionCoord,
        detail: String,
    },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "region I/O error: {}", e),
            StorageError::Corrupt { region, detail } => {
                write!(f, "corrupt record in {}: {}", region, detail)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}
