//! One cached tile: a 16×16 grid of surface samples plus its record codec.
//!
//! Tiles are owned by the in-memory store; the region file on disk is a
//! passive mirror written once per capture. The record layout is fixed so a
//! region file can be addressed at `local_index * RECORD_BYTES` without any
//! header or directory.

use crate::coords::TILE_AREA;
use crate::sampler::{SurfaceSample, ELEVATION_NONE, UNKNOWN_ARGB};

/// On-disk record size: built byte + 256 colors (i32) + 256 elevations (i16).
pub const RECORD_BYTES: usize = 1 + TILE_AREA * 4 + TILE_AREA * 2;

/// A 16×16 grid of surface samples with a monotonic `built` flag.
#[derive(Clone)]
pub struct Tile {
    built: bool,
    colors: [u32; TILE_AREA],
    elevations: [i16; TILE_AREA],
}

impl Tile {
    /// New, unbuilt tile with every sample at the sentinels.
    pub fn new() -> Self {
        Self {
            built: false,
            colors: [UNKNOWN_ARGB; TILE_AREA],
            elevations: [ELEVATION_NONE; TILE_AREA],
        }
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Mark capture complete. Monotonic: there is no way back to unbuilt.
    pub fn mark_built(&mut self) {
        self.built = true;
    }

    /// Store a sample at a local index (row-major, 0..256).
    pub fn set(&mut self, local_index: usize, sample: SurfaceSample) {
        self.colors[local_index] = sample.argb;
        self.elevations[local_index] = sample.elevation;
    }

    /// Read a sample at a local index. `None` for unbuilt tiles and for
    /// slots still holding a sentinel.
    pub fn sample_at(&self, local_index: usize) -> Option<SurfaceSample> {
        if !self.built {
            return None;
        }
        let argb = self.colors[local_index];
        let elevation = self.elevations[local_index];
        if argb == UNKNOWN_ARGB || elevation == ELEVATION_NONE {
            return None;
        }
        Some(SurfaceSample { argb, elevation })
    }

    /// Encode the fixed 1537-byte region record (big-endian fields).
    ///
    /// The built byte is always written as 1: records exist on disk only
    /// for completed captures.
    pub fn encode_record(&self) -> [u8; RECORD_BYTES] {
        let mut buf = [0u8; RECORD_BYTES];
        buf[0] = 1;
        let mut off = 1;
        for &c in &self.colors {
            buf[off..off + 4].copy_from_slice(&c.to_be_bytes());
            off += 4;
        }
        for &e in &self.elevations {
            buf[off..off + 2].copy_from_slice(&e.to_be_bytes());
            off += 2;
        }
        buf
    }

    /// Decode a region record.
    ///
    /// `Ok(None)` for an unwritten slot (built byte 0, the sparse-file
    /// default); `Err` for a built byte that is neither 0 nor 1, which can
    /// only come from a damaged file.
    pub fn decode_record(buf: &[u8; RECORD_BYTES]) -> Result<Option<Tile>, RecordError> {
        match buf[0] {
            0 => return Ok(None),
            1 => {}
            other => return Err(RecordError::BadBuiltByte(other)),
        }

        let mut tile = Tile::new();
        let mut off = 1;
        for c in tile.colors.iter_mut() {
            *c = u32::from_be_bytes(buf[off..off + 4].try_into().unwrap());
            off += 4;
        }
        for e in tile.elevations.iter_mut() {
            *e = i16::from_be_bytes(buf[off..off + 2].try_into().unwrap());
            off += 2;
        }
        tile.built = true;
        Ok(Some(tile))
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::new()
    }
}

/// A structurally invalid record.
#[derive(Debug, PartialEq, Eq)]
pub enum RecordError {
    /// Built byte was neither 0 (unwritten) nor 1 (built).
    BadBuiltByte(u8),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::BadBuiltByte(b) => write!(f, "bad built byte {:#04x}", b),
        }
    }
}

impl std::error::Error for RecordError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_tile(argb: u32, elevation: i16) -> Tile {
        let mut tile = Tile::new();
        for i in 0..TILE_AREA {
            tile.set(
                i,
                SurfaceSample { argb, elevation },
            );
        }
        tile.mark_built();
        tile
    }

    #[test]
    fn test_record_size() {
        assert_eq!(RECORD_BYTES, 1537);
    }

    #[test]
    fn test_unbuilt_tile_reads_none() {
        let tile = Tile::new();
        for i in 0..TILE_AREA {
            assert!(tile.sample_at(i).is_none());
        }
    }

    #[test]
    fn test_sentinel_slot_reads_none_even_when_built() {
        let mut tile = Tile::new();
        tile.set(
            3,
            SurfaceSample {
                argb: 0xFF11_2233,
                elevation: 40,
            },
        );
        tile.mark_built();
        assert!(tile.sample_at(3).is_some());
        assert!(tile.sample_at(4).is_none());
    }

    #[test]
    fn test_record_round_trip() {
        let tile = solid_tile(0xFF22_4466, 64);
        let record = tile.encode_record();
        assert_eq!(record[0], 1);

        let decoded = Tile::decode_record(&record).unwrap().unwrap();
        assert!(decoded.is_built());
        for i in 0..TILE_AREA {
            let s = decoded.sample_at(i).unwrap();
            assert_eq!(s.argb, 0xFF22_4466);
            assert_eq!(s.elevation, 64);
        }
        // byte-for-byte stable across a second encode
        assert_eq!(decoded.encode_record(), record);
    }

    #[test]
    fn test_decode_unwritten_slot() {
        let zeroed = [0u8; RECORD_BYTES];
        assert!(Tile::decode_record(&zeroed).unwrap().is_none());
    }

    #[test]
    fn test_decode_bad_built_byte() {
        let mut buf = [0u8; RECORD_BYTES];
        buf[0] = 7;
        assert!(matches!(
            Tile::decode_record(&buf),
            Err(RecordError::BadBuiltByte(7))
        ));
    }
}
