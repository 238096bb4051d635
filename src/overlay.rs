//! Claim-ownership overlay.
//!
//! A keyed store of tile ownership synced from elsewhere (an authoritative
//! server in the full system). The map engine only reads it, to tint
//! samples; everything else here is bookkeeping: merge of incoming
//! snapshots and prune-by-distance so the map never wipes visibly and
//! never grows without bound.

use std::collections::HashMap;

use crate::coords::TileCoord;

/// Tint applied over friendly claims.
pub const FRIENDLY_TINT_ARGB: u32 = 0xFF33_AA33;

/// Tint applied over hostile claims.
pub const HOSTILE_TINT_ARGB: u32 = 0xFFAA_3333;

/// Overlay tint strength.
pub const CLAIM_TINT_ALPHA: f32 = 0.35;

/// Relationship of a claimed tile to the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnershipKind {
    Friendly,
    Hostile,
}

impl OwnershipKind {
    /// Tint color for this ownership.
    pub fn tint_argb(&self) -> u32 {
        match self {
            OwnershipKind::Friendly => FRIENDLY_TINT_ARGB,
            OwnershipKind::Hostile => HOSTILE_TINT_ARGB,
        }
    }
}

/// One claimed tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimCell {
    pub kind: OwnershipKind,
    /// Display name of the owning group.
    pub owner: String,
}

/// Keyed store of claim state by tile coordinate.
#[derive(Default)]
pub struct ClaimOverlay {
    cells: HashMap<TileCoord, ClaimCell>,
}

impl ClaimOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, tile: TileCoord, cell: ClaimCell) {
        self.cells.insert(tile, cell);
    }

    pub fn get(&self, tile: TileCoord) -> Option<&ClaimCell> {
        self.cells.get(&tile)
    }

    pub fn remove(&mut self, tile: TileCoord) {
        self.cells.remove(&tile);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Merge an incoming snapshot. Entries are upserted, never removed:
    /// replacing wholesale makes claims outside the snapshot window blink
    /// out, which reads as data loss on screen.
    pub fn merge_snapshot<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (TileCoord, ClaimCell)>,
    {
        for (tile, cell) in entries {
            self.cells.insert(tile, cell);
        }
    }

    /// Drop cells outside a Chebyshev radius (in tiles) of the viewer.
    pub fn prune_outside(&mut self, center: TileCoord, keep_radius: i32) {
        self.cells
            .retain(|tile, _| tile.chebyshev_distance(center) <= keep_radius);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn friendly(owner: &str) -> ClaimCell {
        ClaimCell {
            kind: OwnershipKind::Friendly,
            owner: owner.to_string(),
        }
    }

    #[test]
    fn test_put_get_remove() {
        let mut overlay = ClaimOverlay::new();
        let tile = TileCoord::new(3, -4);
        overlay.put(tile, friendly("North Watch"));
        assert_eq!(overlay.get(tile).unwrap().owner, "North Watch");

        overlay.remove(tile);
        assert!(overlay.get(tile).is_none());
    }

    #[test]
    fn test_merge_keeps_entries_outside_snapshot() {
        let mut overlay = ClaimOverlay::new();
        overlay.put(TileCoord::new(100, 100), friendly("Far Hold"));

        overlay.merge_snapshot(vec![
            (TileCoord::new(0, 0), friendly("Near Hold")),
            (
                TileCoord::new(1, 0),
                ClaimCell {
                    kind: OwnershipKind::Hostile,
                    owner: "Raiders".to_string(),
                },
            ),
        ]);

        assert_eq!(overlay.len(), 3);
        assert!(overlay.get(TileCoord::new(100, 100)).is_some());
        assert_eq!(
            overlay.get(TileCoord::new(1, 0)).unwrap().kind,
            OwnershipKind::Hostile
        );
    }

    #[test]
    fn test_prune_outside() {
        let mut overlay = ClaimOverlay::new();
        overlay.put(TileCoord::new(0, 0), friendly("a"));
        overlay.put(TileCoord::new(10, 0), friendly("b"));
        overlay.put(TileCoord::new(0, 11), friendly("c"));

        overlay.prune_outside(TileCoord::new(0, 0), 10);
        assert_eq!(overlay.len(), 2);
        assert!(overlay.get(TileCoord::new(0, 11)).is_none());
    }

    #[test]
    fn test_tint_colors() {
        assert_eq!(OwnershipKind::Friendly.tint_argb(), FRIENDLY_TINT_ARGB);
        assert_eq!(OwnershipKind::Hostile.tint_argb(), HOSTILE_TINT_ARGB);
    }
}
