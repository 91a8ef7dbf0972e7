//! Collection tray: bounded buffer of picked tiles, triple-match clearing, overflow.

use super::tile::{Tile, TileKind};
use std::collections::BTreeMap;

/// Tiles of one kind needed for a match.
pub const MATCH_SIZE: usize = 3;

/// Result of admitting one tile to the tray.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// Stored; tray still has room.
    Stored,
    /// Three of `kind` were removed from the tray.
    Matched { kind: TileKind, cleared: Vec<Tile> },
    /// No match and the tray reached capacity.
    Overflow,
}

#[derive(Debug, Clone)]
pub struct Collection {
    slots: Vec<Tile>,
    capacity: usize,
}

impl Collection {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Tray contents, grouped by kind.
    pub fn tiles(&self) -> &[Tile] {
        &self.slots
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Append `tile`, regroup by kind, then run exactly one match check.
    pub fn admit(&mut self, mut tile: Tile) -> Admission {
        tile.collected = true;
        tile.hidden = false;
        self.slots.push(tile);
        // Stable, so tiles of one kind keep arrival order.
        self.slots.sort_by_key(|t| t.kind);

        if let Some(kind) = self.first_complete_kind() {
            let (cleared, kept): (Vec<Tile>, Vec<Tile>) = std::mem::take(&mut self.slots)
                .into_iter()
                .partition(|t| t.kind == kind);
            self.slots = kept;
            return Admission::Matched { kind, cleared };
        }
        if self.slots.len() >= self.capacity {
            Admission::Overflow
        } else {
            Admission::Stored
        }
    }

    /// Lowest kind with exactly [`MATCH_SIZE`] tiles in the tray.
    fn first_complete_kind(&self) -> Option<TileKind> {
        let mut counts: BTreeMap<TileKind, usize> = BTreeMap::new();
        for t in &self.slots {
            *counts.entry(t.kind).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .find_map(|(kind, n)| (n == MATCH_SIZE).then_some(kind))
    }
}
