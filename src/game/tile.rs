//! Tile identity, kind and placement.

/// Session-unique tile identity. Allocated from a monotonic counter owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

/// Index into the tile catalog (0..K). Ordering is the tray sort order and the match tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKind(pub u8);

impl TileKind {
    /// Every kind of a catalog with `count` entries, lowest first.
    pub fn catalog(count: u8) -> impl Iterator<Item = Self> {
        (0..count).map(Self)
    }

    /// Single-character face shown on the board and in the tray.
    pub fn glyph(self) -> char {
        if self.0 < 26 {
            char::from(b'A' + self.0)
        } else {
            '?'
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    /// Top-left corner in logical board units.
    pub x: f32,
    pub y: f32,
    /// Stacking order; higher sits on top.
    pub layer: u32,
    pub collected: bool,
    /// Derived by the visibility pass; never set by click handling.
    pub hidden: bool,
}

impl Tile {
    pub fn new(id: TileId, kind: TileKind, x: f32, y: f32, layer: u32) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            layer,
            collected: false,
            hidden: false,
        }
    }

    /// True if the two footprints are closer than `threshold` on both axes.
    #[inline]
    pub fn overlaps(&self, other: &Self, threshold: f32) -> bool {
        (self.x - other.x).abs() < threshold && (self.y - other.y).abs() < threshold
    }
}

/// Hands out session-unique tile ids.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> TileId {
        let id = TileId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}
