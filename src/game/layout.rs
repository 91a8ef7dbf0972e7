//! Pyramid layout: concentric square layers filled from a shuffled, balanced pool.

use super::tile::{IdAllocator, Tile, TileKind};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

/// Centre of the logical board; every layer is centred on it.
pub const BOARD_CENTER: f32 = 250.0;

/// Distance between neighbouring cells as a fraction of the tile size.
const SPACING_RATIO: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerGrid {
    pub rows: u16,
    pub cols: u16,
}

impl LayerGrid {
    pub const fn square(n: u16) -> Self {
        Self { rows: n, cols: n }
    }

    pub fn cells(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Bottom layer first.
    pub layers: Vec<LayerGrid>,
    /// Catalog size K.
    pub kinds: u8,
    /// Each kind appears `sets_per_kind * 3` times.
    pub sets_per_kind: u16,
    pub tile_size: f32,
}

impl Default for LayoutConfig {
    /// 7x7 + 6x6 + 5x5 + 4x4 = 126 cells = 14 kinds * 3 sets * 3.
    fn default() -> Self {
        Self {
            layers: vec![
                LayerGrid::square(7),
                LayerGrid::square(6),
                LayerGrid::square(5),
                LayerGrid::square(4),
            ],
            kinds: 14,
            sets_per_kind: 3,
            tile_size: 120.0,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("tile pool holds {pool} tiles but the layers have {cells} cells")]
    PoolMismatch { pool: usize, cells: usize },
    #[error("layout needs at least one kind and one set per kind")]
    EmptyCatalog,
}

impl LayoutConfig {
    pub fn total_cells(&self) -> usize {
        self.layers.iter().map(LayerGrid::cells).sum()
    }

    pub fn pool_size(&self) -> usize {
        self.kinds as usize * self.sets_per_kind as usize * 3
    }

    /// Rejects configurations whose pool would not exactly cover the grid.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.kinds == 0 || self.sets_per_kind == 0 {
            return Err(LayoutError::EmptyCatalog);
        }
        let (pool, cells) = (self.pool_size(), self.total_cells());
        if pool != cells {
            return Err(LayoutError::PoolMismatch { pool, cells });
        }
        Ok(())
    }

    /// Highest layer index a generated layout uses.
    pub fn top_layer(&self) -> u32 {
        self.layers.len().saturating_sub(1) as u32
    }

    fn spacing(&self) -> f32 {
        self.tile_size * SPACING_RATIO
    }
}

/// Every kind repeated `sets_per_kind * 3` times, in catalog order.
fn balanced_pool(config: &LayoutConfig) -> Vec<TileKind> {
    let per_kind = config.sets_per_kind as usize * 3;
    TileKind::catalog(config.kinds)
        .flat_map(|kind| std::iter::repeat_n(kind, per_kind))
        .collect()
}

/// Build a fresh pyramid. Structure is fixed by `config`; kind assignment is random.
pub fn generate_layout<R: Rng>(
    config: &LayoutConfig,
    ids: &mut IdAllocator,
    rng: &mut R,
) -> Result<Vec<Tile>, LayoutError> {
    config.validate()?;
    let mut pool = balanced_pool(config);
    pool.shuffle(rng);

    let spacing = config.spacing();
    let mut kinds = pool.into_iter();
    let mut tiles = Vec::with_capacity(config.total_cells());
    for (layer, grid) in config.layers.iter().enumerate() {
        let left = BOARD_CENTER - f32::from(grid.cols) * spacing / 2.0;
        let top = BOARD_CENTER - f32::from(grid.rows) * spacing / 2.0;
        for r in 0..grid.rows {
            for c in 0..grid.cols {
                // validate() guarantees the pool covers every cell.
                let Some(kind) = kinds.next() else {
                    return Err(LayoutError::PoolMismatch {
                        pool: config.pool_size(),
                        cells: config.total_cells(),
                    });
                };
                tiles.push(Tile::new(
                    ids.next_id(),
                    kind,
                    left + f32::from(c) * spacing,
                    top + f32::from(r) * spacing,
                    layer as u32,
                ));
            }
        }
    }
    Ok(tiles)
}
