//! Endless-mode refill: one balanced batch on a fresh top layer when the board runs low.

use super::tile::{IdAllocator, Tile, TileKind};
use super::collection::MATCH_SIZE;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplenishParams {
    /// Refill when fewer active tiles than this remain.
    pub low_water: usize,
    pub kinds: u8,
    /// Batch positions are drawn from `[0, span)` on both axes.
    pub span: f32,
}

/// Tiles added by one refill.
#[derive(Debug, Clone)]
pub struct Batch {
    pub layer: u32,
    pub tiles: Vec<Tile>,
}

/// Returns a batch if `active` tiles dropped below the low-water mark.
///
/// Every kind gets exactly one triple, so the board can always make progress. `top_layer` is
/// advanced and the batch lands on it, above everything placed so far.
pub fn replenish<R: Rng>(
    active: usize,
    params: &ReplenishParams,
    top_layer: &mut u32,
    ids: &mut IdAllocator,
    rng: &mut R,
) -> Option<Batch> {
    if active >= params.low_water || params.kinds == 0 {
        return None;
    }
    *top_layer += 1;
    let layer = *top_layer;
    let span = params.span.max(f32::EPSILON);
    let tiles = TileKind::catalog(params.kinds)
        .flat_map(|kind| std::iter::repeat_n(kind, MATCH_SIZE))
        .map(|kind| {
            let x = rng.random_range(0.0..span);
            let y = rng.random_range(0.0..span);
            Tile::new(ids.next_id(), kind, x, y, layer)
        })
        .collect();
    Some(Batch { layer, tiles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    const PARAMS: ReplenishParams = ReplenishParams {
        low_water: 15,
        kinds: 14,
        span: 380.0,
    };

    #[test]
    fn nothing_at_or_above_low_water() {
        let mut top = 3;
        let mut rng = StdRng::seed_from_u64(0);
        assert!(replenish(15, &PARAMS, &mut top, &mut IdAllocator::default(), &mut rng).is_none());
        assert_eq!(top, 3);
    }

    #[test]
    fn batch_is_balanced_on_a_new_top_layer() {
        let mut top = 3;
        let mut rng = StdRng::seed_from_u64(9);
        let batch =
            replenish(14, &PARAMS, &mut top, &mut IdAllocator::default(), &mut rng).unwrap();
        assert_eq!(batch.layer, 4);
        assert_eq!(top, 4);
        assert_eq!(batch.tiles.len(), 42);
        let mut counts: HashMap<TileKind, usize> = HashMap::new();
        for t in &batch.tiles {
            *counts.entry(t.kind).or_insert(0) += 1;
            assert_eq!(t.layer, 4);
            assert!((0.0..380.0).contains(&t.x) && (0.0..380.0).contains(&t.y));
            assert!(!t.collected && !t.hidden);
        }
        assert_eq!(counts.len(), 14);
        assert!(counts.values().all(|&n| n == 3));
    }

    #[test]
    fn consecutive_batches_climb() {
        let mut top = 3;
        let mut ids = IdAllocator::default();
        let mut rng = StdRng::seed_from_u64(2);
        let a = replenish(0, &PARAMS, &mut top, &mut ids, &mut rng).unwrap();
        let b = replenish(0, &PARAMS, &mut top, &mut ids, &mut rng).unwrap();
        assert!(b.layer > a.layer);
        assert!(b.tiles[0].id > a.tiles.last().unwrap().id);
    }
}
