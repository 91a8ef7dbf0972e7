//! Obstruction pass: which tiles are covered by a tile on a higher layer.

use super::tile::Tile;

/// Pure recomputation over a snapshot: `hidden[i]` for `tiles[i]`.
///
/// A tile is hidden iff some other uncollected tile on a strictly higher layer overlaps it
/// within `threshold` on both axes. Collected tiles are never hidden and never cover.
pub fn hidden_flags(tiles: &[Tile], threshold: f32) -> Vec<bool> {
    tiles
        .iter()
        .map(|tile| {
            !tile.collected
                && tiles.iter().any(|other| {
                    !other.collected
                        && other.layer > tile.layer
                        && other.id != tile.id
                        && tile.overlaps(other, threshold)
                })
        })
        .collect()
}

/// Apply [`hidden_flags`] in place. Returns true if any flag changed.
pub fn resolve_visibility(tiles: &mut [Tile], threshold: f32) -> bool {
    let flags = hidden_flags(tiles, threshold);
    let mut changed = false;
    for (tile, hidden) in tiles.iter_mut().zip(flags) {
        if tile.hidden != hidden {
            tile.hidden = hidden;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::layout::{LayoutConfig, generate_layout};
    use crate::game::tile::{IdAllocator, TileId, TileKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const THRESHOLD: f32 = 102.0;

    fn tile(id: u32, x: f32, y: f32, layer: u32) -> Tile {
        Tile::new(TileId(id), TileKind(0), x, y, layer)
    }

    #[test]
    fn tile_directly_below_is_hidden() {
        let mut tiles = vec![tile(0, 50.0, 50.0, 0), tile(1, 50.0, 50.0, 1)];
        assert!(resolve_visibility(&mut tiles, THRESHOLD));
        assert!(tiles[0].hidden);
        assert!(!tiles[1].hidden);
    }

    #[test]
    fn same_layer_never_hides() {
        let mut tiles = vec![tile(0, 50.0, 50.0, 2), tile(1, 60.0, 50.0, 2)];
        assert!(!resolve_visibility(&mut tiles, THRESHOLD));
        assert!(tiles.iter().all(|t| !t.hidden));
    }

    #[test]
    fn partial_overlap_counts_as_cover() {
        let mut tiles = vec![tile(0, 0.0, 0.0, 0), tile(1, 72.0, 72.0, 1)];
        resolve_visibility(&mut tiles, THRESHOLD);
        assert!(tiles[0].hidden);
    }

    #[test]
    fn distant_tile_does_not_cover() {
        let mut tiles = vec![tile(0, 0.0, 0.0, 0), tile(1, 144.0, 0.0, 1)];
        resolve_visibility(&mut tiles, THRESHOLD);
        assert!(!tiles[0].hidden);
    }

    #[test]
    fn collected_tiles_neither_hide_nor_get_hidden() {
        let mut tiles = vec![tile(0, 0.0, 0.0, 0), tile(1, 0.0, 0.0, 1), tile(2, 0.0, 0.0, 2)];
        tiles[1].collected = true;
        tiles[2].collected = true;
        resolve_visibility(&mut tiles, THRESHOLD);
        assert!(tiles.iter().all(|t| !t.hidden));
    }

    #[test]
    fn uncovering_clears_the_flag() {
        let mut tiles = vec![tile(0, 0.0, 0.0, 0), tile(1, 0.0, 0.0, 1)];
        resolve_visibility(&mut tiles, THRESHOLD);
        tiles.pop();
        assert!(resolve_visibility(&mut tiles, THRESHOLD));
        assert!(!tiles[0].hidden);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let config = LayoutConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut tiles = generate_layout(&config, &mut IdAllocator::default(), &mut rng).unwrap();
        assert!(resolve_visibility(&mut tiles, THRESHOLD));
        let snapshot = tiles.clone();
        assert!(!resolve_visibility(&mut tiles, THRESHOLD));
        assert_eq!(tiles, snapshot);
    }

    #[test]
    fn top_layer_of_pyramid_is_fully_visible() {
        let config = LayoutConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut tiles = generate_layout(&config, &mut IdAllocator::default(), &mut rng).unwrap();
        resolve_visibility(&mut tiles, THRESHOLD);
        assert!(tiles.iter().filter(|t| t.layer == 3).all(|t| !t.hidden));
        assert!(tiles.iter().filter(|t| t.layer < 3).any(|t| t.hidden));
    }
}
