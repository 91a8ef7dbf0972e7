//! Game state: board, tray, score/combo, endless refill, session phases.

pub mod collection;
pub mod layout;
pub mod replenish;
pub mod scoring;
pub mod tile;
pub mod visibility;

use crate::GameMode;
use collection::{Admission, Collection};
use layout::{LayoutConfig, LayoutError, generate_layout};
use rand::SeedableRng;
use rand::rngs::StdRng;
use replenish::{ReplenishParams, replenish};
use scoring::ComboTracker;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tile::{IdAllocator, Tile, TileId, TileKind};
use visibility::resolve_visibility;

/// Cover threshold as a fraction of the tile size; looser than a full tile so partial overlaps count.
const OVERLAP_RATIO: f32 = 0.85;

/// Tunables for one session. Built from the CLI in `main`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    pub layout: LayoutConfig,
    /// Tray capacity; reaching it without a match loses.
    pub max_collection: usize,
    pub base_score: u32,
    pub combo_window: Duration,
    /// Endless refill threshold (active tiles).
    pub low_water: usize,
    /// Endless batch positions are drawn from `[0, replenish_span)`.
    pub replenish_span: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            max_collection: 7,
            base_score: 100,
            combo_window: Duration::from_millis(2000),
            low_water: 15,
            replenish_span: 380.0,
        }
    }
}

impl Rules {
    pub fn overlap_threshold(&self) -> f32 {
        self.layout.tile_size * OVERLAP_RATIO
    }

    fn replenish_params(&self) -> ReplenishParams {
        ReplenishParams {
            low_water: self.low_water,
            kinds: self.layout.kinds,
            span: self.replenish_span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Menu,
    Playing,
    Won,
    Lost,
}

impl Phase {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

/// What a single click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Unknown, covered, already taken, pending, or not playing.
    Ignored,
    Collected,
    Matched { kind: TileKind, points: u32, combo: u32 },
    Overflow,
}

/// Output for collaborators (UI effects, score submission). Drained with [`GameState::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Started { mode: GameMode, tiles: usize },
    Collected { id: TileId, kind: TileKind },
    Matched { kind: TileKind, points: u32, combo: u32 },
    Replenished { layer: u32, count: usize },
    Finished { mode: GameMode, outcome: Outcome, score: u32 },
}

/// The game controller. Owns every piece of per-session state.
#[derive(Debug)]
pub struct GameState {
    rules: Rules,
    rng: StdRng,
    pub mode: GameMode,
    pub phase: Phase,
    /// Tiles still on the board (collected tiles move to the tray).
    board: Vec<Tile>,
    tray: Collection,
    tracker: ComboTracker,
    ids: IdAllocator,
    /// Highest layer in use; endless batches go one above it.
    top_layer: u32,
    /// Tiles whose click is being processed.
    pending: HashSet<TileId>,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Validates the layout up front; a bad pyramid is a startup error, not a runtime one.
    pub fn new(rules: Rules, seed: Option<u64>) -> Result<Self, LayoutError> {
        rules.layout.validate()?;
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Ok(Self {
            tray: Collection::new(rules.max_collection),
            tracker: ComboTracker::new(rules.base_score, rules.combo_window),
            top_layer: rules.layout.top_layer(),
            rules,
            rng,
            mode: GameMode::Normal,
            phase: Phase::Menu,
            board: Vec::new(),
            ids: IdAllocator::default(),
            pending: HashSet::new(),
            events: Vec::new(),
        })
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Tiles on the board, bottom layer first.
    pub fn board(&self) -> &[Tile] {
        &self.board
    }

    pub fn tray(&self) -> &Collection {
        &self.tray
    }

    pub fn score(&self) -> u32 {
        self.tracker.score()
    }

    pub fn combo(&self) -> u32 {
        self.tracker.combo()
    }

    pub fn last_match(&self) -> Option<Instant> {
        self.tracker.last_match()
    }

    pub fn top_layer(&self) -> u32 {
        self.top_layer
    }

    #[cfg(test)]
    pub fn is_pending(&self, id: TileId) -> bool {
        self.pending.contains(&id)
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.board.iter().find(|t| t.id == id)
    }

    /// Uncovered tiles, in board order.
    pub fn clickable(&self) -> impl Iterator<Item = &Tile> {
        self.board.iter().filter(|t| !t.hidden)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start a fresh session in `mode`, discarding everything from the previous one.
    pub fn init_game(&mut self, mode: GameMode) -> Result<(), LayoutError> {
        self.reset_session();
        self.mode = mode;
        self.board = generate_layout(&self.rules.layout, &mut self.ids, &mut self.rng)?;
        self.phase = Phase::Playing;
        log::info!("new {:?} game with {} tiles", mode, self.board.len());
        self.events.push(GameEvent::Started {
            mode,
            tiles: self.board.len(),
        });
        self.settle();
        Ok(())
    }

    /// Leave the current session for the menu.
    pub fn return_to_menu(&mut self) {
        self.phase = Phase::Menu;
        self.on_leave_playing();
    }

    /// Pick tile `id`. Invalid targets are silently ignored.
    pub fn on_click(&mut self, id: TileId, now: Instant) -> ClickOutcome {
        // Only reachable by a caller that re-enters before `settle` finishes; a plain repeat click
        // is stopped by the tile having left the board.
        if self.phase != Phase::Playing || self.pending.contains(&id) {
            return ClickOutcome::Ignored;
        }
        let Some(index) = self
            .board
            .iter()
            .position(|t| t.id == id && !t.hidden && !t.collected)
        else {
            return ClickOutcome::Ignored;
        };
        self.pending.insert(id);

        let tile = self.board.remove(index);
        let kind = tile.kind;
        self.events.push(GameEvent::Collected { id, kind });

        let outcome = match self.tray.admit(tile) {
            Admission::Stored => ClickOutcome::Collected,
            Admission::Matched { kind, .. } => {
                let (_, combo) = self.tracker.on_match(now);
                let points = self.tracker.last_award();
                log::debug!("matched {:?}: +{} (combo x{})", kind, points, combo);
                self.events.push(GameEvent::Matched { kind, points, combo });
                ClickOutcome::Matched { kind, points, combo }
            }
            Admission::Overflow => {
                self.finish(Outcome::Lost);
                ClickOutcome::Overflow
            }
        };

        // Collected now; the tile can no longer be double-processed.
        self.pending.remove(&id);
        self.settle();
        outcome
    }

    /// Post-mutation pass: visibility to a fixed point, endless refill, win check.
    fn settle(&mut self) {
        let threshold = self.rules.overlap_threshold();
        resolve_visibility(&mut self.board, threshold);
        if self.phase != Phase::Playing {
            return;
        }
        match self.mode {
            GameMode::Endless => {
                let params = self.rules.replenish_params();
                if let Some(batch) = replenish(
                    self.board.len(),
                    &params,
                    &mut self.top_layer,
                    &mut self.ids,
                    &mut self.rng,
                ) {
                    let count = batch.tiles.len();
                    log::debug!("replenished {} tiles on layer {}", count, batch.layer);
                    self.board.extend(batch.tiles);
                    self.events.push(GameEvent::Replenished {
                        layer: batch.layer,
                        count,
                    });
                    resolve_visibility(&mut self.board, threshold);
                }
            }
            GameMode::Normal => {
                if self.board.is_empty() {
                    self.finish(Outcome::Won);
                }
            }
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.phase = match outcome {
            Outcome::Won => Phase::Won,
            Outcome::Lost => Phase::Lost,
        };
        let score = self.tracker.score();
        log::info!("{:?} game over: {:?} with score {}", self.mode, outcome, score);
        self.events.push(GameEvent::Finished {
            mode: self.mode,
            outcome,
            score,
        });
        self.on_leave_playing();
    }

    fn on_leave_playing(&mut self) {
        self.pending.clear();
        self.top_layer = self.rules.layout.top_layer();
    }

    fn reset_session(&mut self) {
        self.board.clear();
        self.tray.clear();
        self.tracker.reset();
        self.ids = IdAllocator::default();
        self.events.clear();
        self.on_leave_playing();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layout::LayerGrid;

    fn toy_rules() -> Rules {
        Rules {
            layout: LayoutConfig {
                layers: vec![LayerGrid { rows: 1, cols: 3 }],
                kinds: 1,
                sets_per_kind: 1,
                tile_size: 120.0,
            },
            ..Rules::default()
        }
    }

    fn started(rules: Rules, mode: GameMode) -> GameState {
        let mut game = GameState::new(rules, Some(42)).unwrap();
        game.init_game(mode).unwrap();
        game
    }

    /// Click any clickable tile whose kind satisfies `pred`.
    fn click_kind(game: &mut GameState, pred: impl Fn(TileKind) -> bool, now: Instant) -> ClickOutcome {
        let id = game
            .clickable()
            .find(|t| pred(t.kind))
            .map(|t| t.id)
            .expect("no clickable tile of that kind");
        game.on_click(id, now)
    }

    #[test]
    fn starts_in_menu() {
        let game = GameState::new(Rules::default(), Some(1)).unwrap();
        assert_eq!(game.phase, Phase::Menu);
        assert!(game.board().is_empty());
    }

    #[test]
    fn bad_layout_fails_at_construction() {
        let mut rules = Rules::default();
        rules.layout.sets_per_kind = 2;
        assert!(matches!(
            GameState::new(rules, Some(1)),
            Err(LayoutError::PoolMismatch { .. })
        ));
    }

    #[test]
    fn toy_game_is_won_with_one_match() {
        let mut game = started(toy_rules(), GameMode::Normal);
        let now = Instant::now();
        let ids: Vec<_> = game.board().iter().map(|t| t.id).collect();
        assert_eq!(game.on_click(ids[0], now), ClickOutcome::Collected);
        assert_eq!(game.on_click(ids[1], now), ClickOutcome::Collected);
        assert_eq!(game.phase, Phase::Playing);
        assert_eq!(
            game.on_click(ids[2], now),
            ClickOutcome::Matched {
                kind: TileKind(0),
                points: 100,
                combo: 1
            }
        );
        assert!(game.board().is_empty());
        assert!(game.tray().is_empty());
        assert_eq!(game.phase, Phase::Won);
        let events = game.drain_events();
        let matches = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Matched { .. }))
            .count();
        assert_eq!(matches, 1);
        assert!(events.contains(&GameEvent::Finished {
            mode: GameMode::Normal,
            outcome: Outcome::Won,
            score: 100
        }));
    }

    #[test]
    fn hidden_and_unknown_tiles_are_ignored() {
        let mut game = started(Rules::default(), GameMode::Normal);
        let hidden = game.board().iter().find(|t| t.hidden).unwrap().id;
        assert_eq!(game.on_click(hidden, Instant::now()), ClickOutcome::Ignored);
        assert_eq!(game.on_click(TileId(9999), Instant::now()), ClickOutcome::Ignored);
        assert_eq!(game.board().len(), 126);
        assert!(game.tray().is_empty());
    }

    #[test]
    fn second_click_on_same_tile_is_ignored() {
        let mut game = started(Rules::default(), GameMode::Normal);
        let id = game.clickable().next().unwrap().id;
        assert_ne!(game.on_click(id, Instant::now()), ClickOutcome::Ignored);
        assert_eq!(game.on_click(id, Instant::now()), ClickOutcome::Ignored);
        assert!(!game.is_pending(id));
        assert_eq!(game.tray().len(), 1);
    }

    #[test]
    fn clicks_outside_playing_are_ignored() {
        let mut game = GameState::new(toy_rules(), Some(1)).unwrap();
        game.init_game(GameMode::Normal).unwrap();
        let id = game.board()[0].id;
        game.return_to_menu();
        assert_eq!(game.on_click(id, Instant::now()), ClickOutcome::Ignored);
    }

    #[test]
    fn visibility_is_refreshed_after_pick() {
        let mut rules = toy_rules();
        rules.layout.layers = vec![LayerGrid { rows: 1, cols: 1 }, LayerGrid { rows: 1, cols: 2 }];
        let mut game = started(rules, GameMode::Normal);
        let bottom = game.board()[0].clone();
        assert!(bottom.hidden);
        // Removing both covering tiles exposes the bottom one.
        let top: Vec<_> = game.board()[1..].iter().map(|t| t.id).collect();
        for id in top {
            game.on_click(id, Instant::now());
        }
        assert!(!game.tile(bottom.id).unwrap().hidden);
    }

    #[test]
    fn overflow_loses() {
        let mut rules = Rules::default();
        rules.max_collection = 2;
        let mut game = started(rules, GameMode::Normal);
        let now = Instant::now();
        let first = game.clickable().next().unwrap().kind;
        assert_eq!(click_kind(&mut game, |k| k == first, now), ClickOutcome::Collected);
        assert_eq!(click_kind(&mut game, |k| k != first, now), ClickOutcome::Overflow);
        assert_eq!(game.phase, Phase::Lost);
        assert_eq!(game.tray().len(), 2);
        assert!(game.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::Finished { outcome: Outcome::Lost, .. }
        )));
    }

    #[test]
    fn combo_scores_across_matches() {
        // Three kinds, one triple each, all on one layer so everything is clickable.
        let mut rules = toy_rules();
        rules.layout.layers = vec![LayerGrid { rows: 3, cols: 3 }];
        rules.layout.kinds = 3;
        let mut game = started(rules, GameMode::Normal);
        let start = Instant::now();
        fn clicks(kind: u8, at: Instant, game: &mut GameState) -> ClickOutcome {
            let mut last = ClickOutcome::Ignored;
            for _ in 0..3 {
                last = click_kind(game, |k| k == TileKind(kind), at);
            }
            last
        }
        assert!(matches!(clicks(0, start, &mut game), ClickOutcome::Matched { points: 100, combo: 1, .. }));
        assert!(matches!(
            clicks(1, start + Duration::from_millis(500), &mut game),
            ClickOutcome::Matched { points: 200, combo: 2, .. }
        ));
        assert!(matches!(
            clicks(2, start + Duration::from_millis(3000), &mut game),
            ClickOutcome::Matched { points: 100, combo: 1, .. }
        ));
        assert_eq!(game.score(), 400);
        assert_eq!(game.phase, Phase::Won);
    }

    #[test]
    fn endless_never_wins_and_refills() {
        let mut game = started(toy_rules(), GameMode::Endless);
        // Three tiles is below the low-water mark, so a batch lands straight away.
        assert_eq!(game.top_layer(), 1);
        assert_eq!(game.board().len(), 6);
        let now = Instant::now();
        for _ in 0..30 {
            click_kind(&mut game, |_| true, now);
            assert_eq!(game.phase, Phase::Playing);
            assert!(!game.board().is_empty());
        }
        assert!(game.score() > 0);
    }

    #[test]
    fn endless_batch_goes_above_everything() {
        let mut rules = Rules::default();
        rules.low_water = 127;
        let mut game = started(rules, GameMode::Endless);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::Replenished { layer: 4, count: 42 }));
        let max_before = 3;
        let batch: Vec<_> = game.board().iter().filter(|t| t.layer > max_before).collect();
        assert_eq!(batch.len(), 42);
        assert!(batch.iter().all(|t| t.layer == 4));
    }

    #[test]
    fn init_game_resets_session() {
        let mut game = started(Rules::default(), GameMode::Endless);
        let now = Instant::now();
        click_kind(&mut game, |_| true, now);
        game.init_game(GameMode::Normal).unwrap();
        assert_eq!(game.mode, GameMode::Normal);
        assert_eq!(game.phase, Phase::Playing);
        assert_eq!(game.board().len(), 126);
        assert!(game.tray().is_empty());
        assert_eq!((game.score(), game.combo()), (0, 0));
        assert_eq!(game.top_layer(), 3);
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::Started {
                mode: GameMode::Normal,
                tiles: 126
            }]
        );
    }

    #[test]
    fn leaving_play_resets_top_layer() {
        let mut game = started(toy_rules(), GameMode::Endless);
        assert_eq!(game.top_layer(), 1);
        game.return_to_menu();
        assert_eq!(game.top_layer(), 0);
        assert_eq!(game.phase, Phase::Menu);
    }
}
