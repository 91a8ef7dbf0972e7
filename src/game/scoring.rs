//! Score and time-windowed combo multiplier.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ComboTracker {
    base_score: u32,
    window: Duration,
    score: u32,
    combo: u32,
    last_match: Option<Instant>,
}

impl ComboTracker {
    pub fn new(base_score: u32, window: Duration) -> Self {
        Self {
            base_score,
            window,
            score: 0,
            combo: 0,
            last_match: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn last_match(&self) -> Option<Instant> {
        self.last_match
    }

    /// Register a match at `now`. Returns `(score, combo)` after the update.
    ///
    /// A match inside the window of the previous one extends the combo; otherwise it restarts at 1.
    /// Points awarded are `base_score * combo`.
    pub fn on_match(&mut self, now: Instant) -> (u32, u32) {
        let in_window = self
            .last_match
            .is_some_and(|prev| now.saturating_duration_since(prev) < self.window);
        self.combo = if in_window {
            self.combo.saturating_add(1)
        } else {
            1
        };
        self.score = self
            .score
            .saturating_add(self.base_score.saturating_mul(self.combo));
        self.last_match = Some(now);
        (self.score, self.combo)
    }

    /// Points the most recent match awarded.
    pub fn last_award(&self) -> u32 {
        self.base_score.saturating_mul(self.combo)
    }

    pub fn reset(&mut self) {
        self.score = 0;
        self.combo = 0;
        self.last_match = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ComboTracker {
        ComboTracker::new(100, Duration::from_millis(2000))
    }

    #[test]
    fn first_match_is_combo_one() {
        let mut t = tracker();
        assert_eq!(t.on_match(Instant::now()), (100, 1));
    }

    #[test]
    fn quick_matches_stack_then_reset_after_window() {
        let mut t = tracker();
        let start = Instant::now();
        assert_eq!(t.on_match(start), (100, 1));
        assert_eq!(t.on_match(start + Duration::from_millis(1500)), (300, 2));
        assert_eq!(t.last_award(), 200);
        assert_eq!(t.on_match(start + Duration::from_millis(3600)), (400, 1));
    }

    #[test]
    fn window_is_measured_from_previous_match() {
        let mut t = tracker();
        let start = Instant::now();
        t.on_match(start);
        t.on_match(start + Duration::from_millis(1900));
        // 3800 ms after start but only 1900 ms after the last match.
        assert_eq!(t.on_match(start + Duration::from_millis(3800)), (600, 3));
    }

    #[test]
    fn exactly_at_window_resets() {
        let mut t = tracker();
        let start = Instant::now();
        t.on_match(start);
        assert_eq!(t.on_match(start + Duration::from_millis(2000)).1, 1);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut t = tracker();
        let start = Instant::now();
        t.on_match(start);
        t.reset();
        assert_eq!((t.score(), t.combo(), t.last_match()), (0, 0, None));
        assert_eq!(t.on_match(start + Duration::from_millis(10)), (100, 1));
    }
}
