use alloc::{string::String, vec::Vec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::*;

pub const BASE_SCORE: u32 = 1000;
pub const POINTS_PER_SECOND: u32 = 10;
pub const POINTS_PER_CHANCE: u32 = 500;

/// Score awarded for a correct guess.
pub const fn score_for(remaining_secs: u16, chances: u8) -> u32 {
    BASE_SCORE + (remaining_secs as u32) * POINTS_PER_SECOND + (chances as u32) * POINTS_PER_CHANCE
}

/// Generation counter of a round, bumped every time a round starts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Epoch(u32);

impl Epoch {
    pub const fn get(self) -> u32 {
        self.0
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptResult {
    Correct,
    Incorrect,
    Partial,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub text: String,
    pub result: AttemptResult,
    pub timestamp: DateTime<Utc>,
}

/// Everything that belongs to the round being played.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRound {
    grid: Grid,
    target: Option<CellIndex>,
    chances: u8,
    remaining_secs: u16,
    score: u32,
    history: Vec<AttemptRecord>,
    epoch: Epoch,
}

impl GameRound {
    pub fn new(grid: Grid, config: &GameConfig) -> Self {
        Self {
            grid,
            target: None,
            chances: config.max_chances,
            remaining_secs: config.round_secs,
            score: 0,
            history: Vec::new(),
            epoch: Epoch::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn target(&self) -> Option<CellIndex> {
        self.target
    }

    pub fn chances(&self) -> u8 {
        self.chances
    }

    pub fn remaining_secs(&self) -> u16 {
        self.remaining_secs
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Clears everything a previous round left behind and moves to a new epoch.
    pub(crate) fn reset(&mut self, config: &GameConfig) {
        self.grid.reset();
        self.target = None;
        self.chances = config.max_chances;
        self.remaining_secs = config.round_secs;
        self.score = 0;
        self.history.clear();
        self.epoch = self.epoch.next();
    }

    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub(crate) fn replace_grid(&mut self, grid: Grid) {
        self.grid = grid;
    }

    pub(crate) fn set_target(&mut self, target: CellIndex) {
        self.target = Some(target);
    }

    pub(crate) fn set_remaining_secs(&mut self, remaining_secs: u16) {
        self.remaining_secs = remaining_secs;
    }

    /// Counts down one second, returning the time left.
    pub(crate) fn tick_clock(&mut self) -> u16 {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.remaining_secs
    }

    pub(crate) fn consume_chance(&mut self) -> u8 {
        self.chances = self.chances.saturating_sub(1);
        self.chances
    }

    pub(crate) fn award(&mut self) -> u32 {
        self.score = score_for(self.remaining_secs, self.chances);
        self.score
    }

    pub(crate) fn record(&mut self, text: &str, result: AttemptResult, timestamp: DateTime<Utc>) {
        self.history.push(AttemptRecord {
            text: text.into(),
            result,
            timestamp,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    fn round() -> GameRound {
        let images = (0..9).map(|i| ImageRecord::new(format!("img-{i}"), format!("/{i}.jpg")));
        GameRound::new(Grid::from_images(images).unwrap(), &GameConfig::default())
    }

    #[test]
    fn score_combines_time_and_chance_bonuses() {
        assert_eq!(score_for(30, 2), 2300);
        assert_eq!(score_for(0, 0), BASE_SCORE);
        assert_eq!(score_for(12, 1), 1000 + 120 + 500);
    }

    #[test]
    fn counters_saturate_at_zero() {
        let mut round = round();
        for _ in 0..5 {
            round.consume_chance();
        }
        assert_eq!(round.chances(), 0);

        round.set_remaining_secs(1);
        assert_eq!(round.tick_clock(), 0);
        assert_eq!(round.tick_clock(), 0);
    }

    #[test]
    fn reset_restores_a_fresh_round_in_a_new_epoch() {
        let config = GameConfig::default();
        let mut round = round();
        let first_epoch = round.epoch();

        round.consume_chance();
        round.set_target(CellIndex::new(3).unwrap());
        round.award();
        round.record("a red bicycle", AttemptResult::Partial, DateTime::<Utc>::UNIX_EPOCH);

        round.reset(&config);

        assert_eq!(round.chances(), config.max_chances);
        assert_eq!(round.score(), 0);
        assert_eq!(round.target(), None);
        assert!(round.history().is_empty());
        assert!(round.epoch() > first_epoch);
    }
}
