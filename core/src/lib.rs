#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use engine::*;
pub use error::*;
pub use grid::*;
pub use notice::*;
pub use path::*;
pub use round::*;
pub use service::*;
pub use types::*;

mod engine;
mod error;
mod grid;
mod notice;
mod path;
mod round;
mod service;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub max_chances: u8,
    pub countdown_ticks: u8,
    pub countdown_interval_ms: u32,
    pub walk_length: usize,
    pub dwell_ms: u32,
    pub round_secs: u16,
    pub clock_interval_ms: u32,
    pub cooldown_ms: u32,
    /// Matches must be strictly more similar than this to count.
    pub match_threshold: f32,
}

impl GameConfig {
    pub const DEFAULT: Self = Self {
        max_chances: 3,
        countdown_ticks: 3,
        countdown_interval_ms: 1000,
        walk_length: DEFAULT_WALK_LENGTH,
        dwell_ms: 500,
        round_secs: 30,
        clock_interval_ms: 1000,
        cooldown_ms: 1500,
        match_threshold: 0.23,
    };

    pub fn with_match_threshold(self, match_threshold: f32) -> Self {
        Self {
            match_threshold: match_threshold.clamp(-1.0, 1.0),
            ..self
        }
    }

    pub fn with_max_chances(self, max_chances: u8) -> Self {
        Self {
            max_chances: max_chances.max(1),
            ..self
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
