use alloc::vec::Vec;
use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use rand::{SeedableRng, rngs::SmallRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossReason {
    OutOfChances,
    OutOfTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Countdown { remaining: u8 },
    Highlighting { sequence: HighlightSequence, step: usize },
    Active,
    Won,
    Lost(LossReason),
}

impl Phase {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Countdown { .. } => "counting down",
            Self::Highlighting { .. } => "highlighting",
            Self::Active => "active",
            Self::Won => "won",
            Self::Lost(_) => "lost",
        }
    }

    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Won | Self::Lost(_))
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Idle
    }
}

/// The independent timers a round relies on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timer {
    Countdown,
    Highlight,
    Clock,
    Cooldown,
}

/// Handed to the driver with every scheduled timer and given back when it fires.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerTicket {
    pub timer: Timer,
    pub epoch: Epoch,
}

/// Side effects the driver has to carry out after an engine call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Schedule { ticket: TimerTicket, delay_ms: u32 },
    Cancel(Timer),
    CancelAll,
    Notify(Notice),
    ClearInput,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// Nothing on the grid matched, or the collaborators failed.
    NoMatch,
    Correct { score: u32 },
    Partial { cells: SmallVec<[CellIndex; GRID_CELLS]> },
    /// The round the attempt belonged to is over.
    Discarded,
}

/// Game lifecycle: idle, countdown, highlight animation, guessing, and the end of the round.
#[derive(Debug)]
pub struct GameEngine {
    config: GameConfig,
    phase: Phase,
    round: GameRound,
    input_locked: bool,
    rng: SmallRng,
    outbox: Vec<Effect>,
}

impl GameEngine {
    pub fn new(config: GameConfig, grid: Grid, seed: u64) -> Self {
        let round = GameRound::new(grid, &config);
        Self {
            config,
            phase: Phase::Idle,
            round,
            input_locked: true,
            rng: SmallRng::seed_from_u64(seed),
            outbox: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn round(&self) -> &GameRound {
        &self.round
    }

    pub fn grid(&self) -> &Grid {
        self.round.grid()
    }

    pub fn is_input_locked(&self) -> bool {
        self.input_locked
    }

    /// True when a new attempt would be looked at.
    pub fn accepts_attempts(&self) -> bool {
        self.phase.is_active() && !self.input_locked && self.round.chances() > 0
    }

    pub fn drain_effects(&mut self) -> alloc::vec::Drain<'_, Effect> {
        self.outbox.drain(..)
    }

    pub fn load_images(&mut self, images: impl IntoIterator<Item = ImageRecord>) -> Result<()> {
        if matches!(self.phase, Phase::Highlighting { .. } | Phase::Active) {
            return Err(self.invalid("load images"));
        }
        let grid = Grid::from_images(images)?;
        log::debug!("loaded {} cells", grid.cells().len());
        self.round.replace_grid(grid);
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(self.invalid("start"));
        }
        self.begin_countdown();
        Ok(())
    }

    /// Abandons whatever is going on and counts down to a fresh round.
    pub fn restart(&mut self) -> Result<()> {
        if matches!(self.phase, Phase::Idle) {
            return Err(self.invalid("restart"));
        }
        self.outbox.push(Effect::CancelAll);
        self.begin_countdown();
        Ok(())
    }

    fn begin_countdown(&mut self) {
        self.round.reset(&self.config);
        self.input_locked = true;
        self.phase = Phase::Countdown {
            remaining: self.config.countdown_ticks,
        };
        log::debug!("round {} counting down", self.round.epoch().get());

        self.outbox.push(Effect::ClearInput);
        self.outbox.push(Effect::Notify(Notice::game_starting()));
        self.schedule(Timer::Countdown, self.config.countdown_interval_ms);
    }

    /// Advances the timer named by `ticket`. Tickets from an earlier round are ignored.
    pub fn tick(&mut self, ticket: TimerTicket) {
        if ticket.epoch != self.round.epoch() {
            log::trace!("ignoring stale {:?} tick", ticket.timer);
            return;
        }

        match ticket.timer {
            Timer::Countdown => self.tick_countdown(),
            Timer::Highlight => self.tick_highlight(),
            Timer::Clock => self.tick_clock(),
            Timer::Cooldown => self.tick_cooldown(),
        }
    }

    fn tick_countdown(&mut self) {
        let Phase::Countdown { remaining } = &mut self.phase else {
            log::trace!("countdown tick while {}", self.phase.name());
            return;
        };

        self.outbox.push(Effect::Notify(Notice::countdown(*remaining)));
        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            self.schedule(Timer::Countdown, self.config.countdown_interval_ms);
        } else {
            self.begin_highlight();
        }
    }

    fn begin_highlight(&mut self) {
        let cells: SmallVec<[CellIndex; GRID_CELLS]> = CellIndex::all().collect();
        let target = cells
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(CellIndex::new_unchecked(0));
        let sequence = RandomWalkPath::new(&mut self.rng)
            .with_walk_length(self.config.walk_length)
            .generate(target);
        log::debug!("highlighting {} steps", sequence.len());

        self.round.set_target(target);
        match sequence.get(0) {
            Some(first) => {
                self.round.grid_mut().highlight(first);
                self.phase = Phase::Highlighting { sequence, step: 0 };
                self.schedule(Timer::Highlight, self.config.dwell_ms);
            }
            None => self.begin_active(),
        }
    }

    fn tick_highlight(&mut self) {
        let Phase::Highlighting { sequence, step } = &mut self.phase else {
            log::trace!("highlight tick while {}", self.phase.name());
            return;
        };

        *step += 1;
        let next = sequence.get(*step);
        self.round.grid_mut().clear_selection();

        match next {
            Some(index) => {
                self.round.grid_mut().highlight(index);
                self.schedule(Timer::Highlight, self.config.dwell_ms);
            }
            None => self.begin_active(),
        }
    }

    fn begin_active(&mut self) {
        self.phase = Phase::Active;
        self.input_locked = false;
        self.round.set_remaining_secs(self.config.round_secs);
        log::debug!("round {} active", self.round.epoch().get());

        self.outbox.push(Effect::Notify(Notice::game_started()));
        self.schedule(Timer::Clock, self.config.clock_interval_ms);
    }

    fn tick_clock(&mut self) {
        if !self.phase.is_active() {
            return;
        }

        if self.round.tick_clock() > 0 {
            self.schedule(Timer::Clock, self.config.clock_interval_ms);
        } else {
            log::debug!("round {} ran out of time", self.round.epoch().get());
            self.finish(Phase::Lost(LossReason::OutOfTime));
            self.outbox.push(Effect::Notify(Notice::out_of_time()));
        }
    }

    fn tick_cooldown(&mut self) {
        if !self.phase.is_active() {
            return;
        }
        self.input_locked = false;
        self.outbox.push(Effect::ClearInput);
    }

    /// Validates an attempt and spends a chance on it.
    ///
    /// Blank text is refused without costing a chance, but still locks input
    /// until the cooldown passes.
    pub fn begin_attempt(&mut self, text: &str) -> Result<PendingAttempt> {
        if !self.phase.is_active() || self.input_locked {
            return Err(GameError::NotAccepting);
        }

        let text = text.trim();
        if text.is_empty() {
            self.lock_input();
            return Err(GameError::EmptyAttempt);
        }

        if self.round.chances() == 0 {
            return Err(GameError::NoChancesLeft);
        }

        self.input_locked = true;
        let chances = self.round.consume_chance();
        log::debug!("attempt {text:?}, {chances} chances left");

        Ok(PendingAttempt {
            epoch: self.round.epoch(),
            text: text.into(),
            candidates: self.round.grid().ids(),
        })
    }

    /// Applies what the collaborators answered for `pending`.
    pub fn resolve_attempt(
        &mut self,
        pending: PendingAttempt,
        outcome: MatchOutcome,
        now: DateTime<Utc>,
    ) -> AttemptOutcome {
        if pending.epoch != self.round.epoch() || !self.phase.is_active() {
            log::debug!("discarding attempt {:?} from a finished round", pending.text);
            return AttemptOutcome::Discarded;
        }

        let outcome = self.apply_matches(&pending, outcome, now);
        if self.phase.is_active() {
            self.lock_input();
        } else {
            self.input_locked = true;
        }
        outcome
    }

    fn apply_matches(
        &mut self,
        pending: &PendingAttempt,
        outcome: MatchOutcome,
        now: DateTime<Utc>,
    ) -> AttemptOutcome {
        let matches = match outcome {
            Ok(matches) => matches,
            Err(err) => {
                log::warn!("matching {:?} failed: {err}", pending.text);
                self.round.record(&pending.text, AttemptResult::Incorrect, now);
                self.outbox.push(Effect::Notify(Notice::service_failure()));
                self.finish_if_out_of_chances();
                return AttemptOutcome::NoMatch;
            }
        };

        let threshold = self.config.match_threshold;
        let accepted: SmallVec<[&SimilarityMatch; GRID_CELLS]> = matches
            .iter()
            .filter(|found| found.similarity > threshold)
            .collect();
        let matched_ids: HashSet<&str> = accepted.iter().map(|found| found.id.as_str()).collect();
        let cells: SmallVec<[CellIndex; GRID_CELLS]> = self
            .round
            .grid()
            .cells()
            .iter()
            .filter(|cell| matched_ids.contains(cell.id()))
            .map(Cell::index)
            .collect();

        if cells.is_empty() {
            self.round.record(&pending.text, AttemptResult::Incorrect, now);
            self.outbox.push(Effect::Notify(Notice::no_match()));
            self.finish_if_out_of_chances();
            return AttemptOutcome::NoMatch;
        }

        // Several rows for one image still count as several matches.
        let unique = accepted.len() == 1;
        let target = self.round.target();
        self.round.grid_mut().clear_selection();

        if unique && cells.len() == 1 && Some(cells[0]) == target {
            self.round.grid_mut().paint(cells[0], CellMark::Correct);
            let score = self.round.award();
            self.round.record(&pending.text, AttemptResult::Correct, now);
            log::debug!("round {} won with {score}", self.round.epoch().get());
            self.finish(Phase::Won);
            self.outbox.push(Effect::Notify(Notice::correct()));
            return AttemptOutcome::Correct { score };
        }

        for &index in &cells {
            self.round.grid_mut().paint(index, CellMark::Incorrect);
            self.round.record(&pending.text, AttemptResult::Partial, now);
        }

        if !self.finish_if_out_of_chances() {
            let chances = self.round.chances();
            self.outbox.push(Effect::Notify(Notice::not_quite(chances)));
        }

        AttemptOutcome::Partial { cells }
    }

    /// Runs a whole attempt against the collaborators.
    pub async fn attempt<E, M>(
        &mut self,
        text: &str,
        embedder: &E,
        matcher: &M,
        now: DateTime<Utc>,
    ) -> Result<AttemptOutcome>
    where
        E: Embedder + ?Sized,
        M: Matcher + ?Sized,
    {
        let pending = self.begin_attempt(text)?;
        let outcome = pending.evaluate(embedder, matcher).await;
        Ok(self.resolve_attempt(pending, outcome, now))
    }

    fn finish_if_out_of_chances(&mut self) -> bool {
        if self.round.chances() > 0 {
            return false;
        }
        log::debug!("round {} out of chances", self.round.epoch().get());
        self.finish(Phase::Lost(LossReason::OutOfChances));
        self.outbox.push(Effect::Notify(Notice::out_of_chances()));
        true
    }

    fn finish(&mut self, phase: Phase) {
        self.phase = phase;
        self.outbox.push(Effect::Cancel(Timer::Clock));
    }

    fn lock_input(&mut self) {
        self.input_locked = true;
        self.schedule(Timer::Cooldown, self.config.cooldown_ms);
    }

    fn schedule(&mut self, timer: Timer, delay_ms: u32) {
        let ticket = TimerTicket {
            timer,
            epoch: self.round.epoch(),
        };
        self.outbox.push(Effect::Schedule { ticket, delay_ms });
    }

    fn invalid(&self, action: &'static str) -> GameError {
        GameError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }
}
