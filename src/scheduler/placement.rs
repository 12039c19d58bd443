//! Block placement into availability windows.
//!
//! # Algorithm
//!
//! Sessions are first grouped into atomic [`Block`]s: a warmup with its
//! preparation buffer and performances, or a single standalone session.
//! Blocks are then placed one at a time, threading an immutable
//! [`PlacementState`] through each step:
//!
//! 1. **Lunch check**: if the current day has no lunch yet and the cursor
//!    is past the soft limit (target + 1h), or the block would end after
//!    14:00, or the cursor is past the target and the block would end
//!    after the soft limit, a lunch break is placed first. A lunch that
//!    does not fit moves to the next window.
//! 2. **Simulated attempt**: the block's sessions are laid out from the
//!    cursor. Before a skating session whose skaters would push the
//!    on-ice count past the rule's capacity (or, when configured, whose
//!    length would push ice time past the cap), a resurfacing is inserted.
//!    Any session ending after the window end fails the whole attempt.
//! 3. **Commit or advance**: a successful attempt is committed. Otherwise
//!    the cursor moves to the next window, accumulators reset, and the
//!    block is retried from step 1. With no windows left the block is
//!    dropped with a schedule-full warning.
//!
//! Resurfacing and any break other than the preparation buffer reset the
//! on-ice accumulators.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use std::collections::BTreeSet;

use crate::models::{add_secs, SchedulerSettings, Session, SessionType, TimeWindow, Violation};

use super::grouping::SchedulingUnit;

/// Latest time a lunch may be pushed to.
const LUNCH_HARD_LIMIT_HOUR: u32 = 14;

/// A run of sessions that must be placed contiguously in one window.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Sessions in order.
    pub sessions: Vec<Session>,
    /// Sum of session durations (s).
    pub duration: i64,
}

impl Block {
    fn new(session: Session) -> Self {
        Self {
            duration: session.duration,
            sessions: vec![session],
        }
    }

    fn push(&mut self, session: Session) {
        self.duration = self.duration.saturating_add(session.duration);
        self.sessions.push(session);
    }

    fn is_group(&self) -> bool {
        self.sessions
            .first()
            .is_some_and(|s| s.session_type == SessionType::Warmup)
    }

    fn group_index(&self) -> Option<u32> {
        self.sessions.first().and_then(|s| s.group_index)
    }
}

/// Groups a unit's session stream into atomic blocks.
///
/// A warmup opens a group block; performances and the preparation buffer
/// with the same group index join it. Everything else is a block of its own.
pub fn build_blocks(sessions: Vec<Session>) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();

    for session in sessions {
        let joins_group = matches!(session.session_type, SessionType::Performance)
            || session.is_prep_buffer();
        match blocks.last_mut() {
            Some(current)
                if joins_group
                    && current.is_group()
                    && current.group_index() == session.group_index =>
            {
                current.push(session);
            }
            _ => blocks.push(Block::new(session)),
        }
    }

    blocks
}

/// Cursor and ice accounting between placement steps.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementState {
    /// Index of the current window.
    pub window_index: usize,
    /// Next free instant.
    pub cursor: NaiveDateTime,
    /// Skating time since the last reset (s).
    pub accumulated_duration: i64,
    /// Skaters on the ice since the last reset.
    pub accumulated_skaters: usize,
    /// Days that already have a lunch.
    pub lunch_days: BTreeSet<NaiveDate>,
}

impl PlacementState {
    /// State at the start of the first window.
    pub fn new(windows: &[TimeWindow]) -> Self {
        Self {
            window_index: 0,
            cursor: windows.first().map(|w| w.start).unwrap_or_default(),
            accumulated_duration: 0,
            accumulated_skaters: 0,
            lunch_days: BTreeSet::new(),
        }
    }

    /// Whether every window has been used up.
    pub fn is_exhausted(&self, windows: &[TimeWindow]) -> bool {
        self.window_index >= windows.len()
    }

    fn reset_ice(&mut self) {
        self.accumulated_duration = 0;
        self.accumulated_skaters = 0;
    }
}

/// Result of placing one block.
#[derive(Debug, Clone)]
pub struct PlacementStep {
    /// State after the step.
    pub state: PlacementState,
    /// Sessions committed in this step (lunch, resurfacing, block sessions).
    pub sessions: Vec<Session>,
    /// Set when the block could not be placed anywhere.
    pub warning: Option<Violation>,
}

/// Places blocks into a fixed list of windows.
#[derive(Debug, Clone)]
pub struct Placer<'a> {
    windows: &'a [TimeWindow],
    lunch_start: NaiveTime,
    lunch_secs: i64,
    resurfacing_secs: i64,
    max_ice_secs: Option<i64>,
}

impl<'a> Placer<'a> {
    /// Creates a placer over sorted windows.
    pub fn new(windows: &'a [TimeWindow], settings: &SchedulerSettings) -> Self {
        Self {
            windows,
            lunch_start: settings.lunch_start_time,
            lunch_secs: settings.lunch_secs(),
            resurfacing_secs: settings.ice_resurfacing_duration,
            max_ice_secs: settings.max_ice_secs(),
        }
    }

    /// Initial state.
    pub fn start(&self) -> PlacementState {
        PlacementState::new(self.windows)
    }

    /// Places one block of `unit`.
    ///
    /// `skater_limit` is the resurfacing capacity of the unit's primary rule.
    pub fn place_block(
        &self,
        state: &PlacementState,
        block: &Block,
        skater_limit: usize,
        unit: &SchedulingUnit<'_>,
    ) -> PlacementStep {
        let mut state = state.clone();
        let mut committed = Vec::new();

        while let Some(window) = self.windows.get(state.window_index) {
            if self.lunch_needed(&state, block.duration) {
                let lunch_end = add_secs(state.cursor, self.lunch_secs);
                if let Some(lunch_end) = lunch_end.filter(|&end| window.fits_until(end)) {
                    debug!("lunch at {} before {}", state.cursor, unit.display_name());
                    committed.push(Session::lunch(self.lunch_secs).placed_at(state.cursor));
                    state.lunch_days.insert(state.cursor.date());
                    state.cursor = lunch_end;
                    state.reset_ice();
                } else {
                    state = self.advance(state);
                    continue;
                }
            }

            match self.try_place(&state, block, window, skater_limit) {
                Some((next, sessions)) => {
                    committed.extend(sessions);
                    return PlacementStep {
                        state: next,
                        sessions: committed,
                        warning: None,
                    };
                }
                None => state = self.advance(state),
            }
        }

        PlacementStep {
            state,
            sessions: committed,
            warning: Some(Violation::schedule_full(unit.id(), &unit.display_name())),
        }
    }

    /// Whether a lunch must precede a block of `block_secs` at the cursor.
    pub fn lunch_needed(&self, state: &PlacementState, block_secs: i64) -> bool {
        let day = state.cursor.date();
        if state.lunch_days.contains(&day) {
            return false;
        }
        let target = day.and_time(self.lunch_start);
        let soft_limit = target + Duration::hours(1);
        let hard_limit = NaiveTime::from_hms_opt(LUNCH_HARD_LIMIT_HOUR, 0, 0)
            .map(|t| day.and_time(t))
            .unwrap_or(soft_limit);
        let block_end = add_secs(state.cursor, block_secs).unwrap_or(NaiveDateTime::MAX);

        let must = state.cursor >= soft_limit || block_end > hard_limit;
        let should = state.cursor >= target && block_end > soft_limit;
        must || should
    }

    /// Simulates placing `block` in `window` from the current cursor.
    ///
    /// Returns the new state and placed sessions, or `None` if anything
    /// would end after the window.
    fn try_place(
        &self,
        state: &PlacementState,
        block: &Block,
        window: &TimeWindow,
        skater_limit: usize,
    ) -> Option<(PlacementState, Vec<Session>)> {
        let mut sim = state.clone();
        let mut placed = Vec::with_capacity(block.sessions.len() + 1);

        for session in &block.sessions {
            if !matches!(
                session.session_type,
                SessionType::Resurfacing | SessionType::Break
            ) && self.needs_resurfacing(&sim, session, skater_limit)
            {
                let end = add_secs(sim.cursor, self.resurfacing_secs)
                    .filter(|&end| window.fits_until(end))?;
                placed.push(
                    Session::resurfacing(self.resurfacing_secs)
                        .with_class(
                            session.class_id.clone(),
                            session.class_name.clone(),
                            session.segment,
                        )
                        .placed_at(sim.cursor),
                );
                sim.cursor = end;
                sim.reset_ice();
            }

            let end = add_secs(sim.cursor, session.duration).filter(|&end| window.fits_until(end))?;
            placed.push(session.clone().placed_at(sim.cursor));
            sim.cursor = end;

            if session.resets_ice() {
                sim.reset_ice();
            } else {
                sim.accumulated_duration += session.duration;
                sim.accumulated_skaters += session.skater_count.unwrap_or(0);
            }
        }

        Some((sim, placed))
    }

    fn needs_resurfacing(&self, state: &PlacementState, session: &Session, limit: usize) -> bool {
        let by_skaters = session.skater_count.is_some_and(|count| {
            count > 0 && state.accumulated_skaters > 0 && state.accumulated_skaters + count > limit
        });
        let by_time = self.max_ice_secs.is_some_and(|max| {
            state.accumulated_duration > 0 && state.accumulated_duration + session.duration > max
        });
        by_skaters || by_time
    }

    fn advance(&self, mut state: PlacementState) -> PlacementState {
        state.window_index += 1;
        if let Some(next) = self.windows.get(state.window_index) {
            state.cursor = next.start;
        }
        state.reset_ice();
        state
    }
}
