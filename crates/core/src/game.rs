//! Game state module - the game loop and its state machine
//!
//! This module ties together all core components: board, resolver, piece source
//! and scoring. Time is counted in whole ticks supplied by the caller; nothing
//! here reads a clock or polls a device.
//!
//! A piece moves through `Spawning → Falling → Locking → LineClearing` and back
//! to `Spawning`, or into `GameOver` when a fresh piece does not fit. All
//! transitions triggered by one intent or one gravity step run to completion
//! before control returns, so callers only ever observe `Falling` or `GameOver`.

use crate::board::Board;
use crate::piece::ActivePiece;
use crate::resolver::{drop_position, fits, try_rotate, try_shift};
use crate::rng::{BagRandomizer, PieceSource};
use crate::scoring::{calculate_level, calculate_line_score, gravity_interval_ticks};
use crate::snapshot::{ActiveSnapshot, GameSnapshot};
use crate::types::{Intent, LockEvent, PieceKind, MAX_INTENTS_PER_ADVANCE, MAX_START_LEVEL};

/// Session settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Seed for the 7-bag piece source
    pub seed: u32,
    /// Level the session starts at (clamped to `MAX_START_LEVEL`)
    pub start_level: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            start_level: 0,
        }
    }
}

/// States of the game loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Spawning,
    Falling,
    Locking,
    LineClearing,
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Spawning => "spawning",
            Phase::Falling => "falling",
            Phase::Locking => "locking",
            Phase::LineClearing => "lineClearing",
            Phase::GameOver => "gameOver",
        }
    }
}

/// How an `advance` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A piece is falling
    Running,
    /// The session is over; only `new_game` changes state now
    GameOver,
    /// A quit intent stopped the batch
    Quit,
}

/// Summary of one `advance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceReport {
    pub step: Step,
    /// Intents that changed the falling piece
    pub intents_applied: u32,
    /// Intents the resolver refused (or that arrived with no falling piece)
    pub intents_rejected: u32,
    /// Intents past `MAX_INTENTS_PER_ADVANCE`, never looked at
    pub intents_dropped: u32,
    /// Gravity steps attempted
    pub gravity_steps: u32,
    /// Pieces locked into the board
    pub locks: u32,
    /// Rows removed across all locks
    pub lines_cleared: u32,
}

impl AdvanceReport {
    fn new() -> Self {
        Self {
            step: Step::Running,
            intents_applied: 0,
            intents_rejected: 0,
            intents_dropped: 0,
            gravity_steps: 0,
            locks: 0,
            lines_cleared: 0,
        }
    }
}

/// Complete game state, owned by one game loop
#[derive(Debug)]
pub struct GameState {
    board: Board,
    active: Option<ActivePiece>,
    pieces: Box<dyn PieceSource>,
    phase: Phase,
    /// Kind of the piece between `Locking` and `LineClearing`.
    locked_kind: Option<PieceKind>,
    start_level: u32,
    score: u32,
    level: u32,
    lines: u32,
    gravity_ticks_remaining: u32,
    /// Monotonic id for spawned pieces within the current game
    pieces_spawned: u32,
    /// Monotonic episode id (increments on `new_game`)
    episode_id: u32,
    /// Last lock/line-clear event (consumed by observers)
    last_event: Option<LockEvent>,
}

impl GameState {
    /// Create a new game with the given seed and spawn the first piece
    pub fn new(seed: u32) -> Self {
        Self::with_config(GameConfig {
            seed,
            ..GameConfig::default()
        })
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self::with_source(Box::new(BagRandomizer::new(config.seed)), config.start_level)
    }

    /// Create a game drawing pieces from `pieces`
    pub fn with_source(pieces: Box<dyn PieceSource>, start_level: u32) -> Self {
        Self::with_board(Board::new(), pieces, start_level)
    }

    /// Start a game on a prepared board.
    ///
    /// The first spawn is checked against `board`; if it does not fit the
    /// game starts in `GameOver`.
    pub fn with_board(board: Board, pieces: Box<dyn PieceSource>, start_level: u32) -> Self {
        let start_level = start_level.min(MAX_START_LEVEL);
        let mut state = Self {
            board,
            active: None,
            pieces,
            phase: Phase::Spawning,
            locked_kind: None,
            start_level,
            score: 0,
            level: start_level,
            lines: 0,
            gravity_ticks_remaining: gravity_interval_ticks(start_level),
            pieces_spawned: 0,
            episode_id: 0,
            last_event: None,
        };
        state.settle();
        state
    }

    /// Throw away the board and counters and start over.
    ///
    /// The piece source keeps its position, so consecutive games see
    /// different piece sequences.
    pub fn new_game(&mut self) {
        self.board.clear();
        self.active = None;
        self.locked_kind = None;
        self.score = 0;
        self.lines = 0;
        self.level = self.start_level;
        self.gravity_ticks_remaining = gravity_interval_ticks(self.level);
        self.pieces_spawned = 0;
        self.episode_id = self.episode_id.wrapping_add(1);
        self.last_event = None;
        self.phase = Phase::Spawning;
        self.settle();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active(&self) -> Option<ActivePiece> {
        self.active
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn start_level(&self) -> u32 {
        self.start_level
    }

    pub fn gravity_ticks_remaining(&self) -> u32 {
        self.gravity_ticks_remaining
    }

    pub fn pieces_spawned(&self) -> u32 {
        self.pieces_spawned
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    /// Kind the next spawn will use
    pub fn next_piece(&self) -> PieceKind {
        self.pieces.peek()
    }

    /// Where the falling piece would land on a hard drop
    pub fn ghost(&self) -> Option<ActivePiece> {
        self.active.map(|p| drop_position(&self.board, &p))
    }

    /// Take and clear the last lock/line-clear event.
    pub fn take_last_event(&mut self) -> Option<LockEvent> {
        self.last_event.take()
    }

    pub fn last_event(&self) -> Option<LockEvent> {
        self.last_event
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.board.write_u8_grid(&mut out.board);
        out.active = self.active.map(ActiveSnapshot::from);
        out.ghost_y = self.ghost().map(|g| g.y);
        out.next = self.next_piece();
        out.phase = self.phase;
        out.game_over = self.game_over();
        out.score = self.score;
        out.level = self.level;
        out.lines = self.lines;
        out.gravity_ticks_remaining = self.gravity_ticks_remaining;
        out.pieces_spawned = self.pieces_spawned;
        out.episode_id = self.episode_id;
        out.last_event = self.last_event;
    }

    /// Read-only copy of everything a renderer needs
    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Advance the simulation by `ticks` gravity ticks after applying `intents`.
    ///
    /// Intents run first, in order, each validated on its own. Then each tick
    /// counts the gravity timer down and performs at most one downward step.
    /// A `Quit` intent returns at once: later intents and all ticks are
    /// skipped and state stays as the earlier intents left it.
    pub fn advance(&mut self, ticks: u32, intents: &[Intent]) -> AdvanceReport {
        let mut report = AdvanceReport::new();
        report.intents_dropped = intents.len().saturating_sub(MAX_INTENTS_PER_ADVANCE) as u32;

        for &intent in intents.iter().take(MAX_INTENTS_PER_ADVANCE) {
            if intent == Intent::Quit {
                report.step = Step::Quit;
                return report;
            }
            if self.apply_intent(intent, &mut report) {
                report.intents_applied += 1;
            } else {
                report.intents_rejected += 1;
            }
        }

        for _ in 0..ticks {
            if self.phase != Phase::Falling {
                break;
            }
            self.gravity_ticks_remaining = self.gravity_ticks_remaining.saturating_sub(1);
            if self.gravity_ticks_remaining == 0 {
                report.gravity_steps += 1;
                self.gravity_step(&mut report);
            }
        }

        self.debug_check_invariants();
        report.step = if self.game_over() {
            Step::GameOver
        } else {
            Step::Running
        };
        report
    }

    /// Apply one intent; returns whether the falling piece changed.
    fn apply_intent(&mut self, intent: Intent, report: &mut AdvanceReport) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        if self.phase != Phase::Falling {
            return false;
        }

        let result = match intent {
            Intent::MoveLeft => try_shift(&self.board, &active, -1, 0),
            Intent::MoveRight => try_shift(&self.board, &active, 1, 0),
            Intent::RotateCw => try_rotate(&self.board, &active, true),
            Intent::RotateCcw => try_rotate(&self.board, &active, false),
            Intent::SoftDrop => try_shift(&self.board, &active, 0, 1),
            Intent::HardDrop => {
                self.active = Some(drop_position(&self.board, &active));
                self.begin_lock(report);
                return true;
            }
            Intent::Quit => return false,
        };

        match result {
            Ok(piece) => {
                self.active = Some(piece);
                true
            }
            Err(_) => false,
        }
    }

    fn gravity_step(&mut self, report: &mut AdvanceReport) {
        let Some(active) = self.active else {
            return;
        };

        match try_shift(&self.board, &active, 0, 1) {
            Ok(piece) => {
                self.active = Some(piece);
                self.gravity_ticks_remaining = gravity_interval_ticks(self.level);
            }
            Err(_) => self.begin_lock(report),
        }
    }

    fn begin_lock(&mut self, report: &mut AdvanceReport) {
        let lines_before = self.lines;
        self.phase = Phase::Locking;
        self.settle();
        report.locks += 1;
        report.lines_cleared += self.lines - lines_before;
    }

    /// Run transitions until the loop rests in `Falling` or `GameOver`.
    fn settle(&mut self) {
        loop {
            match self.phase {
                Phase::Spawning => self.spawn(),
                Phase::Locking => self.lock_active(),
                Phase::LineClearing => self.clear_lines(),
                Phase::Falling | Phase::GameOver => return,
            }
        }
    }

    fn spawn(&mut self) {
        let piece = ActivePiece::spawn(self.pieces.draw());
        if fits(&self.board, &piece).is_err() {
            self.active = None;
            self.phase = Phase::GameOver;
            return;
        }

        self.active = Some(piece);
        self.pieces_spawned = self.pieces_spawned.wrapping_add(1);
        self.gravity_ticks_remaining = gravity_interval_ticks(self.level);
        self.phase = Phase::Falling;
    }

    fn lock_active(&mut self) {
        let Some(piece) = self.active.take() else {
            panic!("lock requested with no falling piece");
        };
        self.board.lock(&piece.cells(), piece.kind);
        self.locked_kind = Some(piece.kind);
        self.phase = Phase::LineClearing;
    }

    fn clear_lines(&mut self) {
        let cleared = self.board.clear_full_rows();
        let awarded = calculate_line_score(cleared, self.level);

        self.score = self.score.saturating_add(awarded);
        self.lines += cleared as u32;
        self.level = calculate_level(self.start_level, self.lines);

        if let Some(kind) = self.locked_kind.take() {
            self.last_event = Some(LockEvent {
                kind,
                lines_cleared: cleared as u32,
                score_awarded: awarded,
                level: self.level,
            });
        }
        self.phase = Phase::Spawning;
    }

    fn debug_check_invariants(&self) {
        debug_assert!(
            self.active
                .map_or(true, |p| fits(&self.board, &p).is_ok()),
            "falling piece overlaps the stack or leaves the board"
        );
        debug_assert_eq!(self.active.is_some(), self.phase == Phase::Falling);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}
