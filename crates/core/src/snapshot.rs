use crate::game::Phase;
use crate::piece::{ActivePiece, PieceCells};
use crate::types::{LockEvent, PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
    pub cells: PieceCells,
}

impl From<ActivePiece> for ActiveSnapshot {
    fn from(value: ActivePiece) -> Self {
        Self {
            kind: value.kind,
            rotation: value.rotation,
            x: value.x,
            y: value.y,
            cells: value.cells(),
        }
    }
}

/// Immutable view of a game between ticks.
///
/// Board cells hold color codes: 0 for empty, `PieceKind::color_code` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSnapshot {
    pub board: [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
    pub active: Option<ActiveSnapshot>,
    pub ghost_y: Option<i8>,
    pub next: PieceKind,
    pub phase: Phase,
    pub game_over: bool,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub gravity_ticks_remaining: u32,
    pub pieces_spawned: u32,
    pub episode_id: u32,
    pub last_event: Option<LockEvent>,
}

impl GameSnapshot {
    pub fn playable(&self) -> bool {
        !self.game_over && self.active.is_some()
    }

    /// Color code at (x, y) including the falling piece
    pub fn color_at(&self, x: i8, y: i8) -> u8 {
        if let Some(active) = &self.active {
            if active.cells.contains(&(x, y)) {
                return active.kind.color_code();
            }
        }
        if x < 0 || y < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
            return 0;
        }
        self.board[y as usize][x as usize]
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            board: [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
            active: None,
            ghost_y: None,
            next: PieceKind::I,
            phase: Phase::Spawning,
            game_over: false,
            score: 0,
            level: 0,
            lines: 0,
            gravity_ticks_remaining: 0,
            pieces_spawned: 0,
            episode_id: 0,
            last_event: None,
        }
    }
}
