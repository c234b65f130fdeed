//! Collision & kick resolver
//!
//! Every change to the falling piece goes through [`try_apply`]. A candidate is
//! accepted only if all four of its cells are inside the board and empty, so an
//! accepted piece can always be locked. Rotations that collide try the fixed
//! [`KICK_OFFSETS`] in order and take the first that fits; translations never
//! kick. The result depends only on the board, the piece and the request.

use std::fmt;

use crate::board::Board;
use crate::piece::ActivePiece;
use crate::pieces::KICK_OFFSETS;
use crate::types::Rotation;

/// Why a candidate placement was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// At least one cell would leave the board
    OutOfBounds,
    /// At least one cell overlaps a locked cell
    Blocked,
}

impl Rejected {
    pub fn code(self) -> &'static str {
        match self {
            Rejected::OutOfBounds => "out_of_bounds",
            Rejected::Blocked => "blocked",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Rejected::OutOfBounds => "piece would leave the board",
            Rejected::Blocked => "piece would overlap a locked cell",
        }
    }
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Rejected {}

/// Check a piece against board bounds and locked cells.
///
/// Cells are scanned in shape order; the first failing cell names the reason.
/// A cell whose coordinate overflows `i8` is out of bounds.
pub fn fits(board: &Board, piece: &ActivePiece) -> Result<(), Rejected> {
    let cells = piece.checked_cells().ok_or(Rejected::OutOfBounds)?;
    for (x, y) in cells {
        if !Board::is_inside(x, y) {
            return Err(Rejected::OutOfBounds);
        }
        if board.is_occupied(x, y) {
            return Err(Rejected::Blocked);
        }
    }
    Ok(())
}

/// Propose a new rotation and anchor shift for `piece`.
///
/// Returns the accepted piece (possibly kicked) or the reason the unshifted
/// candidate failed when nothing fits.
pub fn try_apply(
    board: &Board,
    piece: &ActivePiece,
    rotation: Rotation,
    delta: (i8, i8),
) -> Result<ActivePiece, Rejected> {
    let candidate = piece
        .checked_moved(rotation, delta.0, delta.1)
        .ok_or(Rejected::OutOfBounds)?;
    let err = match fits(board, &candidate) {
        Ok(()) => return Ok(candidate),
        Err(err) => err,
    };

    let is_rotation = rotation != piece.rotation && delta == (0, 0);
    if !is_rotation {
        return Err(err);
    }

    KICK_OFFSETS
        .iter()
        .filter_map(|&(kx, ky)| candidate.checked_moved(rotation, kx, ky))
        .find(|kicked| fits(board, kicked).is_ok())
        .ok_or(err)
}

/// Shift by one cell; never kicks.
pub fn try_shift(
    board: &Board,
    piece: &ActivePiece,
    dx: i8,
    dy: i8,
) -> Result<ActivePiece, Rejected> {
    try_apply(board, piece, piece.rotation, (dx, dy))
}

/// Rotate one step in place, kicking if needed.
pub fn try_rotate(
    board: &Board,
    piece: &ActivePiece,
    clockwise: bool,
) -> Result<ActivePiece, Rejected> {
    let rotation = if clockwise {
        piece.rotation.rotate_cw()
    } else {
        piece.rotation.rotate_ccw()
    };
    try_apply(board, piece, rotation, (0, 0))
}

/// Lowest position reachable by repeated downward shifts.
pub fn drop_position(board: &Board, piece: &ActivePiece) -> ActivePiece {
    let mut current = *piece;
    while let Ok(next) = try_shift(board, &current, 0, 1) {
        current = next;
    }
    current
}
