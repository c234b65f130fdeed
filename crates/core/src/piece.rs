//! Active piece geometry

use crate::pieces::{get_shape, PieceShape};
use crate::types::{PieceKind, Rotation, SPAWN_X, SPAWN_Y};

/// Absolute board cells covered by a piece
pub type PieceCells = [(i8, i8); 4];

/// The falling piece: kind, rotation and board-relative anchor.
///
/// Values are replaced wholesale on every accepted move, never patched in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl ActivePiece {
    /// Create a piece at the spawn anchor in its spawn rotation
    pub fn spawn(kind: PieceKind) -> Self {
        Self::at(kind, Rotation::North, SPAWN_X, SPAWN_Y)
    }

    pub fn at(kind: PieceKind, rotation: Rotation, x: i8, y: i8) -> Self {
        Self {
            kind,
            rotation,
            x,
            y,
        }
    }

    /// Get the shape (mino offsets) for current rotation
    pub fn shape(&self) -> PieceShape {
        get_shape(self.kind, self.rotation)
    }

    /// Absolute cells occupied by this piece
    pub fn cells(&self) -> PieceCells {
        self.shape().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    /// Same piece with a different rotation and a shifted anchor
    pub fn moved(&self, rotation: Rotation, dx: i8, dy: i8) -> Self {
        Self {
            rotation,
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// [`cells`](Self::cells), or `None` when a coordinate leaves the `i8` range
    pub fn checked_cells(&self) -> Option<PieceCells> {
        let mut cells = [(0, 0); 4];
        for (cell, (dx, dy)) in cells.iter_mut().zip(self.shape()) {
            *cell = (self.x.checked_add(dx)?, self.y.checked_add(dy)?);
        }
        Some(cells)
    }

    /// [`moved`](Self::moved), or `None` when the anchor leaves the `i8` range
    pub fn checked_moved(&self, rotation: Rotation, dx: i8, dy: i8) -> Option<Self> {
        Some(Self {
            rotation,
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            ..*self
        })
    }
}

/// Absolute cells for a piece; free-function form of [`ActivePiece::cells`].
pub fn occupied_cells(piece: &ActivePiece) -> PieceCells {
    piece.cells()
}
