//! Board module - manages the game grid
//!
//! The board is a 10x20 grid where each cell is empty or locked with a piece kind.
//! Uses a flat array for better cache locality and zero-allocation.
//! Coordinates: (x, y) where x ranges 0..9 (left to right), y ranges 0..19 (top to bottom)

use arrayvec::ArrayVec;

use crate::types::{Cell, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// Row indices of full rows, at most one per board row
pub type FullRows = ArrayVec<u8, { BOARD_HEIGHT as usize }>;

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if !Self::is_inside(x, y) {
            return None;
        }
        Some((y as usize) * (BOARD_WIDTH as usize) + (x as usize))
    }

    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Bounds check against width/height
    #[inline(always)]
    pub fn is_inside(x: i8, y: i8) -> bool {
        x >= 0 && x < BOARD_WIDTH as i8 && y >= 0 && y < BOARD_HEIGHT as i8
    }

    /// True for locked cells and for every out-of-bounds position.
    ///
    /// Collision checks rely on this: walls and floor behave like locked cells.
    #[inline(always)]
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        match Self::index(x, y) {
            Some(idx) => self.cells[idx].is_some(),
            None => true,
        }
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    ///
    /// This bypasses the locking rules and exists for building positions
    /// (tests, puzzles, benchmarks).
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Lock the given absolute cells with a color tag.
    ///
    /// # Panics
    ///
    /// Panics if any cell is out of bounds or already occupied. The resolver
    /// guarantees this never happens for pieces it accepted, so a panic here
    /// means the board and the falling piece have diverged.
    pub fn lock(&mut self, cells: &[(i8, i8)], kind: PieceKind) {
        for &(x, y) in cells {
            assert!(
                Self::is_inside(x, y),
                "lock: cell ({x}, {y}) is outside the board"
            );
            assert!(
                !self.is_occupied(x, y),
                "lock: cell ({x}, {y}) is already occupied"
            );
        }

        for &(x, y) in cells {
            self.set(x, y, Some(kind));
        }
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return false;
        }
        self.row(y).iter().all(|cell| cell.is_some())
    }

    /// Indices of all full rows, top to bottom
    pub fn full_rows(&self) -> FullRows {
        (0..BOARD_HEIGHT as usize)
            .filter(|&y| self.is_row_full(y))
            .map(|y| y as u8)
            .collect()
    }

    /// Remove every full row in one pass and return how many were removed.
    ///
    /// Rows above each removed row shift down by one per removed row below
    /// them; empty rows are inserted at the top. Uses a two-pointer sweep from
    /// the bottom with no allocation.
    pub fn clear_full_rows(&mut self) -> usize {
        let width = BOARD_WIDTH as usize;
        let mut cleared = 0usize;
        let mut write_y = BOARD_HEIGHT as usize;

        for read_y in (0..BOARD_HEIGHT as usize).rev() {
            if self.is_row_full(read_y) {
                cleared += 1;
                continue;
            }
            write_y -= 1;
            if write_y != read_y {
                let src_start = read_y * width;
                self.cells
                    .copy_within(src_start..src_start + width, write_y * width);
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = None;
        }

        cleared
    }

    /// One row of cells
    pub fn row(&self, y: usize) -> &[Cell] {
        let start = y * BOARD_WIDTH as usize;
        &self.cells[start..start + BOARD_WIDTH as usize]
    }

    /// Iterate rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks_exact(BOARD_WIDTH as usize)
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of locked cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells = [None; BOARD_SIZE];
    }

    /// Write color codes (0 = empty, 1..=7 piece kinds) into a row-major grid.
    pub fn write_u8_grid(
        &self,
        out: &mut [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
    ) {
        for (dst, src) in out.iter_mut().zip(self.rows()) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s.map_or(0, PieceKind::color_code);
            }
        }
    }

    /// Create from a 2D vector for testing (converts to flat array)
    #[cfg(test)]
    pub fn from_cells(cells_2d: Vec<Vec<Cell>>) -> Self {
        assert_eq!(cells_2d.len(), BOARD_HEIGHT as usize);
        assert!(cells_2d.iter().all(|row| row.len() == BOARD_WIDTH as usize));

        let mut flat = [None; BOARD_SIZE];
        for (y, row) in cells_2d.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                flat[y * BOARD_WIDTH as usize + x] = *cell;
            }
        }
        Self { cells: flat }
    }

    /// Convert to 2D vector for testing/display
    #[cfg(test)]
    pub fn to_cells(&self) -> Vec<Vec<Cell>> {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(board: &mut Board, y: i8, kind: PieceKind) {
        for x in 0..BOARD_WIDTH as i8 {
            board.set(x, y, Some(kind));
        }
    }

    #[test]
    fn test_board_index_calculation() {
        assert_eq!(Board::index(0, 0), Some(0));
        assert_eq!(Board::index(9, 0), Some(9));
        assert_eq!(Board::index(0, 1), Some(10));
        assert_eq!(Board::index(9, 19), Some(199));
        assert_eq!(Board::index(-1, 0), None);
        assert_eq!(Board::index(10, 0), None);
        assert_eq!(Board::index(0, 20), None);
    }

    #[test]
    fn test_out_of_bounds_counts_as_occupied() {
        let board = Board::new();
        assert!(board.is_occupied(-1, 5));
        assert!(board.is_occupied(10, 5));
        assert!(board.is_occupied(3, -1));
        assert!(board.is_occupied(3, 20));
        assert!(!board.is_occupied(3, 5));
    }

    #[test]
    fn test_lock_sets_color_tag() {
        let mut board = Board::new();
        board.lock(&[(4, 18), (5, 18), (4, 19), (5, 19)], PieceKind::O);

        assert_eq!(board.get(4, 18), Some(Some(PieceKind::O)));
        assert_eq!(board.get(5, 19), Some(Some(PieceKind::O)));
        assert_eq!(board.occupied_count(), 4);
    }

    #[test]
    #[should_panic(expected = "already occupied")]
    fn test_lock_into_occupied_cell_panics() {
        let mut board = Board::new();
        board.set(4, 19, Some(PieceKind::T));
        board.lock(&[(4, 19)], PieceKind::O);
    }

    #[test]
    #[should_panic(expected = "outside the board")]
    fn test_lock_out_of_bounds_panics() {
        let mut board = Board::new();
        board.lock(&[(9, 19), (10, 19)], PieceKind::I);
    }

    #[test]
    fn test_failed_lock_leaves_board_untouched() {
        let mut board = Board::new();
        board.set(5, 19, Some(PieceKind::T));
        let before = board.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            board.lock(&[(4, 19), (5, 19)], PieceKind::O);
        }));

        assert!(result.is_err());
        // (4, 19) precedes the conflicting cell but must not have been written.
        assert_eq!(board, before);
    }

    #[test]
    fn test_clear_full_rows_compacts_gaps() {
        let mut board = Board::new();
        fill_row(&mut board, 5, PieceKind::T);
        fill_row(&mut board, 10, PieceKind::I);
        board.set(0, 4, Some(PieceKind::J));
        board.set(0, 9, Some(PieceKind::L));
        board.set(0, 11, Some(PieceKind::S));

        assert_eq!(board.clear_full_rows(), 2);

        // J was above both cleared rows, L only above row 10, S below both.
        assert_eq!(board.get(0, 6), Some(Some(PieceKind::J)));
        assert_eq!(board.get(0, 10), Some(Some(PieceKind::L)));
        assert_eq!(board.get(0, 11), Some(Some(PieceKind::S)));
        assert_eq!(board.occupied_count(), 3);
        assert!(board.rows().take(2).all(|row| row.iter().all(|c| c.is_none())));
    }

    #[test]
    fn test_clear_full_rows_four_at_once() {
        let mut board = Board::new();
        for y in 16..20 {
            fill_row(&mut board, y, PieceKind::I);
        }
        board.set(2, 15, Some(PieceKind::Z));

        assert_eq!(board.full_rows().as_slice(), &[16, 17, 18, 19]);
        assert_eq!(board.clear_full_rows(), 4);
        assert_eq!(board.get(2, 19), Some(Some(PieceKind::Z)));
        assert_eq!(board.occupied_count(), 1);
    }

    #[test]
    fn test_clear_without_full_rows_is_noop() {
        let mut board = Board::new();
        board.set(0, 19, Some(PieceKind::T));
        let before = board.clone();

        assert_eq!(board.clear_full_rows(), 0);
        assert_eq!(board, before);
    }

    #[test]
    fn test_board_from_cells_roundtrip() {
        let mut cells_2d = vec![vec![None; 10]; 20];
        cells_2d[5][3] = Some(PieceKind::O);
        cells_2d[10][7] = Some(PieceKind::L);

        let board = Board::from_cells(cells_2d.clone());
        assert_eq!(cells_2d, board.to_cells());
    }

    #[test]
    fn test_write_u8_grid() {
        let mut board = Board::new();
        board.set(0, 0, Some(PieceKind::I));
        board.set(9, 19, Some(PieceKind::L));

        let mut grid = [[0u8; 10]; 20];
        board.write_u8_grid(&mut grid);
        assert_eq!(grid[0][0], 1);
        assert_eq!(grid[19][9], 7);
        assert_eq!(grid[10][5], 0);
    }
}
