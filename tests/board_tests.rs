//! Board tests - bounds, locking and row clearing through the facade

use blockfall::core::Board;
use blockfall::types::{PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

fn fill_row(board: &mut Board, y: i8, kind: PieceKind) {
    for x in 0..BOARD_WIDTH as i8 {
        board.set(x, y, Some(kind));
    }
}

#[test]
fn test_board_new_empty() {
    let board = Board::new();
    assert_eq!(board.width(), BOARD_WIDTH);
    assert_eq!(board.height(), BOARD_HEIGHT);

    for y in 0..BOARD_HEIGHT as i8 {
        for x in 0..BOARD_WIDTH as i8 {
            assert!(Board::is_inside(x, y));
            assert!(!board.is_occupied(x, y), "Cell ({}, {}) should be empty", x, y);
        }
    }
    assert_eq!(board.occupied_count(), 0);
}

#[test]
fn test_out_of_bounds_counts_as_occupied() {
    let board = Board::new();

    for (x, y) in [(-1, 0), (0, -1), (BOARD_WIDTH as i8, 0), (0, BOARD_HEIGHT as i8)] {
        assert!(!Board::is_inside(x, y));
        assert!(board.is_occupied(x, y), "({}, {})", x, y);
        assert_eq!(board.get(x, y), None);
    }
}

#[test]
fn test_lock_marks_cells() {
    let mut board = Board::new();
    board.lock(&[(3, 5), (4, 5), (3, 6), (4, 6)], PieceKind::O);

    assert_eq!(board.get(3, 5), Some(Some(PieceKind::O)));
    assert_eq!(board.get(4, 6), Some(Some(PieceKind::O)));
    assert_eq!(board.occupied_count(), 4);
}

#[test]
#[should_panic(expected = "already occupied")]
fn test_lock_on_occupied_cell_panics() {
    let mut board = Board::new();
    board.set(4, 5, Some(PieceKind::T));
    board.lock(&[(3, 5), (4, 5)], PieceKind::O);
}

#[test]
#[should_panic(expected = "outside the board")]
fn test_lock_out_of_bounds_panics() {
    let mut board = Board::new();
    board.lock(&[(9, 5), (10, 5)], PieceKind::I);
}

#[test]
fn test_clear_without_full_rows_is_noop() {
    let mut board = Board::new();
    board.lock(&[(0, 19), (1, 19), (2, 19), (3, 19)], PieceKind::I);
    let before = board.clone();

    assert_eq!(board.clear_full_rows(), 0);
    assert_eq!(board, before);
}

#[test]
fn test_clear_single_row_shifts_rows_above() {
    let mut board = Board::new();
    fill_row(&mut board, 19, PieceKind::T);
    board.set(0, 18, Some(PieceKind::I));
    board.set(1, 17, Some(PieceKind::O));

    assert_eq!(board.clear_full_rows(), 1);

    assert_eq!(board.get(0, 19), Some(Some(PieceKind::I)));
    assert_eq!(board.get(1, 18), Some(Some(PieceKind::O)));
    assert_eq!(board.get(1, 17), Some(None));
    assert_eq!(board.occupied_count(), 2);
    assert_eq!(board.rows().count(), BOARD_HEIGHT as usize);
}

#[test]
fn test_clear_separated_full_rows_in_one_pass() {
    let mut board = Board::new();
    fill_row(&mut board, 19, PieceKind::I);
    fill_row(&mut board, 17, PieceKind::O);
    board.set(2, 18, Some(PieceKind::S));
    board.set(5, 16, Some(PieceKind::Z));

    assert_eq!(board.full_rows().as_slice(), &[17, 19]);
    assert_eq!(board.clear_full_rows(), 2);

    // Row 18 drops one (past 19), row 16 drops two (past 17 and 19).
    assert_eq!(board.get(2, 19), Some(Some(PieceKind::S)));
    assert_eq!(board.get(5, 18), Some(Some(PieceKind::Z)));
    assert_eq!(board.occupied_count(), 2);
}

#[test]
fn test_clear_four_rows() {
    let mut board = Board::new();
    for y in 16..20 {
        fill_row(&mut board, y, PieceKind::L);
    }
    board.set(7, 15, Some(PieceKind::J));

    assert_eq!(board.clear_full_rows(), 4);
    assert_eq!(board.get(7, 19), Some(Some(PieceKind::J)));
    assert_eq!(board.occupied_count(), 1);
}

#[test]
fn test_full_top_row_clears() {
    let mut board = Board::new();
    fill_row(&mut board, 0, PieceKind::I);

    assert_eq!(board.clear_full_rows(), 1);
    assert_eq!(board.occupied_count(), 0);
}

#[test]
fn test_u8_grid_uses_color_codes() {
    let mut board = Board::new();
    board.set(0, 19, Some(PieceKind::I));
    board.set(9, 0, Some(PieceKind::L));

    let mut grid = [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];
    board.write_u8_grid(&mut grid);
    assert_eq!(grid[19][0], PieceKind::I.color_code());
    assert_eq!(grid[0][9], PieceKind::L.color_code());
    assert_eq!(grid.iter().flatten().filter(|&&c| c != 0).count(), 2);
}
