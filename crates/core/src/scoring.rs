//! Scoring module - line-clear points, level progression and gravity speed
//!
//! Only line clears score. Clearing more rows at once pays more than clearing
//! the same rows one by one: 100/300/500/800 per 1/2/3/4 rows, times
//! (level + 1).

use crate::types::{
    ms_to_ticks, DROP_INTERVALS_MS, DROP_INTERVAL_FLOOR_MS, LINES_PER_LEVEL, LINE_SCORES,
};

/// Calculate line clear score
/// lines: number of rows removed by one lock (0-4)
/// level: level in effect when the rows were cleared
pub fn calculate_line_score(lines: usize, level: u32) -> u32 {
    if lines == 0 || lines >= LINE_SCORES.len() {
        return 0;
    }
    LINE_SCORES[lines].saturating_mul(level.saturating_add(1))
}

/// Level management
/// Level increases every 10 lines cleared on top of the starting level
pub fn calculate_level(start_level: u32, total_lines: u32) -> u32 {
    start_level.saturating_add(total_lines / LINES_PER_LEVEL)
}

/// Get drop interval for a level (in milliseconds)
pub fn get_drop_interval_ms(level: u32) -> u32 {
    DROP_INTERVALS_MS
        .get(level as usize)
        .copied()
        .unwrap_or(DROP_INTERVAL_FLOOR_MS)
}

/// Ticks between gravity steps at `level`; never increases with level.
pub fn gravity_interval_ticks(level: u32) -> u32 {
    ms_to_ticks(get_drop_interval_ms(level)).max(1)
}
