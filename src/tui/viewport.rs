//! Scroll and slicing arithmetic for the validator list. No terminal access.

use std::collections::VecDeque;

use crate::validator::ValidatorRecord;

/// Rows taken by the top and bottom border.
const FRAME_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollInput {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollLimits {
    pub page_size: usize,
    pub max_offset: usize,
}

pub fn compute_scroll_limits(row_count: usize, terminal_height: usize) -> ScrollLimits {
    ScrollLimits {
        page_size: terminal_height.saturating_sub(FRAME_ROWS),
        max_offset: (row_count + FRAME_ROWS).saturating_sub(terminal_height),
    }
}

pub fn apply_scroll(input: ScrollInput, offset: usize, max_offset: usize, page_size: usize) -> usize {
    let moved = match input {
        ScrollInput::LineUp => offset.saturating_sub(1),
        ScrollInput::LineDown => offset.saturating_add(1),
        ScrollInput::PageUp => offset.saturating_sub(page_size),
        ScrollInput::PageDown => offset.saturating_add(page_size),
    };
    moved.min(max_offset)
}

/// Row of the scrollbar thumb. Content that fits entirely reports the bottom.
pub fn scroll_indicator_position(offset: usize, max_offset: usize, terminal_height: usize) -> usize {
    let fraction = if max_offset > 0 {
        offset.min(max_offset) as f64 / max_offset as f64
    } else {
        1.0
    };
    let track = terminal_height.saturating_sub(FRAME_ROWS + 1);
    (fraction * track as f64).floor() as usize + 1
}

/// The most recent `column_budget` entries, oldest first, so the newest
/// lands in the rightmost column.
pub fn visible_history_slice<T: Copy>(sequence: &VecDeque<T>, column_budget: usize) -> Vec<T> {
    let skip = sequence.len().saturating_sub(column_budget);
    sequence.iter().skip(skip).copied().collect()
}

/// Validators whose display name contains `query` (case-sensitive). A query
/// matching nothing yields the full list.
pub fn filter_by_substring<'a>(validators: &'a [ValidatorRecord], query: &str) -> Vec<&'a ValidatorRecord> {
    let matches: Vec<_> = validators
        .iter()
        .filter(|v| v.display_name.contains(query))
        .collect();

    if matches.is_empty() {
        validators.iter().collect()
    } else {
        matches
    }
}
