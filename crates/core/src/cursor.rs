//! Ring-position arithmetic shared by the sponsor and unit tiers.
//!
//! Cursors are plain integers over the 1-based `display_order` positions of a
//! sorted list. Picking resumes at the cursor, and advancing moves one step
//! past the position that was used, wrapping back to 1.

/// Picks the item at `cursor`, else the first item positioned after it, else
/// wraps to the first item. `items` must already be sorted by position.
pub fn pick_at_cursor<T, F>(items: &[T], cursor: i32, position: F) -> Option<&T>
where
    F: Fn(&T) -> i32,
{
    items
        .iter()
        .find(|item| position(*item) == cursor)
        .or_else(|| items.iter().find(|item| position(*item) >= cursor))
        .or_else(|| items.first())
}

/// The cursor that follows `used`, wrapped to 1 past `max`. With no positions
/// left (`max` is `None`) the cursor restarts at 1.
pub fn next_position(used: i32, max: Option<i32>) -> i32 {
    match max {
        Some(max) if used + 1 <= max => used + 1,
        _ => 1,
    }
}
