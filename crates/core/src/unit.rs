//! Unit-tier selection: always sequential over the sponsor's unit cursor.

use crate::cursor::pick_at_cursor;
use crate::types::CreativeUnit;

pub fn select_unit(units: &[CreativeUnit], unit_cursor: i32) -> Option<&CreativeUnit> {
    let mut sorted: Vec<&CreativeUnit> = units.iter().collect();
    sorted.sort_by_key(|u| u.display_order);
    pick_at_cursor(&sorted, unit_cursor, |u| u.display_order).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::unit;

    fn ids(units: &[CreativeUnit], cursor: i32) -> Option<&str> {
        select_unit(units, cursor).map(|u| u.id.as_str())
    }

    #[test]
    fn test_unit_cursor_exact_and_wrap() {
        let units = vec![unit("u3", "sp", 3), unit("u1", "sp", 1), unit("u2", "sp", 2)];
        assert_eq!(ids(&units, 1), Some("u1"));
        assert_eq!(ids(&units, 2), Some("u2"));
        assert_eq!(ids(&units, 3), Some("u3"));
        assert_eq!(ids(&units, 4), Some("u1"));
    }

    #[test]
    fn test_unit_cursor_skips_to_next_position() {
        let units = vec![unit("u1", "sp", 1), unit("u4", "sp", 4)];
        assert_eq!(ids(&units, 2), Some("u4"));
    }

    #[test]
    fn test_no_units() {
        assert_eq!(ids(&[], 1), None);
    }
}
