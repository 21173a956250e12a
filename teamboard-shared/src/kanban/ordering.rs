/// Ordering engine
///
/// Cards within a column and columns within a board carry dense, zero-based
/// positions: after every committed mutation the positions of a container
/// are exactly `0..n`. The functions here are pure planners. They decide the
/// final position of the item being placed and which range of siblings has
/// to shift, and the callers apply the plan with range `UPDATE`s inside a
/// transaction.
///
/// # Example
///
/// ```
/// use teamboard_shared::kanban::ordering::{plan_move_within, Shift, Slot};
///
/// // Card at position 0 of a 3-card column dragged to the bottom.
/// let slot = plan_move_within(0, Some(5), 3);
/// assert_eq!(slot, Slot {
///     position: 2,
///     shift: Some(Shift { start: 1, end: Some(2), delta: -1 }),
/// });
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shift of a contiguous range of sibling positions
///
/// Every sibling whose position lies in `start..=end` (or `start..` when
/// `end` is `None`) moves by `delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub start: i32,
    pub end: Option<i32>,
    pub delta: i32,
}

impl Shift {
    /// Shift of every position from `start` onwards
    pub fn starting_at(start: i32, delta: i32) -> Self {
        Shift {
            start,
            end: None,
            delta,
        }
    }

    /// Shift of positions in `start..=end`
    pub fn range(start: i32, end: i32, delta: i32) -> Self {
        Shift {
            start,
            end: Some(end),
            delta,
        }
    }

    pub fn covers(&self, position: i32) -> bool {
        position >= self.start && self.end.map_or(true, |end| position <= end)
    }

    /// Position after applying the shift
    pub fn apply(&self, position: i32) -> i32 {
        if self.covers(position) {
            position + self.delta
        } else {
            position
        }
    }
}

/// Final position of the placed item plus the sibling shift, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub position: i32,
    pub shift: Option<Shift>,
}

/// Where a new column goes
///
/// Deserializes from `{"mode": "end"}` or
/// `{"mode": "before", "anchor_column_id": "..."}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Placement {
    /// First column; every existing column moves right
    Start,

    /// After the last column
    #[default]
    End,

    /// Takes the anchor's position; the anchor and later columns move right
    Before { anchor_column_id: Uuid },

    /// Directly after the anchor; later columns move right
    After { anchor_column_id: Uuid },
}

impl Placement {
    pub fn anchor(&self) -> Option<Uuid> {
        match self {
            Placement::Start | Placement::End => None,
            Placement::Before { anchor_column_id } | Placement::After { anchor_column_id } => {
                Some(*anchor_column_id)
            }
        }
    }
}

/// Placement with the anchor already resolved to its position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    Start,
    End,
    Before(i32),
    After(i32),
}

/// Clamps a requested position into `0..=max`
pub fn clamp(requested: i32, max: i32) -> i32 {
    requested.clamp(0, max.max(0))
}

/// Plans inserting one item into a container of `count` items
///
/// Without a requested position the item is appended. A requested position
/// is clamped to `0..=count`, and siblings at or after it move down one.
pub fn plan_insert(count: i32, requested: Option<i32>) -> Slot {
    match requested {
        None => Slot {
            position: count,
            shift: None,
        },
        Some(requested) => {
            let position = clamp(requested, count);
            let shift = (position < count).then(|| Shift::starting_at(position, 1));
            Slot { position, shift }
        }
    }
}

/// Plans inserting a column into a board of `count` columns
pub fn plan_column_insert(count: i32, at: InsertAt) -> Slot {
    match at {
        InsertAt::Start => plan_insert(count, Some(0)),
        InsertAt::End => plan_insert(count, None),
        InsertAt::Before(anchor) => plan_insert(count, Some(anchor)),
        InsertAt::After(anchor) => plan_insert(count, Some(anchor + 1)),
    }
}

/// Plans closing the gap left by removing the item at `position`
pub fn plan_remove(position: i32) -> Shift {
    Shift::starting_at(position + 1, -1)
}

/// Plans moving an item within its own container of `count` items
///
/// The target defaults to the current position and is clamped to
/// `0..=count-1`. Items between the old and new positions move one step
/// towards the vacated slot.
pub fn plan_move_within(current: i32, requested: Option<i32>, count: i32) -> Slot {
    let position = clamp(requested.unwrap_or(current), count - 1);

    let shift = if position < current {
        Some(Shift::range(position, current - 1, 1))
    } else if position > current {
        Some(Shift::range(current + 1, position, -1))
    } else {
        None
    };

    Slot { position, shift }
}

/// Checks that `requested` is a permutation of `current`
///
/// Returns a description of the first problem found: a duplicate, an id
/// that does not belong to the container, or a missing id.
pub fn validate_permutation(current: &[Uuid], requested: &[Uuid]) -> Result<(), String> {
    let mut seen = std::collections::HashSet::with_capacity(requested.len());

    for id in requested {
        if !seen.insert(*id) {
            return Err(format!("column {} is listed more than once", id));
        }
        if !current.contains(id) {
            return Err(format!("column {} does not belong to this board", id));
        }
    }

    if let Some(missing) = current.iter().find(|id| !seen.contains(*id)) {
        return Err(format!("column {} is missing from the new order", missing));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Applies a slot to a container laid out as `items[i]` at position `i`
    /// and returns the resulting order.
    fn insert(items: &[&'static str], new: &'static str, slot: Slot) -> Vec<&'static str> {
        let mut placed: Vec<(i32, &'static str)> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let position = i as i32;
                (slot.shift.map_or(position, |s| s.apply(position)), *item)
            })
            .collect();
        placed.push((slot.position, new));
        into_order(placed)
    }

    fn move_within(items: &[&'static str], from: usize, slot: Slot) -> Vec<&'static str> {
        let placed: Vec<(i32, &'static str)> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if i == from {
                    (slot.position, *item)
                } else {
                    let position = i as i32;
                    (slot.shift.map_or(position, |s| s.apply(position)), *item)
                }
            })
            .collect();
        into_order(placed)
    }

    fn into_order(mut placed: Vec<(i32, &'static str)>) -> Vec<&'static str> {
        placed.sort();
        let positions: Vec<i32> = placed.iter().map(|(p, _)| *p).collect();
        let dense: Vec<i32> = (0..placed.len() as i32).collect();
        assert_eq!(positions, dense, "positions must be dense");
        placed.into_iter().map(|(_, item)| item).collect()
    }

    #[test]
    fn test_append_uses_count() {
        let slot = plan_insert(3, None);
        assert_eq!(slot, Slot { position: 3, shift: None });
        assert_eq!(insert(&["a", "b", "c"], "d", slot), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_insert_into_empty_container() {
        assert_eq!(plan_insert(0, None).position, 0);
        assert_eq!(plan_insert(0, Some(4)), Slot { position: 0, shift: None });
    }

    #[test]
    fn test_insert_at_requested_position_shifts_followers() {
        let slot = plan_insert(3, Some(1));
        assert_eq!(slot.shift, Some(Shift::starting_at(1, 1)));
        assert_eq!(insert(&["a", "b", "c"], "x", slot), vec!["a", "x", "b", "c"]);
    }

    #[test]
    fn test_insert_clamps_requested_position() {
        assert_eq!(plan_insert(2, Some(-3)).position, 0);
        assert_eq!(plan_insert(2, Some(99)), Slot { position: 2, shift: None });
    }

    #[test]
    fn test_column_placements() {
        let board = ["todo", "doing", "done"];

        let start = plan_column_insert(3, InsertAt::Start);
        assert_eq!(insert(&board, "new", start), vec!["new", "todo", "doing", "done"]);

        let end = plan_column_insert(3, InsertAt::End);
        assert_eq!(insert(&board, "new", end), vec!["todo", "doing", "done", "new"]);

        let before = plan_column_insert(3, InsertAt::Before(1));
        assert_eq!(before.position, 1);
        assert_eq!(insert(&board, "new", before), vec!["todo", "new", "doing", "done"]);

        let after = plan_column_insert(3, InsertAt::After(1));
        assert_eq!(after.position, 2);
        assert_eq!(insert(&board, "new", after), vec!["todo", "doing", "new", "done"]);

        let after_last = plan_column_insert(3, InsertAt::After(2));
        assert_eq!(after_last, Slot { position: 3, shift: None });
    }

    #[test]
    fn test_remove_closes_gap() {
        let shift = plan_remove(1);
        let remaining: Vec<i32> = [0, 2, 3].iter().map(|p| shift.apply(*p)).collect();
        assert_eq!(remaining, vec![0, 1, 2]);
    }

    #[test]
    fn test_move_within_down() {
        let slot = plan_move_within(0, Some(2), 3);
        assert_eq!(slot.shift, Some(Shift::range(1, 2, -1)));
        assert_eq!(move_within(&["a", "b", "c"], 0, slot), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_move_within_up() {
        let slot = plan_move_within(3, Some(1), 4);
        assert_eq!(slot.shift, Some(Shift::range(1, 2, 1)));
        assert_eq!(
            move_within(&["a", "b", "c", "d"], 3, slot),
            vec!["a", "d", "b", "c"]
        );
    }

    #[test]
    fn test_move_within_without_target_is_noop() {
        assert_eq!(plan_move_within(2, None, 4), Slot { position: 2, shift: None });
        assert_eq!(plan_move_within(1, Some(1), 4), Slot { position: 1, shift: None });
    }

    #[test]
    fn test_move_within_clamps_to_last_position() {
        let slot = plan_move_within(1, Some(10), 3);
        assert_eq!(slot.position, 2);
        assert_eq!(move_within(&["a", "b", "c"], 1, slot), vec!["a", "c", "b"]);

        let slot = plan_move_within(1, Some(-1), 3);
        assert_eq!(slot.position, 0);
    }

    #[test]
    fn test_cross_container_move_keeps_both_dense() {
        // Move "b" out of [a, b, c] into [x, y] at position 1.
        let removal = plan_remove(1);
        let source: Vec<i32> = [0, 2].iter().map(|p| removal.apply(*p)).collect();
        assert_eq!(source, vec![0, 1]);

        let slot = plan_insert(2, Some(1));
        assert_eq!(insert(&["x", "y"], "b", slot), vec!["x", "b", "y"]);
    }

    #[test]
    fn test_validate_permutation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let current = [a, b, c];

        assert!(validate_permutation(&current, &[c, a, b]).is_ok());

        let duplicate = validate_permutation(&current, &[a, a, b]).unwrap_err();
        assert!(duplicate.contains("more than once"));

        let foreign = validate_permutation(&current, &[a, b, Uuid::new_v4()]).unwrap_err();
        assert!(foreign.contains("does not belong"));

        let missing = validate_permutation(&current, &[a, b]).unwrap_err();
        assert!(missing.contains("missing"));
    }

    #[test]
    fn test_placement_deserialization() {
        let end: Placement = serde_json::from_str(r#"{"mode":"end"}"#).unwrap();
        assert_eq!(end, Placement::End);
        assert_eq!(end.anchor(), None);

        let anchor = Uuid::new_v4();
        let before: Placement = serde_json::from_value(serde_json::json!({
            "mode": "before",
            "anchor_column_id": anchor,
        }))
        .unwrap();
        assert_eq!(before, Placement::Before { anchor_column_id: anchor });
        assert_eq!(before.anchor(), Some(anchor));

        assert!(serde_json::from_str::<Placement>(r#"{"mode":"after"}"#).is_err());
        assert_eq!(Placement::default(), Placement::End);
    }
}
