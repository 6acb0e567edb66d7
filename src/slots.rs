use crate::config::SlotConfig;

/// Spreads a day's entry start offsets (seconds since the anchor) over a
/// fixed number of display rows.
///
/// Walks the offsets latest-first under a shrinking ceiling. An empty
/// row is emitted when the gap between ceiling and offset is at least
/// one step and the rows emitted so far plus the entries still to place
/// leave spare capacity, so padding can never evict a real entry. The
/// latest-first sequence is right-padded with empties, reversed back to
/// ascending order and truncated to capacity.
///
/// Holds: output length == capacity, filled rows keep the input's
/// relative order, and the number of filled rows never exceeds
/// min(input length, capacity).
pub fn arrange(offsets: &[i64], config: &SlotConfig) -> Vec<Option<i64>> {
    let mut rows: Vec<Option<i64>> = Vec::with_capacity(config.capacity);
    let mut ceiling = config.ceiling_secs;

    for (i, &offset) in offsets.iter().rev().enumerate() {
        let unplaced = offsets.len() - i;

        while ceiling - offset >= config.step_secs && rows.len() + unplaced < config.capacity {
            rows.push(None);
            ceiling -= config.step_secs;
        }

        if offset <= ceiling {
            ceiling = offset;
        }
        rows.push(Some(offset));
    }

    while rows.len() < config.capacity {
        rows.push(None);
    }
    rows.reverse();
    rows.truncate(config.capacity);

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> SlotConfig {
        SlotConfig::default()
    }

    #[test]
    fn no_entries_give_all_empty_rows() {
        assert_eq!(arrange(&[], &defaults()), vec![None, None, None]);
    }

    #[test]
    fn single_early_entry_leads_the_rows() {
        assert_eq!(arrange(&[0], &defaults()), vec![Some(0), None, None]);
    }

    #[test]
    fn single_late_entry_sinks_to_the_bottom_row() {
        // 30000s past the anchor sits above every band boundary, so the
        // padding ends up in the earlier rows.
        assert_eq!(arrange(&[30_000], &defaults()), vec![None, None, Some(30_000)]);
    }

    #[test]
    fn close_pair_keeps_order_and_is_not_padded_apart() {
        // 09:00 and 09:15 relative to an 08:00 anchor
        let rows = arrange(&[3_600, 4_500], &defaults());
        assert_eq!(rows, vec![Some(3_600), Some(4_500), None]);
    }

    #[test]
    fn wide_pair_keeps_both_entries() {
        let rows = arrange(&[0, 18_000], &defaults());
        let filled: Vec<i64> = rows.iter().copied().flatten().collect();
        assert_eq!(filled, vec![0, 18_000]);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn overflow_keeps_the_earliest_entries_in_order() {
        let rows = arrange(&[0, 3_600, 7_200, 10_800], &defaults());
        assert_eq!(rows, vec![Some(0), Some(3_600), Some(7_200)]);
    }

    #[test]
    fn filled_rows_never_exceed_capacity_or_input() {
        for offsets in [vec![], vec![500], vec![500, 600], vec![0, 9_000, 18_000, 27_000]] {
            let rows = arrange(&offsets, &defaults());
            assert_eq!(rows.len(), 3);
            let filled = rows.iter().flatten().count();
            assert!(filled <= offsets.len().min(3));

            // relative order preserved
            let values: Vec<i64> = rows.iter().copied().flatten().collect();
            let mut sorted = values.clone();
            sorted.sort_unstable();
            assert_eq!(values, sorted);
        }
    }
}
