//! Sibling ordering strategy.
//!
//! The original expresses this as a `Sorter` abstract base class with two
//! concrete subclasses selected at construction time. A tagged enum plus a
//! free comparator function gets the same "pick a strategy, apply it
//! uniformly" behavior without a vtable or heap-allocated trait object.

use chrono::{DateTime, Utc};

/// Sort key and direction for a directory's child lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    AlphabeticalAscending,
    AlphabeticalDescending,
    LastWriteTimeAscending,
    LastWriteTimeDescending,
}

impl Default for SortKind {
    fn default() -> Self {
        SortKind::AlphabeticalAscending
    }
}

/// A name/last-write-time pair, the two fields a sibling ordering can key
/// on. Node names always live in the global name pool, so this borrows
/// nothing and stays `'static`.
#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    pub name: &'static str,
    pub last_write_time: DateTime<Utc>,
}

impl SortKind {
    /// Orders two siblings; `Less` means `a` sorts before `b`.
    pub fn compare(self, a: SortKey, b: SortKey) -> std::cmp::Ordering {
        let ordering = match self {
            SortKind::AlphabeticalAscending | SortKind::AlphabeticalDescending => {
                a.name.cmp(b.name)
            }
            SortKind::LastWriteTimeAscending | SortKind::LastWriteTimeDescending => {
                a.last_write_time.cmp(&b.last_write_time)
            }
        };
        match self {
            SortKind::AlphabeticalDescending | SortKind::LastWriteTimeDescending => {
                ordering.reverse()
            }
            _ => ordering,
        }
    }

    /// Returns the insertion position in an already-sorted slice that
    /// keeps it sorted, using a binary search on the given key projection.
    pub fn insertion_index<T>(
        self,
        existing: &[T],
        new_key: SortKey,
        key_of: impl Fn(&T) -> SortKey,
    ) -> usize {
        existing
            .partition_point(|item| self.compare(key_of(item), new_key) != std::cmp::Ordering::Greater)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &'static str, t: i64) -> SortKey {
        SortKey { name, last_write_time: DateTime::from_timestamp(t, 0).unwrap() }
    }

    #[test]
    fn alphabetical_ascending_orders_by_name() {
        let kind = SortKind::AlphabeticalAscending;
        assert_eq!(kind.compare(key("a", 0), key("b", 0)), std::cmp::Ordering::Less);
    }

    #[test]
    fn alphabetical_descending_reverses_order() {
        let kind = SortKind::AlphabeticalDescending;
        assert_eq!(kind.compare(key("a", 0), key("b", 0)), std::cmp::Ordering::Greater);
    }

    #[test]
    fn last_write_time_ascending_orders_by_time() {
        let kind = SortKind::LastWriteTimeAscending;
        assert_eq!(kind.compare(key("z", 1), key("a", 2)), std::cmp::Ordering::Less);
    }

    #[test]
    fn insertion_index_keeps_slice_sorted() {
        let kind = SortKind::AlphabeticalAscending;
        let names = vec!["alpha", "charlie", "echo"];
        let idx = kind.insertion_index(&names, key("bravo", 0), |n| key(*n, 0));
        assert_eq!(idx, 1);
    }

    #[test]
    fn insertion_index_at_end_for_largest_key() {
        let kind = SortKind::AlphabeticalAscending;
        let names = vec!["alpha", "bravo"];
        let idx = kind.insertion_index(&names, key("zulu", 0), |n| key(*n, 0));
        assert_eq!(idx, 2);
    }
}
