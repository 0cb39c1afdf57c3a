//! Ordered in-memory tables.
//!
//! A [`Table`] is just an ordered `Vec` of typed rows, readable as a slice,
//! plus the handful of keyed helpers the reconciliation operations need.
//! Every helper preserves row order; grouping iterates keys in ascending
//! order.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use std::ops::Deref;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table<R> {
    rows: Vec<R>,
}

/// Rows that can be rendered as a flat header + fields record.
pub trait Tabular {
    fn headers() -> &'static [&'static str];
    fn fields(&self) -> Vec<Cow<'_, str>>;
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> From<Vec<R>> for Table<R> {
    fn from(rows: Vec<R>) -> Self {
        Self { rows }
    }
}

impl<R> FromIterator<R> for Table<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<R> IntoIterator for Table<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl<R> Deref for Table<R> {
    type Target = [R];

    fn deref(&self) -> &[R] {
        &self.rows
    }
}

impl<R> Table<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }
}

/// Group rows by key. Keys iterate ascending, rows keep their input order
/// within each group.
pub fn group_by<'a, R, K, F>(rows: &'a [R], key: F) -> BTreeMap<K, Vec<&'a R>>
where
    K: Ord,
    F: Fn(&'a R) -> K,
{
    let mut groups: BTreeMap<K, Vec<&'a R>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row);
    }
    groups
}

/// Keep the first row seen for each key.
pub fn dedup_first_by<'a, R, K, F>(rows: impl IntoIterator<Item = &'a R>, key: F) -> Vec<&'a R>
where
    R: 'a,
    K: Hash + Eq,
    F: Fn(&'a R) -> K,
{
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(key(*row))).collect()
}

/// Keep rows whose key does not occur among `exclude`'s keys.
pub fn anti_join_by<'a, R, K, F>(rows: &'a [R], exclude: &'a [R], key: F) -> Vec<&'a R>
where
    K: Hash + Eq,
    F: Fn(&'a R) -> K,
{
    let excluded: HashSet<K> = exclude.iter().map(&key).collect();
    rows.iter()
        .filter(|row| !excluded.contains(&key(*row)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_sorts_keys_and_keeps_row_order() {
        let rows = vec![("b", 1), ("a", 2), ("b", 3), ("a", 4)];
        let groups = group_by(&rows, |row| row.0);

        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(groups["b"], vec![&("b", 1), &("b", 3)]);
    }

    #[test]
    fn test_dedup_first_by_keeps_earliest() {
        let rows = vec![("x", 1), ("y", 2), ("x", 3)];
        let deduped = dedup_first_by(&rows, |row| row.0);
        assert_eq!(deduped, vec![&("x", 1), &("y", 2)]);
    }

    #[test]
    fn test_anti_join_by() {
        let left = vec![1, 2, 3, 2];
        let right = vec![2];
        assert_eq!(anti_join_by(&left, &right, |v| *v), vec![&1, &3]);
    }

    #[test]
    fn test_table_collects_in_order() {
        let table: Table<u32> = (1..=3).collect();
        assert_eq!(table.rows(), &[1, 2, 3]);
        assert_eq!(table.len(), 3);
        assert!(Table::<u32>::new().is_empty());
    }
}
