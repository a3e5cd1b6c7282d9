//! Grouping and ratio helpers shared by every metric computation.

use std::collections::HashMap;
use std::hash::Hash;

use crate::models::Task;

// ── Precision ─────────────────────────────────────────────────────────────────

/// Decimal precision used when publishing a ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Two decimals: per-developer ratios, shares and means.
    Ratio,
    /// One decimal: whole-sprint rates (completion, unfinished, late).
    Rate,
}

impl Precision {
    pub fn decimals(self) -> u32 {
        match self {
            Precision::Ratio => 2,
            Precision::Rate => 1,
        }
    }
}

/// Round `value` to `decimals` places, half away from zero.
///
/// Midpoints that binary floating point lands just below (`28.749999…` for
/// `28.75`) still round away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    let scaled = value.abs() * factor;
    // Half ULP at the target precision.
    let rounded = (scaled + f64::EPSILON * scaled).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded.copysign(value)
    }
}

/// Calculate `(numerator / denominator) * 100` at the given precision.
///
/// Returns `0.0` when `denominator` is zero.
///
/// # Examples
///
/// ```
/// use metrics_core::grouping::{percentage, Precision};
///
/// assert_eq!(percentage(1.0, 3.0, Precision::Ratio), 33.33);
/// assert_eq!(percentage(2.0, 3.0, Precision::Rate), 66.7);
/// assert_eq!(percentage(5.0, 0.0, Precision::Ratio), 0.0);
/// ```
pub fn percentage(numerator: f64, denominator: f64, precision: Precision) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    round_to(numerator * 100.0 / denominator, precision.decimals())
}

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Relative estimation error of a task in percent:
/// `(actual - estimated) / estimated * 100`.
///
/// `None` when the estimate is not positive.
pub fn estimation_error(task: &Task) -> Option<f64> {
    if task.estimated_hours > 0.0 {
        Some((task.actual_hours - task.estimated_hours) / task.estimated_hours * 100.0)
    } else {
        None
    }
}

// ── OrderedMap ────────────────────────────────────────────────────────────────

/// Map that remembers the order in which keys were first inserted.
///
/// Metric categories (developers, sprints) follow first-seen order, which a
/// `HashMap` would lose and a `BTreeMap` would replace with sort order.
#[derive(Debug, Clone)]
pub struct OrderedMap<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to the value for `key`, inserting `make()` on first sight.
    pub fn entry_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> &mut V {
        let pos = match self.index.get(&key) {
            Some(&pos) => pos,
            None => {
                let pos = self.entries.len();
                self.index.insert(key.clone(), pos);
                self.entries.push((key, make()));
                pos
            }
        };
        &mut self.entries[pos].1
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.entries.iter_mut().map(|(k, v)| (&*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash + Clone, V: Default> OrderedMap<K, V> {
    /// Mutable access to the value for `key`, inserting `V::default()` on first sight.
    pub fn entry(&mut self, key: K) -> &mut V {
        self.entry_or_insert_with(key, V::default)
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Stable group-by: items keep their relative order within a group and groups
/// appear in the order their key was first produced.
pub fn group_by<I, K, F>(items: I, key_fn: F) -> OrderedMap<K, Vec<I::Item>>
where
    I: IntoIterator,
    K: Eq + Hash + Clone,
    F: Fn(&I::Item) -> K,
{
    let mut groups: OrderedMap<K, Vec<I::Item>> = OrderedMap::new();
    for item in items {
        let key = key_fn(&item);
        groups.entry(key).push(item);
    }
    groups
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskId, TaskStatus, TaskType};
    use chrono::Utc;

    fn task(estimated: f64, actual: f64) -> Task {
        Task {
            id: TaskId::Number(1),
            assigned_to: "Ana".to_string(),
            status: TaskStatus::Done,
            task_type: TaskType::Task,
            estimated_hours: estimated,
            actual_hours: actual,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    // ── percentage ───────────────────────────────────────────────────────────

    #[test]
    fn test_percentage_zero_over_zero() {
        assert_eq!(percentage(0.0, 0.0, Precision::Ratio), 0.0);
    }

    #[test]
    fn test_percentage_anything_over_zero() {
        assert_eq!(percentage(7.0, 0.0, Precision::Ratio), 0.0);
        assert_eq!(percentage(7.0, 0.0, Precision::Rate), 0.0);
    }

    #[test]
    fn test_percentage_two_decimals() {
        assert_eq!(percentage(1.0, 3.0, Precision::Ratio), 33.33);
        assert_eq!(percentage(2.0, 3.0, Precision::Ratio), 66.67);
        assert_eq!(percentage(1.0, 8.0, Precision::Ratio), 12.5);
    }

    #[test]
    fn test_percentage_one_decimal() {
        assert_eq!(percentage(1.0, 3.0, Precision::Rate), 33.3);
        assert_eq!(percentage(2.0, 3.0, Precision::Rate), 66.7);
    }

    #[test]
    fn test_percentage_exact_midpoints_round_up() {
        assert_eq!(percentage(23.0, 80.0, Precision::Rate), 28.8);
        assert_eq!(percentage(23.0, 160.0, Precision::Ratio), 14.38);
        assert_eq!(percentage(1.0, 8.0, Precision::Rate), 12.5);
    }

    #[test]
    fn test_percentage_full() {
        assert_eq!(percentage(4.0, 4.0, Precision::Ratio), 100.0);
    }

    #[test]
    fn test_round_to_half_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-0.125, 2), -0.13);
        assert_eq!(round_to(28.749999999999996, 1), 28.8);
        assert_eq!(round_to(-28.749999999999996, 1), -28.8);
    }

    #[test]
    fn test_round_to_tiny_negative_is_plain_zero() {
        let rounded = round_to(-0.001, 2);
        assert_eq!(rounded, 0.0);
        assert!(rounded.is_sign_positive());
    }

    // ── mean / estimation_error ──────────────────────────────────────────────

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_values() {
        assert!((mean(&[1.0, 2.0, 6.0]) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_estimation_error_over_estimate() {
        assert_eq!(estimation_error(&task(4.0, 5.0)), Some(25.0));
    }

    #[test]
    fn test_estimation_error_under_estimate() {
        assert_eq!(estimation_error(&task(10.0, 5.0)), Some(-50.0));
    }

    #[test]
    fn test_estimation_error_zero_estimate_is_none() {
        assert_eq!(estimation_error(&task(0.0, 5.0)), None);
    }

    // ── OrderedMap / group_by ────────────────────────────────────────────────

    #[test]
    fn test_group_by_preserves_first_seen_order() {
        let words = vec!["banana", "apple", "blueberry", "avocado", "cherry"];
        let groups = group_by(words, |w| w.chars().next().unwrap());
        let keys: Vec<char> = groups.keys().copied().collect();
        assert_eq!(keys, vec!['b', 'a', 'c']);
        assert_eq!(groups.get(&'b').unwrap(), &vec!["banana", "blueberry"]);
        assert_eq!(groups.get(&'a').unwrap(), &vec!["apple", "avocado"]);
    }

    #[test]
    fn test_group_by_empty() {
        let groups = group_by(Vec::<u32>::new(), |n| *n);
        assert!(groups.is_empty());
        assert_eq!(groups.len(), 0);
    }

    #[test]
    fn test_ordered_map_entry_accumulates() {
        let mut counts: OrderedMap<String, u32> = OrderedMap::new();
        for dev in ["Bo", "Ana", "Bo", "Bo"] {
            *counts.entry(dev.to_string()) += 1;
        }
        let collected: Vec<(String, u32)> = counts.into_iter().collect();
        assert_eq!(
            collected,
            vec![("Bo".to_string(), 3), ("Ana".to_string(), 1)]
        );
    }

    #[test]
    fn test_ordered_map_get_missing_key() {
        let mut map: OrderedMap<&str, Vec<u8>> = OrderedMap::new();
        map.entry("x").push(1);
        assert_eq!(map.get(&"x"), Some(&vec![1]));
        assert!(map.get(&"y").is_none());
    }
}
