// Per-habit statistics and excess-entry pruning plans
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::Habit;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitStats {
    pub key: String,
    pub name: String,
    pub color: String,
    pub target_per_day: u32,
    pub total_entries: usize,
    pub unique_days: usize,
    pub current_streak: u32,
    /// Only meaningful for habits logged more than once a day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<f64>,
}

impl HabitStats {
    pub fn compute(key: &str, habit: &Habit, today: NaiveDate) -> Self {
        let unique = unique_days(habit);
        let completion_rate = if habit.target_per_day > 1 && !unique.is_empty() {
            let expected = unique.len() as f64 * f64::from(habit.target_per_day);
            Some(habit.dates.len() as f64 / expected * 100.0)
        } else {
            None
        };

        Self {
            key: key.to_string(),
            name: habit.name.clone(),
            color: habit.color.to_string(),
            target_per_day: habit.target_per_day,
            total_entries: habit.dates.len(),
            unique_days: unique.len(),
            current_streak: current_streak(habit, today),
            completion_rate,
        }
    }

    /// Entries the target implies for the tracked days
    pub fn expected_entries(&self) -> usize {
        self.unique_days * self.target_per_day as usize
    }
}

fn unique_days(habit: &Habit) -> BTreeSet<NaiveDate> {
    habit.dates.iter().copied().collect()
}

/// Consecutive days with at least one entry, counting back from today.
/// A habit not logged today has no current streak.
pub fn current_streak(habit: &Habit, today: NaiveDate) -> u32 {
    let days = unique_days(habit);
    let mut streak = 0;
    let mut cursor = today;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

/// Entries above the daily target on one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Excess {
    pub date: NaiveDate,
    pub count: usize,
    pub excess: usize,
}

/// Dates (ascending) where the habit was logged more often than its target
pub fn prune_plan(habit: &Habit) -> Vec<Excess> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in &habit.dates {
        *counts.entry(*date).or_insert(0) += 1;
    }

    let target = habit.target_per_day.max(1) as usize;
    counts
        .into_iter()
        .filter(|(_, count)| *count > target)
        .map(|(date, count)| Excess {
            date,
            count,
            excess: count - target,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HabitColor;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_current_streak() {
        let mut habit = Habit::new("Run", HabitColor::Red, 1);
        habit.dates = vec![day(16), day(15), day(15), day(14), day(12)];
        assert_eq!(current_streak(&habit, day(16)), 3);
        // Nothing logged today
        assert_eq!(current_streak(&habit, day(17)), 0);
        assert_eq!(current_streak(&Habit::new("x", HabitColor::Red, 1), day(16)), 0);
    }

    #[test]
    fn test_streak_crosses_month_boundary() {
        let mut habit = Habit::new("Run", HabitColor::Red, 1);
        habit.dates = vec![
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 27).unwrap(),
        ];
        assert_eq!(
            current_streak(&habit, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
            3
        );
    }

    #[test]
    fn test_stats_with_target() {
        let mut habit = Habit::new("Water", HabitColor::Cyan, 4);
        habit.dates = vec![day(16), day(16), day(15), day(15), day(15), day(15)];
        let stats = HabitStats::compute("water", &habit, day(16));
        assert_eq!(stats.total_entries, 6);
        assert_eq!(stats.unique_days, 2);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.expected_entries(), 8);
        assert_eq!(stats.completion_rate, Some(75.0));

        let single = HabitStats::compute("run", &Habit::new("Run", HabitColor::Red, 1), day(16));
        assert_eq!(single.completion_rate, None);
    }

    #[test]
    fn test_prune_plan() {
        let mut habit = Habit::new("Floss", HabitColor::Magenta, 2);
        habit.dates = vec![day(3), day(1), day(3), day(1), day(3), day(1), day(1), day(2)];
        let plan = prune_plan(&habit);
        assert_eq!(
            plan,
            vec![
                Excess {
                    date: day(1),
                    count: 4,
                    excess: 2
                },
                Excess {
                    date: day(3),
                    count: 3,
                    excess: 1
                },
            ]
        );
    }
}
