// Cell classification: completion count vs. daily target -> glyph level
use crate::capability::RenderingTier;
use crate::grid::{Cell, Week};
use crate::models::{Habit, HabitColor};

/// Completion level of a single day. There is no tier above `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    None,
    Low,
    Partial,
    Complete,
}

impl Level {
    /// Map `completions / target` onto a level. `target` is at least 1.
    pub fn from_counts(completions: usize, target: u32) -> Self {
        let rate = completions as f64 / f64::from(target.max(1));
        if rate == 0.0 {
            Level::None
        } else if rate < 0.5 {
            Level::Low
        } else if rate < 1.0 {
            Level::Partial
        } else {
            Level::Complete
        }
    }

    pub fn glyph(&self, tier: RenderingTier) -> &'static str {
        let cs = tier.charset();
        match self {
            Level::None => cs.none,
            Level::Low => cs.low,
            Level::Partial => cs.partial,
            Level::Complete => cs.complete,
        }
    }
}

/// Color of a rendered cell: the habit's own color on any day with an
/// entry, a fixed neutral otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellColor {
    Active(HabitColor),
    Inactive,
}

pub fn classify(cell: &Cell, habit: &Habit) -> Level {
    Level::from_counts(habit.completions_on(cell.date), habit.target_per_day)
}

pub fn classify_glyph(cell: &Cell, habit: &Habit, tier: RenderingTier) -> &'static str {
    classify(cell, habit).glyph(tier)
}

pub fn cell_color(cell: &Cell, habit: &Habit) -> CellColor {
    if habit.has_entry_on(cell.date) {
        CellColor::Active(habit.color)
    } else {
        CellColor::Inactive
    }
}

/// Row labels, Sunday first
pub const DAY_LABELS: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

/// One week column of a grid row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Outside the timeline
    Blank,
    Glyph(&'static str, CellColor),
}

/// `[N] Name (K activities)`, or without the number
pub fn block_title(habit: &Habit, number: Option<usize>) -> String {
    let count = habit.dates.len();
    match number {
        Some(n) => format!("[{}] {} ({} activities)", n, habit.name, count),
        None => format!("{} ({} activities)", habit.name, count),
    }
}

/// Seven labelled rows of classified slots, one slot per week
pub fn habit_rows(
    habit: &Habit,
    weeks: &[Week],
    tier: RenderingTier,
) -> Vec<(&'static str, Vec<Slot>)> {
    DAY_LABELS
        .iter()
        .enumerate()
        .map(|(row, label)| {
            let slots = weeks
                .iter()
                .map(|week| {
                    let cell = &week[row];
                    if cell.in_range {
                        Slot::Glyph(classify_glyph(cell, habit, tier), cell_color(cell, habit))
                    } else {
                        Slot::Blank
                    }
                })
                .collect();
            (*label, slots)
        })
        .collect()
}

/// `None  . - + #  Complete` for the tier
pub fn legend_text(tier: RenderingTier) -> String {
    let cs = tier.charset();
    format!(
        "None  {}  {}  {}  {}  Complete",
        cs.none, cs.low, cs.partial, cs.complete
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::build_grid;
    use crate::models::{Habits, Timeline};
    use chrono::{Duration, NaiveDate};

    fn cell_on(date: NaiveDate) -> Cell {
        Cell {
            date,
            in_range: true,
            active_color: None,
        }
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(Level::from_counts(0, 1), Level::None);
        assert_eq!(Level::from_counts(1, 1), Level::Complete);
        assert_eq!(Level::from_counts(1, 2), Level::Partial);
        assert_eq!(Level::from_counts(2, 4), Level::Partial);
        assert_eq!(Level::from_counts(1, 4), Level::Low);
        assert_eq!(Level::from_counts(3, 4), Level::Partial);
        assert_eq!(Level::from_counts(4, 4), Level::Complete);
        assert_eq!(Level::from_counts(5, 4), Level::Complete);
        assert_eq!(Level::from_counts(0, 0), Level::None);
    }

    #[test]
    fn test_monotonic_in_completions() {
        for target in 1..=8u32 {
            let mut previous = Level::None;
            for completions in 0..=20usize {
                let level = Level::from_counts(completions, target);
                assert!(level >= previous, "target={} completions={}", target, completions);
                previous = level;
            }
        }
    }

    #[test]
    fn test_glyph_lookup_per_tier() {
        assert_eq!(Level::None.glyph(RenderingTier::Minimal), ".");
        assert_eq!(Level::Low.glyph(RenderingTier::Extended), "▒");
        assert_eq!(Level::Partial.glyph(RenderingTier::Full), "◑");
        assert_eq!(Level::Complete.glyph(RenderingTier::Full), "●");
    }

    #[test]
    fn test_classify_counts_same_day_entries() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut habit = Habit::new("Water", HabitColor::Cyan, 4);
        habit.dates = vec![day, day];
        assert_eq!(classify(&cell_on(day), &habit), Level::Partial);
        assert_eq!(
            classify_glyph(&cell_on(day), &habit, RenderingTier::Minimal),
            "+"
        );
        assert_eq!(cell_color(&cell_on(day), &habit), CellColor::Active(HabitColor::Cyan));

        let other = day - Duration::days(1);
        assert_eq!(classify(&cell_on(other), &habit), Level::None);
        assert_eq!(cell_color(&cell_on(other), &habit), CellColor::Inactive);
    }

    #[test]
    fn test_habit_rows_layout() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut habit = Habit::new("Read", HabitColor::Blue, 2);
        habit.dates = vec![today];
        let mut habits = Habits::new();
        habits.insert("read".to_string(), habit.clone());
        let grid = build_grid(&habits, Timeline::ThreeMonths, today);

        let rows = habit_rows(&habit, grid.recent_weeks(2), RenderingTier::Minimal);
        assert_eq!(rows.len(), 7);
        assert!(rows.iter().all(|(_, slots)| slots.len() == 2));
        let labels: Vec<&str> = rows.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, DAY_LABELS);
        // Friday the 16th is half done; Saturday the 17th is after today
        assert_eq!(
            rows[5].1[1],
            Slot::Glyph("+", CellColor::Active(HabitColor::Blue))
        );
        assert_eq!(rows[6].1[1], Slot::Blank);
        assert_eq!(rows[6].1[0], Slot::Glyph(".", CellColor::Inactive));

        assert_eq!(block_title(&habit, Some(2)), "[2] Read (1 activities)");
        assert_eq!(block_title(&habit, None), "Read (1 activities)");
        assert_eq!(legend_text(RenderingTier::Extended), "None  ░  ▒  ▓  █  Complete");
    }

    #[test]
    fn test_exercise_end_to_end() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let yesterday = today - Duration::days(1);
        let mut exercise = Habit::new("Exercise", HabitColor::Green, 1);
        exercise.dates = vec![today, yesterday];
        let mut habits = Habits::new();
        habits.insert("exercise".to_string(), exercise.clone());

        let grid = build_grid(&habits, Timeline::ThreeMonths, today);
        assert_eq!(grid.in_range_count(), 90);

        for cell in grid.cells().filter(|c| c.in_range) {
            let expected = if cell.date == today || cell.date == yesterday {
                Level::Complete
            } else {
                Level::None
            };
            assert_eq!(classify(cell, &exercise), expected, "date {}", cell.date);
        }
    }
}
