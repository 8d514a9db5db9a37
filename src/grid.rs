//! Contribution grid construction.
//!
//! Turns the sparse completion dates of every habit into a week-aligned
//! calendar matrix. Weeks run Sunday to Saturday; the first week starts on the
//! Sunday on or before the first day of the timeline, so some leading cells
//! (and the days after today in the final week) fall outside the range.

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

use crate::models::{HabitColor, Habits, Timeline};

/// Upper bound on emitted weeks (~14 months), whatever the inputs
pub const MAX_WEEKS: usize = 60;

/// Source of "today". Injected so grids are reproducible in tests.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Host local calendar day
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one day
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// One day in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub date: NaiveDate,
    pub in_range: bool,
    /// Color of the first habit (by id) with an entry that day
    pub active_color: Option<HabitColor>,
}

/// Seven cells, Sunday first
pub type Week = [Cell; 7];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub weeks: Vec<Week>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub timeline: Timeline,
}

impl Grid {
    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.weeks.iter().flat_map(|week| week.iter())
    }

    #[cfg(test)]
    pub fn in_range_count(&self) -> usize {
        self.cells().filter(|c| c.in_range).count()
    }

    /// The trailing `max_weeks` weeks, which always include today
    pub fn recent_weeks(&self, max_weeks: usize) -> &[Week] {
        let skip = self.weeks.len().saturating_sub(max_weeks);
        &self.weeks[skip..]
    }
}

/// Most recent Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Build the grid covering `timeline` days ending at `today`.
///
/// Shared days take the color of the habit with the smallest id, so the
/// output does not depend on map iteration order.
pub fn build_grid(habits: &Habits, timeline: Timeline, today: NaiveDate) -> Grid {
    let end = today;
    let start = today - Duration::days(timeline.days() - 1);
    let grid_start = week_start(start);

    let mut weeks = Vec::with_capacity(timeline.days() as usize / 7 + 2);
    let mut current = grid_start;

    while current <= end && weeks.len() < MAX_WEEKS {
        let week: Week = std::array::from_fn(|offset| {
            let date = current + Duration::days(offset as i64);
            let in_range = date >= start && date <= end;
            let active_color = if in_range {
                habits
                    .values()
                    .find(|habit| habit.has_entry_on(date))
                    .map(|habit| habit.color)
            } else {
                None
            };
            Cell {
                date,
                in_range,
                active_color,
            }
        });
        debug_assert_eq!(week[0].date.weekday(), Weekday::Sun);
        weeks.push(week);
        current += Duration::days(7);
    }

    Grid {
        weeks,
        start,
        end,
        timeline,
    }
}
