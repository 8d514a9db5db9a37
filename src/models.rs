// Core data model: habits, colors and timelines
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::HabError;

/// Habits keyed by id. Ascending id order is the iteration order everywhere
/// (grid tie-break, 1-9 shortcuts, `hab list` numbering).
pub type Habits = BTreeMap<String, Habit>;

/// Display color of a habit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitColor {
    Red,
    Blue,
    Green,
    Magenta,
    Cyan,
    Yellow,
    Gray,
}

impl HabitColor {
    pub const ALL: [HabitColor; 7] = [
        HabitColor::Red,
        HabitColor::Blue,
        HabitColor::Green,
        HabitColor::Magenta,
        HabitColor::Cyan,
        HabitColor::Yellow,
        HabitColor::Gray,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HabitColor::Red => "red",
            HabitColor::Blue => "blue",
            HabitColor::Green => "green",
            HabitColor::Magenta => "magenta",
            HabitColor::Cyan => "cyan",
            HabitColor::Yellow => "yellow",
            HabitColor::Gray => "gray",
        }
    }

    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for HabitColor {
    type Err = HabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == lowered)
            .ok_or_else(|| {
                HabError::Validation(format!(
                    "invalid color '{}'. Valid colors: {}",
                    s,
                    Self::valid_names()
                ))
            })
    }
}

impl fmt::Display for HabitColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tracked habit as persisted in the data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub name: String,
    pub color: HabitColor,
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    #[serde(default = "default_target", deserialize_with = "deserialize_target")]
    pub target_per_day: u32,
}

fn default_target() -> u32 {
    1
}

/// Older files may carry 0 or a negative target; both mean "once a day".
fn deserialize_target<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(normalize_target(raw))
}

/// Clamp a user- or file-supplied target into the valid `>= 1` range.
pub fn normalize_target(raw: i64) -> u32 {
    if raw <= 0 {
        1
    } else {
        u32::try_from(raw).unwrap_or(u32::MAX)
    }
}

impl Habit {
    pub fn new(name: impl Into<String>, color: HabitColor, target_per_day: u32) -> Self {
        Self {
            name: name.into(),
            color,
            dates: Vec::new(),
            target_per_day: target_per_day.max(1),
        }
    }

    /// Number of entries logged on `date`
    pub fn completions_on(&self, date: NaiveDate) -> usize {
        self.dates.iter().filter(|d| **d == date).count()
    }

    pub fn has_entry_on(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

/// Visible history length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeline {
    ThreeMonths,
    SixMonths,
    #[default]
    TwelveMonths,
}

impl Timeline {
    pub fn days(&self) -> i64 {
        match self {
            Timeline::ThreeMonths => 90,
            Timeline::SixMonths => 180,
            Timeline::TwelveMonths => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timeline::ThreeMonths => "3 months",
            Timeline::SixMonths => "6 months",
            Timeline::TwelveMonths => "12 months",
        }
    }
}

impl FromStr for Timeline {
    type Err = HabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "3m" | "3" => Ok(Timeline::ThreeMonths),
            "6m" | "6" => Ok(Timeline::SixMonths),
            "12m" | "12" | "1y" | "y" | "" => Ok(Timeline::TwelveMonths),
            other => Err(HabError::Validation(format!(
                "invalid timeline '{}'. Use 3m, 6m, or 12m",
                other
            ))),
        }
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse a `YYYY-MM-DD` calendar day
pub fn parse_date(s: &str) -> Result<NaiveDate, HabError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        HabError::Validation(format!("invalid date format '{}', use YYYY-MM-DD", s))
    })
}

/// Derive a storage key from a display name: lowercase, spaces become `_`
pub fn key_from_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Derive a display name from a key: `_` becomes a space, words capitalized
pub fn name_from_key(key: &str) -> String {
    key.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_str() {
        assert_eq!("red".parse::<HabitColor>().unwrap(), HabitColor::Red);
        assert_eq!("Cyan".parse::<HabitColor>().unwrap(), HabitColor::Cyan);
        assert!(matches!(
            "purple".parse::<HabitColor>(),
            Err(HabError::Validation(_))
        ));
    }

    #[test]
    fn test_timeline_from_str() {
        assert_eq!("3m".parse::<Timeline>().unwrap(), Timeline::ThreeMonths);
        assert_eq!("6".parse::<Timeline>().unwrap(), Timeline::SixMonths);
        assert_eq!("1y".parse::<Timeline>().unwrap(), Timeline::TwelveMonths);
        assert_eq!("12m".parse::<Timeline>().unwrap(), Timeline::TwelveMonths);
        assert!("2w".parse::<Timeline>().is_err());
        assert_eq!(Timeline::SixMonths.days(), 180);
    }

    #[test]
    fn test_habit_deserialize_normalizes_target() {
        let json = r#"{"name":"Read","color":"blue","dates":["2025-01-02"],"target_per_day":0}"#;
        let habit: Habit = serde_json::from_str(json).unwrap();
        assert_eq!(habit.target_per_day, 1);

        let json = r#"{"name":"Read","color":"blue","dates":[],"target_per_day":-3}"#;
        let habit: Habit = serde_json::from_str(json).unwrap();
        assert_eq!(habit.target_per_day, 1);

        let json = r#"{"name":"Read","color":"blue","dates":[]}"#;
        let habit: Habit = serde_json::from_str(json).unwrap();
        assert_eq!(habit.target_per_day, 1);
    }

    #[test]
    fn test_completions_on_counts_duplicates() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut habit = Habit::new("Water", HabitColor::Cyan, 4);
        habit.dates = vec![day, day, day.succ_opt().unwrap(), day];
        assert_eq!(habit.completions_on(day), 3);
        assert!(habit.has_entry_on(day));
    }

    #[test]
    fn test_name_and_key_derivation() {
        assert_eq!(name_from_key("morning_run"), "Morning Run");
        assert_eq!(key_from_name("Morning Run"), "morning_run");
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("2024-02-29").is_ok());
    }
}
