// Mode-aware output for the non-interactive commands
use colored::{ColoredString, Colorize};
use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL_CONDENSED};
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use std::io::{self, BufRead, IsTerminal, Write};

use crate::capability::RenderingTier;
use crate::classify::{block_title, habit_rows, CellColor, Slot};
use crate::grid::Week;
use crate::models::{Habit, HabitColor};
use crate::stats::HabitStats;

/// Output mode for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Colors and symbols
    Human,
    /// Machine-readable JSON output
    Json,
    /// Plain text without colors (for pipes/logs)
    Plain,
}

impl OutputMode {
    /// JSON when requested, plain text when stdout is not a terminal
    pub fn detect(json_requested: bool) -> Self {
        if json_requested {
            Self::Json
        } else if !io::stdout().is_terminal() {
            Self::Plain
        } else {
            Self::Human
        }
    }
}

/// Structured message emitted in JSON mode
#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    level: &'a str,
    message: &'a str,
}

pub struct OutputWriter {
    mode: OutputMode,
}

impl OutputWriter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, OutputMode::Json)
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        match self.mode {
            OutputMode::Human => {
                println!();
                println!("{}", title.cyan().bold());
                println!("{}", "═".repeat(title.chars().count()).cyan());
            }
            OutputMode::Plain => {
                println!();
                println!("{}", title);
                println!("{}", "=".repeat(title.chars().count()));
            }
            OutputMode::Json => {}
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("{} {}", "✓".green(), message),
            OutputMode::Plain => println!("[OK] {}", message),
            OutputMode::Json => self.emit_message("success", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => eprintln!("{} {}", "✗".red(), message),
            OutputMode::Plain => eprintln!("[ERROR] {}", message),
            OutputMode::Json => self.emit_message("error", message),
        }
    }

    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("{} {}", "⚠".yellow(), message),
            OutputMode::Plain => println!("[WARN] {}", message),
            OutputMode::Json => self.emit_message("warning", message),
        }
    }

    pub fn info(&self, message: &str) {
        match self.mode {
            OutputMode::Human | OutputMode::Plain => println!("{}", message),
            OutputMode::Json => self.emit_message("info", message),
        }
    }

    /// Print a key-value table
    pub fn table(&self, rows: &[(&str, String)]) {
        let max_key_len = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        match self.mode {
            OutputMode::Human => {
                for (key, value) in rows {
                    let padded = format!("{:width$}", key, width = max_key_len);
                    println!("  {} │ {}", padded.yellow(), value);
                }
            }
            OutputMode::Plain => {
                for (key, value) in rows {
                    println!("  {:width$} : {}", key, value, width = max_key_len);
                }
            }
            OutputMode::Json => {}
        }
    }

    /// Print a serializable value as the command's JSON result
    pub fn emit<T: Serialize>(&self, value: &T) {
        if self.is_json() {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }

    fn emit_message(&self, level: &str, message: &str) {
        if let Ok(json) = serde_json::to_string(&Message { level, message }) {
            println!("{}", json);
        }
    }

    /// `hab list` table: one row per habit
    pub fn habit_table(&self, stats: &[HabitStats]) {
        if self.is_json() {
            self.emit(&stats);
            return;
        }
        println!("{}", self.build_habit_table(stats));
    }

    fn build_habit_table(&self, stats: &[HabitStats]) -> Table {
        let mut table = Table::new();
        match self.mode {
            OutputMode::Human => table.load_preset(UTF8_FULL_CONDENSED),
            _ => table.load_preset(ASCII_MARKDOWN),
        };
        table
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Key", "Name", "Color", "Target", "Entries", "Days", "Streak"]);
        for s in stats {
            table.add_row(vec![
                s.key.clone(),
                s.name.clone(),
                s.color.clone(),
                format!("{}/day", s.target_per_day),
                s.total_entries.to_string(),
                s.unique_days.to_string(),
                s.current_streak.to_string(),
            ]);
        }
        table
    }

    /// Grid for `hab show`: same layout as the interactive view
    pub fn habit_grid(
        &self,
        habit: &Habit,
        number: Option<usize>,
        weeks: &[Week],
        tier: RenderingTier,
    ) {
        let colorize = self.mode == OutputMode::Human;
        for line in grid_lines(habit, number, weeks, tier, colorize) {
            println!("{}", line);
        }
    }

    /// Ask a yes/no question on stdin; anything but y/yes is "no"
    pub fn confirm(&self, question: &str) -> io::Result<bool> {
        let answer = self.prompt(&format!("{} [y/N]", question))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    /// Read one trimmed line from stdin after printing `question`
    pub fn prompt(&self, question: &str) -> io::Result<String> {
        print!("{} ", question);
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

fn paint(text: &str, color: CellColor) -> ColoredString {
    match color {
        CellColor::Active(c) => paint_habit(text, c),
        CellColor::Inactive => text.bright_black(),
    }
}

fn paint_habit(text: &str, color: HabitColor) -> ColoredString {
    match color {
        HabitColor::Red => text.red(),
        HabitColor::Blue => text.blue(),
        HabitColor::Green => text.green(),
        HabitColor::Magenta => text.magenta(),
        HabitColor::Cyan => text.cyan(),
        HabitColor::Yellow => text.yellow(),
        HabitColor::Gray => text.bright_black(),
    }
}

/// Text rows of one habit grid; colored when `colorize` is set
pub fn grid_lines(
    habit: &Habit,
    number: Option<usize>,
    weeks: &[Week],
    tier: RenderingTier,
    colorize: bool,
) -> Vec<String> {
    let title = block_title(habit, number);
    let mut lines = vec![if colorize {
        paint_habit(&title, habit.color).bold().to_string()
    } else {
        title
    }];

    for (label, slots) in habit_rows(habit, weeks, tier) {
        let cells: Vec<String> = slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Blank => " ".to_string(),
                Slot::Glyph(glyph, color) if colorize => paint(glyph, color).to_string(),
                Slot::Glyph(glyph, _) => glyph.to_string(),
            })
            .collect();
        lines.push(format!("{}  {}", label, cells.join("  ")));
    }

    lines
}

/// Format a completion percentage with one decimal
pub fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::build_grid;
    use crate::models::{Habits, Timeline};
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_json_mode_wins() {
        assert_eq!(OutputMode::detect(true), OutputMode::Json);
        // Plain when running under the test harness (no TTY)
        assert!(matches!(
            OutputMode::detect(false),
            OutputMode::Plain | OutputMode::Human
        ));
    }

    #[test]
    fn test_plain_grid_lines() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut habit = Habit::new("Read", HabitColor::Blue, 2);
        habit.dates = vec![today, today - Duration::days(1), today - Duration::days(1)];
        let mut habits = Habits::new();
        habits.insert("read".to_string(), habit.clone());
        let grid = build_grid(&habits, Timeline::ThreeMonths, today);

        let lines = grid_lines(&habit, None, grid.recent_weeks(2), RenderingTier::Minimal, false);
        assert_eq!(lines[0], "Read (3 activities)");
        assert_eq!(lines[5], "T  .  #");
        assert_eq!(lines[6], "F  .  +");
        assert_eq!(lines[7], "S  .   ");
    }

    #[test]
    fn test_habit_table_columns() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut habit = Habit::new("Drink Water", HabitColor::Cyan, 8);
        habit.dates = vec![today];
        let stats = vec![HabitStats::compute("water", &habit, today)];

        let rendered = OutputWriter::new(OutputMode::Plain)
            .build_habit_table(&stats)
            .to_string();
        assert!(rendered.contains("Drink Water"));
        assert!(rendered.contains("8/day"));
        assert!(rendered.contains("Streak"));
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(75.0), "75.0%");
        assert_eq!(format_rate(33.333), "33.3%");
    }
}
