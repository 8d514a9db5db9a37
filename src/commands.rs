// Handlers for the non-interactive subcommands
use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::capability::RenderingTier;
use crate::classify::legend_text;
use crate::cli_output::{format_rate, OutputWriter};
use crate::error::HabError;
use crate::grid::build_grid;
use crate::models::{
    key_from_name, name_from_key, normalize_target, parse_date, Habit, HabitColor, Timeline,
};
use crate::render::{grid_width, weeks_that_fit};
use crate::stats::{current_streak, prune_plan, HabitStats};
use crate::store::{HabitRepository, HabitUpdate, JsonStore};

/// Key and habit resolved from the `new` arguments and prompt answers
pub fn plan_new_habit(
    key: Option<&str>,
    name_answer: Option<&str>,
    color: &str,
    target: i64,
) -> Result<(String, Habit), HabError> {
    let (key, name) = match key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => (key.to_string(), name_from_key(key)),
        None => {
            let name = name_answer.map(str::trim).unwrap_or_default();
            if name.is_empty() {
                return Err(HabError::Validation("habit name cannot be empty".to_string()));
            }
            (key_from_name(name), name.to_string())
        }
    };

    let color = if color.trim().is_empty() {
        HabitColor::Green
    } else {
        color.parse()?
    };

    Ok((key, Habit::new(name, color, normalize_target(target))))
}

pub fn new_habit(
    store: &mut JsonStore,
    out: &OutputWriter,
    key: Option<String>,
    color: Option<String>,
    target: Option<i64>,
) -> Result<()> {
    let name_answer = match key {
        Some(_) => None,
        None => Some(out.prompt("Habit name:")?),
    };
    let color = match color {
        Some(color) => color,
        None => out.prompt(&format!("Color ({}) [green]:", HabitColor::valid_names()))?,
    };
    let target = match target {
        Some(target) => target,
        None => {
            let answer = out.prompt("Target per day [1]:")?;
            if answer.is_empty() {
                1
            } else {
                answer.parse().map_err(|_| {
                    HabError::Validation(format!("invalid target '{}', expected a number", answer))
                })?
            }
        }
    };

    let (key, habit) = plan_new_habit(key.as_deref(), name_answer.as_deref(), &color, target)?;
    let summary = format!(
        "Created habit '{}' ({}, {}, target {}/day)",
        habit.name, key, habit.color, habit.target_per_day
    );
    store.create_habit(&key, habit)?;
    out.success(&summary);
    Ok(())
}

#[derive(Debug, Serialize)]
struct EntryResult<'a> {
    key: &'a str,
    date: NaiveDate,
    completions: usize,
    current_streak: u32,
}

/// Log one entry for `key` on `date` (today when absent)
pub fn add_entry(
    store: &mut JsonStore,
    out: &OutputWriter,
    key: &str,
    date: Option<&str>,
    today: NaiveDate,
) -> Result<()> {
    let date = match date {
        Some(d) => parse_date(d)?,
        None => today,
    };
    store.append_completion(key, date)?;

    let habit = store.require(key)?;
    let streak = current_streak(habit, today);
    if out.is_json() {
        out.emit(&EntryResult {
            key,
            date,
            completions: habit.completions_on(date),
            current_streak: streak,
        });
        return Ok(());
    }

    out.success(&format!("Added entry for '{}' on {}", habit.name, date));
    if streak > 0 {
        let plural = if streak == 1 { "" } else { "s" };
        out.info(&format!("Current streak: {} day{}", streak, plural));
    }
    Ok(())
}

pub fn remove_entry(
    store: &mut JsonStore,
    out: &OutputWriter,
    key: &str,
    date: Option<&str>,
    today: NaiveDate,
) -> Result<()> {
    let date = match date {
        Some(d) => parse_date(d)?,
        None => today,
    };
    store.remove_completion(key, date)?;
    let name = store.require(key)?.name.clone();
    out.success(&format!("Removed entry for '{}' on {}", name, date));
    Ok(())
}

pub fn edit_habit(
    store: &mut JsonStore,
    out: &OutputWriter,
    key: &str,
    name: Option<String>,
    color: Option<String>,
    target: Option<i64>,
) -> Result<()> {
    store.require(key)?;
    if name.is_none() && color.is_none() && target.is_none() {
        bail!(HabError::Validation(
            "nothing to update; pass --name, --color or --target".to_string()
        ));
    }

    let update = HabitUpdate {
        name,
        color: color.map(|c| c.parse()).transpose()?,
        target_per_day: target.map(normalize_target),
    };
    store.update_habit(key, update)?;

    let habit = store.require(key)?;
    out.success(&format!(
        "Updated '{}': {}, {}, target {}/day",
        key, habit.name, habit.color, habit.target_per_day
    ));
    Ok(())
}

pub fn delete_habit(
    store: &mut JsonStore,
    out: &OutputWriter,
    key: &str,
    force: bool,
) -> Result<()> {
    let habit = store.require(key)?;
    if !force {
        let question = format!(
            "Delete habit '{}' and its {} entries?",
            habit.name,
            habit.dates.len()
        );
        if !out.confirm(&question)? {
            out.info("Cancelled.");
            return Ok(());
        }
    }
    let removed = store.delete_habit(key)?;
    out.success(&format!("Deleted habit '{}'", removed.name));
    Ok(())
}

pub fn list_habits(store: &JsonStore, out: &OutputWriter, today: NaiveDate) -> Result<()> {
    let habits = store.list_habits();
    if habits.is_empty() && !out.is_json() {
        out.info("No habits yet. Create one with: hab new <name>");
        return Ok(());
    }
    let stats: Vec<HabitStats> = habits
        .iter()
        .map(|(key, habit)| HabitStats::compute(key, habit, today))
        .collect();
    out.habit_table(&stats);
    Ok(())
}

pub fn show_stats(
    store: &JsonStore,
    out: &OutputWriter,
    key: &str,
    today: NaiveDate,
) -> Result<()> {
    let stats = HabitStats::compute(key, store.require(key)?, today);
    if out.is_json() {
        out.emit(&stats);
        return Ok(());
    }

    out.section(&format!("Statistics for {}", stats.name));
    let mut rows = vec![
        ("Key", stats.key.clone()),
        ("Color", stats.color.clone()),
        ("Target", format!("{}/day", stats.target_per_day)),
        ("Total entries", stats.total_entries.to_string()),
        ("Unique days", stats.unique_days.to_string()),
        ("Current streak", format!("{} days", stats.current_streak)),
    ];
    if let Some(rate) = stats.completion_rate {
        rows.push((
            "Completion rate",
            format!(
                "{} ({}/{})",
                format_rate(rate),
                stats.total_entries,
                stats.expected_entries()
            ),
        ));
    }
    out.table(&rows);
    Ok(())
}

#[derive(Debug, Serialize)]
struct PruneReport {
    dry_run: bool,
    pruned: usize,
}

pub fn prune(
    store: &mut JsonStore,
    out: &OutputWriter,
    key: Option<&str>,
    dry_run: bool,
    force: bool,
) -> Result<()> {
    let keys: Vec<String> = match key {
        Some(key) => {
            store.require(key)?;
            vec![key.to_string()]
        }
        None => store.list_habits().into_keys().collect(),
    };
    if keys.is_empty() {
        out.info("No habits found to prune.");
        return Ok(());
    }

    let mut total = 0;
    for key in &keys {
        let habit = store.require(key)?;
        let plan = prune_plan(habit);
        if plan.is_empty() {
            continue;
        }
        let excess: usize = plan.iter().map(|e| e.excess).sum();

        out.section(&format!("{} (target: {} per day)", habit.name, habit.target_per_day));
        for entry in &plan {
            out.info(&format!(
                "  {}: {} entries -> {} entries (removing {})",
                entry.date,
                entry.count,
                entry.count - entry.excess,
                entry.excess
            ));
        }

        if dry_run {
            total += excess;
            continue;
        }
        if !force && !out.confirm(&format!("Remove {} excess entries?", excess))? {
            out.warning(&format!("Skipped '{}'", key));
            continue;
        }
        total += store.prune_habit(key)?;
    }

    if out.is_json() {
        out.emit(&PruneReport { dry_run, pruned: total });
    } else if dry_run {
        out.info(&format!("Dry run complete. Would prune {} total entries.", total));
    } else if total > 0 {
        out.success(&format!("Pruned {} total entries.", total));
    } else {
        out.info("No excess entries found to prune.");
    }
    Ok(())
}

/// Print the contribution grid without entering the interactive session
pub fn show_grid(
    store: &JsonStore,
    out: &OutputWriter,
    key: Option<&str>,
    timeline: Timeline,
    tier: RenderingTier,
    today: NaiveDate,
    width: u16,
) -> Result<()> {
    let habits = store.list_habits();
    let grid = build_grid(&habits, timeline, today);
    let weeks = grid.recent_weeks(weeks_that_fit(width).max(1));
    debug!("Showing {} of {} weeks", weeks.len(), grid.week_count());

    let selected: Vec<(usize, &String, &Habit)> = match key {
        Some(key) => {
            let (stored_key, habit) = habits
                .get_key_value(key)
                .ok_or_else(|| HabError::NotFound(key.to_string()))?;
            vec![(0, stored_key, habit)]
        }
        None => habits.iter().enumerate().map(|(i, (k, h))| (i + 1, k, h)).collect(),
    };

    if selected.is_empty() {
        out.info("No habits yet. Create one with: hab new <name>");
        return Ok(());
    }

    out.info(&format!("Activity Tracker ({})", timeline));
    for (number, _, habit) in selected {
        out.info("");
        out.habit_grid(habit, (number > 0).then_some(number), weeks, tier);
    }

    let legend = legend_text(tier);
    out.info("");
    out.info(&format!("{:>width$}", legend, width = grid_width(weeks.len())));
    Ok(())
}

/// Parse a `--timeline` value for clap
pub fn parse_timeline(value: &str) -> Result<Timeline, String> {
    value.parse().map_err(|e: HabError| e.to_string())
}
