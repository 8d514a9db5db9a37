// Frame layout for the interactive session
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::capability::RenderingTier;
use crate::classify::{block_title, habit_rows, legend_text, CellColor, Slot};
use crate::grid::Week;
use crate::models::{Habit, HabitColor};
use crate::tui::{App, Mode};

/// Day label column ("S  ")
const LABEL_WIDTH: usize = 3;
/// Glyph plus two spaces of week separation
const CELL_WIDTH: usize = 3;

pub fn habit_color(color: HabitColor) -> Color {
    match color {
        HabitColor::Red => Color::Red,
        HabitColor::Blue => Color::Blue,
        HabitColor::Green => Color::Green,
        HabitColor::Magenta => Color::Magenta,
        HabitColor::Cyan => Color::Cyan,
        HabitColor::Yellow => Color::Yellow,
        HabitColor::Gray => Color::DarkGray,
    }
}

fn tint(color: CellColor) -> Color {
    match color {
        CellColor::Active(c) => habit_color(c),
        CellColor::Inactive => Color::DarkGray,
    }
}

/// Number of week columns that fit in `width` terminal cells
pub fn weeks_that_fit(width: u16) -> usize {
    // The last column has no trailing separator
    ((width as usize).saturating_sub(LABEL_WIDTH) + 2) / CELL_WIDTH
}

/// Rendered width of a grid block with `weeks` columns
pub fn grid_width(weeks: usize) -> usize {
    if weeks == 0 {
        LABEL_WIDTH
    } else {
        LABEL_WIDTH + weeks * CELL_WIDTH - 2
    }
}

pub fn title_line(app: &App) -> Line<'static> {
    let timeline = app.view.timeline.label();
    let text = match (app.view.mode, app.selected_habit()) {
        _ if app.keys.is_empty() => format!("Activity Tracker ({})", timeline),
        (Mode::Aggregate, _) => format!("Activity Tracker - All Activities ({})", timeline),
        (_, Some(habit)) => format!("Activity Tracker - {} ({})", habit.name, timeline),
        (_, None) => format!("Activity Tracker ({})", timeline),
    };
    Line::from(Span::styled(
        text,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

/// Title row plus seven day rows for one habit
pub fn habit_block(
    habit: &Habit,
    number: Option<usize>,
    weeks: &[Week],
    tier: RenderingTier,
) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(8);
    lines.push(Line::from(Span::styled(
        block_title(habit, number),
        Style::default()
            .fg(habit_color(habit.color))
            .add_modifier(Modifier::BOLD),
    )));

    for (label, slots) in habit_rows(habit, weeks, tier) {
        let mut spans = Vec::with_capacity(slots.len() * 2 + 1);
        spans.push(Span::raw(format!("{:<width$}", label, width = LABEL_WIDTH)));
        for (i, slot) in slots.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(match slot {
                Slot::Blank => Span::raw(" "),
                Slot::Glyph(glyph, color) => Span::styled(glyph, Style::default().fg(tint(color))),
            });
        }
        lines.push(Line::from(spans));
    }

    lines
}

/// `None  . - + #  Complete`, padded to end at the grid's right edge
pub fn legend_line(tier: RenderingTier, weeks: usize) -> Line<'static> {
    let text = legend_text(tier);
    let padding = grid_width(weeks).saturating_sub(text.chars().count());
    Line::from(vec![
        Span::raw(" ".repeat(padding)),
        Span::styled(text, Style::default().fg(Color::DarkGray)),
    ])
}

const FULL_HELP: [&str; 4] = [
    "↑/k move up     ↓/j move down    enter select/log     space log today",
    "tab habit list  a/esc all habits l toggle legend      / filter list",
    "ctrl+3/F3 3 months   ctrl+6/F6 6 months   ctrl+y/F12 12 months",
    "? toggle help   q quit           esc back             ctrl+c quit",
];

pub fn footer_lines(app: &App) -> Vec<Line<'static>> {
    let style = Style::default().fg(Color::DarkGray);
    if app.view.help_visible {
        return FULL_HELP
            .iter()
            .map(|line| Line::from(Span::styled(*line, style)))
            .collect();
    }

    let hints = match app.view.mode {
        Mode::Aggregate => {
            "tab habits • 1-9 open • ctrl+3/6/y timeline • l legend • ? help • q quit"
        }
        Mode::SingleHabit => {
            "↑/k ↓/j switch • enter/space log today • a all • tab habits • ? help • q quit"
        }
        Mode::Picker if app.picker.editing => {
            "type to filter • enter apply • esc clear • ctrl+c quit"
        }
        Mode::Picker => "enter select • / filter • esc back • ? help • q quit",
    };
    vec![Line::from(Span::styled(hints, style))]
}

/// Grid region for the aggregate and single-habit views
pub fn body_lines(app: &App, width: u16) -> Vec<Line<'static>> {
    let weeks = app.grid.recent_weeks(weeks_that_fit(width).max(1));
    let mut lines = Vec::new();

    if app.keys.is_empty() {
        lines.push(Line::from(Span::styled(
            "No habits yet. Create one with: hab new <name>",
            Style::default().fg(Color::DarkGray),
        )));
    } else if app.view.mode == Mode::Aggregate {
        for (i, key) in app.keys.iter().enumerate() {
            if let Some(habit) = app.habits.get(key) {
                if i > 0 {
                    lines.push(Line::default());
                }
                lines.extend(habit_block(habit, Some(i + 1), weeks, app.tier));
            }
        }
    } else if let Some(habit) = app.selected_habit() {
        lines.extend(habit_block(habit, None, weeks, app.tier));
    }

    if app.view.legend_visible {
        lines.push(Line::default());
        lines.push(legend_line(app.tier, weeks.len()));
    }

    lines
}

fn status_line(app: &App) -> Line<'static> {
    match &app.status {
        Some(message) if message.starts_with("Error") || message.starts_with("Could not") => {
            Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red)))
        }
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Green),
        )),
        None => Line::default(),
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    match app.view.mode {
        Mode::Picker => draw_picker(f, app, f.area()),
        _ => draw_grid_view(f, app, f.area()),
    }
}

fn draw_grid_view(f: &mut Frame, app: &App, area: Rect) {
    let mut title = vec![title_line(app)];
    if app.debug {
        title.push(Line::from(Span::styled(
            format!("Rendering Mode: {}", app.tier.name()),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let footer = footer_lines(app);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(title.len() as u16 + 1), // Title + gap
            Constraint::Min(3),                         // Grids
            Constraint::Length(1),                      // Status
            Constraint::Length(footer.len() as u16),    // Footer
        ])
        .split(area);

    f.render_widget(Paragraph::new(title), chunks[0]);
    f.render_widget(Paragraph::new(body_lines(app, chunks[1].width)), chunks[1]);
    f.render_widget(Paragraph::new(status_line(app)), chunks[2]);
    f.render_widget(Paragraph::new(footer), chunks[3]);
}

fn draw_picker(f: &mut Frame, app: &App, area: Rect) {
    let footer = footer_lines(app);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),                   // Title
            Constraint::Length(2),                   // Filter
            Constraint::Min(3),                      // List
            Constraint::Length(1),                   // Status
            Constraint::Length(footer.len() as u16), // Footer
        ])
        .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        "Select a Habit",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )));
    f.render_widget(title, chunks[0]);

    let cursor = if app.picker.editing { "_" } else { "" };
    let filter = Paragraph::new(Line::from(vec![
        Span::styled("Filter: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}{}", app.picker.filter, cursor)),
    ]));
    f.render_widget(filter, chunks[1]);

    let filtered = app.filtered();
    if filtered.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No habits match",
            Style::default().fg(Color::DarkGray),
        ));
        f.render_widget(empty, chunks[2]);
    } else {
        let items: Vec<ListItem> = filtered
            .iter()
            .filter_map(|&i| {
                let key = &app.keys[i];
                app.habits.get(key).map(|habit| picker_item(key, habit))
            })
            .collect();
        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(app.picker.highlighted.min(filtered.len() - 1)));
        f.render_stateful_widget(list, chunks[2], &mut state);
    }

    f.render_widget(Paragraph::new(status_line(app)), chunks[3]);
    f.render_widget(Paragraph::new(footer), chunks[4]);
}

fn picker_item(key: &str, habit: &Habit) -> ListItem<'static> {
    let description = format!(
        "Key: {} • Color: {} • Target: {}/day • Entries: {}",
        key,
        habit.color,
        habit.target_per_day,
        habit.dates.len()
    );
    ListItem::new(vec![
        Line::from(Span::styled(
            habit.name.clone(),
            Style::default().fg(habit_color(habit.color)),
        )),
        Line::from(Span::styled(description, Style::default().fg(Color::DarkGray))),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{build_grid, FixedClock};
    use crate::models::{Habits, Timeline};
    use crate::store::JsonStore;
    use crate::tui::SessionOptions;
    use chrono::{Duration, NaiveDate};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn screen(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn app_with(dir: &TempDir, habits: &[(&str, Habit)]) -> App {
        let mut store = JsonStore::open(dir.path().join("activities.json")).unwrap();
        for (key, habit) in habits {
            store.create_habit(key, habit.clone()).unwrap();
        }
        App::new(
            Box::new(store),
            Box::new(FixedClock(today())),
            RenderingTier::Minimal,
            SessionOptions::default(),
        )
    }

    #[test]
    fn test_width_helpers() {
        assert_eq!(grid_width(1), 4);
        assert_eq!(grid_width(53), 3 + 53 * 3 - 2);
        assert_eq!(weeks_that_fit(grid_width(20) as u16), 20);
        assert_eq!(weeks_that_fit(grid_width(20) as u16 + 2), 20);
        assert_eq!(weeks_that_fit(0), 0);
    }

    #[test]
    fn test_habit_block_rows() {
        let mut habit = Habit::new("Exercise", HabitColor::Green, 1);
        habit.dates = vec![today(), today() - Duration::days(1), today() - Duration::days(1)];
        let mut habits = Habits::new();
        habits.insert("exercise".to_string(), habit.clone());
        let grid = build_grid(&habits, Timeline::ThreeMonths, today());

        let lines = habit_block(&habit, Some(1), grid.recent_weeks(1), RenderingTier::Minimal);
        assert_eq!(lines.len(), 8);
        assert_eq!(text(&lines[0]), "[1] Exercise (3 activities)");
        // 2026-10-16 is a Friday; the last week runs Sun 11th .. Sat 17th
        assert_eq!(text(&lines[5]), "T  #");
        assert_eq!(text(&lines[6]), "F  #");
        assert_eq!(text(&lines[7]), "S   ");
        assert_eq!(text(&lines[1]), "S  .");
    }

    #[test]
    fn test_legend_right_aligned() {
        let line = legend_line(RenderingTier::Minimal, 20);
        let rendered = text(&line);
        assert_eq!(rendered.chars().count(), grid_width(20));
        assert!(rendered.ends_with("None  .  -  +  #  Complete"));

        // Narrow grids never pad negatively
        let line = legend_line(RenderingTier::Full, 1);
        assert_eq!(text(&line), "None  ○  ◐  ◑  ●  Complete");
    }

    #[test]
    fn test_title_reflects_mode_and_timeline() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&dir, &[("read", Habit::new("Read", HabitColor::Blue, 1))]);
        assert_eq!(
            text(&title_line(&app)),
            "Activity Tracker - All Activities (12 months)"
        );
        app.handle_key(KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE))
            .unwrap();
        app.set_timeline(Timeline::SixMonths);
        assert_eq!(text(&title_line(&app)), "Activity Tracker - Read (6 months)");
    }

    #[test]
    fn test_empty_state_renders() {
        let dir = TempDir::new().unwrap();
        let app = app_with(&dir, &[]);
        let out = screen(&app, 80, 20);
        assert!(out.contains("Activity Tracker (12 months)"));
        assert!(out.contains("No habits yet"));
    }

    #[test]
    fn test_narrow_terminal_keeps_recent_weeks() {
        let dir = TempDir::new().unwrap();
        let mut habit = Habit::new("Run", HabitColor::Red, 1);
        habit.dates = vec![today()];
        let app = app_with(&dir, &[("run", habit)]);

        let body = body_lines(&app, 20);
        let friday = body.iter().map(text).find(|l| l.starts_with("F  ")).unwrap();
        assert!(friday.ends_with('#'));
        assert!(friday.chars().count() <= 20);

        // Full draw at a tiny size must not panic
        let _ = screen(&app, 12, 6);
    }

    #[test]
    fn test_help_and_legend_toggle_output() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&dir, &[("run", Habit::new("Run", HabitColor::Red, 1))]);
        assert!(screen(&app, 200, 30).contains("Complete"));
        app.view.legend_visible = false;
        app.view.help_visible = true;
        let out = screen(&app, 200, 30);
        assert!(!out.contains("None  ."));
        assert!(out.contains("toggle legend"));
    }

    #[test]
    fn test_picker_screen() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(
            &dir,
            &[
                ("read", Habit::new("Read", HabitColor::Blue, 1)),
                ("water", Habit::new("Drink Water", HabitColor::Cyan, 8)),
            ],
        );
        app.handle_key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE))
            .unwrap();
        let out = screen(&app, 80, 20);
        assert!(out.contains("Select a Habit"));
        assert!(out.contains("Drink Water"));
        assert!(out.contains("Target: 8/day"));
    }
}
