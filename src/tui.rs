// TUI module - interactive contribution grid session
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use std::io;
use tracing::{debug, warn};

use crate::capability::RenderingTier;
use crate::error::HabError;
use crate::grid::{build_grid, Clock, Grid};
use crate::models::{Habit, Habits, Timeline};
use crate::render;
use crate::store::HabitRepository;

/// Which view is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every habit stacked
    Aggregate,
    /// One habit; today's completion can be logged here
    SingleHabit,
    /// Filterable habit list
    Picker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: Mode,
    pub selected: usize,
    pub timeline: Timeline,
    pub legend_visible: bool,
    pub help_visible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickerState {
    pub filter: String,
    pub editing: bool,
    /// Index into the filtered list
    pub highlighted: usize,
}

/// Result of handling one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Continue,
    Quit,
}

/// Session parameters chosen on the command line
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub timeline: Timeline,
    pub legend_visible: bool,
    pub debug: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeline: Timeline::TwelveMonths,
            legend_visible: true,
            debug: false,
        }
    }
}

/// App state for the TUI. Sole owner of the view state and the cached grid.
pub struct App {
    pub view: ViewState,
    pub picker: PickerState,
    pub habits: Habits,
    /// Habit ids in ascending order
    pub keys: Vec<String>,
    pub grid: Grid,
    pub tier: RenderingTier,
    pub debug: bool,
    pub status: Option<String>,
    store: Box<dyn HabitRepository>,
    clock: Box<dyn Clock>,
}

impl App {
    pub fn new(
        mut store: Box<dyn HabitRepository>,
        clock: Box<dyn Clock>,
        tier: RenderingTier,
        options: SessionOptions,
    ) -> Self {
        let (habits, status) = match store.load_habits() {
            Ok(habits) => (habits, None),
            Err(e) => {
                warn!("Starting with no habits: {}", e);
                (Habits::new(), Some(format!("Could not load habits: {}", e)))
            }
        };

        let grid = build_grid(&habits, options.timeline, clock.today());
        let keys = habits.keys().cloned().collect();

        Self {
            view: ViewState {
                mode: Mode::Aggregate,
                selected: 0,
                timeline: options.timeline,
                legend_visible: options.legend_visible,
                help_visible: false,
            },
            picker: PickerState::default(),
            habits,
            keys,
            grid,
            tier,
            debug: options.debug,
            status,
            store,
            clock,
        }
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.keys.get(self.view.selected).map(String::as_str)
    }

    pub fn selected_habit(&self) -> Option<&Habit> {
        self.selected_key().and_then(|key| self.habits.get(key))
    }

    /// Indices into `keys` of habits matching the picker filter
    pub fn filtered(&self) -> Vec<usize> {
        let needle = self.picker.filter.to_lowercase();
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, key)| {
                needle.is_empty()
                    || key.to_lowercase().contains(&needle)
                    || self
                        .habits
                        .get(key.as_str())
                        .is_some_and(|h| h.name.to_lowercase().contains(&needle))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Process one key event. A failed completion log returns `Err` and
    /// leaves the view state, habits and grid untouched.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Transition, HabError> {
        if key.kind != KeyEventKind::Press {
            return Ok(Transition::Continue);
        }
        self.status = None;

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Ok(Transition::Quit);
        }

        if self.view.mode == Mode::Picker && self.picker.editing {
            self.handle_filter_key(key);
            return Ok(Transition::Continue);
        }

        if let Some(timeline) = timeline_for(&key) {
            self.set_timeline(timeline);
            return Ok(Transition::Continue);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(Transition::Quit),
            KeyCode::Char('?') => {
                self.view.help_visible = !self.view.help_visible;
                return Ok(Transition::Continue);
            }
            KeyCode::Char('l') if !ctrl => {
                self.view.legend_visible = !self.view.legend_visible;
                return Ok(Transition::Continue);
            }
            _ => {}
        }

        match self.view.mode {
            Mode::Aggregate => self.handle_aggregate_key(key),
            Mode::SingleHabit => self.handle_single_key(key)?,
            Mode::Picker => self.handle_picker_key(key),
        }
        Ok(Transition::Continue)
    }

    fn handle_aggregate_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab => self.open_picker(),
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as u8 - b'1') as usize;
                if index < self.keys.len() {
                    self.view.selected = index;
                    self.set_mode(Mode::SingleHabit);
                }
            }
            _ => {}
        }
    }

    fn handle_single_key(&mut self, key: KeyEvent) -> Result<(), HabError> {
        let count = self.keys.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') if count > 0 => {
                self.view.selected = (self.view.selected + count - 1) % count;
            }
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                self.view.selected = (self.view.selected + 1) % count;
            }
            KeyCode::Tab => self.open_picker(),
            KeyCode::Char('a') | KeyCode::Esc => self.set_mode(Mode::Aggregate),
            KeyCode::Enter | KeyCode::Char(' ') => self.log_today()?,
            _ => {}
        }
        Ok(())
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        let visible = self.filtered().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') if visible > 0 => {
                self.picker.highlighted = (self.picker.highlighted + visible - 1) % visible;
            }
            KeyCode::Down | KeyCode::Char('j') if visible > 0 => {
                self.picker.highlighted = (self.picker.highlighted + 1) % visible;
            }
            KeyCode::Char('/') => self.picker.editing = true,
            KeyCode::Enter => self.confirm_picker(),
            KeyCode::Esc => {
                self.picker = PickerState::default();
                self.set_mode(Mode::Aggregate);
            }
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => {
                self.picker.filter.push(c);
                self.picker.highlighted = 0;
            }
            KeyCode::Backspace => {
                self.picker.filter.pop();
                self.picker.highlighted = 0;
            }
            KeyCode::Enter => self.picker.editing = false,
            KeyCode::Esc => {
                self.picker.filter.clear();
                self.picker.editing = false;
                self.picker.highlighted = self.view.selected.min(self.keys.len().saturating_sub(1));
            }
            _ => {}
        }
    }

    fn open_picker(&mut self) {
        self.picker = PickerState {
            filter: String::new(),
            editing: false,
            highlighted: self.view.selected.min(self.keys.len().saturating_sub(1)),
        };
        self.set_mode(Mode::Picker);
    }

    fn confirm_picker(&mut self) {
        let filtered = self.filtered();
        if let Some(&index) = filtered.get(self.picker.highlighted) {
            self.view.selected = index;
            self.picker = PickerState::default();
            self.set_mode(Mode::SingleHabit);
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        debug!("View mode {:?} -> {:?}", self.view.mode, mode);
        self.view.mode = mode;
    }

    /// Rebuild the grid for `timeline`. The new grid is fully built before it
    /// replaces the cached one.
    pub fn set_timeline(&mut self, timeline: Timeline) {
        let grid = build_grid(&self.habits, timeline, self.clock.today());
        self.view.timeline = timeline;
        self.grid = grid;
        debug!("Timeline set to {}", timeline);
    }

    /// Append today's date to the selected habit, then reload and rebuild
    pub fn log_today(&mut self) -> Result<(), HabError> {
        let Some(key) = self.selected_key().map(str::to_owned) else {
            return Ok(());
        };
        let today = self.clock.today();
        self.store.append_completion(&key, today)?;

        self.replace_habits(self.store.list_habits());
        let name = self
            .habits
            .get(&key)
            .map(|h| h.name.clone())
            .unwrap_or(key);
        self.status = Some(format!("Logged {} for {}", name, today));
        Ok(())
    }

    fn replace_habits(&mut self, habits: Habits) {
        let grid = build_grid(&habits, self.view.timeline, self.clock.today());
        self.keys = habits.keys().cloned().collect();
        self.habits = habits;
        self.grid = grid;
        if self.view.selected >= self.keys.len() {
            self.view.selected = self.keys.len().saturating_sub(1);
        }
    }

    pub fn report_error(&mut self, error: &HabError) {
        self.status = Some(format!("Error: {}", error));
    }
}

/// The three timeline bindings: Ctrl+3/F3, Ctrl+6/F6, Ctrl+Y/F12
fn timeline_for(key: &KeyEvent) -> Option<Timeline> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::F(3) => Some(Timeline::ThreeMonths),
        KeyCode::F(6) => Some(Timeline::SixMonths),
        KeyCode::F(12) => Some(Timeline::TwelveMonths),
        KeyCode::Char('3') if ctrl => Some(Timeline::ThreeMonths),
        KeyCode::Char('6') if ctrl => Some(Timeline::SixMonths),
        KeyCode::Char('y') if ctrl => Some(Timeline::TwelveMonths),
        _ => None,
    }
}

/// Run the TUI application
pub fn run(
    store: Box<dyn HabitRepository>,
    clock: Box<dyn Clock>,
    tier: RenderingTier,
    options: SessionOptions,
) -> Result<()> {
    let mut app = App::new(store, clock, tier, options);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| render::draw(f, app))?;

        // Blocks until the next event; one event is fully applied per frame
        if let Event::Key(key) = event::read()? {
            match app.handle_key(key) {
                Ok(Transition::Quit) => return Ok(()),
                Ok(Transition::Continue) => {}
                Err(e) => {
                    warn!("Could not log completion: {}", e);
                    app.report_error(&e);
                }
            }
        }
    }
}
