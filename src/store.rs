// Habit persistence: a single pretty-printed JSON file
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::HabError;
use crate::models::{Habit, HabitColor, Habits};

/// Root of the data file: `{"activities": {"<id>": {...}}}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ActivitiesData {
    #[serde(default)]
    activities: Habits,
}

/// What the grid engine and the interactive session need from storage
pub trait HabitRepository {
    /// Read the store from its backing medium, creating an empty one on first use
    fn load_habits(&mut self) -> Result<Habits, HabError>;

    /// Append one completion for `id` on `date`
    fn append_completion(&mut self, id: &str, date: NaiveDate) -> Result<(), HabError>;

    /// Remove the first completion for `id` on `date`
    fn remove_completion(&mut self, id: &str, date: NaiveDate) -> Result<(), HabError>;

    /// Snapshot of the habits currently held
    fn list_habits(&self) -> Habits;
}

/// Partial metadata update; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub color: Option<HabitColor>,
    pub target_per_day: Option<u32>,
}

/// JSON-file backed store
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    data: ActivitiesData,
}

impl JsonStore {
    /// Create a store for `path` without touching the file system
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: ActivitiesData::default(),
        }
    }

    /// Create and load in one step
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HabError> {
        let mut store = Self::new(path);
        store.load_habits()?;
        Ok(store)
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, id: &str) -> Option<&Habit> {
        self.data.activities.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&Habit, HabError> {
        self.get(id).ok_or_else(|| HabError::NotFound(id.to_string()))
    }

    pub fn create_habit(&mut self, id: &str, habit: Habit) -> Result<(), HabError> {
        if self.data.activities.contains_key(id) {
            return Err(HabError::AlreadyExists(id.to_string()));
        }
        self.commit(|data| {
            data.activities.insert(id.to_string(), habit);
            Ok(())
        })?;
        info!("Created habit '{}'", id);
        Ok(())
    }

    pub fn update_habit(&mut self, id: &str, update: HabitUpdate) -> Result<(), HabError> {
        self.commit(|data| {
            let habit = data
                .activities
                .get_mut(id)
                .ok_or_else(|| HabError::NotFound(id.to_string()))?;
            if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
                habit.name = name;
            }
            if let Some(color) = update.color {
                habit.color = color;
            }
            if let Some(target) = update.target_per_day.filter(|t| *t > 0) {
                habit.target_per_day = target;
            }
            Ok(())
        })?;
        info!("Updated habit '{}'", id);
        Ok(())
    }

    pub fn delete_habit(&mut self, id: &str) -> Result<Habit, HabError> {
        let removed = self.require(id)?.clone();
        self.commit(|data| {
            data.activities.remove(id);
            Ok(())
        })?;
        info!("Deleted habit '{}'", id);
        Ok(removed)
    }

    /// Drop entries beyond the daily target, keeping the earliest-logged ones.
    /// Returns the number of entries removed.
    pub fn prune_habit(&mut self, id: &str) -> Result<usize, HabError> {
        let mut removed = 0;
        self.commit(|data| {
            let habit = data
                .activities
                .get_mut(id)
                .ok_or_else(|| HabError::NotFound(id.to_string()))?;
            let target = habit.target_per_day.max(1) as usize;
            let mut seen: BTreeMap<NaiveDate, usize> = BTreeMap::new();
            let before = habit.dates.len();
            habit.dates.retain(|date| {
                let count = seen.entry(*date).or_insert(0);
                *count += 1;
                *count <= target
            });
            removed = before - habit.dates.len();
            Ok(())
        })?;
        if removed > 0 {
            info!("Pruned {} entries from '{}'", removed, id);
        }
        Ok(removed)
    }

    /// Apply `mutate` to a copy of the data and persist it. The in-memory
    /// state only changes once the write has succeeded.
    fn commit<F>(&mut self, mutate: F) -> Result<(), HabError>
    where
        F: FnOnce(&mut ActivitiesData) -> Result<(), HabError>,
    {
        let mut next = self.data.clone();
        mutate(&mut next)?;
        self.write(&next)?;
        self.data = next;
        Ok(())
    }

    /// Write through a temp file in the same directory, then rename it over
    /// the data file so readers never see a partial file
    fn write(&self, data: &ActivitiesData) -> Result<(), HabError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| HabError::io(parent, e))?;
                parent
            }
            None => Path::new("."),
        };

        let json =
            serde_json::to_string_pretty(data).map_err(|e| HabError::format(&self.path, e))?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| HabError::io(dir, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| HabError::io(tmp.path(), e))?;
        // A failed persist drops the temp file, which removes it
        tmp.persist(&self.path)
            .map_err(|e| HabError::io(&self.path, e.error))?;

        debug!("Saved {} habits to {}", data.activities.len(), self.path.display());
        Ok(())
    }
}

impl HabitRepository for JsonStore {
    fn load_habits(&mut self) -> Result<Habits, HabError> {
        if !self.path.exists() {
            let empty = ActivitiesData::default();
            self.write(&empty)?;
            self.data = empty;
            info!("Created empty data file at {}", self.path.display());
            return Ok(Habits::new());
        }

        let bytes = fs::read(&self.path).map_err(|e| HabError::io(&self.path, e))?;
        let data: ActivitiesData =
            serde_json::from_slice(&bytes).map_err(|e| HabError::format(&self.path, e))?;
        debug!("Loaded {} habits from {}", data.activities.len(), self.path.display());
        self.data = data;
        Ok(self.data.activities.clone())
    }

    fn append_completion(&mut self, id: &str, date: NaiveDate) -> Result<(), HabError> {
        self.commit(|data| {
            data.activities
                .get_mut(id)
                .ok_or_else(|| HabError::NotFound(id.to_string()))?
                .dates
                .push(date);
            Ok(())
        })?;
        info!("Logged '{}' on {}", id, date);
        Ok(())
    }

    fn remove_completion(&mut self, id: &str, date: NaiveDate) -> Result<(), HabError> {
        self.commit(|data| {
            let habit = data
                .activities
                .get_mut(id)
                .ok_or_else(|| HabError::NotFound(id.to_string()))?;
            let pos = habit
                .dates
                .iter()
                .position(|d| *d == date)
                .ok_or_else(|| HabError::EntryNotFound {
                    id: id.to_string(),
                    date,
                })?;
            habit.dates.remove(pos);
            Ok(())
        })?;
        info!("Removed '{}' entry on {}", id, date);
        Ok(())
    }

    fn list_habits(&self) -> Habits {
        self.data.activities.clone()
    }
}
