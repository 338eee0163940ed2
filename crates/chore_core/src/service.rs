use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use parking_lot::RwLock;
use serde::Serialize;
use walkdir::WalkDir;

use crate::{
    clock::{Clock, SystemClock},
    due::{describe_due_date, DueDescription},
    grouping::{self, GroupingMode, TaskGroup},
    recurrence::describe_recurrence,
    task::{self, DueDate, Priority, RecordId, Task},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: RecordId,
    pub name: String,
    pub clean_name: String,
    pub recurrence: String,
    pub frequency_type: String,
    pub next_due_date: Option<DueDate>,
    pub due: DueDescription,
    pub priority: Priority,
    pub labels: Vec<String>,
}

impl TaskView {
    pub fn from_task(task: &Task, now: DateTime<FixedOffset>) -> Self {
        Self {
            id: task.id.clone(),
            name: task.name.clone(),
            clean_name: task.clean_name().to_string(),
            recurrence: describe_recurrence(task),
            frequency_type: task.recurrence.frequency_type().to_string(),
            next_due_date: task.next_due_date,
            due: describe_due_date(task.next_due_date, now),
            priority: task.priority,
            labels: task.labels.iter().map(|label| label.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub mode: GroupingMode,
    pub generated_at: DateTime<FixedOffset>,
    pub task_count: usize,
    pub groups: Vec<TaskGroup<TaskView>>,
}

pub struct ChoreBoard {
    sources: Vec<PathBuf>,
    tasks: RwLock<HashMap<PathBuf, Vec<Task>>>,
    clock: Box<dyn Clock>,
}

pub struct ChoreBoardBuilder {
    sources: Vec<PathBuf>,
    clock: Option<Box<dyn Clock>>,
}

impl Default for ChoreBoardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChoreBoardBuilder {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            clock: None,
        }
    }

    // A `.json` file or a directory searched recursively for them.
    pub fn add_source(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if !self.sources.contains(&path) {
            self.sources.push(path);
        }
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<ChoreBoard> {
        let board = ChoreBoard {
            sources: self.sources,
            tasks: RwLock::new(HashMap::new()),
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
        };
        board.reload_all()?;
        Ok(board)
    }
}

impl ChoreBoard {
    pub fn builder() -> ChoreBoardBuilder {
        ChoreBoardBuilder::new()
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    // Nothing is cached or recorded unless every file under `path` loads.
    pub fn add_source(&mut self, path: PathBuf) -> Result<()> {
        if self.sources.contains(&path) {
            return Ok(());
        }
        let mut fresh = HashMap::new();
        Self::ingest_source(&mut fresh, &path)?;
        tracing::info!(path = %path.display(), files = fresh.len(), "task source added");
        self.tasks.write().extend(fresh);
        self.sources.push(path);
        Ok(())
    }

    // On failure the previous cache is kept.
    pub fn reload_all(&self) -> Result<()> {
        let mut fresh = HashMap::new();
        for source in &self.sources {
            Self::ingest_source(&mut fresh, source)?;
        }
        let count: usize = fresh.values().map(Vec::len).sum();
        *self.tasks.write() = fresh;
        tracing::info!(sources = self.sources.len(), tasks = count, "chore board loaded");
        Ok(())
    }

    pub fn list_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.tasks.read().keys().cloned().collect();
        files.sort();
        files
    }

    pub fn tasks(&self) -> Vec<Task> {
        let tasks = self.tasks.read();
        let mut files: Vec<&PathBuf> = tasks.keys().collect();
        files.sort();
        files
            .into_iter()
            .flat_map(|file| tasks[file].iter().cloned())
            .collect()
    }

    // First match in `tasks()` order, so duplicate ids resolve to the earliest file.
    pub fn find_task(&self, id: &RecordId) -> Option<Task> {
        self.tasks().into_iter().find(|task| &task.id == id)
    }

    pub fn group(&self, mode: GroupingMode) -> Vec<TaskGroup> {
        grouping::group(&self.tasks(), mode, self.now())
    }

    pub fn snapshot(&self, mode: GroupingMode) -> BoardSnapshot {
        let now = self.now();
        let tasks = self.tasks();
        let groups = grouping::group(&tasks, mode, now)
            .into_iter()
            .map(|group| group.map(|task| TaskView::from_task(&task, now)))
            .collect();
        BoardSnapshot {
            mode,
            generated_at: now,
            task_count: tasks.len(),
            groups,
        }
    }
}

impl ChoreBoard {
    fn ingest_source(tasks: &mut HashMap<PathBuf, Vec<Task>>, path: &Path) -> Result<()> {
        if path.is_file() {
            if Self::is_json_file(path) {
                tasks.insert(path.to_path_buf(), Self::load_file(path)?);
            }
            return Ok(());
        }

        if path.is_dir() {
            for entry in WalkDir::new(path) {
                let entry = entry?;
                let entry_path = entry.path();
                if entry.file_type().is_file() && Self::is_json_file(entry_path) {
                    tasks.insert(entry_path.to_path_buf(), Self::load_file(entry_path)?);
                }
            }
            return Ok(());
        }

        tracing::warn!(path = %path.display(), "task source does not exist");
        Ok(())
    }

    fn load_file(path: &Path) -> Result<Vec<Task>> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading tasks from {}", path.display()))?;
        let tasks = task::parse_tasks(&raw)
            .with_context(|| format!("parsing tasks from {}", path.display()))?;
        tracing::debug!(path = %path.display(), count = tasks.len(), "loaded task file");
        Ok(tasks)
    }

    fn is_json_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}
