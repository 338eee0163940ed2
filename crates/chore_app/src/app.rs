use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chore_core::{BoardSnapshot, ChoreBoard, FixedClock, GroupingMode};
use chrono::{DateTime, FixedOffset};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub(crate) sources: Vec<PathBuf>,
    pub(crate) group_by: GroupingMode,
    pub(crate) hide_empty: bool,
    pub(crate) now: Option<DateTime<FixedOffset>>,
    pub(crate) output: OutputFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(source) = lookup("CHORE_TASKS") {
            config.push_source(PathBuf::from(source));
        }
        if let Some(list) = lookup("CHORE_TASK_PATHS") {
            for path in std::env::split_paths(&list) {
                config.push_source(path);
            }
        }
        if let Some(mode) = lookup("CHORE_GROUP_BY") {
            match mode.parse::<GroupingMode>() {
                Ok(mode) => config.group_by = mode,
                Err(err) => warn!(%err, "ignoring CHORE_GROUP_BY"),
            }
        }
        if let Some(flag) = lookup("CHORE_HIDE_EMPTY") {
            config.hide_empty = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
        if let Some(now) = lookup("CHORE_NOW") {
            match DateTime::parse_from_rfc3339(now.trim()) {
                Ok(now) => config.now = Some(now),
                Err(err) => warn!(%err, value = %now, "ignoring CHORE_NOW"),
            }
        }
        if let Some(output) = lookup("CHORE_OUTPUT") {
            match output.trim().to_ascii_lowercase().as_str() {
                "json" => config.output = OutputFormat::Json,
                "text" => config.output = OutputFormat::Text,
                other => warn!(value = other, "ignoring CHORE_OUTPUT"),
            }
        }
        config
    }

    pub(crate) fn push_source(&mut self, path: PathBuf) {
        if !self.sources.contains(&path) {
            info!(path = %path.display(), "registering task source");
            self.sources.push(path);
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let mut builder = ChoreBoard::builder();
    for source in &config.sources {
        builder = builder.add_source(source);
    }
    if let Some(now) = config.now {
        builder = builder.with_clock(Box::new(FixedClock(now)));
    }
    let board = builder.build().context("loading chore board")?;
    let snapshot = board.snapshot(config.group_by);

    let rendered = match config.output {
        OutputFormat::Text => render_text(&snapshot, config.hide_empty),
        OutputFormat::Json => serde_json::to_string_pretty(&snapshot)?,
    };
    println!("{}", rendered);
    Ok(())
}

pub fn render_text(snapshot: &BoardSnapshot, hide_empty: bool) -> String {
    let mut out = String::new();
    for group in &snapshot.groups {
        if hide_empty && group.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{} ({})", group.name, group.content.len());
        for view in &group.content {
            let recurrence = view.recurrence.replace('\n', " ");
            let _ = writeln!(
                out,
                "  - {} · {} · {}",
                view.clean_name, recurrence, view.due.text
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn reads_settings_from_environment() {
        let config = config_from(&[
            ("CHORE_TASKS", "/tmp/tasks.json"),
            ("CHORE_GROUP_BY", "labels"),
            ("CHORE_HIDE_EMPTY", "yes"),
            ("CHORE_NOW", "2025-10-24T10:00:00+02:00"),
            ("CHORE_OUTPUT", "json"),
        ]);
        assert_eq!(config.sources, vec![PathBuf::from("/tmp/tasks.json")]);
        assert_eq!(config.group_by, GroupingMode::Labels);
        assert!(config.hide_empty);
        assert_eq!(
            config.now.map(|now| now.to_rfc3339()),
            Some("2025-10-24T10:00:00+02:00".to_string())
        );
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[("CHORE_GROUP_BY", "assignee"), ("CHORE_NOW", "soon")]);
        assert_eq!(config.group_by, GroupingMode::DueDate);
        assert!(config.now.is_none());
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn text_output_can_hide_empty_groups() {
        let now = DateTime::parse_from_rfc3339("2025-10-24T10:00:00+00:00").unwrap();
        let board = ChoreBoard::builder()
            .with_clock(Box::new(FixedClock(now)))
            .build()
            .unwrap();
        let snapshot = board.snapshot(GroupingMode::Priority);
        assert_eq!(render_text(&snapshot, true), "");
        assert!(render_text(&snapshot, false).starts_with("Priority 1 (0)\n"));
    }
}
