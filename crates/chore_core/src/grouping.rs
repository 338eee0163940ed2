use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::due::Tone;
use crate::task::{RecordId, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    #[default]
    DueDate,
    Priority,
    Labels,
}

impl GroupingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DueDate => "due_date",
            Self::Priority => "priority",
            Self::Labels => "labels",
        }
    }
}

impl fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "due_date" => Ok(Self::DueDate),
            "priority" => Ok(Self::Priority),
            "labels" => Ok(Self::Labels),
            other => Err(anyhow::anyhow!("unknown grouping mode `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskGroup<T = Task> {
    pub key: String,
    pub name: String,
    pub color: Option<Tone>,
    pub content: Vec<T>,
}

impl<T> TaskGroup<T> {
    fn empty(key: impl Into<String>, name: impl Into<String>, color: Option<Tone>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            color,
            content: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> TaskGroup<U> {
        TaskGroup {
            key: self.key,
            name: self.name,
            color: self.color,
            content: self.content.into_iter().map(f).collect(),
        }
    }
}

// Declared in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueBucket {
    Overdue,
    Today,
    InAWeek,
    ThisMonth,
    Later,
    Anytime,
}

impl DueBucket {
    pub const ALL: [DueBucket; 6] = [
        DueBucket::Overdue,
        DueBucket::Today,
        DueBucket::InAWeek,
        DueBucket::ThisMonth,
        DueBucket::Later,
        DueBucket::Anytime,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Today => "today",
            Self::InAWeek => "in_a_week",
            Self::ThisMonth => "this_month",
            Self::Later => "later",
            Self::Anytime => "anytime",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Overdue => "Overdue",
            Self::Today => "Today",
            Self::InAWeek => "In a week",
            Self::ThisMonth => "This month",
            Self::Later => "Later",
            Self::Anytime => "Anytime",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            Self::Overdue => Tone::Danger,
            Self::Today => Tone::Warning,
            Self::InAWeek => Tone::Info,
            Self::ThisMonth => Tone::Primary,
            Self::Later => Tone::Neutral,
            Self::Anytime => Tone::Success,
        }
    }

    pub fn for_task(task: &Task, now: DateTime<FixedOffset>) -> Self {
        let Some(due) = task.next_due_date else {
            return Self::Anytime;
        };
        let due = due.resolve(now.offset());
        if due < now {
            Self::Overdue
        } else if due.date_naive() == now.date_naive() {
            Self::Today
        } else if due < now + Duration::days(7) {
            Self::InAWeek
        } else if due.year() == now.year() && due.month() == now.month() {
            Self::ThisMonth
        } else {
            Self::Later
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

const PRIORITY_GROUPS: [(&str, &str, Tone); 5] = [
    ("priority_1", "Priority 1", Tone::Danger),
    ("priority_2", "Priority 2", Tone::Warning),
    ("priority_3", "Priority 3", Tone::Info),
    ("priority_4", "Priority 4", Tone::Primary),
    ("no_priority", "No Priority", Tone::Neutral),
];

/// Canonical task order: priority ascending with unset last, then due date ascending with
/// undated last. Bare dates end their day in UTC.
pub fn compare(a: &Task, b: &Task) -> Ordering {
    compare_in(a, b, &Utc.fix())
}

pub fn compare_in(a: &Task, b: &Task, offset: &FixedOffset) -> Ordering {
    let priority_key = |task: &Task| (!task.priority.is_set(), task.priority.0);
    let due_key = |task: &Task| {
        let due = task.next_due_date.map(|due| due.resolve(offset));
        (due.is_none(), due)
    };
    priority_key(a)
        .cmp(&priority_key(b))
        .then_with(|| due_key(a).cmp(&due_key(b)))
}

pub fn sorted(tasks: &[Task]) -> Vec<Task> {
    sorted_in(tasks, &Utc.fix())
}

fn sorted_in(tasks: &[Task], offset: &FixedOffset) -> Vec<Task> {
    let mut ordered = tasks.to_vec();
    ordered.sort_by(|a, b| compare_in(a, b, offset));
    ordered
}

pub fn group(tasks: &[Task], mode: GroupingMode, now: DateTime<FixedOffset>) -> Vec<TaskGroup> {
    let ordered = sorted_in(tasks, now.offset());
    match mode {
        GroupingMode::DueDate => group_by_due_date(ordered, now),
        GroupingMode::Priority => group_by_priority(ordered),
        GroupingMode::Labels => group_by_labels(ordered),
    }
}

fn group_by_due_date(ordered: Vec<Task>, now: DateTime<FixedOffset>) -> Vec<TaskGroup> {
    let mut groups: Vec<TaskGroup> = DueBucket::ALL
        .iter()
        .map(|bucket| TaskGroup::empty(bucket.key(), bucket.name(), Some(bucket.tone())))
        .collect();
    for task in ordered {
        let bucket = DueBucket::for_task(&task, now);
        groups[bucket.index()].content.push(task);
    }
    groups
}

fn group_by_priority(ordered: Vec<Task>) -> Vec<TaskGroup> {
    let mut groups: Vec<TaskGroup> = PRIORITY_GROUPS
        .iter()
        .map(|(key, name, tone)| TaskGroup::empty(*key, *name, Some(*tone)))
        .collect();
    let no_priority = groups.len() - 1;
    for task in ordered {
        let slot = match task.priority.0 {
            p @ 1..=4 => (p - 1) as usize,
            _ => no_priority,
        };
        groups[slot].content.push(task);
    }
    groups
}

fn group_by_labels(ordered: Vec<Task>) -> Vec<TaskGroup> {
    let mut groups: Vec<TaskGroup> = Vec::new();
    let mut slots: HashMap<RecordId, usize> = HashMap::new();
    for task in ordered {
        for label in &task.labels {
            let slot = *slots.entry(label.id.clone()).or_insert_with(|| {
                groups.push(TaskGroup::empty(label.id.as_str(), label.name.clone(), None));
                groups.len() - 1
            });
            groups[slot].content.push(task.clone());
        }
    }
    groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));
    groups
}
