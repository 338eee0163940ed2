use std::fmt;

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Timelike, Utc,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TaskError;
use crate::recurrence::{strip_leading_emoji, Recurrence};

// The backend sends numbers, fixtures sometimes send strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct RecordId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for RecordId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        }
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub id: RecordId,
    pub name: String,
}

/// When a task is due. Bare dates stay unresolved until a viewer offset is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DueDate {
    At(DateTime<FixedOffset>),
    OnDay(NaiveDate),
}

const DAY_END_SECONDS: i64 = 23 * 3_600 + 59 * 60 + 59;

impl DueDate {
    /// The due instant seen from `offset`; bare dates land on 23:59:59 local.
    pub fn resolve(self, offset: &FixedOffset) -> DateTime<FixedOffset> {
        match self {
            Self::At(at) => at.with_timezone(offset),
            Self::OnDay(day) => {
                let local = day.and_time(NaiveTime::default()) + Duration::seconds(DAY_END_SECONDS);
                let utc = local - Duration::seconds(offset.local_minus_utc().into());
                offset.from_utc_datetime(&utc)
            }
        }
    }

    // hh:59:59 in the offset the timestamp was written in marks a date without a time.
    pub fn is_date_only(self) -> bool {
        match self {
            Self::At(at) => at.minute() == 59 && at.second() == 59,
            Self::OnDay(_) => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i64);

impl Priority {
    pub const NONE: Priority = Priority(0);

    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub name: String,
    pub next_due_date: Option<DueDate>,
    pub priority: Priority,
    pub recurrence: Recurrence,
    pub labels: Vec<Label>,
}

impl Task {
    pub fn clean_name(&self) -> &str {
        strip_leading_emoji(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub next_due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    pub frequency_type: String,
    #[serde(default)]
    pub frequency_metadata: Option<Value>,
    #[serde(default)]
    pub frequency: Option<u32>,
    #[serde(default, rename = "labelsV2")]
    pub labels_v2: Option<Vec<Label>>,
}

impl TryFrom<RawTask> for Task {
    type Error = TaskError;

    fn try_from(raw: RawTask) -> Result<Self, Self::Error> {
        let metadata =
            FrequencyMetadata::normalize(raw.id.as_str(), raw.frequency_metadata.as_ref())?;
        let recurrence =
            Recurrence::from_parts(&raw.frequency_type, raw.frequency.unwrap_or(1), metadata)?;
        let next_due_date = raw
            .next_due_date
            .as_deref()
            .map(parse_due_date)
            .transpose()?;

        Ok(Task {
            id: raw.id,
            name: raw.name,
            next_due_date,
            priority: Priority(raw.priority.unwrap_or_default()),
            recurrence,
            labels: raw.labels_v2.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrequencyMetadata {
    #[serde(default)]
    pub days: Option<Vec<String>>,
    #[serde(default)]
    pub months: Option<Vec<String>>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl FrequencyMetadata {
    // Metadata arrives either as a JSON object or as a JSON-encoded string of one.
    pub fn normalize(task: &str, raw: Option<&Value>) -> Result<Self, TaskError> {
        let invalid = |source: serde_json::Error| TaskError::InvalidMetadata {
            task: task.to_string(),
            source,
        };
        match raw {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::String(encoded)) => {
                if encoded.trim().is_empty() {
                    return Ok(Self::default());
                }
                let decoded: Value = serde_json::from_str(encoded).map_err(invalid)?;
                if decoded.is_null() {
                    return Ok(Self::default());
                }
                serde_json::from_value(decoded).map_err(invalid)
            }
            Some(value) => serde_json::from_value(value.clone()).map_err(invalid),
        }
    }
}

fn parse_due_date(raw: &str) -> Result<DueDate, TaskError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(DueDate::At(parsed));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(DueDate::At(Utc.fix().from_utc_datetime(&naive)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(DueDate::OnDay(date));
    }
    Err(TaskError::InvalidDueDate(raw.to_string()))
}

pub fn parse_task(value: Value) -> Result<Task, TaskError> {
    let raw: RawTask = serde_json::from_value(value)?;
    Task::try_from(raw)
}

// Accepts an array of records or a single record; stops at the first bad one.
pub fn parse_tasks(json: &str) -> Result<Vec<Task>, TaskError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(entries) => entries.into_iter().map(parse_task).collect(),
        single => Ok(vec![parse_task(single)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_metadata_as_object_or_encoded_string() {
        let object = parse_task(json!({
            "id": 1,
            "name": "Water plants",
            "frequencyType": "days_of_the_week",
            "frequencyMetadata": { "days": ["monday", "thursday"] },
        }))
        .expect("object metadata");
        let encoded = parse_task(json!({
            "id": 1,
            "name": "Water plants",
            "frequencyType": "days_of_the_week",
            "frequencyMetadata": "{\"days\":[\"monday\",\"thursday\"]}",
        }))
        .expect("string metadata");
        assert_eq!(object.recurrence, encoded.recurrence);
    }

    #[test]
    fn malformed_metadata_string_is_an_error() {
        let err = parse_task(json!({
            "id": 7,
            "name": "Broken",
            "frequencyType": "interval",
            "frequencyMetadata": "{\"unit\": ",
        }))
        .unwrap_err();
        assert!(matches!(err, TaskError::InvalidMetadata { ref task, .. } if task == "7"));
    }

    #[test]
    fn null_due_date_and_defaults() {
        let task = parse_task(json!({
            "id": "abc",
            "name": "Someday",
            "nextDueDate": null,
            "frequencyType": "once",
            "labelsV2": null,
        }))
        .expect("task");
        assert!(task.next_due_date.is_none());
        assert_eq!(task.priority, Priority::NONE);
        assert!(task.labels.is_empty());
        assert_eq!(task.id.as_str(), "abc");
    }

    #[test]
    fn parses_due_date_forms() {
        let with_offset = parse_due_date("2025-10-24T18:00:00+02:00").unwrap();
        let DueDate::At(at) = with_offset else {
            panic!("expected a timestamp, got {with_offset:?}");
        };
        assert_eq!(at.to_rfc3339(), "2025-10-24T18:00:00+02:00");
        assert!(!with_offset.is_date_only());

        let naive = parse_due_date("2025-10-24T23:59:59").unwrap();
        assert!(naive.is_date_only());

        let date_only = parse_due_date("2999-01-01").unwrap();
        assert_eq!(
            date_only,
            DueDate::OnDay(NaiveDate::from_ymd_opt(2999, 1, 1).unwrap())
        );
        assert!(date_only.is_date_only());

        assert!(matches!(
            parse_due_date("next tuesday"),
            Err(TaskError::InvalidDueDate(_))
        ));
    }

    #[test]
    fn bare_dates_resolve_to_end_of_day_in_the_viewer_offset() {
        let day = DueDate::OnDay(NaiveDate::from_ymd_opt(2025, 10, 24).unwrap());
        for (offset_seconds, expected) in [
            (0, "2025-10-24T23:59:59+00:00"),
            (2 * 3600, "2025-10-24T23:59:59+02:00"),
            (5 * 3600 + 1800, "2025-10-24T23:59:59+05:30"),
            (-7 * 3600, "2025-10-24T23:59:59-07:00"),
        ] {
            let offset = FixedOffset::east_opt(offset_seconds).unwrap();
            assert_eq!(day.resolve(&offset).to_rfc3339(), expected);
        }
    }

    #[test]
    fn parse_tasks_is_fail_fast() {
        let json = r#"[
            {"id": 1, "name": "Ok", "frequencyType": "daily"},
            {"id": 2, "name": "Bad", "frequencyType": "daily", "nextDueDate": "soon"}
        ]"#;
        assert!(matches!(
            parse_tasks(json),
            Err(TaskError::InvalidDueDate(ref value)) if value == "soon"
        ));
    }

    #[test]
    fn keeps_label_order_and_ignores_extra_fields() {
        let task = parse_task(json!({
            "id": 3,
            "name": "Laundry",
            "frequencyType": "weekly",
            "priority": 2,
            "labelsV2": [
                {"id": 9, "name": "home", "color": "#fff"},
                {"id": 4, "name": "chores"}
            ],
        }))
        .expect("task");
        let names: Vec<&str> = task.labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["home", "chores"]);
        assert_eq!(task.labels[0].id, RecordId::from(9));
        assert_eq!(task.priority, Priority(2));
    }
}
