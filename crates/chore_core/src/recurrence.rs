use chrono::{Month, Weekday};
use serde::Serialize;
use unicode_properties::UnicodeEmoji;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::TaskError;
use crate::task::{FrequencyMetadata, Task};

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const ALL_MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recurrence {
    Once,
    Trigger,
    Daily,
    Adaptive,
    Weekly,
    Monthly,
    Yearly,
    DaysOfTheWeek {
        days: Vec<Weekday>,
    },
    DayOfTheMonth {
        day: u32,
        // `None` when the record carried no month list.
        months: Option<Vec<Month>>,
    },
    Interval {
        every: u32,
        unit: String,
    },
    Unknown {
        raw: String,
    },
}

impl Recurrence {
    pub fn from_parts(
        frequency_type: &str,
        frequency: u32,
        metadata: FrequencyMetadata,
    ) -> Result<Self, TaskError> {
        let missing = |field: &'static str| TaskError::MissingMetadata {
            frequency_type: frequency_type.to_string(),
            field,
        };

        let recurrence = match frequency_type {
            "once" => Self::Once,
            "trigger" => Self::Trigger,
            "daily" => Self::Daily,
            "adaptive" => Self::Adaptive,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            "yearly" => Self::Yearly,
            "days_of_the_week" => {
                let days = metadata.days.ok_or_else(|| missing("days"))?;
                Self::DaysOfTheWeek {
                    days: days
                        .iter()
                        .map(|day| parse_weekday(day))
                        .collect::<Result<_, _>>()?,
                }
            }
            "day_of_the_month" => Self::DayOfTheMonth {
                day: frequency,
                months: metadata
                    .months
                    .map(|months| {
                        months
                            .iter()
                            .map(|month| parse_month(month))
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .transpose()?,
            },
            "interval" => Self::Interval {
                every: frequency,
                unit: metadata.unit.ok_or_else(|| missing("unit"))?,
            },
            other => Self::Unknown {
                raw: other.to_string(),
            },
        };
        Ok(recurrence)
    }

    pub fn frequency_type(&self) -> &str {
        match self {
            Self::Once => "once",
            Self::Trigger => "trigger",
            Self::Daily => "daily",
            Self::Adaptive => "adaptive",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::DaysOfTheWeek { .. } => "days_of_the_week",
            Self::DayOfTheMonth { .. } => "day_of_the_month",
            Self::Interval { .. } => "interval",
            Self::Unknown { raw } => raw,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Once => "Once".to_string(),
            Self::Trigger => "Trigger".to_string(),
            Self::Daily => "Daily".to_string(),
            Self::Adaptive => "Adaptive".to_string(),
            Self::Weekly => "Weekly".to_string(),
            Self::Monthly => "Monthly".to_string(),
            Self::Yearly => "Yearly".to_string(),
            Self::DaysOfTheWeek { days } => describe_weekdays(days),
            Self::DayOfTheMonth { day, months } => describe_day_of_month(*day, months.as_deref()),
            Self::Interval { every, unit } => format!("Every {} {}", every, unit),
            Self::Unknown { raw } => raw.clone(),
        }
    }
}

pub fn describe_recurrence(task: &Task) -> String {
    task.recurrence.describe()
}

fn describe_weekdays(days: &[Weekday]) -> String {
    if days.len() > 4 {
        let except: Vec<&str> = ALL_WEEKDAYS
            .iter()
            .filter(|day| !days.contains(day))
            .map(|day| weekday_abbrev(*day))
            .collect();
        if except.is_empty() {
            return "Daily".to_string();
        }
        return format!("Daily except {}", except.join(", "));
    }
    days.iter()
        .map(|day| weekday_abbrev(*day))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_day_of_month(day: u32, months: Option<&[Month]>) -> String {
    let suffix = ordinal_suffix(day);
    match months {
        Some(months) if months.len() > 6 => {
            let except: Vec<&str> = ALL_MONTHS
                .iter()
                .filter(|month| !months.contains(month))
                .map(|month| month_abbrev(*month))
                .collect();
            if except.is_empty() {
                format!("Monthly {}{}", day, suffix)
            } else {
                format!("Monthly {}{}\nexcept {}", day, suffix, except.join(", "))
            }
        }
        Some(months) => format!("{}{} of {}", day, suffix, join_months(months)),
        None => format!("{}{} of {}", day, suffix, join_months(&ALL_MONTHS)),
    }
}

fn join_months(months: &[Month]) -> String {
    months
        .iter()
        .map(|month| month_abbrev(*month))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn ordinal_suffix(n: u32) -> &'static str {
    if (11..=13).contains(&(n % 100)) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Drops a leading emoji grapheme (and the whitespace after it) from a task name.
pub fn strip_leading_emoji(name: &str) -> &str {
    let Some(first) = name.graphemes(true).next() else {
        return name;
    };
    if is_emoji_grapheme(first) {
        name[first.len()..].trim_start()
    } else {
        name
    }
}

fn is_emoji_grapheme(grapheme: &str) -> bool {
    let mut chars = grapheme.chars();
    let Some(lead) = chars.next() else {
        return false;
    };
    if !lead.is_emoji_char() {
        return false;
    }
    // Digits, '#' and '*' only count as emoji inside keycap sequences.
    !lead.is_ascii() || chars.next().is_some()
}

fn parse_weekday(name: &str) -> Result<Weekday, TaskError> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| TaskError::UnknownWeekday(name.to_string()))
}

fn parse_month(name: &str) -> Result<Month, TaskError> {
    name.trim()
        .parse::<Month>()
        .map_err(|_| TaskError::UnknownMonth(name.to_string()))
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
