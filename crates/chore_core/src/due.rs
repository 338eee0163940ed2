use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::task::DueDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Primary,
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDescription {
    pub text: String,
    pub color: Tone,
}

const SOON_HOURS: i64 = 48;

/// Text and urgency for a due date, evaluated against `now` and in `now`'s offset.
pub fn describe_due_date(
    next_due_date: Option<DueDate>,
    now: DateTime<FixedOffset>,
) -> DueDescription {
    let Some(due) = next_due_date else {
        return DueDescription {
            text: "No Due Date".to_string(),
            color: Tone::Neutral,
        };
    };

    let with_time = !due.is_date_only();
    let due = due.resolve(now.offset());
    let diff = due.signed_duration_since(now);
    let soon = Duration::hours(SOON_HOURS);

    if diff < Duration::zero() {
        let phrase = if -diff <= soon {
            lower_first(&calendar_phrase(&due, &now, with_time))
        } else {
            relative_phrase(diff)
        };
        return DueDescription {
            text: format!("Overdue {}", phrase),
            color: Tone::Danger,
        };
    }

    if diff > Duration::zero() && diff < soon {
        return DueDescription {
            text: calendar_phrase(&due, &now, with_time),
            color: Tone::Warning,
        };
    }

    DueDescription {
        text: format!("Due {}", relative_phrase(diff)),
        color: Tone::Neutral,
    }
}

fn calendar_phrase(
    due: &DateTime<FixedOffset>,
    now: &DateTime<FixedOffset>,
    with_time: bool,
) -> String {
    let days = due
        .date_naive()
        .signed_duration_since(now.date_naive())
        .num_days();
    let day = match days {
        -1 => "Yesterday".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        2..=6 => due.format("%A").to_string(),
        -6..=-2 => format!("Last {}", due.format("%A")),
        _ => due.format("%m/%d/%Y").to_string(),
    };
    if with_time {
        format!("{} {}", day, due.format("%-I:%M %p"))
    } else {
        day
    }
}

fn relative_phrase(diff: Duration) -> String {
    if diff < Duration::zero() {
        format!("{} ago", humanize(-diff))
    } else {
        format!("in {}", humanize(diff))
    }
}

fn humanize(span: Duration) -> String {
    let seconds = span.num_seconds() as f64;
    let minutes = (seconds / 60.0).round() as i64;
    let hours = (seconds / 3_600.0).round() as i64;
    let days = (seconds / 86_400.0).round() as i64;
    // Average Gregorian month: 146097 days per 4800 months.
    let months = (seconds / 86_400.0 * 4_800.0 / 146_097.0).round() as i64;
    let years = (seconds / 86_400.0 / 365.2425).round() as i64;

    if seconds < 45.0 {
        "a few seconds".to_string()
    } else if minutes <= 1 {
        "a minute".to_string()
    } else if minutes < 45 {
        format!("{} minutes", minutes)
    } else if hours <= 1 {
        "an hour".to_string()
    } else if hours < 22 {
        format!("{} hours", hours)
    } else if days <= 1 {
        "a day".to_string()
    } else if days < 26 {
        format!("{} days", days)
    } else if months <= 1 {
        "a month".to_string()
    } else if months < 11 {
        format!("{} months", months)
    } else if years <= 1 {
        "a year".to_string()
    } else {
        format!("{} years", years)
    }
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 10, 24, 10, 0, 0)
            .unwrap()
    }

    fn after(now: DateTime<FixedOffset>, offset: Duration) -> Option<DueDate> {
        Some(DueDate::At(now + offset))
    }

    fn at(
        offset_seconds: i32,
        (y, m, d): (i32, u32, u32),
        (h, mi, s): (u32, u32, u32),
    ) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_seconds)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, mi, s)
            .unwrap()
    }

    fn on_day(y: i32, m: u32, d: u32) -> Option<DueDate> {
        Some(DueDate::OnDay(NaiveDate::from_ymd_opt(y, m, d).unwrap()))
    }

    #[test]
    fn missing_due_date_is_neutral() {
        let described = describe_due_date(None, now());
        assert_eq!(described.text, "No Due Date");
        assert_eq!(described.color, Tone::Neutral);
    }

    #[test]
    fn due_within_two_days_is_a_warning_with_clock_time() {
        let described = describe_due_date(after(now(), Duration::hours(30)), now());
        assert_eq!(described.color, Tone::Warning);
        assert_eq!(described.text, "Tomorrow 4:00 PM");
    }

    #[test]
    fn date_only_marker_hides_clock_time() {
        let due = at(0, (2025, 10, 25), (23, 59, 59));
        let described = describe_due_date(Some(DueDate::At(due)), now());
        assert_eq!(described.color, Tone::Warning);
        assert_eq!(described.text, "Tomorrow");
    }

    #[test]
    fn recently_overdue_uses_calendar_phrase() {
        let described = describe_due_date(after(now(), -Duration::hours(10)), now());
        assert_eq!(described.color, Tone::Danger);
        assert!(described.text.starts_with("Overdue"));
        assert_eq!(described.text, "Overdue today 12:00 AM");

        let described = describe_due_date(on_day(2025, 10, 23), now());
        assert_eq!(described.text, "Overdue yesterday");
    }

    #[test]
    fn long_overdue_uses_relative_duration() {
        let described = describe_due_date(after(now(), -Duration::days(5)), now());
        assert_eq!(described.color, Tone::Danger);
        assert_eq!(described.text, "Overdue 5 days ago");
    }

    #[test]
    fn later_due_dates_are_neutral() {
        let described = describe_due_date(after(now(), Duration::days(5)), now());
        assert_eq!(described.color, Tone::Neutral);
        assert_eq!(described.text, "Due in 5 days");

        let described = describe_due_date(after(now(), Duration::days(90)), now());
        assert_eq!(described.text, "Due in 3 months");
    }

    #[test]
    fn calendar_phrase_follows_viewer_offset() {
        // 01:30 UTC on the 25th is still the 24th in UTC-5.
        let viewer = at(-5 * 3600, (2025, 10, 24), (8, 0, 0));
        let due = at(0, (2025, 10, 25), (1, 30, 0));
        let described = describe_due_date(Some(DueDate::At(due)), viewer);
        assert_eq!(described.text, "Today 8:30 PM");
    }

    #[test]
    fn bare_date_is_due_at_the_end_of_the_viewers_day() {
        let viewer = at(2 * 3600, (2025, 10, 24), (10, 0, 0));
        let described = describe_due_date(on_day(2025, 10, 24), viewer);
        assert_eq!(described.color, Tone::Warning);
        assert_eq!(described.text, "Today");

        let viewer = at(5 * 3600 + 1800, (2025, 10, 24), (10, 0, 0));
        let described = describe_due_date(on_day(2025, 10, 25), viewer);
        assert_eq!(described.color, Tone::Warning);
        assert_eq!(described.text, "Tomorrow");

        let viewer = at(-7 * 3600, (2025, 10, 24), (22, 0, 0));
        let described = describe_due_date(on_day(2025, 10, 24), viewer);
        assert_eq!(described.text, "Today");
    }

    #[test]
    fn date_only_marker_is_read_in_the_written_offset() {
        // 23:59:59 at +05:30 is 18:29:59 UTC; the marker still applies.
        let due = at(5 * 3600 + 1800, (2025, 10, 24), (23, 59, 59));
        let described = describe_due_date(Some(DueDate::At(due)), now());
        assert_eq!(described.color, Tone::Warning);
        assert_eq!(described.text, "Today");
    }

    #[test]
    fn humanize_thresholds() {
        assert_eq!(humanize(Duration::seconds(10)), "a few seconds");
        assert_eq!(humanize(Duration::seconds(70)), "a minute");
        assert_eq!(humanize(Duration::minutes(30)), "30 minutes");
        assert_eq!(humanize(Duration::minutes(50)), "an hour");
        assert_eq!(humanize(Duration::hours(5)), "5 hours");
        assert_eq!(humanize(Duration::hours(30)), "a day");
        assert_eq!(humanize(Duration::days(40)), "a month");
        assert_eq!(humanize(Duration::days(400)), "a year");
        assert_eq!(humanize(Duration::days(1000)), "3 years");
    }
}
