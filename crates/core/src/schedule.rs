//! Six-field cron schedule as written in the job file.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Value a blank schedule field is filled with.
pub const WILDCARD: &str = "*";

/// Field names in trigger order, used in log and error messages.
pub const FIELD_NAMES: [&str; 6] = [
    "second",
    "minute",
    "hour",
    "day_of_month",
    "month",
    "day_of_week",
];

/// A cron-style schedule with one string per field (digits, ranges, steps
/// or `*`). Blank fields are filled with `*` individually by
/// [`normalize`](ScheduleExpression::normalize).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleExpression {
    #[serde(default)]
    pub second: String,
    #[serde(default)]
    pub minute: String,
    #[serde(default)]
    pub hour: String,
    #[serde(default)]
    pub day_of_month: String,
    #[serde(default)]
    pub month: String,
    #[serde(default)]
    pub day_of_week: String,
}

impl ScheduleExpression {
    /// Build a normalized expression from its six fields.
    pub fn new(
        second: impl Into<String>,
        minute: impl Into<String>,
        hour: impl Into<String>,
        day_of_month: impl Into<String>,
        month: impl Into<String>,
        day_of_week: impl Into<String>,
    ) -> Self {
        let mut expr = Self {
            second: second.into(),
            minute: minute.into(),
            hour: hour.into(),
            day_of_month: day_of_month.into(),
            month: month.into(),
            day_of_week: day_of_week.into(),
        };
        expr.normalize();
        expr
    }

    /// `* * * * * *`: fires every second.
    pub fn every_second() -> Self {
        Self::new(WILDCARD, WILDCARD, WILDCARD, WILDCARD, WILDCARD, WILDCARD)
    }

    /// True when every field is blank (before normalization).
    pub fn is_blank(&self) -> bool {
        self.fields().iter().all(|f| f.trim().is_empty())
    }

    /// Trim every field and fill blank ones with `*`.
    pub fn normalize(&mut self) {
        let fields = [
            &mut self.second,
            &mut self.minute,
            &mut self.hour,
            &mut self.day_of_month,
            &mut self.month,
            &mut self.day_of_week,
        ];
        for (name, field) in FIELD_NAMES.iter().zip(fields) {
            let trimmed = field.trim();
            if trimmed.is_empty() {
                debug!(field = %name, "schedule field is empty, defaulting to '*'");
                *field = WILDCARD.to_string();
            } else if trimmed.len() != field.len() {
                *field = trimmed.to_string();
            }
        }
    }

    /// Fields in trigger order: second, minute, hour, day-of-month, month, day-of-week.
    pub fn fields(&self) -> [&str; 6] {
        [
            &self.second,
            &self.minute,
            &self.hour,
            &self.day_of_month,
            &self.month,
            &self.day_of_week,
        ]
    }

    /// Render the fields as configured, space separated.
    pub fn render(&self) -> String {
        self.fields().join(" ")
    }

    /// Render for the `cron` crate, which numbers days of week 1-7 from
    /// Sunday. Numeric day-of-week values are read the classic way (0-6,
    /// Sunday is 0 or 7) and rewritten as an explicit list; names pass
    /// through untouched.
    pub fn trigger_expression(&self) -> String {
        let day_of_week = trigger_day_of_week(&self.day_of_week);
        let mut fields = self.fields();
        fields[5] = &day_of_week;
        fields.join(" ")
    }
}

/// Rewrite each comma-separated day-of-week item into the trigger numbering.
fn trigger_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(|item| {
            let numeric = !item.is_empty() && !item.chars().any(|c| c.is_ascii_alphabetic());
            if !numeric || item == WILDCARD || item == "?" {
                return item.to_string();
            }
            // Left as written when unparseable so the trigger layer reports it.
            match classic_days(item) {
                Some(days) => days
                    .iter()
                    .map(|d| (d + 1).to_string())
                    .collect::<Vec<_>>()
                    .join(","),
                None => item.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Days (0 = Sunday .. 6 = Saturday) selected by one classic cron item:
/// `n`, `a-b`, `*/s`, `a-b/s` or `n/s`.
fn classic_days(item: &str) -> Option<Vec<u32>> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, step.parse::<usize>().ok().filter(|s| *s > 0)?),
        None => (item, 1),
    };
    let parse = |s: &str| s.parse::<u32>().ok().filter(|d| *d <= 7);

    let (start, end) = if range == WILDCARD {
        (0, 6)
    } else if let Some((a, b)) = range.split_once('-') {
        (parse(a)?, parse(b)?)
    } else {
        let day = parse(range)?;
        if item.contains('/') {
            (day, day.max(6))
        } else {
            (day, day)
        }
    };
    if start > end {
        return None;
    }

    let mut days: Vec<u32> = (start..=end).step_by(step).map(|d| d % 7).collect();
    days.sort_unstable();
    days.dedup();
    Some(days)
}

impl fmt::Display for ScheduleExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_expression_renders_six_stars() {
        assert_eq!(ScheduleExpression::every_second().render(), "* * * * * *");
    }

    #[test]
    fn render_keeps_field_order() {
        let expr = ScheduleExpression::new("0", "30", "2", "1", "6", "Mon");
        assert_eq!(expr.render(), "0 30 2 1 6 Mon");
        assert_eq!(expr.to_string(), "0 30 2 1 6 Mon");
    }

    #[test]
    fn normalize_fills_blank_fields_individually() {
        let mut expr = ScheduleExpression {
            second: "0".into(),
            minute: "".into(),
            hour: " 4 ".into(),
            ..Default::default()
        };
        expr.normalize();
        assert_eq!(expr.render(), "0 * 4 * * *");
    }

    fn dow(field: &str) -> String {
        ScheduleExpression::new("0", "0", "9", "*", "*", field)
            .trigger_expression()
            .rsplit(' ')
            .next()
            .unwrap()
            .to_string()
    }

    #[test]
    fn day_of_week_sunday_is_zero_or_seven() {
        assert_eq!(dow("0"), "1");
        assert_eq!(dow("7"), "1");
        assert_eq!(dow("6"), "7");
    }

    #[test]
    fn day_of_week_ranges_and_steps_use_classic_numbering() {
        assert_eq!(dow("1-5"), "2,3,4,5,6");
        assert_eq!(dow("*/2"), "1,3,5,7");
        assert_eq!(dow("1-5/2"), "2,4,6");
        assert_eq!(dow("5-7"), "1,6,7");
        assert_eq!(dow("0,3"), "1,4");
    }

    #[test]
    fn day_of_week_names_and_wildcards_pass_through() {
        assert_eq!(dow("*"), "*");
        assert_eq!(dow("Mon-Fri"), "Mon-Fri");
        assert_eq!(dow("Sun,3"), "Sun,4");
        assert_eq!(dow("9"), "9");
    }

    #[test]
    fn trigger_expression_keeps_other_fields() {
        let expr = ScheduleExpression::new("0", "30", "2", "1", "6", "1");
        assert_eq!(expr.trigger_expression(), "0 30 2 1 6 2");
        assert_eq!(expr.render(), "0 30 2 1 6 1");
    }

    #[test]
    fn blank_detection() {
        assert!(ScheduleExpression::default().is_blank());
        assert!(!ScheduleExpression::every_second().is_blank());
    }

    #[test]
    fn deserialize_partial_fields() {
        let expr: ScheduleExpression =
            serde_yaml::from_str("second: \"0\"\nminute: \"*/15\"\n").unwrap();
        assert_eq!(expr.second, "0");
        assert_eq!(expr.minute, "*/15");
        assert!(expr.hour.is_empty());
    }

    #[test]
    fn deserialize_rejects_unknown_fields() {
        let result: Result<ScheduleExpression, _> = serde_yaml::from_str("seconds: \"0\"\n");
        assert!(result.is_err());
    }
}
