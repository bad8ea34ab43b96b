use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::rules::recurrence::EventSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Holiday,
    Weekend,
    Meeting,
    Event,
}

impl EventType {
    /// Weekends and holidays are not working days.
    pub fn blocks_work(self) -> bool {
        matches!(self, EventType::Holiday | EventType::Weekend)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CalendarEvent {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Independence Day")]
    pub title: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    #[schema(example = "HOLIDAY")]
    pub event_type: String,
    #[schema(example = "2026-03-26", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String, nullable = true)]
    pub end_date: Option<NaiveDate>,
    pub is_recurring: bool,
    #[schema(example = "YEARLY", nullable = true)]
    pub recurrence_pattern: Option<String>,
    #[schema(nullable = true)]
    pub created_by: Option<u64>,
}

impl CalendarEvent {
    /// Typed view used by the calendar rules. `None` for rows with unknown
    /// enum strings.
    pub fn span(&self) -> Option<EventSpan> {
        let event_type = self.event_type.parse().ok()?;
        let recurrence = if self.is_recurring {
            Some(self.recurrence_pattern.as_deref()?.parse().ok()?)
        } else {
            None
        };
        Some(EventSpan {
            event_type,
            start: self.start_date,
            end: self.end_date,
            recurrence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(event_type: &str, is_recurring: bool, pattern: Option<&str>) -> CalendarEvent {
        CalendarEvent {
            id: 1,
            title: "Weekend".to_string(),
            description: None,
            event_type: event_type.to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(),
            end_date: None,
            is_recurring,
            recurrence_pattern: pattern.map(str::to_string),
            created_by: None,
        }
    }

    #[test]
    fn span_parses_stored_enums() {
        let span = row("WEEKEND", true, Some("WEEKLY")).span().unwrap();
        assert_eq!(span.event_type, EventType::Weekend);
        assert_eq!(span.recurrence, Some(RecurrencePattern::Weekly));
    }

    #[test]
    fn non_recurring_ignores_pattern_column() {
        let span = row("HOLIDAY", false, Some("DAILY")).span().unwrap();
        assert_eq!(span.recurrence, None);
    }

    #[test]
    fn unknown_values_yield_none() {
        assert!(row("PARTY", false, None).span().is_none());
        assert!(row("HOLIDAY", true, None).span().is_none());
        assert!(row("HOLIDAY", true, Some("HOURLY")).span().is_none());
    }
}
