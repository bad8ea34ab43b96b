use chrono::{Datelike, NaiveDate};

use crate::model::event::{EventType, RecurrencePattern};

/// The date-relevant part of a calendar event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpan {
    pub event_type: EventType,
    pub start: NaiveDate,
    /// Last covered day; for recurring events the end of the recurrence.
    pub end: Option<NaiveDate>,
    pub recurrence: Option<RecurrencePattern>,
}

/// `date` lies within `[start, end]` and matches `pattern` relative to `start`.
/// A missing `end` leaves the recurrence open-ended.
pub fn is_recurring_date(
    date: NaiveDate,
    start: NaiveDate,
    end: Option<NaiveDate>,
    pattern: RecurrencePattern,
) -> bool {
    if date < start || end.is_some_and(|end| date > end) {
        return false;
    }

    match pattern {
        RecurrencePattern::Daily => true,
        RecurrencePattern::Weekly => date.weekday() == start.weekday(),
        RecurrencePattern::Monthly => date.day() == start.day(),
        RecurrencePattern::Yearly => date.month() == start.month() && date.day() == start.day(),
    }
}

impl EventSpan {
    pub fn covers(&self, date: NaiveDate) -> bool {
        match self.recurrence {
            Some(pattern) => is_recurring_date(date, self.start, self.end, pattern),
            None => {
                let end = self.end.unwrap_or(self.start);
                self.start <= date && date <= end
            }
        }
    }

    /// Every covered date inside `[from, to]`.
    pub fn occurrences(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let first = from.max(self.start);
        let last = match self.end {
            Some(end) => to.min(end),
            None if self.recurrence.is_some() => to,
            None => to.min(self.start),
        };

        first
            .iter_days()
            .take_while(|day| *day <= last)
            .filter(|day| self.covers(*day))
            .collect()
    }
}

/// A day is a working day unless a WEEKEND or HOLIDAY event covers it.
pub fn is_working_day(date: NaiveDate, events: &[EventSpan]) -> bool {
    !events
        .iter()
        .filter(|event| event.event_type.blocks_work())
        .any(|event| event.covers(date))
}

/// Working days in the inclusive range `[start, end]`.
pub fn working_days_between(start: NaiveDate, end: NaiveDate, events: &[EventSpan]) -> u32 {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| is_working_day(*day, events))
        .count() as u32
}
