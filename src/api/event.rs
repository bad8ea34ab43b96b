use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{AppError, AppResult, FieldErrors, validate},
    model::event::{CalendarEvent, EventType, RecurrencePattern},
    rules::recurrence::{EventSpan, is_working_day},
};
use actix_web::{HttpResponse, web};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Longest range a single listing may expand.
const MAX_RANGE_DAYS: i64 = 366;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EventPayload {
    #[schema(example = "Independence Day")]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    #[schema(example = "2026-03-26", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String, nullable = true)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
}

impl EventPayload {
    fn check(&self) -> AppResult<()> {
        validate(self)?;

        let mut errors = FieldErrors::new();
        if self.end_date.is_some_and(|end| end < self.start_date) {
            errors
                .entry("end_date".to_string())
                .or_default()
                .push("end_date must not be before start_date".to_string());
        }
        if self.is_recurring && self.recurrence_pattern.is_none() {
            errors
                .entry("recurrence_pattern".to_string())
                .or_default()
                .push("recurring events need a recurrence_pattern".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(AppError::Validation(errors)) }
    }

    fn pattern(&self) -> Option<&str> {
        self.recurrence_pattern
            .as_ref()
            .filter(|_| self.is_recurring)
            .map(|p| p.as_ref())
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RangeQuery {
    /// First day, defaults to the first of the current month
    #[param(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    /// Last day, defaults to 30 days after `from`
    #[param(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    pub event_type: Option<EventType>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DateQuery {
    #[param(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventOccurrences {
    #[serde(flatten)]
    pub event: CalendarEvent,
    #[schema(value_type = Vec<String>)]
    pub occurrences: Vec<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkingDayResponse {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub working_day: bool,
    /// Weekend and holiday events covering the date
    pub blocked_by: Vec<String>,
}

fn resolve_range(query: &RangeQuery, today: NaiveDate) -> AppResult<(NaiveDate, NaiveDate)> {
    let from = query
        .from
        .unwrap_or_else(|| today.with_day(1).unwrap_or(today));
    let to = query.to.unwrap_or(from + Duration::days(30));

    if to < from {
        return Err(AppError::field("to", "to must not be before from"));
    }
    if (to - from).num_days() > MAX_RANGE_DAYS {
        return Err(AppError::field(
            "to",
            format!("range must not exceed {MAX_RANGE_DAYS} days"),
        ));
    }
    Ok((from, to))
}

/// Events that may touch `[from, to]`. Open-ended rows are kept and filtered
/// by their span.
async fn events_touching(
    pool: &MySqlPool,
    from: NaiveDate,
    to: NaiveDate,
    blocking_only: bool,
) -> AppResult<Vec<CalendarEvent>> {
    let sql = if blocking_only {
        "SELECT * FROM calendar_events
         WHERE event_type IN ('WEEKEND', 'HOLIDAY') AND start_date <= ? AND (end_date IS NULL OR end_date >= ?)"
    } else {
        "SELECT * FROM calendar_events
         WHERE start_date <= ? AND (end_date IS NULL OR end_date >= ?) ORDER BY start_date, id"
    };

    Ok(sqlx::query_as::<_, CalendarEvent>(sql)
        .bind(to)
        .bind(from)
        .fetch_all(pool)
        .await?)
}

fn spans_of(events: &[CalendarEvent]) -> Vec<EventSpan> {
    events
        .iter()
        .filter_map(|event| {
            let span = event.span();
            if span.is_none() {
                warn!(event_id = event.id, "Skipping calendar event with unknown type or pattern");
            }
            span
        })
        .collect()
}

/// Weekend and holiday spans relevant to `[from, to]`, for working-day checks.
pub async fn blocking_spans(pool: &MySqlPool, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<EventSpan>> {
    let events = events_touching(pool, from, to, true).await?;
    Ok(spans_of(&events))
}

async fn fetch_event(pool: &MySqlPool, id: u64) -> AppResult<CalendarEvent> {
    sqlx::query_as::<_, CalendarEvent>("SELECT * FROM calendar_events WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
}

/// Events in a date range with their concrete occurrence dates
#[utoipa::path(
    get,
    path = "/api/events",
    params(RangeQuery),
    responses(
        (status = 200, description = "Events occurring in the range", body = [EventOccurrences]),
        (status = 422, description = "Invalid range")
    ),
    tag = "Calendar",
    security(("bearer_auth" = []))
)]
pub async fn list_events(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<RangeQuery>,
) -> AppResult<HttpResponse> {
    let (from, to) = resolve_range(&query, config.office_now().date())?;
    let events = events_touching(pool.get_ref(), from, to, false).await?;

    let listed: Vec<EventOccurrences> = events
        .into_iter()
        .filter_map(|event| {
            let span = event.span()?;
            if query.event_type.is_some_and(|t| t != span.event_type) {
                return None;
            }
            let occurrences = span.occurrences(from, to);
            (!occurrences.is_empty()).then_some(EventOccurrences { event, occurrences })
        })
        .collect();

    Ok(HttpResponse::Ok().json(listed))
}

#[utoipa::path(
    get,
    path = "/api/events/working-day",
    params(DateQuery),
    responses((status = 200, description = "Whether the date is a working day", body = WorkingDayResponse)),
    tag = "Calendar",
    security(("bearer_auth" = []))
)]
pub async fn working_day(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateQuery>,
) -> AppResult<HttpResponse> {
    let date = query.date.unwrap_or_else(|| config.office_now().date());
    let events = events_touching(pool.get_ref(), date, date, true).await?;

    let blocked_by: Vec<String> = events
        .iter()
        .filter(|event| event.span().is_some_and(|span| span.covers(date)))
        .map(|event| event.title.clone())
        .collect();

    Ok(HttpResponse::Ok().json(WorkingDayResponse {
        date,
        working_day: is_working_day(date, &spans_of(&events)),
        blocked_by,
    }))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}",
    params(("event_id" = u64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = CalendarEvent),
        (status = 404, description = "Event not found")
    ),
    tag = "Calendar",
    security(("bearer_auth" = []))
)]
pub async fn get_event(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let event = fetch_event(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(event))
}

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = EventPayload,
    responses(
        (status = 201, description = "Event created"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Calendar",
    security(("bearer_auth" = []))
)]
pub async fn create_event(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<EventPayload>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    payload.check()?;

    let result = sqlx::query(
        r#"
        INSERT INTO calendar_events
            (title, description, event_type, start_date, end_date, is_recurring, recurrence_pattern, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.title.trim())
    .bind(payload.description.as_deref())
    .bind(payload.event_type.as_ref())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.is_recurring)
    .bind(payload.pattern())
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Event created",
        "id": result.last_insert_id()
    })))
}

#[utoipa::path(
    put,
    path = "/api/events/{event_id}",
    params(("event_id" = u64, Path, description = "Event ID")),
    request_body = EventPayload,
    responses(
        (status = 200, description = "Event updated"),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Calendar",
    security(("bearer_auth" = []))
)]
pub async fn update_event(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<EventPayload>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    payload.check()?;
    let id = path.into_inner();
    fetch_event(pool.get_ref(), id).await?;

    sqlx::query(
        r#"
        UPDATE calendar_events
        SET title = ?, description = ?, event_type = ?, start_date = ?, end_date = ?,
            is_recurring = ?, recurrence_pattern = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.title.trim())
    .bind(payload.description.as_deref())
    .bind(payload.event_type.as_ref())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.is_recurring)
    .bind(payload.pattern())
    .bind(id)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Event updated" })))
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}",
    params(("event_id" = u64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 404, description = "Event not found")
    ),
    tag = "Calendar",
    security(("bearer_auth" = []))
)]
pub async fn delete_event(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let result = sqlx::query("DELETE FROM calendar_events WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Event deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn payload() -> EventPayload {
        EventPayload {
            title: "Weekend".to_string(),
            description: None,
            event_type: EventType::Weekend,
            start_date: d(2026, 1, 3),
            end_date: None,
            is_recurring: true,
            recurrence_pattern: Some(RecurrencePattern::Weekly),
        }
    }

    #[test]
    fn recurring_event_requires_pattern() {
        assert!(payload().check().is_ok());

        let missing = EventPayload { recurrence_pattern: None, ..payload() };
        let Err(AppError::Validation(errors)) = missing.check() else {
            panic!("expected validation error");
        };
        assert!(errors.contains_key("recurrence_pattern"));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let bad = EventPayload { end_date: Some(d(2026, 1, 2)), ..payload() };
        let Err(AppError::Validation(errors)) = bad.check() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["end_date"]);
    }

    #[test]
    fn pattern_is_dropped_for_single_events() {
        let single = EventPayload { is_recurring: false, ..payload() };
        assert_eq!(single.pattern(), None);
        assert_eq!(payload().pattern(), Some("WEEKLY"));
    }

    #[test]
    fn range_defaults_to_month_start() {
        let query = RangeQuery { from: None, to: None, event_type: None };
        let (from, to) = resolve_range(&query, d(2026, 10, 18)).unwrap();
        assert_eq!(from, d(2026, 10, 1));
        assert_eq!(to, d(2026, 10, 31));
    }

    #[test]
    fn oversized_or_inverted_ranges_are_rejected() {
        let inverted = RangeQuery { from: Some(d(2026, 2, 1)), to: Some(d(2026, 1, 1)), event_type: None };
        assert!(resolve_range(&inverted, d(2026, 1, 1)).is_err());

        let huge = RangeQuery { from: Some(d(2026, 1, 1)), to: Some(d(2027, 6, 1)), event_type: None };
        assert!(resolve_range(&huge, d(2026, 1, 1)).is_err());
    }
}
