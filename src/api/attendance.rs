use crate::{
    api::event::blocking_spans,
    auth::auth::AuthUser,
    config::Config,
    error::{AppError, AppResult},
    model::{
        attendance::{Attendance, AttendanceStatus, session_columns},
        leave_request::LeaveStatus,
    },
    rules::{
        recurrence::is_working_day,
        window::{AttendanceWindows, MarkKind, Session},
    },
    settings::Settings,
    utils::db_utils::{FilterValue, bind_as, bind_scalar, paginate},
};
use actix_web::{HttpResponse, http::header, web};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error, info, instrument};
use utoipa::{IntoParams, ToSchema};

/// Upper bound on rows in one CSV export.
const EXPORT_LIMIT: u32 = 10_000;

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkResponse {
    #[schema(example = "Checked in")]
    pub message: String,
    pub kind: MarkKind,
    pub session: Session,
    pub late: bool,
    pub early: bool,
    #[schema(value_type = String, format = "date-time")]
    pub at: NaiveDateTime,
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AttendanceQuery {
    pub user_id: Option<u64>,
    /// Ignored for supervisors, who are pinned to their own department
    pub department_id: Option<u64>,
    pub status: Option<AttendanceStatus>,
    #[param(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TodayResponse {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub working_day: bool,
    pub attendance: Option<Attendance>,
    pub windows: AttendanceWindows,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AbsenteeRequest {
    /// Defaults to today
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
pub struct ExportRow {
    pub date: NaiveDate,
    pub user_id: u64,
    pub name: String,
    pub department: Option<String>,
    pub morning_check_in: Option<NaiveDateTime>,
    pub morning_check_out: Option<NaiveDateTime>,
    pub afternoon_check_in: Option<NaiveDateTime>,
    pub afternoon_check_out: Option<NaiveDateTime>,
    pub is_late_morning: bool,
    pub is_late_afternoon: bool,
    pub is_early_morning: bool,
    pub is_early_afternoon: bool,
    pub status: String,
}

const EXPORT_HEADER: [&str; 11] = [
    "date",
    "user_id",
    "name",
    "department",
    "morning_check_in",
    "morning_check_out",
    "afternoon_check_in",
    "afternoon_check_out",
    "late",
    "early",
    "status",
];

/// Picks the session a mark applies to, given the day's row so far.
///
/// Check-in takes the first accepting session not yet checked into. Check-out
/// takes the first accepting session that is still open.
pub fn resolve_session(
    windows: &AttendanceWindows,
    kind: MarkKind,
    at: NaiveTime,
    row: Option<&Attendance>,
) -> AppResult<Session> {
    let Some(first) = windows.session_for(kind, at) else {
        return Err(AppError::BadRequest("Outside attendance window".to_string()));
    };
    let candidates = windows.candidates(kind, at);

    match kind {
        MarkKind::CheckIn => candidates
            .iter()
            .copied()
            .find(|s| row.is_none_or(|r| r.check_in(*s).is_none()))
            .ok_or_else(|| {
                AppError::Conflict(format!("Already checked in for the {first} session"))
            }),
        MarkKind::CheckOut => {
            let Some(row) = row else {
                return Err(AppError::BadRequest("No check-in found for today".to_string()));
            };
            if let Some(open) = candidates.iter().copied().find(|s| row.is_open(*s)) {
                return Ok(open);
            }
            if candidates.iter().all(|s| row.check_out(*s).is_some()) {
                Err(AppError::Conflict(format!("Already checked out for the {first} session")))
            } else {
                Err(AppError::BadRequest("No check-in found for this session".to_string()))
            }
        }
    }
}

async fn day_row(pool: &MySqlPool, user_id: u64, date: NaiveDate) -> AppResult<Option<Attendance>> {
    Ok(
        sqlx::query_as::<_, Attendance>("SELECT * FROM attendances WHERE user_id = ? AND date = ?")
            .bind(user_id)
            .bind(date)
            .fetch_optional(pool)
            .await?,
    )
}

/// Marks are stored in a whole-second DATETIME, so lateness is judged on
/// the same second.
fn marked_at(now: NaiveDateTime) -> NaiveDateTime {
    now.trunc_subsecs(0)
}

/// Records a check-in or check-out for `user_id` at the current office time.
///
/// Shared by the attendance endpoints and face recognition.
#[instrument(skip(pool, settings, config))]
pub async fn record_mark(
    pool: &MySqlPool,
    settings: &Settings,
    config: &Config,
    user_id: u64,
    kind: MarkKind,
) -> AppResult<MarkResponse> {
    let now = marked_at(config.office_now());
    let date = now.date();

    let spans = blocking_spans(pool, date, date).await?;
    if !is_working_day(date, &spans) {
        return Err(AppError::BadRequest("Today is not a working day".to_string()));
    }

    let windows = settings.attendance_windows().await;
    let existing = day_row(pool, user_id, date).await?;
    let session = resolve_session(&windows, kind, now.time(), existing.as_ref())?;
    let mark = windows.mark(kind, session, now.time());
    let columns = session_columns(session);

    let updated = match kind {
        MarkKind::CheckIn => {
            sqlx::query(
                "INSERT INTO attendances (user_id, date) VALUES (?, ?) ON DUPLICATE KEY UPDATE id = id",
            )
            .bind(user_id)
            .bind(date)
            .execute(pool)
            .await?;

            let sql = format!(
                "UPDATE attendances SET {} = ?, {} = ? WHERE user_id = ? AND date = ? AND {} IS NULL",
                columns.check_in, columns.late, columns.check_in
            );
            sqlx::query(&sql)
                .bind(now)
                .bind(mark.late)
                .bind(user_id)
                .bind(date)
                .execute(pool)
                .await?
        }
        MarkKind::CheckOut => {
            let sql = format!(
                "UPDATE attendances SET {} = ?, {} = ? WHERE user_id = ? AND date = ? AND {} IS NOT NULL AND {} IS NULL",
                columns.check_out, columns.early, columns.check_in, columns.check_out
            );
            sqlx::query(&sql)
                .bind(now)
                .bind(mark.early)
                .bind(user_id)
                .bind(date)
                .execute(pool)
                .await?
        }
    };

    // Lost a race against a concurrent mark for the same session.
    if updated.rows_affected() == 0 {
        return Err(AppError::Conflict(format!("Already marked for the {session} session")));
    }

    let row = day_row(pool, user_id, date)
        .await?
        .ok_or(AppError::Internal)?;
    let status = AttendanceStatus::derive(&row);
    if row.status != status.as_ref() {
        sqlx::query("UPDATE attendances SET status = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(row.id)
            .execute(pool)
            .await?;
    }

    info!(user_id, session = %mark.session, %kind, late = mark.late, early = mark.early, "Attendance marked");

    let message = match kind {
        MarkKind::CheckIn => "Checked in",
        MarkKind::CheckOut => "Checked out",
    };
    Ok(MarkResponse {
        message: message.to_string(),
        kind,
        session,
        late: mark.late,
        early: mark.early,
        at: now,
        status,
    })
}

#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in", body = MarkResponse),
        (status = 400, description = "Not a working day or outside attendance window"),
        (status = 409, description = "Session already checked in")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings: web::Data<Settings>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let response = record_mark(pool.get_ref(), &settings, &config, auth.user_id, MarkKind::CheckIn).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out", body = MarkResponse),
        (status = 400, description = "No check-in, not a working day or outside attendance window"),
        (status = 409, description = "Session already checked out")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings: web::Data<Settings>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let response = record_mark(pool.get_ref(), &settings, &config, auth.user_id, MarkKind::CheckOut).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// The caller's row for today along with the windows in force
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses((status = 200, description = "Today's attendance", body = TodayResponse)),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings: web::Data<Settings>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let date = config.office_now().date();
    let spans = blocking_spans(pool.get_ref(), date, date).await?;

    Ok(HttpResponse::Ok().json(TodayResponse {
        date,
        working_day: is_working_day(date, &spans),
        attendance: day_row(pool.get_ref(), auth.user_id, date).await?,
        windows: settings.attendance_windows().await,
    }))
}

/// WHERE conditions shared by the list and export queries. `scope` is the
/// caller's forced department.
fn list_filters(query: &AttendanceQuery, scope: Option<u64>) -> (Vec<&'static str>, Vec<FilterValue>) {
    let mut conditions = Vec::new();
    let mut args = Vec::new();

    if let Some(department_id) = scope.or(query.department_id) {
        conditions.push("u.department_id = ?");
        args.push(FilterValue::U64(department_id));
    }
    if let Some(user_id) = query.user_id {
        conditions.push("a.user_id = ?");
        args.push(FilterValue::U64(user_id));
    }
    if let Some(status) = query.status {
        conditions.push("a.status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }
    if let Some(from) = query.from {
        conditions.push("a.date >= ?");
        args.push(FilterValue::Date(from));
    }
    if let Some(to) = query.to {
        conditions.push("a.date <= ?");
        args.push(FilterValue::Date(to));
    }

    (conditions, args)
}

fn where_clause(conditions: &[&str]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

async fn page_of(
    pool: &MySqlPool,
    conditions: &[&str],
    args: &[FilterValue],
    page: Option<u32>,
    per_page: Option<u32>,
) -> AppResult<AttendanceListResponse> {
    let (page, per_page, offset) = paginate(page, per_page, 31);
    let where_sql = where_clause(conditions);

    let count_sql = format!(
        "SELECT COUNT(*) FROM attendances a JOIN users u ON u.id = a.user_id {}",
        where_sql
    );
    let total = bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql), args)
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        "SELECT a.* FROM attendances a JOIN users u ON u.id = a.user_id {} ORDER BY a.date DESC, a.user_id LIMIT ? OFFSET ?",
        where_sql
    );
    debug!(sql = %data_sql, page, per_page, "Fetching attendance page");

    let data = bind_as(sqlx::query_as::<_, Attendance>(&data_sql), args)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(AttendanceListResponse {
        data,
        page,
        per_page,
        total,
    })
}

/// The caller's own history
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    params(AttendanceQuery),
    responses((status = 200, description = "Own attendance", body = AttendanceListResponse)),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> AppResult<HttpResponse> {
    let own = AttendanceQuery {
        user_id: Some(auth.user_id),
        department_id: None,
        status: query.status,
        from: query.from,
        to: query.to,
        page: query.page,
        per_page: query.per_page,
    };
    let (conditions, args) = list_filters(&own, None);
    let response = page_of(pool.get_ref(), &conditions, &args, own.page, own.per_page).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance records", body = AttendanceListResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> AppResult<HttpResponse> {
    let scope = auth.department_scope()?;
    let (conditions, args) = list_filters(&query, scope);
    let response = page_of(pool.get_ref(), &conditions, &args, query.page, query.per_page).await?;
    Ok(HttpResponse::Ok().json(response))
}

fn clock(t: Option<NaiveDateTime>) -> String {
    t.map(|t| t.format("%H:%M:%S").to_string()).unwrap_or_default()
}

pub fn render_csv(rows: &[ExportRow]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for row in rows {
        let late = row.is_late_morning || row.is_late_afternoon;
        let early = row.is_early_morning || row.is_early_afternoon;
        writer.write_record([
            row.date.to_string(),
            row.user_id.to_string(),
            row.name.clone(),
            row.department.clone().unwrap_or_default(),
            clock(row.morning_check_in),
            clock(row.morning_check_out),
            clock(row.afternoon_check_in),
            clock(row.afternoon_check_out),
            late.to_string(),
            early.to_string(),
            row.status.clone(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Attendance as CSV, one line per user-day
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn export_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> AppResult<HttpResponse> {
    let scope = auth.department_scope()?;
    let (conditions, args) = list_filters(&query, scope);

    let sql = format!(
        r#"
        SELECT a.date, a.user_id, u.name, d.name AS department,
               a.morning_check_in, a.morning_check_out, a.afternoon_check_in, a.afternoon_check_out,
               a.is_late_morning, a.is_late_afternoon, a.is_early_morning, a.is_early_afternoon, a.status
        FROM attendances a
        JOIN users u ON u.id = a.user_id
        LEFT JOIN departments d ON d.id = u.department_id
        {}
        ORDER BY a.date, u.name
        LIMIT ?
        "#,
        where_clause(&conditions)
    );

    let rows = bind_as(sqlx::query_as::<_, ExportRow>(&sql), &args)
        .bind(EXPORT_LIMIT)
        .fetch_all(pool.get_ref())
        .await?;

    let body = render_csv(&rows).map_err(|e| {
        error!(error = %e, "Failed to render attendance CSV");
        AppError::Internal
    })?;

    info!(rows = rows.len(), by = auth.user_id, "Attendance exported");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"attendance.csv\"",
        ))
        .body(body))
}

/// Users hired after `date` are skipped.
const ABSENTEES_SQL: &str = r#"
    INSERT INTO attendances (user_id, date, status)
    SELECT u.id, ?,
           IF(EXISTS(
               SELECT 1 FROM leave_requests l
               WHERE l.user_id = u.id AND l.status = ? AND l.start_date <= ? AND l.end_date >= ?
           ), ?, ?)
    FROM users u
    WHERE u.is_active = TRUE
      AND NOT EXISTS (SELECT 1 FROM attendances a WHERE a.user_id = u.id AND a.date = ?)
      AND (u.hire_date IS NULL OR u.hire_date <= ?)
"#;

/// Marks every active user without a row for the day as absent, or on leave
/// when an approved leave covers the day.
#[utoipa::path(
    post,
    path = "/api/attendance/absentees",
    request_body = AbsenteeRequest,
    responses(
        (status = 200, description = "Absentees recorded"),
        (status = 400, description = "Not a working day"),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Date in the future")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_absentees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<AbsenteeRequest>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let today = config.office_now().date();
    let date = payload.date.unwrap_or(today);
    if date > today {
        return Err(AppError::field("date", "date must not be in the future"));
    }

    let spans = blocking_spans(pool.get_ref(), date, date).await?;
    if !is_working_day(date, &spans) {
        return Err(AppError::BadRequest(format!("{date} is not a working day")));
    }

    let result = sqlx::query(ABSENTEES_SQL)
        .bind(date)
        .bind(LeaveStatus::Approved.as_ref())
        .bind(date)
        .bind(date)
        .bind(AttendanceStatus::OnLeave.as_ref())
        .bind(AttendanceStatus::Absent.as_ref())
        .bind(date)
        .bind(date)
        .execute(pool.get_ref())
        .await?;

    info!(%date, marked = result.rows_affected(), "Absentees recorded");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Absentees recorded",
        "date": date,
        "marked": result.rows_affected()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::empty_row;
    use pretty_assertions::assert_eq;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_time(t(h, m))
    }

    fn at_hms(h: u32, m: u32, s: u32) -> NaiveDateTime {
        day().and_time(NaiveTime::from_hms_opt(h, m, s).unwrap())
    }

    #[test]
    fn check_in_outside_every_window_is_rejected() {
        let windows = AttendanceWindows::default();
        let err = resolve_session(&windows, MarkKind::CheckIn, t(6, 30), None).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn second_check_in_for_same_session_conflicts() {
        let windows = AttendanceWindows::default();
        let mut row = empty_row(day());
        row.morning_check_in = Some(at(8, 5));

        let err = resolve_session(&windows, MarkKind::CheckIn, t(9, 0), Some(&row)).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn overlapping_check_in_falls_through_to_afternoon() {
        // 12:00 is inside both the morning window and the afternoon lead time.
        let windows = AttendanceWindows::default();
        let mut row = empty_row(day());
        row.morning_check_in = Some(at(8, 0));

        assert_eq!(
            resolve_session(&windows, MarkKind::CheckIn, t(12, 0), None).unwrap(),
            Session::Morning
        );
        assert_eq!(
            resolve_session(&windows, MarkKind::CheckIn, t(12, 0), Some(&row)).unwrap(),
            Session::Afternoon
        );
    }

    #[test]
    fn sub_second_check_in_at_start_is_on_time() {
        let windows = AttendanceWindows::default();
        let now = day().and_time(NaiveTime::from_hms_milli_opt(8, 0, 0, 400).unwrap());

        let at = marked_at(now);
        assert_eq!(at, at_hms(8, 0, 0));
        assert!(!windows.mark(MarkKind::CheckIn, Session::Morning, at.time()).late);

        let next_second = marked_at(day().and_time(NaiveTime::from_hms_milli_opt(8, 0, 1, 10).unwrap()));
        assert!(windows.mark(MarkKind::CheckIn, Session::Morning, next_second.time()).late);
    }

    #[test]
    fn check_out_without_check_in_is_bad_request() {
        let windows = AttendanceWindows::default();
        assert!(matches!(
            resolve_session(&windows, MarkKind::CheckOut, t(12, 0), None),
            Err(AppError::BadRequest(_))
        ));

        let row = empty_row(day());
        assert!(matches!(
            resolve_session(&windows, MarkKind::CheckOut, t(12, 0), Some(&row)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn check_out_picks_the_open_session() {
        // 13:30 is in the morning grace period and the afternoon window.
        let windows = AttendanceWindows::default();
        let mut row = empty_row(day());
        row.morning_check_in = Some(at(8, 0));
        row.morning_check_out = Some(at(12, 0));
        row.afternoon_check_in = Some(at(13, 0));

        assert_eq!(
            resolve_session(&windows, MarkKind::CheckOut, t(13, 30), Some(&row)).unwrap(),
            Session::Afternoon
        );
    }

    #[test]
    fn repeated_check_out_conflicts() {
        let windows = AttendanceWindows::default();
        let mut row = empty_row(day());
        row.morning_check_in = Some(at(8, 0));
        row.morning_check_out = Some(at(11, 0));

        assert!(matches!(
            resolve_session(&windows, MarkKind::CheckOut, t(11, 30), Some(&row)),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn supervisor_scope_overrides_requested_department() {
        let query = AttendanceQuery {
            user_id: None,
            department_id: Some(9),
            status: Some(AttendanceStatus::Late),
            from: Some(day()),
            to: None,
            page: None,
            per_page: None,
        };
        let (conditions, args) = list_filters(&query, Some(2));
        assert_eq!(conditions, vec!["u.department_id = ?", "a.status = ?", "a.date >= ?"]);
        assert_eq!(
            args,
            vec![
                FilterValue::U64(2),
                FilterValue::Str("LATE".to_string()),
                FilterValue::Date(day()),
            ]
        );
    }

    #[test]
    fn absentees_skip_users_hired_later() {
        assert!(ABSENTEES_SQL.contains("u.hire_date IS NULL OR u.hire_date <= ?"));
        // date, leave status, two leave bounds, two statuses, existing row, hire date
        assert_eq!(ABSENTEES_SQL.matches('?').count(), 8);
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let rows = vec![ExportRow {
            date: day(),
            user_id: 7,
            name: "Doe, Jane".to_string(),
            department: None,
            morning_check_in: Some(at(8, 10)),
            morning_check_out: Some(at(12, 0)),
            afternoon_check_in: None,
            afternoon_check_out: None,
            is_late_morning: true,
            is_late_afternoon: false,
            is_early_morning: false,
            is_early_afternoon: false,
            status: "LATE".to_string(),
        }];

        let csv = String::from_utf8(render_csv(&rows).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "date,user_id,name,department,morning_check_in,morning_check_out,afternoon_check_in,afternoon_check_out,late,early,status"
        );
        assert_eq!(lines[1], "2026-10-19,7,\"Doe, Jane\",,08:10:00,12:00:00,,,true,false,LATE");
    }
}
