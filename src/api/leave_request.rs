use crate::{
    api::{event::blocking_spans, leave_type::fetch_leave_type},
    auth::auth::AuthUser,
    config::Config,
    error::{AppError, AppResult, validate},
    model::{
        leave_request::{LeaveRequest, LeaveStatus},
        leave_type::LeaveType,
        role::Role,
    },
    rules::recurrence::{EventSpan, working_days_between},
    settings::Settings,
    utils::db_utils::{FilterValue, bind_as, bind_scalar, paginate},
};
use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Longest single request, in calendar days.
const MAX_REQUEST_DAYS: i64 = 366;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family event")]
    #[validate(length(max = 1000, message = "reason must be at most 1000 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaveFilter {
    /// Filter by requester
    pub user_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub leave_type_id: Option<u64>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
    /// Defaults to the caller
    pub user_id: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceEntry {
    pub leave_type_id: u64,
    pub name: String,
    pub max_days_per_year: Option<u32>,
    pub approved_days: u32,
    pub pending_days: u32,
    /// `null` for unlimited types
    pub remaining_days: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// Which approval step a decision applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Supervisor,
    Final,
}

fn clip_to_year(start: NaiveDate, end: NaiveDate, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let from = start.max(NaiveDate::from_ymd_opt(year, 1, 1)?);
    let to = end.min(NaiveDate::from_ymd_opt(year, 12, 31)?);
    (from <= to).then_some((from, to))
}

/// Working days of `[start, end]` falling in `year`.
pub fn days_in_year(start: NaiveDate, end: NaiveDate, year: i32, spans: &[EventSpan]) -> u32 {
    clip_to_year(start, end, year)
        .map(|(from, to)| working_days_between(from, to, spans))
        .unwrap_or(0)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub approved: u32,
    pub pending: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.approved + self.pending
    }
}

/// Approved and pending working days of `requests` in `year`. Rejected
/// requests do not count.
pub fn usage(requests: &[LeaveRequest], year: i32, spans: &[EventSpan]) -> Usage {
    requests.iter().fold(Usage::default(), |mut acc, request| {
        let days = days_in_year(request.start_date, request.end_date, year, spans);
        match request.status.parse::<LeaveStatus>() {
            Ok(LeaveStatus::Approved) => acc.approved += days,
            Ok(LeaveStatus::Pending) => acc.pending += days,
            _ => {}
        }
        acc
    })
}

/// Decides which stage the caller acts on, or why they may not.
pub fn decision_stage(
    auth: &AuthUser,
    request: &LeaveRequest,
    requester_department: Option<u64>,
    decision: Decision,
) -> AppResult<Stage> {
    if request.status != LeaveStatus::Pending.as_ref() {
        return Err(AppError::Conflict("Leave request already processed".to_string()));
    }
    if request.user_id == auth.user_id {
        return Err(AppError::Forbidden("Cannot decide on your own leave request".to_string()));
    }

    let supervisor_pending = request.supervisor_status.as_deref() == Some(LeaveStatus::Pending.as_ref());

    if auth.is_admin() {
        if supervisor_pending && decision == Decision::Approve {
            return Err(AppError::Conflict("Awaiting supervisor approval".to_string()));
        }
        return Ok(Stage::Final);
    }

    if auth.is_supervisor() && auth.can_oversee(requester_department) {
        return if supervisor_pending {
            Ok(Stage::Supervisor)
        } else {
            Err(AppError::Forbidden("Final decision belongs to HR Admin".to_string()))
        };
    }

    Err(AppError::Forbidden("Not allowed to decide on this leave request".to_string()))
}

async fn load_request(pool: &MySqlPool, leave_id: u64) -> AppResult<(LeaveRequest, Option<u64>)> {
    let request = sqlx::query_as::<_, LeaveRequest>("SELECT * FROM leave_requests WHERE id = ?")
        .bind(leave_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".to_string()))?;

    let department = sqlx::query_scalar::<_, Option<u64>>("SELECT department_id FROM users WHERE id = ?")
        .bind(request.user_id)
        .fetch_optional(pool)
        .await?
        .flatten();

    Ok((request, department))
}

/// Pending and approved requests of `user_id` touching `[from, to]`.
async fn active_requests(
    pool: &MySqlPool,
    user_id: u64,
    leave_type_id: Option<u64>,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<Vec<LeaveRequest>> {
    let mut sql = String::from(
        "SELECT * FROM leave_requests
         WHERE user_id = ? AND status IN ('PENDING', 'APPROVED') AND start_date <= ? AND end_date >= ?",
    );
    if leave_type_id.is_some() {
        sql.push_str(" AND leave_type_id = ?");
    }

    let mut query = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(user_id)
        .bind(to)
        .bind(from);
    if let Some(leave_type_id) = leave_type_id {
        query = query.bind(leave_type_id);
    }
    Ok(query.fetch_all(pool).await?)
}

fn year_range(first: i32, last: i32) -> AppResult<(NaiveDate, NaiveDate)> {
    let from = NaiveDate::from_ymd_opt(first, 1, 1);
    let to = NaiveDate::from_ymd_opt(last, 12, 31);
    from.zip(to)
        .ok_or_else(|| AppError::field("year", "year out of range"))
}

/// Checks the request against the yearly allowance of its type, year by year.
fn check_allowance(
    leave_type: &LeaveType,
    payload: &CreateLeave,
    existing: &[LeaveRequest],
    spans: &[EventSpan],
) -> AppResult<()> {
    let Some(max) = leave_type.max_days_per_year else {
        return Ok(());
    };

    for year in payload.start_date.year()..=payload.end_date.year() {
        let requested = days_in_year(payload.start_date, payload.end_date, year, spans);
        let used = usage(existing, year, spans).total();
        if used + requested > max {
            return Err(AppError::field(
                "leave_type_id",
                format!(
                    "{} allowance exceeded for {year}: {used} of {max} days already used or pending, {requested} requested",
                    leave_type.name
                ),
            ));
        }
    }
    Ok(())
}

/// Submit a leave request
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted", "id": 4, "working_days": 3
        })),
        (status = 409, description = "Overlaps an existing request"),
        (status = 422, description = "Invalid range, unknown type or allowance exceeded")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
#[instrument(name = "leave_create", skip(auth, pool, settings, payload), fields(user_id = auth.user_id))]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings: web::Data<Settings>,
    payload: web::Json<CreateLeave>,
) -> AppResult<HttpResponse> {
    validate(&*payload)?;

    if payload.end_date < payload.start_date {
        return Err(AppError::field("end_date", "end_date must not be before start_date"));
    }
    if (payload.end_date - payload.start_date).num_days() >= MAX_REQUEST_DAYS {
        return Err(AppError::field(
            "end_date",
            format!("a request may span at most {MAX_REQUEST_DAYS} days"),
        ));
    }

    let leave_type = fetch_leave_type(pool.get_ref(), payload.leave_type_id)
        .await?
        .ok_or_else(|| AppError::field("leave_type_id", "leave type does not exist"))?;

    let (from, to) = year_range(payload.start_date.year(), payload.end_date.year())?;
    let spans = blocking_spans(pool.get_ref(), from, to).await?;

    let working_days = working_days_between(payload.start_date, payload.end_date, &spans);
    if working_days == 0 {
        return Err(AppError::field("start_date", "range contains no working days"));
    }

    let overlapping = active_requests(pool.get_ref(), auth.user_id, None, payload.start_date, payload.end_date).await?;
    if let Some(clash) = overlapping.first() {
        return Err(AppError::Conflict(format!(
            "Overlaps leave request {} ({} to {})",
            clash.id, clash.start_date, clash.end_date
        )));
    }

    let existing = active_requests(pool.get_ref(), auth.user_id, Some(leave_type.id), from, to).await?;
    check_allowance(&leave_type, &payload, &existing, &spans)?;

    let needs_supervisor = auth.role == Role::Employee
        && auth.department_id.is_some()
        && settings.leave_supervisor_approval().await;
    let supervisor_status = needs_supervisor.then_some(LeaveStatus::Pending.as_ref());

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests (user_id, leave_type_id, start_date, end_date, reason, status, supervisor_status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(leave_type.id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.reason.as_deref())
    .bind(LeaveStatus::Pending.as_ref())
    .bind(supervisor_status)
    .execute(pool.get_ref())
    .await?;

    info!(leave_id = result.last_insert_id(), working_days, needs_supervisor, "Leave request submitted");

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request submitted",
        "id": result.last_insert_id(),
        "working_days": working_days
    })))
}

/// Leave requests visible to the caller
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses((status = 200, description = "Paginated leave requests", body = LeaveListResponse)),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> AppResult<HttpResponse> {
    let (page, per_page, offset) = paginate(query.page, query.per_page, 20);

    let mut conditions: Vec<&str> = Vec::new();
    let mut args: Vec<FilterValue> = Vec::new();

    match auth.role {
        Role::Admin => {}
        Role::Supervisor => {
            conditions.push("(u.department_id = ? OR l.user_id = ?)");
            args.push(FilterValue::U64(auth.department_id.unwrap_or_default()));
            args.push(FilterValue::U64(auth.user_id));
        }
        Role::Employee => {
            conditions.push("l.user_id = ?");
            args.push(FilterValue::U64(auth.user_id));
        }
    }

    if let Some(user_id) = query.user_id {
        conditions.push("l.user_id = ?");
        args.push(FilterValue::U64(user_id));
    }
    if let Some(status) = query.status {
        conditions.push("l.status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }
    if let Some(leave_type_id) = query.leave_type_id {
        conditions.push("l.leave_type_id = ?");
        args.push(FilterValue::U64(leave_type_id));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!(
        "SELECT COUNT(*) FROM leave_requests l JOIN users u ON u.id = l.user_id {}",
        where_clause
    );
    let total = bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql), &args)
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT l.* FROM leave_requests l JOIN users u ON u.id = l.user_id {} ORDER BY l.created_at DESC, l.id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, "Fetching leave requests");

    let data = bind_as(sqlx::query_as::<_, LeaveRequest>(&data_sql), &args)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let (request, department) = load_request(pool.get_ref(), path.into_inner()).await?;
    if !auth.can_view_user(request.user_id, department) {
        return Err(AppError::Forbidden("Not allowed to view this leave request".to_string()));
    }
    Ok(HttpResponse::Ok().json(request))
}

/// Withdraw one's own pending request
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request cancelled"),
        (status = 403, description = "Not the requester"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let leave_id = path.into_inner();
    let (request, _) = load_request(pool.get_ref(), leave_id).await?;

    if request.user_id != auth.user_id {
        return Err(AppError::Forbidden("Only the requester can cancel".to_string()));
    }

    let result = sqlx::query("DELETE FROM leave_requests WHERE id = ? AND user_id = ? AND status = ?")
        .bind(leave_id)
        .bind(auth.user_id)
        .bind(LeaveStatus::Pending.as_ref())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("Leave request already processed".to_string()));
    }

    info!(leave_id, user_id = auth.user_id, "Leave request cancelled");
    Ok(HttpResponse::Ok().json(json!({ "message": "Leave request cancelled" })))
}

async fn decide(auth: &AuthUser, pool: &MySqlPool, leave_id: u64, decision: Decision) -> AppResult<&'static str> {
    let (request, department) = load_request(pool, leave_id).await?;
    let stage = decision_stage(auth, &request, department, decision)?;

    let pending = LeaveStatus::Pending.as_ref();
    let result = match (stage, decision) {
        (Stage::Final, Decision::Approve) => {
            sqlx::query(
                "UPDATE leave_requests SET status = ?, approved_by = ?
                 WHERE id = ? AND status = ? AND (supervisor_status IS NULL OR supervisor_status <> ?)",
            )
            .bind(LeaveStatus::Approved.as_ref())
            .bind(auth.user_id)
            .bind(leave_id)
            .bind(pending)
            .bind(pending)
            .execute(pool)
            .await?
        }
        (Stage::Final, Decision::Reject) => {
            sqlx::query("UPDATE leave_requests SET status = ?, approved_by = ? WHERE id = ? AND status = ?")
                .bind(LeaveStatus::Rejected.as_ref())
                .bind(auth.user_id)
                .bind(leave_id)
                .bind(pending)
                .execute(pool)
                .await?
        }
        (Stage::Supervisor, Decision::Approve) => {
            sqlx::query(
                "UPDATE leave_requests SET supervisor_status = ?, supervisor_id = ?
                 WHERE id = ? AND status = ? AND supervisor_status = ?",
            )
            .bind(LeaveStatus::Approved.as_ref())
            .bind(auth.user_id)
            .bind(leave_id)
            .bind(pending)
            .bind(pending)
            .execute(pool)
            .await?
        }
        // A supervisor rejection is final.
        (Stage::Supervisor, Decision::Reject) => {
            sqlx::query(
                "UPDATE leave_requests SET supervisor_status = ?, status = ?, supervisor_id = ?
                 WHERE id = ? AND status = ? AND supervisor_status = ?",
            )
            .bind(LeaveStatus::Rejected.as_ref())
            .bind(LeaveStatus::Rejected.as_ref())
            .bind(auth.user_id)
            .bind(leave_id)
            .bind(pending)
            .bind(pending)
            .execute(pool)
            .await?
        }
    };

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("Leave request already processed".to_string()));
    }

    info!(leave_id, by = auth.user_id, ?stage, ?decision, "Leave decision recorded");

    Ok(match (stage, decision) {
        (Stage::Final, Decision::Approve) => "Leave approved",
        (Stage::Final, Decision::Reject) | (Stage::Supervisor, Decision::Reject) => "Leave rejected",
        (Stage::Supervisor, Decision::Approve) => "Leave approved by supervisor; awaiting HR Admin",
    })
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Approval recorded", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed or awaiting supervisor approval")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let message = decide(&auth, pool.get_ref(), path.into_inner(), Decision::Approve).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Rejection recorded", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let message = decide(&auth, pool.get_ref(), path.into_inner(), Decision::Reject).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}

/// Per-type allowance and usage for one year
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Leave balance", body = [BalanceEntry]),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<BalanceQuery>,
) -> AppResult<HttpResponse> {
    let user_id = query.user_id.unwrap_or(auth.user_id);
    if user_id != auth.user_id {
        let department = sqlx::query_scalar::<_, Option<u64>>("SELECT department_id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool.get_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if !auth.can_view_user(user_id, department) {
            return Err(AppError::Forbidden("Not allowed to view this balance".to_string()));
        }
    }

    let year = query.year.unwrap_or_else(|| config.office_now().year());
    let (from, to) = year_range(year, year)?;

    let spans = blocking_spans(pool.get_ref(), from, to).await?;
    let requests = active_requests(pool.get_ref(), user_id, None, from, to).await?;
    let types = sqlx::query_as::<_, LeaveType>("SELECT * FROM leave_types ORDER BY name")
        .fetch_all(pool.get_ref())
        .await?;

    let balance: Vec<BalanceEntry> = types
        .into_iter()
        .map(|leave_type| {
            let of_type: Vec<LeaveRequest> = requests
                .iter()
                .filter(|r| r.leave_type_id == leave_type.id)
                .cloned()
                .collect();
            let used = usage(&of_type, year, &spans);
            BalanceEntry {
                leave_type_id: leave_type.id,
                remaining_days: leave_type
                    .max_days_per_year
                    .map(|max| i64::from(max) - i64::from(used.total())),
                name: leave_type.name,
                max_days_per_year: leave_type.max_days_per_year,
                approved_days: used.approved,
                pending_days: used.pending,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::auth::caller;
    use crate::model::event::{EventType, RecurrencePattern};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekends() -> Vec<EventSpan> {
        // 2026-01-03 is a Saturday
        [d(2026, 1, 3), d(2026, 1, 4)]
            .into_iter()
            .map(|start| EventSpan {
                event_type: EventType::Weekend,
                start,
                end: None,
                recurrence: Some(RecurrencePattern::Weekly),
            })
            .collect()
    }

    fn request(status: LeaveStatus, supervisor: Option<LeaveStatus>, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            user_id: 7,
            leave_type_id: 1,
            start_date: start,
            end_date: end,
            reason: None,
            status: status.to_string(),
            supervisor_status: supervisor.map(|s| s.to_string()),
            supervisor_id: None,
            approved_by: None,
            created_at: None,
        }
    }

    fn pending() -> LeaveRequest {
        request(LeaveStatus::Pending, None, d(2026, 10, 19), d(2026, 10, 21))
    }

    #[test]
    fn usage_counts_only_working_days_in_the_year() {
        let requests = vec![
            // Thu 2026-12-31 .. Fri 2027-01-08: only the 31st falls in 2026.
            request(LeaveStatus::Approved, None, d(2026, 12, 31), d(2027, 1, 8)),
            // Mon..Sun: five working days.
            request(LeaveStatus::Pending, None, d(2026, 10, 12), d(2026, 10, 18)),
            request(LeaveStatus::Rejected, None, d(2026, 3, 2), d(2026, 3, 6)),
        ];
        assert_eq!(usage(&requests, 2026, &weekends()), Usage { approved: 1, pending: 5 });
        assert_eq!(usage(&requests, 2027, &weekends()), Usage { approved: 6, pending: 0 });
    }

    #[test]
    fn allowance_includes_pending_days() {
        let leave_type = LeaveType {
            id: 1,
            name: "Sick".to_string(),
            description: None,
            max_days_per_year: Some(7),
        };
        let existing = vec![request(LeaveStatus::Pending, None, d(2026, 10, 12), d(2026, 10, 16))];
        let mut payload = CreateLeave {
            leave_type_id: 1,
            start_date: d(2026, 10, 19),
            end_date: d(2026, 10, 20),
            reason: None,
        };
        assert!(check_allowance(&leave_type, &payload, &existing, &weekends()).is_ok());

        payload.end_date = d(2026, 10, 21);
        let Err(AppError::Validation(errors)) = check_allowance(&leave_type, &payload, &existing, &weekends()) else {
            panic!("allowance should be exceeded");
        };
        assert!(errors.contains_key("leave_type_id"));

        let unlimited = LeaveType { max_days_per_year: None, ..leave_type };
        assert!(check_allowance(&unlimited, &payload, &existing, &weekends()).is_ok());
    }

    #[rstest]
    #[case(Role::Admin, Some(2), Decision::Approve, Ok(Stage::Final))]
    #[case(Role::Admin, None, Decision::Reject, Ok(Stage::Final))]
    #[case(Role::Supervisor, Some(2), Decision::Approve, Err("forbidden"))]
    #[case(Role::Employee, Some(2), Decision::Approve, Err("forbidden"))]
    fn without_supervisor_stage_admin_decides(
        #[case] role: Role,
        #[case] department: Option<u64>,
        #[case] decision: Decision,
        #[case] expected: Result<Stage, &str>,
    ) {
        let actor = caller(role, 1, department);
        let outcome = decision_stage(&actor, &pending(), Some(2), decision);
        match expected {
            Ok(stage) => assert_eq!(outcome.unwrap(), stage),
            Err(_) => assert!(matches!(outcome, Err(AppError::Forbidden(_)))),
        }
    }

    #[test]
    fn supervisor_stage_comes_first() {
        let request = request(
            LeaveStatus::Pending,
            Some(LeaveStatus::Pending),
            d(2026, 10, 19),
            d(2026, 10, 21),
        );

        let admin = caller(Role::Admin, 1, None);
        assert!(matches!(
            decision_stage(&admin, &request, Some(2), Decision::Approve),
            Err(AppError::Conflict(_))
        ));
        assert_eq!(decision_stage(&admin, &request, Some(2), Decision::Reject).unwrap(), Stage::Final);

        let own_supervisor = caller(Role::Supervisor, 2, Some(2));
        assert_eq!(
            decision_stage(&own_supervisor, &request, Some(2), Decision::Approve).unwrap(),
            Stage::Supervisor
        );

        let other_supervisor = caller(Role::Supervisor, 3, Some(5));
        assert!(matches!(
            decision_stage(&other_supervisor, &request, Some(2), Decision::Approve),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn decided_and_own_requests_cannot_be_decided() {
        let admin = caller(Role::Admin, 1, None);
        let approved = request(LeaveStatus::Approved, None, d(2026, 1, 5), d(2026, 1, 5));
        assert!(matches!(
            decision_stage(&admin, &approved, None, Decision::Reject),
            Err(AppError::Conflict(_))
        ));

        let own_admin = caller(Role::Admin, 7, None);
        assert!(matches!(
            decision_stage(&own_admin, &pending(), None, Decision::Approve),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn clipping_respects_year_edges() {
        assert_eq!(clip_to_year(d(2025, 12, 30), d(2026, 1, 2), 2026), Some((d(2026, 1, 1), d(2026, 1, 2))));
        assert_eq!(clip_to_year(d(2025, 12, 30), d(2025, 12, 31), 2026), None);
    }
}
