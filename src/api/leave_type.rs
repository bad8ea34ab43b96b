use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult, validate},
    model::leave_type::LeaveType,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, Validate, ToSchema)]
pub struct LeaveTypePayload {
    #[schema(example = "Sick")]
    #[validate(length(min = 1, max = 80, message = "name must be 1-80 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 10)]
    #[validate(range(min = 1, max = 366))]
    pub max_days_per_year: Option<u32>,
}

pub async fn fetch_leave_type(pool: &MySqlPool, id: u64) -> AppResult<Option<LeaveType>> {
    Ok(sqlx::query_as::<_, LeaveType>("SELECT * FROM leave_types WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/leave-types",
    responses((status = 200, description = "All leave types", body = [LeaveType])),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn list_leave_types(_auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let types = sqlx::query_as::<_, LeaveType>("SELECT * FROM leave_types ORDER BY name")
        .fetch_all(pool.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(types))
}

#[utoipa::path(
    post,
    path = "/api/leave-types",
    request_body = LeaveTypePayload,
    responses(
        (status = 201, description = "Leave type created"),
        (status = 409, description = "Name already used")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn create_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<LeaveTypePayload>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    validate(&*payload)?;

    let result = sqlx::query(
        "INSERT INTO leave_types (name, description, max_days_per_year) VALUES (?, ?, ?)",
    )
    .bind(payload.name.trim())
    .bind(payload.description.as_deref())
    .bind(payload.max_days_per_year)
    .execute(pool.get_ref())
    .await
    .map_err(|e| AppError::db(e, "Leave type name already used"))?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave type created",
        "id": result.last_insert_id()
    })))
}

#[utoipa::path(
    put,
    path = "/api/leave-types/{leave_type_id}",
    params(("leave_type_id" = u64, Path, description = "Leave type ID")),
    request_body = LeaveTypePayload,
    responses(
        (status = 200, description = "Leave type updated"),
        (status = 404, description = "Leave type not found")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn update_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<LeaveTypePayload>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    validate(&*payload)?;
    let id = path.into_inner();

    if fetch_leave_type(pool.get_ref(), id).await?.is_none() {
        return Err(AppError::NotFound("Leave type not found".to_string()));
    }

    sqlx::query("UPDATE leave_types SET name = ?, description = ?, max_days_per_year = ? WHERE id = ?")
        .bind(payload.name.trim())
        .bind(payload.description.as_deref())
        .bind(payload.max_days_per_year)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| AppError::db(e, "Leave type name already used"))?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Leave type updated" })))
}

/// Refused while leave requests still reference the type.
#[utoipa::path(
    delete,
    path = "/api/leave-types/{leave_type_id}",
    params(("leave_type_id" = u64, Path, description = "Leave type ID")),
    responses(
        (status = 200, description = "Leave type deleted"),
        (status = 404, description = "Leave type not found"),
        (status = 409, description = "Leave type in use")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn delete_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let id = path.into_inner();

    let in_use = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM leave_requests WHERE leave_type_id = ?)",
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;
    if in_use {
        return Err(AppError::Conflict("Leave type is referenced by leave requests".to_string()));
    }

    let result = sqlx::query("DELETE FROM leave_types WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Leave type not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Leave type deleted" })))
}
