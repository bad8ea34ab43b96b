use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult, validate},
    model::department::Department,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, MySqlPool};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, Validate, ToSchema)]
pub struct DepartmentPayload {
    #[schema(example = "Finance")]
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: String,
    #[schema(example = "Accounting and payroll")]
    pub description: Option<String>,
}

#[derive(Serialize, FromRow, ToSchema)]
pub struct DepartmentSummary {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    /// Active members
    pub member_count: i64,
}

/// Departments with their member counts
#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, description = "All departments", body = [DepartmentSummary])),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
pub async fn list_departments(_auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let departments = sqlx::query_as::<_, DepartmentSummary>(
        r#"
        SELECT d.id, d.name, d.description,
               CAST(COUNT(u.id) AS SIGNED) AS member_count
        FROM departments d
        LEFT JOIN users u ON u.department_id = d.id AND u.is_active = TRUE
        GROUP BY d.id, d.name, d.description
        ORDER BY d.name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(departments))
}

#[utoipa::path(
    get,
    path = "/api/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department found", body = Department),
        (status = 404, description = "Department not found")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
pub async fn get_department(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let department = sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = ?")
        .bind(path.into_inner())
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

    Ok(HttpResponse::Ok().json(department))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = DepartmentPayload,
    responses(
        (status = 201, description = "Department created"),
        (status = 409, description = "Name already used"),
        (status = 422, description = "Validation failed")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<DepartmentPayload>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    validate(&*payload)?;

    let result = sqlx::query("INSERT INTO departments (name, description) VALUES (?, ?)")
        .bind(payload.name.trim())
        .bind(payload.description.as_deref())
        .execute(pool.get_ref())
        .await
        .map_err(|e| AppError::db(e, "Department name already used"))?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Department created",
        "id": result.last_insert_id()
    })))
}

#[utoipa::path(
    put,
    path = "/api/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    request_body = DepartmentPayload,
    responses(
        (status = 200, description = "Department updated"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Name already used")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<DepartmentPayload>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    validate(&*payload)?;
    let department_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM departments WHERE id = ?)")
        .bind(department_id)
        .fetch_one(pool.get_ref())
        .await?;
    if !exists {
        return Err(AppError::NotFound("Department not found".to_string()));
    }

    sqlx::query("UPDATE departments SET name = ?, description = ? WHERE id = ?")
        .bind(payload.name.trim())
        .bind(payload.description.as_deref())
        .bind(department_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| AppError::db(e, "Department name already used"))?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Department updated" })))
}

/// Refused while users still belong to the department.
#[utoipa::path(
    delete,
    path = "/api/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Department still has members")
    ),
    tag = "Departments",
    security(("bearer_auth" = []))
)]
pub async fn delete_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let department_id = path.into_inner();

    let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE department_id = ?")
        .bind(department_id)
        .fetch_one(pool.get_ref())
        .await?;
    if members > 0 {
        return Err(AppError::Conflict(format!(
            "Department still has {members} member(s)"
        )));
    }

    let result = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(department_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Department not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Department deleted" })))
}
