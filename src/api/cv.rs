use crate::{
    api::user::fetch_user,
    auth::auth::AuthUser,
    config::Config,
    error::{AppError, AppResult},
};
use actix_web::{HttpResponse, http::header, web};
use serde_json::json;
use sqlx::MySqlPool;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Rejects empty, oversized or non-PDF uploads.
pub fn check_pdf(body: &[u8], max_bytes: usize) -> AppResult<()> {
    if body.is_empty() {
        return Err(AppError::field("cv", "file is empty"));
    }
    if body.len() > max_bytes {
        return Err(AppError::field("cv", format!("file exceeds {max_bytes} bytes")));
    }
    if !body.starts_with(PDF_MAGIC) {
        return Err(AppError::field("cv", "file must be a PDF"));
    }
    Ok(())
}

fn cv_file(dir: &str, user_id: u64) -> PathBuf {
    Path::new(dir).join(format!("{user_id}.pdf"))
}

fn io_error(e: impl std::fmt::Display) -> AppError {
    error!(error = %e, "CV storage failed");
    AppError::Internal
}

/// Deletes the stored CV of `user_id`. Returns whether a file was removed.
pub async fn remove_cv(dir: &str, user_id: u64) -> AppResult<bool> {
    let file = cv_file(dir, user_id);
    match web::block(move || std::fs::remove_file(file)).await.map_err(io_error)? {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(e)),
    }
}

/// Upload a CV (raw PDF body)
#[utoipa::path(
    put,
    path = "/api/users/{user_id}/cv",
    params(("user_id" = u64, Path, description = "User ID")),
    request_body(content = String, content_type = "application/pdf", description = "PDF file"),
    responses(
        (status = 200, description = "CV stored"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Not a PDF or too large")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn upload_cv(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    if user_id != auth.user_id {
        auth.require_admin()?;
    }
    check_pdf(&body, config.cv_max_bytes)?;
    let user = fetch_user(pool.get_ref(), user_id).await?;

    let dir = config.cv_dir.clone();
    let file = cv_file(&dir, user.id);
    let size = body.len();
    web::block(move || {
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&file, &body)
    })
    .await
    .map_err(io_error)?
    .map_err(io_error)?;

    sqlx::query("UPDATE users SET cv_path = ? WHERE id = ?")
        .bind(format!("{}.pdf", user.id))
        .bind(user.id)
        .execute(pool.get_ref())
        .await?;

    info!(user_id, size, by = auth.user_id, "CV stored");
    Ok(HttpResponse::Ok().json(json!({ "message": "CV uploaded" })))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/cv",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "The PDF", content_type = "application/pdf", body = String),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No CV uploaded")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn download_cv(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let user = fetch_user(pool.get_ref(), path.into_inner()).await?;
    if !auth.can_view_user(user.id, user.department_id) {
        return Err(AppError::Forbidden("Not allowed to view this CV".to_string()));
    }

    let Some(stored) = user.cv_path else {
        return Err(AppError::NotFound("No CV uploaded".to_string()));
    };
    let file = Path::new(&config.cv_dir).join(stored);

    let bytes = web::block(move || std::fs::read(file))
        .await
        .map_err(io_error)?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound("CV file missing".to_string())
            } else {
                io_error(e)
            }
        })?;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"cv-{}.pdf\"", user.id),
        ))
        .body(bytes))
}
