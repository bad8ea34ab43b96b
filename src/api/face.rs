use crate::{
    api::{
        attendance::{MarkResponse, record_mark},
        user::fetch_user,
    },
    auth::auth::AuthUser,
    config::Config,
    error::{AppError, AppResult},
    rules::{
        face::{DescriptorError, FaceMatch, check_descriptor, compare},
        window::MarkKind,
    },
    settings::Settings,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info, warn};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DescriptorPayload {
    /// 128 values from the client-side face model
    pub descriptor: Vec<f32>,
    /// Target user; HR Admin only. Defaults to the caller.
    pub user_id: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ComparePayload {
    pub descriptor: Vec<f32>,
    /// Attendance mark recorded when the face matches
    pub kind: MarkKind,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompareResponse {
    pub matched: bool,
    pub distance: f64,
    pub threshold: f64,
    /// Present only when the face matched
    pub attendance: Option<MarkResponse>,
}

fn descriptor_error(e: DescriptorError) -> AppError {
    AppError::field("descriptor", e.to_string())
}

#[utoipa::path(
    put,
    path = "/api/face/descriptor",
    request_body = DescriptorPayload,
    responses(
        (status = 200, description = "Descriptor registered"),
        (status = 403, description = "Only HR Admin may register for another user"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Malformed descriptor")
    ),
    tag = "Face",
    security(("bearer_auth" = []))
)]
pub async fn register_descriptor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<DescriptorPayload>,
) -> AppResult<HttpResponse> {
    let user_id = payload.user_id.unwrap_or(auth.user_id);
    if user_id != auth.user_id {
        auth.require_admin()?;
    }
    check_descriptor(&payload.descriptor).map_err(descriptor_error)?;

    let user = fetch_user(pool.get_ref(), user_id).await?;

    let encoded = serde_json::to_string(&payload.descriptor).map_err(|e| {
        error!(error = %e, "Failed to encode face descriptor");
        AppError::Internal
    })?;

    sqlx::query("UPDATE users SET face_descriptor = ? WHERE id = ?")
        .bind(encoded)
        .bind(user.id)
        .execute(pool.get_ref())
        .await?;

    info!(user_id, by = auth.user_id, "Face descriptor registered");
    Ok(HttpResponse::Ok().json(json!({ "message": "Face descriptor registered" })))
}

/// Compares a live descriptor with the caller's registered one and records
/// the requested attendance mark on a match.
#[utoipa::path(
    post,
    path = "/api/face/compare",
    request_body = ComparePayload,
    responses(
        (status = 200, description = "Comparison result", body = CompareResponse),
        (status = 400, description = "No descriptor registered, or the mark was refused"),
        (status = 403, description = "Face recognition disabled"),
        (status = 422, description = "Malformed descriptor")
    ),
    tag = "Face",
    security(("bearer_auth" = []))
)]
pub async fn compare_face(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings: web::Data<Settings>,
    config: web::Data<Config>,
    payload: web::Json<ComparePayload>,
) -> AppResult<HttpResponse> {
    if !settings.face_recognition_enabled().await {
        return Err(AppError::Forbidden("Face recognition is disabled".to_string()));
    }
    check_descriptor(&payload.descriptor).map_err(descriptor_error)?;

    let user = fetch_user(pool.get_ref(), auth.user_id).await?;
    let stored = user
        .descriptor()
        .ok_or_else(|| AppError::BadRequest("No face descriptor registered".to_string()))?;

    let threshold = settings.face_match_threshold().await;
    let FaceMatch { distance, matched } = compare(&payload.descriptor, &stored, threshold).map_err(|e| {
        // The probe was checked above, so the stored value is the bad one.
        warn!(user_id = user.id, error = %e, "Stored face descriptor is malformed");
        AppError::BadRequest("Registered face descriptor is invalid; register again".to_string())
    })?;

    if !matched {
        info!(user_id = user.id, distance, "Face not recognized");
        return Ok(HttpResponse::Ok().json(CompareResponse {
            matched,
            distance,
            threshold,
            attendance: None,
        }));
    }

    let mark = record_mark(pool.get_ref(), &settings, &config, user.id, payload.kind).await?;

    Ok(HttpResponse::Ok().json(CompareResponse {
        matched,
        distance,
        threshold,
        attendance: Some(mark),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::face::DESCRIPTOR_LEN;

    #[test]
    fn descriptor_errors_are_field_errors() {
        let Err(e) = check_descriptor(&[0.1; 3]).map_err(descriptor_error) else {
            panic!("short descriptor accepted");
        };
        let AppError::Validation(errors) = e else {
            panic!("expected validation error");
        };
        assert!(errors["descriptor"][0].contains(&DESCRIPTOR_LEN.to_string()));
    }

    #[test]
    fn compare_payload_requires_kind() {
        let body = serde_json::json!({ "descriptor": vec![0.0f32; 4], "kind": "check_out" });
        let payload: ComparePayload = serde_json::from_value(body).unwrap();
        assert_eq!(payload.kind, MarkKind::CheckOut);

        let missing = serde_json::json!({ "descriptor": vec![0.0f32; 4] });
        assert!(serde_json::from_value::<ComparePayload>(missing).is_err());
    }
}
