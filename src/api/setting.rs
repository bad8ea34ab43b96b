use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult, FieldErrors},
    model::setting::{SettingResponse, SettingType},
    settings::{KNOWN_KEYS, SettingValue, Settings, check_known, default_for},
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveSetting {
    #[schema(example = "BOOLEAN")]
    pub value_type: SettingType,
    #[schema(value_type = Object, example = json!(true))]
    pub value: serde_json::Value,
}

fn check_key(key: &str) -> AppResult<()> {
    let well_formed = !key.is_empty()
        && key.len() <= 120
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.');
    if well_formed {
        Ok(())
    } else {
        Err(AppError::field(
            "key",
            "key must be 1-120 characters of a-z, 0-9, '_' or '.'",
        ))
    }
}

fn problems_to_errors(problems: Vec<(String, String)>) -> AppError {
    let mut errors = FieldErrors::new();
    for (field, message) in problems {
        errors.entry(field).or_default().push(message);
    }
    AppError::Validation(errors)
}

fn setting_response(key: &str, value: SettingValue) -> SettingResponse {
    SettingResponse {
        key: key.to_string(),
        value_type: value.value_type(),
        value: value.to_json(),
        updated_at: None,
    }
}

fn storage_error(e: sqlx::Error) -> AppError {
    error!(error = %e, "Settings storage failed");
    AppError::Internal
}

/// Stored settings, plus defaults for known keys never saved
#[utoipa::path(
    get,
    path = "/api/settings",
    responses((status = 200, description = "All settings", body = [SettingResponse])),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn list_settings(_auth: AuthUser, settings: web::Data<Settings>) -> AppResult<HttpResponse> {
    let mut listed = settings.list().await.map_err(storage_error)?;

    for key in KNOWN_KEYS {
        if listed.iter().any(|s| s.key == key) {
            continue;
        }
        if let Some(value) = default_for(key) {
            listed.push(setting_response(key, value));
        }
    }
    listed.sort_by(|a, b| a.key.cmp(&b.key));

    Ok(HttpResponse::Ok().json(listed))
}

#[utoipa::path(
    get,
    path = "/api/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 200, description = "Setting value", body = SettingResponse),
        (status = 404, description = "Unknown setting")
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn get_setting(
    _auth: AuthUser,
    settings: web::Data<Settings>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let key = path.into_inner();

    let value = settings
        .get(&key)
        .await
        .map_err(storage_error)?
        .or_else(|| default_for(&key))
        .ok_or_else(|| AppError::NotFound("Setting not found".to_string()))?;

    Ok(HttpResponse::Ok().json(setting_response(&key, value)))
}

/// Create or replace a setting
#[utoipa::path(
    put,
    path = "/api/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    request_body = SaveSetting,
    responses(
        (status = 200, description = "Setting saved"),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Value does not match its type or key")
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn save_setting(
    auth: AuthUser,
    settings: web::Data<Settings>,
    path: web::Path<String>,
    payload: web::Json<SaveSetting>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let key = path.into_inner();
    check_key(&key)?;

    let SaveSetting { value_type, value } = payload.into_inner();
    let value = SettingValue::from_json(value_type, value).map_err(|e| AppError::field("value", e))?;
    check_known(&key, &value).map_err(problems_to_errors)?;

    settings.save(&key, &value).await.map_err(storage_error)?;

    info!(key = %key, value_type = %value_type, by = auth.user_id, "Setting saved");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Setting saved",
        "key": key,
        "value": value.to_json()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{FACE_MATCH_THRESHOLD, lazy_settings};
    use crate::{auth::auth::caller, model::role::Role};
    use pretty_assertions::assert_eq;

    #[test]
    fn keys_are_restricted() {
        assert!(check_key("face_match_threshold").is_ok());
        assert!(check_key("ui.theme").is_ok());
        assert!(check_key("").is_err());
        assert!(check_key("Bad Key").is_err());
        assert!(check_key(&"k".repeat(121)).is_err());
    }

    #[test]
    fn problems_group_by_field() {
        let AppError::Validation(errors) = problems_to_errors(vec![
            ("value".to_string(), "a".to_string()),
            ("value".to_string(), "b".to_string()),
        ]) else {
            panic!("expected validation error");
        };
        assert_eq!(errors["value"], vec!["a".to_string(), "b".to_string()]);
    }

    #[actix_web::test]
    async fn only_admins_save() {
        let resp = save_setting(
            caller(Role::Supervisor, 2, Some(1)),
            web::Data::new(lazy_settings()),
            web::Path::from(FACE_MATCH_THRESHOLD.to_string()),
            web::Json(SaveSetting {
                value_type: SettingType::Number,
                value: json!(0.4),
            }),
        )
        .await;
        assert!(matches!(resp, Err(AppError::Forbidden(_))));
    }

    #[actix_web::test]
    async fn mistyped_known_key_is_unprocessable() {
        let resp = save_setting(
            caller(Role::Admin, 1, None),
            web::Data::new(lazy_settings()),
            web::Path::from(FACE_MATCH_THRESHOLD.to_string()),
            web::Json(SaveSetting {
                value_type: SettingType::String,
                value: json!("high"),
            }),
        )
        .await;
        let Err(AppError::Validation(errors)) = resp else {
            panic!("expected validation error");
        };
        assert!(errors.contains_key("value_type"));
    }

    #[actix_web::test]
    async fn unsaved_known_key_reads_its_default() {
        let settings = lazy_settings();
        settings.remember(FACE_MATCH_THRESHOLD, None).await;
        let resp = get_setting(
            caller(Role::Employee, 3, None),
            web::Data::new(settings),
            web::Path::from(FACE_MATCH_THRESHOLD.to_string()),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    }
}
