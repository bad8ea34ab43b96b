use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// Full `users` row. Never serialized directly: it carries the password hash
/// and the face descriptor.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role_id: u8,
    pub department_id: Option<u64>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub face_descriptor: Option<String>,
    pub cv_path: Option<String>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Jane Doe",
        "email": "jane.doe@company.com",
        "role": "EMPLOYEE",
        "department_id": 2,
        "position": "Accountant",
        "phone": "+8801712345678",
        "hire_date": "2024-01-01",
        "is_active": true,
        "has_face": false,
        "has_cv": true
    })
)]
pub struct UserResponse {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department_id: Option<u64>,
    pub position: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = String, format = "date", nullable = true)]
    pub hire_date: Option<NaiveDate>,
    pub is_active: bool,
    /// A face descriptor is registered for this user
    pub has_face: bool,
    pub has_cv: bool,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_id(self.role_id).unwrap_or(Role::Employee)
    }

    /// Stored descriptor, if present and well formed.
    pub fn descriptor(&self) -> Option<Vec<f32>> {
        self.face_descriptor
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            role: user.role(),
            has_face: user.face_descriptor.is_some(),
            has_cv: user.cv_path.is_some(),
            id: user.id,
            name: user.name,
            email: user.email,
            department_id: user.department_id,
            position: user.position,
            phone: user.phone,
            hire_date: user.hire_date,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user() -> User {
    User {
        id: 7,
        name: "Jane Doe".to_string(),
        email: "jane@company.com".to_string(),
        password: "$argon2id$hash".to_string(),
        role_id: 3,
        department_id: Some(2),
        position: None,
        phone: None,
        hire_date: None,
        face_descriptor: Some("[0.5, 0.25]".to_string()),
        cv_path: None,
        is_active: true,
        created_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_hides_secrets() {
        let response = UserResponse::from(sample_user());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("face_descriptor").is_none());
        assert_eq!(json["has_face"], true);
        assert_eq!(json["role"], "EMPLOYEE");
    }

    #[test]
    fn descriptor_parses_stored_json() {
        assert_eq!(sample_user().descriptor(), Some(vec![0.5, 0.25]));

        let mut broken = sample_user();
        broken.face_descriptor = Some("not json".to_string());
        assert_eq!(broken.descriptor(), None);
    }
}
