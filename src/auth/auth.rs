use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use crate::models::{Claims, TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
    pub department_id: Option<u64>,
}

impl AuthUser {
    /// Access-token claims to a caller identity.
    pub fn from_claims(claims: Claims) -> Result<Self, AppError> {
        if claims.token_type != TokenType::Access {
            return Err(AppError::Unauthorized("Access token required".to_string()));
        }
        let role = Role::from_id(claims.role)
            .ok_or_else(|| AppError::Unauthorized("Invalid role".to_string()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role,
            department_id: claims.department_id,
        })
    }
}

pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    // Set by the middleware on protected scopes.
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    let token = bearer_token(req).ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;

    let config = req.app_data::<Data<Config>>().ok_or_else(|| {
        tracing::error!("Config missing from app data");
        AppError::Internal
    })?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    AuthUser::from_claims(claims)
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_supervisor(&self) -> bool {
        self.role == Role::Supervisor
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR Admin only".to_string()))
        }
    }

    /// Admins see every department, supervisors only their own.
    pub fn can_oversee(&self, department_id: Option<u64>) -> bool {
        self.is_admin()
            || (self.is_supervisor() && department_id.is_some() && department_id == self.department_id)
    }

    /// Self, a supervisor of the user's department, or an admin.
    pub fn can_view_user(&self, user_id: u64, department_id: Option<u64>) -> bool {
        self.user_id == user_id || self.can_oversee(department_id)
    }

    /// Department filter forced on list queries: `None` for admins.
    pub fn department_scope(&self) -> Result<Option<u64>, AppError> {
        match self.role {
            Role::Admin => Ok(None),
            Role::Supervisor => self
                .department_id
                .map(Some)
                .ok_or_else(|| AppError::Forbidden("Supervisor has no department".to_string())),
            Role::Employee => Err(AppError::Forbidden("Supervisor/HR Admin only".to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) fn caller(role: Role, user_id: u64, department_id: Option<u64>) -> AuthUser {
    AuthUser {
        user_id,
        email: format!("user{user_id}@company.com"),
        role,
        department_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token, subject};
    use actix_web::test::TestRequest;

    #[test]
    fn supervisors_oversee_only_their_department() {
        let supervisor = caller(Role::Supervisor, 1, Some(4));
        assert!(supervisor.can_oversee(Some(4)));
        assert!(!supervisor.can_oversee(Some(5)));
        assert!(!supervisor.can_oversee(None));
        assert!(caller(Role::Admin, 1, None).can_oversee(Some(5)));
        assert!(!caller(Role::Employee, 1, Some(4)).can_oversee(Some(4)));
    }

    #[test]
    fn department_scope_per_role() {
        assert_eq!(caller(Role::Admin, 1, Some(3)).department_scope().unwrap(), None);
        assert_eq!(caller(Role::Supervisor, 1, Some(3)).department_scope().unwrap(), Some(3));
        assert!(caller(Role::Supervisor, 1, None).department_scope().is_err());
        assert!(caller(Role::Employee, 1, Some(3)).department_scope().is_err());
    }

    #[test]
    fn employees_can_view_themselves() {
        let employee = caller(Role::Employee, 9, Some(3));
        assert!(employee.can_view_user(9, Some(3)));
        assert!(!employee.can_view_user(10, Some(3)));
        assert!(employee.require_admin().is_err());
    }

    #[actix_web::test]
    async fn extractor_reads_bearer_token() {
        let config = Config::for_tests();
        let token = generate_access_token(&subject(2), &config.jwt_secret, 60).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .app_data(Data::new(config))
            .to_http_request();

        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.role, Role::Supervisor);
        assert_eq!(user.department_id, Some(2));
    }

    #[actix_web::test]
    async fn extractor_rejects_refresh_and_missing_tokens() {
        let config = Config::for_tests();
        let (refresh, _) = generate_refresh_token(&subject(3), &config.jwt_secret, 60).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {refresh}")))
            .app_data(Data::new(config.clone()))
            .to_http_request();
        assert!(matches!(AuthUser::extract(&req).await, Err(AppError::Unauthorized(_))));

        let req = TestRequest::default().app_data(Data::new(config)).to_http_request();
        assert!(matches!(AuthUser::extract(&req).await, Err(AppError::Unauthorized(_))));
    }
}
