use std::sync::Arc;

use tracing::instrument;
use validator::{Validate, ValidationErrors};

use crate::domain::User;
use crate::dto::auth::{LoginRequest, LoginResponse, ProfileResponse};
use crate::repository::user::{RepositoryError, UserRepository};
use crate::util::error::{AuthFlowError, BusinessError, InternalError, UserError, ValidationField};
use crate::util::password::{PasswordError, verify_password};
use crate::util::token::{SessionIdentity, TokenConfig, issue_token};
use crate::util::AppError;

#[derive(Clone)]
pub struct AuthService<R: UserRepository + Send + Sync + 'static> {
    repository: Arc<R>,
    token_config: Arc<TokenConfig>,
}

impl<R> AuthService<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub fn new(repository: R, token_config: Arc<TokenConfig>) -> Self {
        Self {
            repository: Arc::new(repository),
            token_config,
        }
    }

    pub fn token_config(&self) -> Arc<TokenConfig> {
        self.token_config.clone()
    }

    #[instrument(skip(self, payload), fields(email = %payload.email))]
    pub async fn login(&self, payload: LoginRequest) -> Result<LoginResponse, AppError> {
        payload
            .validate()
            .map_err(|err| AppError::from(BusinessError::Validation(validation_errors(err))))?;

        let user = self
            .repository
            .find_by_email(payload.email.trim())
            .await
            .map_err(map_repository_error)?
            .ok_or_else(invalid_credentials)?;

        let password_ok =
            verify_password(&payload.password, user.password_hash.as_str()).map_err(map_password_error)?;
        if !password_ok {
            tracing::info!(user_id = user.id, "login rejected");
            return Err(invalid_credentials());
        }

        let access_token = issue_token(&self.token_config, &session_identity(&user), None)
            .map_err(|err| {
                tracing::error!(error = %err, "failed to sign session token");
                AppError::from(InternalError::TokenSigning)
            })?;
        tracing::info!(user_id = user.id, role = %user.role, "session issued");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer",
            expires_in: self.token_config.validity_secs,
            user: ProfileResponse::from(user),
        })
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: i64) -> Result<ProfileResponse, AppError> {
        let user = self
            .repository
            .find_by_id(user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| AppError::from(BusinessError::User(UserError::UserNotFound)))?;

        Ok(ProfileResponse::from(user))
    }
}

pub fn session_identity(user: &User) -> SessionIdentity {
    SessionIdentity {
        sub: user.id.to_string(),
        email: user.email.clone(),
        username: user.username.clone(),
        role: user.role,
    }
}

fn invalid_credentials() -> AppError {
    AppError::from(BusinessError::Auth(AuthFlowError::InvalidCredentials))
}

fn map_repository_error(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Database(err) => AppError::from(err),
        RepositoryError::Domain(err) => {
            tracing::error!(error = %err, "stored user record is invalid");
            AppError::from(InternalError::Unknown)
        }
    }
}

fn map_password_error(err: PasswordError) -> AppError {
    match err {
        PasswordError::Empty => AppError::from(BusinessError::Validation(vec![ValidationField {
            field: "password".into(),
            message: "password is required".into(),
        }])),
        PasswordError::Hash(_) => AppError::from(InternalError::PasswordHash),
    }
}

pub(crate) fn validation_errors(err: ValidationErrors) -> Vec<ValidationField> {
    let mut fields = Vec::new();
    for (field, errors) in err.field_errors() {
        for error in errors {
            let message = error
                .message
                .clone()
                .unwrap_or_else(|| "invalid value".into());
            fields.push(ValidationField {
                field: field.to_string(),
                message: message.to_string(),
            });
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HashedPassword, Role};
    use crate::util::password::{MIN_COST, hash_password};
    use crate::util::token::{Claims, DEFAULT_VALIDITY_SECS, verify_token};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;

    #[derive(Default, Clone)]
    struct InMemoryUserRepository {
        users: HashMap<i64, User>,
    }

    impl InMemoryUserRepository {
        fn with_user(id: i64, email: &str, password: &str, role: Role) -> Self {
            let hash = HashedPassword::new(hash_password(password, MIN_COST).unwrap()).unwrap();
            let user = User::new(id, email.into(), format!("user{id}"), hash, role, Utc::now()).unwrap();
            Self {
                users: HashMap::from([(id, user)]),
            }
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
            Ok(self
                .users
                .values()
                .find(|user| user.email.eq_ignore_ascii_case(email))
                .cloned())
        }

        async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, RepositoryError> {
            Ok(self.users.get(&user_id).cloned())
        }
    }

    fn service(repo: InMemoryUserRepository) -> AuthService<InMemoryUserRepository> {
        let config = TokenConfig::hs256(b"secretsecretsecretsecret", DEFAULT_VALIDITY_SECS);
        AuthService::new(repo, Arc::new(config))
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let service = service(InMemoryUserRepository::with_user(
            3,
            "pendeta@example.org",
            "password123",
            Role::Clergy,
        ));

        let response = service
            .login(LoginRequest {
                email: "pendeta@example.org".into(),
                password: "password123".into(),
            })
            .await
            .unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, DEFAULT_VALIDITY_SECS);
        let claims: Claims<SessionIdentity> =
            verify_token(&service.token_config(), &response.access_token).unwrap();
        assert_eq!(claims.payload.sub, "3");
        assert_eq!(claims.payload.role, Role::Clergy);
        assert_eq!(claims.payload.email, "pendeta@example.org");
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let service = service(InMemoryUserRepository::with_user(
            1,
            "admin@example.org",
            "password123",
            Role::Admin,
        ));
        let err = service
            .login(LoginRequest {
                email: "admin@example.org".into(),
                password: "not-the-password".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), 4011);
    }

    #[tokio::test]
    async fn unknown_email_is_invalid_credentials() {
        let service = service(InMemoryUserRepository::default());
        let err = service
            .login(LoginRequest {
                email: "ghost@example.org".into(),
                password: "password123".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), 4011);
    }

    #[tokio::test]
    async fn malformed_login_is_validation_error() {
        let service = service(InMemoryUserRepository::default());
        let err = service
            .login(LoginRequest {
                email: "not-an-email".into(),
                password: "short".into(),
            })
            .await
            .unwrap_err();
        match err {
            AppError::BusinessError(BusinessError::Validation(fields)) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert!(names.contains(&"email"));
                assert!(names.contains(&"password"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn profile_of_missing_user_is_not_found() {
        let service = service(InMemoryUserRepository::default());
        let err = service.profile(99).await.unwrap_err();
        assert_eq!(err.code(), 4041);
    }
}
