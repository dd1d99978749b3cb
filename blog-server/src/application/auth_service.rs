use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};
use tracing::{info, warn};

use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::{LoginRequest, RegisterRequest, User};
use crate::infrastructure::jwt::JwtService;

#[derive(Debug, Clone)]
pub(crate) struct AuthResult {
    pub(crate) user: User,
    pub(crate) access_token: String,
}

pub(crate) struct AuthService<R: UserRepository> {
    repo: R,
    jwt: JwtService,
}

impl<R: UserRepository> AuthService<R> {
    const DUMMY_PASSWORD_HASH: &'static str = "$argon2id$v=19$m=19456,t=2,p=1$MDEyMzQ1Njc4OWFiY2RlZg$gwN6hT1sNdk9kI95f7n2Gl3fL0qRmBf2Ffkj2r90/0M";

    pub(crate) fn new(repo: R, jwt: JwtService) -> Self {
        Self { repo, jwt }
    }

    pub(crate) async fn register(&self, req: RegisterRequest) -> Result<AuthResult, DomainError> {
        let req = req.validate()?;

        if self.repo.find_by_email(&req.email).await?.is_some() {
            return Err(DomainError::DuplicateField("email"));
        }
        if self.repo.find_by_username(&req.username).await?.is_some() {
            return Err(DomainError::DuplicateField("username"));
        }

        let password_hash = self.hash_password(&req.password)?;

        // the unique constraints still guard against a concurrent registration
        let new_user = Self::into_new_user(req, password_hash);
        let user = self.repo.create_user(new_user).await?;

        let access_token = self.issue_token(&user)?;
        info!(user_id = user.id, username = %user.username, "user registered");

        Ok(AuthResult { user, access_token })
    }

    pub(crate) async fn login(&self, req: LoginRequest) -> Result<AuthResult, DomainError> {
        let req = req.validate()?;

        let Some(user_creds) = self.find_by_email(&req.email).await? else {
            // стремимся к одинаковому времени проверки если user не найден
            match self.verify_password(&req.password, Self::DUMMY_PASSWORD_HASH) {
                Ok(()) | Err(DomainError::InvalidCredentials) => {}
                Err(err) => return Err(err),
            }
            warn!("login attempt for unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        if let Err(err) = self.verify_password(&req.password, &user_creds.password_hash) {
            if matches!(err, DomainError::InvalidCredentials) {
                warn!(user_id = user_creds.user.id, "login attempt with wrong password");
            }
            return Err(err);
        }

        let access_token = self.issue_token(&user_creds.user)?;

        Ok(AuthResult {
            user: user_creds.user,
            access_token,
        })
    }

    /// Emails are stored lowercased, so the lookup normalizes its input.
    pub(crate) async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        self.repo.find_by_email(&email.trim().to_lowercase()).await
    }

    pub(crate) fn hash_password(&self, raw_password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Self::argon2()?
            .hash_password(raw_password.as_bytes(), &salt)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Ok(password_hash.to_string())
    }

    pub(crate) fn verify_password(
        &self,
        raw_password: &str,
        password_hash: &str,
    ) -> Result<(), DomainError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Self::argon2()?
            .verify_password(raw_password.as_bytes(), &parsed_hash)
            .map_err(|err| match err {
                PasswordHashError::Password => DomainError::InvalidCredentials,
                _ => DomainError::Unexpected(err.to_string()),
            })?;

        Ok(())
    }

    pub(crate) fn into_new_user(req: RegisterRequest, password_hash: String) -> NewUser {
        NewUser {
            username: req.username,
            email: req.email,
            password_hash,
        }
    }

    fn issue_token(&self, user: &User) -> Result<String, DomainError> {
        self.jwt
            .generate_token(user.id, &user.username)
            .map_err(|err| DomainError::Unexpected(err.to_string()))
    }

    fn argon2() -> Result<Argon2<'static>, DomainError> {
        let params = Params::new(19 * 1024, 2, 1, None)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

#[cfg(test)]
mod tests {
    use super::AuthService;
    use crate::data::repositories::memory::user_repository::InMemoryUserRepository;
    use crate::domain::error::DomainError;
    use crate::domain::user::{LoginRequest, RegisterRequest};
    use crate::infrastructure::jwt::JwtService;

    fn test_jwt() -> JwtService {
        JwtService::new("0123456789abcdef0123456789abcdef", 3600).expect("secret is set")
    }

    fn register_req(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "very-secure-password".to_string(),
        }
    }

    #[tokio::test]
    async fn register_creates_user_and_returns_token() {
        let repo = InMemoryUserRepository::new();
        let service = AuthService::new(repo.clone(), test_jwt());

        let result = service
            .register(register_req("  valid_user  ", "  VALID@EXAMPLE.COM  "))
            .await
            .expect("register must succeed");

        assert_eq!(result.user.username, "valid_user");
        assert_eq!(result.user.email, "valid@example.com");
        assert!(!result.access_token.is_empty());

        let stored = service
            .find_by_email("valid@example.com")
            .await
            .expect("lookup must succeed")
            .expect("user must be stored");
        assert_ne!(stored.password_hash, "very-secure-password");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_case_insensitively() {
        let repo = InMemoryUserRepository::new();
        let service = AuthService::new(repo.clone(), test_jwt());

        service
            .register(register_req("first_user", "same@example.com"))
            .await
            .expect("first register must succeed");

        let err = service
            .register(register_req("second_user", "SAME@Example.com"))
            .await
            .expect_err("second register must fail");
        assert!(matches!(err, DomainError::DuplicateField("email")));
        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let repo = InMemoryUserRepository::new();
        let service = AuthService::new(repo.clone(), test_jwt());

        service
            .register(register_req("taken_name", "one@example.com"))
            .await
            .expect("first register must succeed");

        let err = service
            .register(register_req("taken_name", "two@example.com"))
            .await
            .expect_err("second register must fail");
        assert!(matches!(err, DomainError::DuplicateField("username")));
    }

    #[tokio::test]
    async fn find_by_email_ignores_case() {
        let service = AuthService::new(InMemoryUserRepository::new(), test_jwt());
        service
            .register(register_req("valid_user", "mixed@example.com"))
            .await
            .expect("register must succeed");

        let found = service
            .find_by_email("  MIXED@example.COM ")
            .await
            .expect("lookup must succeed");
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn login_returns_invalid_credentials_for_missing_user() {
        let service = AuthService::new(InMemoryUserRepository::new(), test_jwt());

        let req = LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "some-password".to_string(),
        };

        let err = service.login(req).await.expect_err("login must fail");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_returns_invalid_credentials_for_wrong_password() {
        let service = AuthService::new(InMemoryUserRepository::new(), test_jwt());
        service
            .register(register_req("valid_user", "valid@example.com"))
            .await
            .expect("register must succeed");

        let req = LoginRequest {
            email: "valid@example.com".to_string(),
            password: "wrong-password".to_string(),
        };

        let err = service.login(req).await.expect_err("login must fail");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_returns_token_for_valid_credentials() {
        let service = AuthService::new(InMemoryUserRepository::new(), test_jwt());
        let registered = service
            .register(register_req("valid_user", "valid@example.com"))
            .await
            .expect("register must succeed");

        let req = LoginRequest {
            email: "VALID@example.com".to_string(),
            password: "very-secure-password".to_string(),
        };

        let result = service.login(req).await.expect("login must succeed");
        assert_eq!(result.user.id, registered.user.id);
        assert!(!result.access_token.is_empty());
    }

    #[test]
    fn verify_password_distinguishes_match_and_mismatch() {
        let service = AuthService::new(InMemoryUserRepository::new(), test_jwt());
        let hash = service
            .hash_password("correct-password")
            .expect("hash must be created");

        assert!(service.verify_password("correct-password", &hash).is_ok());
        assert!(matches!(
            service.verify_password("wrong-password", &hash),
            Err(DomainError::InvalidCredentials)
        ));
    }
}
