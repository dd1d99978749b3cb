use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::error::{DomainError, FieldViolation};

const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 20;
const PASSWORD_MIN_CHARS: usize = 6;
const PASSWORD_MAX_CHARS: usize = 128;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl RegisterRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = normalize_username(&self.username);
        let email = normalize_email(&self.email);
        let password = check_password(&self.password);

        match (username, email, password) {
            (Ok(username), Ok(email), Ok(())) => Ok(Self {
                username,
                email,
                password: self.password,
            }),
            (username, email, password) => Err(DomainError::Validation(
                [username.err(), email.err(), password.err()]
                    .into_iter()
                    .flatten()
                    .collect(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

impl LoginRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let email = self.email.trim().to_lowercase();
        if email.is_empty() || self.password.is_empty() {
            return Err(DomainError::validation(
                "credentials",
                "email and password are required",
            ));
        }

        Ok(Self {
            email,
            password: self.password,
        })
    }
}

/// Public identity of a registered account. The password hash lives only in
/// `UserCredentials` and never reaches this type.
#[derive(Debug, Clone)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
}

impl User {
    pub(crate) fn new(
        id: i64,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::validation("id", "must be > 0"));
        }
        let username = normalize_username(&username.into()).map_err(single)?;
        let email = normalize_email(&email.into()).map_err(single)?;

        Ok(Self {
            id,
            username,
            email,
        })
    }
}

fn single(violation: FieldViolation) -> DomainError {
    DomainError::Validation(vec![violation])
}

fn normalize_username(username: &str) -> Result<String, FieldViolation> {
    let username = username.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(FieldViolation {
            field: "username",
            message: "must be 3..20 chars",
        });
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(FieldViolation {
            field: "username",
            message: "may only contain letters, numbers and underscores",
        });
    }
    Ok(username.to_string())
}

fn check_password(password: &str) -> Result<(), FieldViolation> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) {
        return Err(FieldViolation {
            field: "password",
            message: "must be 6..128 chars",
        });
    }
    Ok(())
}

fn normalize_email(email: &str) -> Result<String, FieldViolation> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(FieldViolation {
            field: "email",
            message: "must be a valid email",
        });
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::{LoginRequest, RegisterRequest, User, normalize_email, normalize_username};
    use crate::domain::error::DomainError;

    #[test]
    fn user_new_rejects_non_positive_id() {
        let result = User::new(0, "valid_user", "test@example.com");
        assert!(result.is_err());
    }

    #[test]
    fn user_new_normalizes_identity() {
        let user = User::new(7, " valid_user ", " Test@Example.COM ").expect("must be valid");
        assert_eq!(user.id, 7);
        assert_eq!(user.username, "valid_user");
        assert_eq!(user.email, "test@example.com");
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        let value = normalize_email("  TeSt@Example.COM ").expect("must be valid");
        assert_eq!(value, "test@example.com");
    }

    #[test]
    fn username_length_and_charset_are_checked() {
        assert!(normalize_username("ab").is_err());
        assert!(normalize_username("a_very_long_username_x").is_err());
        assert!(normalize_username("bad-name").is_err());
        assert!(normalize_username("with space").is_err());
        assert_eq!(
            normalize_username("  valid_user_20  ").expect("must be valid"),
            "valid_user_20"
        );
    }

    #[test]
    fn register_password_length_is_checked() {
        let short = RegisterRequest {
            username: "valid_user".to_string(),
            email: "test@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(short.validate().is_err());

        let ok = RegisterRequest {
            username: "valid_user".to_string(),
            email: "Test@Example.com".to_string(),
            password: "secret".to_string(),
        };
        let validated = ok.validate().expect("must be valid");
        assert_eq!(validated.username, "valid_user");
        assert_eq!(validated.email, "test@example.com");
    }

    #[test]
    fn register_reports_every_violated_field() {
        let req = RegisterRequest {
            username: "x".to_string(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
        };

        let err = req.validate().expect_err("all fields are invalid");
        let fields: Vec<_> = err.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["username", "email", "password"]);
    }

    #[test]
    fn login_request_requires_both_fields() {
        let req = LoginRequest {
            email: "   ".to_string(),
            password: "secret".to_string(),
        };
        assert!(matches!(req.validate(), Err(DomainError::Validation(_))));

        let req = LoginRequest {
            email: " User@Example.COM ".to_string(),
            password: "secret".to_string(),
        };
        let validated = req.validate().expect("must be valid");
        assert_eq!(validated.email, "user@example.com");
    }
}
