use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::User;

#[derive(Debug, Clone)]
pub(crate) struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        query: &'static str,
        value: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        let row = sqlx::query_as::<_, UserCredentialsRow>(query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(map_row_to_credentials).transpose()
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
}

#[derive(FromRow)]
struct UserCredentialsRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
}

const FIND_BY_USERNAME: &str = r#"
    SELECT id, username, email, password_hash
    FROM users
    WHERE username = $1
"#;

const FIND_BY_EMAIL: &str = r#"
    SELECT id, username, email, password_hash
    FROM users
    WHERE email = $1
"#;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        User::new(row.id, row.username, row.email)
            .map_err(|err| DomainError::Unexpected(err.to_string()))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        self.find_one(FIND_BY_USERNAME, username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        self.find_one(FIND_BY_EMAIL, email).await
    }
}

fn map_row_to_credentials(r: UserCredentialsRow) -> Result<UserCredentials, DomainError> {
    let user = User::new(r.id, r.username, r.email)
        .map_err(|err| DomainError::Unexpected(err.to_string()))?;

    Ok(UserCredentials {
        user,
        password_hash: r.password_hash,
    })
}

fn map_user_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23505")
    {
        return match db_err.constraint() {
            Some("users_username_key") => DomainError::DuplicateField("username"),
            Some("users_email_key") => DomainError::DuplicateField("email"),
            _ => DomainError::DuplicateField("user"),
        };
    }
    DomainError::Unexpected(err.to_string())
}
