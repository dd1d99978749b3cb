use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::data::post_repository::{NewPost, Pagination, PostFilter, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PostRow {
    id: i64,
    title: String,
    image_url: Option<String>,
    content: String,
    username: String,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// $1 = owner filter, $2 = ILIKE pattern; NULL disables the corresponding condition.
const FILTER_CLAUSE: &str = r#"
    WHERE ($1::BIGINT IS NULL OR user_id = $1)
      AND ($2::TEXT IS NULL OR title ILIKE $2 OR username ILIKE $2)
"#;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (title, image_url, content, username, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, image_url, content, username, user_id, created_at, updated_at
            "#,
        )
        .bind(&input.title)
        .bind(&input.image_url)
        .bind(&input.content)
        .bind(&input.username)
        .bind(input.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        map_row_to_post(row)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                id,
                title,
                image_url,
                content,
                username,
                user_id,
                created_at,
                updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET title = $3,
                image_url = $4,
                content = $5,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, title, image_url, content, username, user_id, created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(owner_id)
        .bind(&patch.title)
        .bind(&patch.image_url)
        .bind(&patch.content)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        row.map(map_row_to_post).transpose()
    }

    async fn delete_post_owned(&self, post_id: i64, owner_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(post_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        let sql = format!(
            r#"
            SELECT
                id,
                title,
                image_url,
                content,
                username,
                user_id,
                created_at,
                updated_at
            FROM posts
            {FILTER_CLAUSE}
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            OFFSET $4
            "#
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(filter.user_id)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        rows.into_iter().map(map_row_to_post).collect()
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<i64, DomainError> {
        let sql = format!("SELECT COUNT(*) FROM posts {FILTER_CLAUSE}");

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.user_id)
            .bind(filter.search.as_deref().map(like_pattern))
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(count)
    }
}

/// Builds an ILIKE pattern matching `term` literally anywhere in the value.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn map_row_to_post(row: PostRow) -> Result<Post, DomainError> {
    Post::new(
        row.id,
        row.title,
        row.image_url,
        row.content,
        row.username,
        row.user_id,
        row.created_at,
        row.updated_at,
    )
    .map_err(|err| DomainError::Unexpected(err.to_string()))
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23514")
    {
        return DomainError::validation("post", "violates a storage constraint");
    }
    DomainError::Unexpected(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_wraps_term_in_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
    }

    #[test]
    fn like_pattern_escapes_wildcards_in_term() {
        assert_eq!(like_pattern("100%_off\\"), "%100\\%\\_off\\\\%");
    }
}
