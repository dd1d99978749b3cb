use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;
use validator::Validate;

use crate::application::blog_service::ListPostsResult;
use crate::data::post_repository::DEFAULT_PAGE_SIZE;
use crate::domain::error::DomainError;
use crate::domain::post::{CreatePostRequest, Post, UpdatePostRequest};
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppError, AppJson, AppResult};
use crate::presentation::http::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "title is required"))]
    pub(crate) title: String,
    #[serde(default, rename = "imageURL")]
    pub(crate) image_url: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "content is required"))]
    pub(crate) content: String,
}

/// Every field is optional; an empty `imageURL` removes the image.
/// Field rules apply to the merged post, after the existence and ownership checks.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct UpdatePostDto {
    pub(crate) title: Option<String>,
    #[serde(rename = "imageURL")]
    pub(crate) image_url: Option<String>,
    pub(crate) content: Option<String>,
}

/// Raw paging input. Values that do not parse fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListPostsQuery {
    pub(crate) page: Option<String>,
    pub(crate) limit: Option<String>,
    pub(crate) search: Option<String>,
}

impl ListPostsQuery {
    fn page(&self) -> i64 {
        parse_or(self.page.as_deref(), 1)
    }

    fn limit(&self) -> i64 {
        parse_or(self.limit.as_deref(), i64::from(DEFAULT_PAGE_SIZE))
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub(crate) image_url: Option<String>,
    pub(crate) content: String,
    pub(crate) username: String,
    pub(crate) user_id: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListPostsResponseDto {
    pub(crate) posts: Vec<PostDto>,
    pub(crate) total_pages: u32,
    pub(crate) current_page: u32,
    pub(crate) total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostEnvelopeDto {
    pub(crate) post: PostDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostMessageDto {
    pub(crate) message: String,
    pub(crate) post: PostDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct MessageDto {
    pub(crate) message: String,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            image_url: post.image_url,
            content: post.content,
            username: post.username,
            user_id: post.user_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<ListPostsResult> for ListPostsResponseDto {
    fn from(result: ListPostsResult) -> Self {
        Self {
            posts: result.posts.into_iter().map(PostDto::from).collect(),
            total_pages: result.total_pages,
            current_page: result.current_page,
            total: result.total,
        }
    }
}

impl ListPostsResponseDto {
    fn empty() -> Self {
        Self {
            posts: Vec::new(),
            total_pages: 0,
            current_page: 1,
            total: 0,
        }
    }
}

impl PostMessageDto {
    fn new(message: &str, post: Post) -> Self {
        Self {
            message: message.to_string(),
            post: post.into(),
        }
    }
}

fn parse_post_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid post ID format"))
}

/// Listing failures keep the envelope shape so clients can still render it.
fn list_response(result: Result<ListPostsResult, DomainError>) -> Response {
    match result {
        Ok(result) => (StatusCode::OK, Json(ListPostsResponseDto::from(result))).into_response(),
        Err(err) => {
            error!(error = %err, "listing posts failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ListPostsResponseDto::empty()),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(
        ("page" = Option<u32>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=50, default 10)"),
        ("search" = Option<String>, Query, description = "Case-insensitive match on title or username")
    ),
    responses(
        (status = 200, description = "Posts listed", body = ListPostsResponseDto),
        (status = 500, description = "Internal error, empty listing", body = ListPostsResponseDto)
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Response {
    let result = state
        .blog_service
        .list_posts(query.page(), query.limit(), query.search.as_deref())
        .await;
    list_response(result)
}

#[utoipa::path(
    get,
    path = "/api/posts/user/me",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("page" = Option<u32>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=50, default 10)")
    ),
    responses(
        (status = 200, description = "Posts of the current user", body = ListPostsResponseDto),
        (status = 401, description = "Unauthorized", body = crate::presentation::http::app_error::ErrorBody),
        (status = 500, description = "Internal error, empty listing", body = ListPostsResponseDto)
    )
)]
pub(crate) async fn list_my_posts(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<ListPostsQuery>,
) -> Response {
    let result = state
        .blog_service
        .list_user_posts(auth.user_id, query.page(), query.limit())
        .await;
    list_response(result)
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found", body = PostEnvelopeDto),
        (status = 400, description = "Invalid post ID format", body = crate::presentation::http::app_error::ErrorBody),
        (status = 404, description = "Post not found", body = crate::presentation::http::app_error::ErrorBody),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<PostEnvelopeDto>)> {
    let id = parse_post_id(&id)?;
    let post = state.blog_service.get_post(id).await?;

    Ok((StatusCode::OK, Json(PostEnvelopeDto { post: post.into() })))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostMessageDto),
        (status = 400, description = "Validation error", body = crate::presentation::http::app_error::ErrorBody),
        (status = 401, description = "Unauthorized", body = crate::presentation::http::app_error::ErrorBody),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(dto): AppJson<CreatePostDto>,
) -> AppResult<(StatusCode, Json<PostMessageDto>)> {
    dto.validate()?;
    let req = CreatePostRequest {
        title: dto.title,
        image_url: dto.image_url,
        content: dto.content,
    };

    let post = state
        .blog_service
        .create_post(auth.user_id, &auth.username, req)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PostMessageDto::new("Post created successfully", post)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = PostMessageDto),
        (status = 400, description = "Validation error or invalid id", body = crate::presentation::http::app_error::ErrorBody),
        (status = 401, description = "Unauthorized", body = crate::presentation::http::app_error::ErrorBody),
        (status = 403, description = "Forbidden", body = crate::presentation::http::app_error::ErrorBody),
        (status = 404, description = "Post not found", body = crate::presentation::http::app_error::ErrorBody),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
    AppJson(dto): AppJson<UpdatePostDto>,
) -> AppResult<(StatusCode, Json<PostMessageDto>)> {
    let id = parse_post_id(&id)?;
    let req = UpdatePostRequest {
        title: dto.title,
        image_url: dto.image_url,
        content: dto.content,
    };

    let post = state
        .blog_service
        .update_post(auth.user_id, id, req)
        .await?;
    Ok((
        StatusCode::OK,
        Json(PostMessageDto::new("Post updated successfully", post)),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post deleted", body = MessageDto),
        (status = 400, description = "Invalid post ID format", body = crate::presentation::http::app_error::ErrorBody),
        (status = 401, description = "Unauthorized", body = crate::presentation::http::app_error::ErrorBody),
        (status = 403, description = "Forbidden", body = crate::presentation::http::app_error::ErrorBody),
        (status = 404, description = "Post not found", body = crate::presentation::http::app_error::ErrorBody),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<MessageDto>)> {
    let id = parse_post_id(&id)?;
    state.blog_service.delete_post(auth.user_id, id).await?;

    Ok((
        StatusCode::OK,
        Json(MessageDto {
            message: "Post deleted successfully".to_string(),
        }),
    ))
}
