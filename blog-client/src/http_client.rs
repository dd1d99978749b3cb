use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{BlogClientError, BlogClientResult};
use crate::models::{AuthResponse, ListPostsResponse, ListQuery, NewPost, Post, PostUpdate, User};

#[derive(Debug, Serialize)]
struct RegisterRequestDto<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequestDto<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct CreatePostRequestDto<'a> {
    title: &'a str,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdatePostRequestDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    message: Option<String>,
    #[serde(default)]
    details: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponseDto {
    message: String,
    token: String,
    user: UserDto,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    id: i64,
    username: String,
    email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDto {
    id: i64,
    title: String,
    #[serde(rename = "imageURL", default)]
    image_url: Option<String>,
    content: String,
    username: String,
    user_id: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
struct PostEnvelopeDto {
    post: PostDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPostsResponseDto {
    posts: Vec<PostDto>,
    total_pages: u32,
    current_page: u32,
    total: i64,
}

#[derive(Serialize)]
struct ListPostsQuery<'a> {
    page: u32,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
}

impl From<AuthResponseDto> for AuthResponse {
    fn from(value: AuthResponseDto) -> Self {
        Self {
            message: value.message,
            token: value.token,
            user: User {
                id: value.user.id,
                username: value.user.username,
                email: value.user.email,
            },
        }
    }
}

impl From<PostDto> for Post {
    fn from(value: PostDto) -> Self {
        Self {
            id: value.id,
            title: value.title,
            image_url: value.image_url,
            content: value.content,
            username: value.username,
            user_id: value.user_id,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<ListPostsResponseDto> for ListPostsResponse {
    fn from(value: ListPostsResponseDto) -> Self {
        Self {
            posts: value.posts.into_iter().map(Post::from).collect(),
            total_pages: value.total_pages,
            current_page: value.current_page,
            total: value.total.max(0) as u64,
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP-клиент для работы с REST API `blog-server`.
pub(crate) struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт новый HTTP-клиент с базовым URL сервера.
    pub(crate) fn new(base_url: impl Into<String>) -> BlogClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let request = self.client.request(method, self.endpoint(path));
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode_error(response: reqwest::Response) -> BlogClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponseDto>().await {
            Ok(ErrorResponseDto {
                message: Some(message),
                details,
            }) if !details.is_empty() => Some(format!("{message} ({})", details.join("; "))),
            Ok(body) => body.message,
            Err(_) => None,
        };
        BlogClientError::from_http_status(status, message)
    }

    /// отправляет запрос и декодирует успешный json-ответ
    async fn execute<TRes>(&self, request: RequestBuilder) -> BlogClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(BlogClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        response
            .json::<TRes>()
            .await
            .map_err(BlogClientError::from_reqwest)
    }

    async fn send_json<TReq, TRes>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
        token: Option<&str>,
    ) -> BlogClientResult<TRes>
    where
        TReq: Serialize,
        TRes: DeserializeOwned,
    {
        self.execute(self.request(method, path, token).json(body))
            .await
    }

    /// Регистрирует пользователя и возвращает JWT + данные пользователя.
    pub(crate) async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> BlogClientResult<AuthResponse> {
        let payload = RegisterRequestDto {
            username,
            email,
            password,
        };
        let dto: AuthResponseDto = self
            .send_json(Method::POST, "/api/auth/register", &payload, None)
            .await?;
        Ok(dto.into())
    }

    /// Выполняет вход по email и паролю.
    pub(crate) async fn login(&self, email: &str, password: &str) -> BlogClientResult<AuthResponse> {
        let payload = LoginRequestDto { email, password };
        let dto: AuthResponseDto = self
            .send_json(Method::POST, "/api/auth/login", &payload, None)
            .await?;
        Ok(dto.into())
    }

    pub(crate) async fn create_post(&self, token: &str, post: &NewPost) -> BlogClientResult<Post> {
        let payload = CreatePostRequestDto {
            title: &post.title,
            image_url: post.image_url.as_deref(),
            content: &post.content,
        };
        let dto: PostEnvelopeDto = self
            .send_json(Method::POST, "/api/posts", &payload, Some(token))
            .await?;

        Ok(dto.post.into())
    }

    pub(crate) async fn get_post(&self, id: i64) -> BlogClientResult<Post> {
        let dto: PostEnvelopeDto = self
            .execute(self.request(Method::GET, &format!("/api/posts/{id}"), None))
            .await?;
        Ok(dto.post.into())
    }

    pub(crate) async fn update_post(
        &self,
        token: &str,
        id: i64,
        update: &PostUpdate,
    ) -> BlogClientResult<Post> {
        let payload = UpdatePostRequestDto {
            title: update.title.as_deref(),
            image_url: update.image_url.as_deref(),
            content: update.content.as_deref(),
        };
        let dto: PostEnvelopeDto = self
            .send_json(
                Method::PUT,
                &format!("/api/posts/{id}"),
                &payload,
                Some(token),
            )
            .await?;

        Ok(dto.post.into())
    }

    pub(crate) async fn delete_post(&self, token: &str, id: i64) -> BlogClientResult<()> {
        let _: serde_json::Value = self
            .execute(self.request(Method::DELETE, &format!("/api/posts/{id}"), Some(token)))
            .await?;
        Ok(())
    }

    /// Возвращает страницу постов, опционально с поиском.
    pub(crate) async fn list_posts(&self, query: &ListQuery) -> BlogClientResult<ListPostsResponse> {
        let query = ListPostsQuery {
            page: query.page,
            limit: query.limit,
            search: query.search.as_deref().filter(|term| !term.trim().is_empty()),
        };
        let dto: ListPostsResponseDto = self
            .execute(self.request(Method::GET, "/api/posts", None).query(&query))
            .await?;
        Ok(dto.into())
    }

    /// Возвращает страницу постов текущего пользователя.
    pub(crate) async fn list_my_posts(
        &self,
        token: &str,
        page: u32,
        limit: u32,
    ) -> BlogClientResult<ListPostsResponse> {
        let query = ListPostsQuery {
            page,
            limit,
            search: None,
        };
        let dto: ListPostsResponseDto = self
            .execute(
                self.request(Method::GET, "/api/posts/user/me", Some(token))
                    .query(&query),
            )
            .await?;
        Ok(dto.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_slashes() {
        let client = HttpClient::new("http://localhost:5000/").expect("client must build");
        let full = client.endpoint("/api/posts");
        assert_eq!(full, "http://localhost:5000/api/posts");
    }

    #[test]
    fn post_envelope_reads_server_field_names() {
        let raw = r#"{
            "post": {
                "id": 3,
                "title": "Hello there",
                "imageURL": "https://cdn.example.com/a.png",
                "content": "body",
                "username": "alice",
                "userId": 7,
                "createdAt": "2026-01-01T10:00:00Z",
                "updatedAt": "2026-01-01T11:00:00Z"
            }
        }"#;

        let dto: PostEnvelopeDto = serde_json::from_str(raw).expect("must decode");
        let post = Post::from(dto.post);
        assert_eq!(post.id, 3);
        assert_eq!(post.user_id, 7);
        assert_eq!(post.image_url.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn post_without_image_decodes() {
        let raw = r#"{
            "id": 3,
            "title": "Hello there",
            "content": "body",
            "username": "alice",
            "userId": 7,
            "createdAt": "2026-01-01T10:00:00Z",
            "updatedAt": "2026-01-01T10:00:00Z"
        }"#;

        let dto: PostDto = serde_json::from_str(raw).expect("must decode");
        assert!(dto.image_url.is_none());
    }

    #[test]
    fn list_response_clamps_negative_total() {
        let raw = r#"{"posts": [], "totalPages": 0, "currentPage": 1, "total": -7}"#;

        let dto: ListPostsResponseDto = serde_json::from_str(raw).expect("must decode");
        let mapped = ListPostsResponse::from(dto);
        assert_eq!(mapped.total, 0);
        assert_eq!(mapped.current_page, 1);
    }

    #[test]
    fn update_payload_omits_untouched_fields() {
        let payload = UpdatePostRequestDto {
            title: Some("New title"),
            image_url: Some(""),
            content: None,
        };

        let json = serde_json::to_value(&payload).expect("must encode");
        assert_eq!(json, serde_json::json!({ "title": "New title", "imageURL": "" }));
    }
}
