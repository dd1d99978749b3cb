//! Клиентская библиотека для работы с blog-server по HTTP.
//!
//! `BlogClient` хранит JWT-токен после `register`/`login` и автоматически
//! использует его в защищённых операциях. Для сохранения входа между
//! запусками используйте [`SessionManager`] с подходящим [`SessionStore`].
#![warn(missing_docs)]

mod cursor;
mod error;
mod http_client;
mod models;
mod session;

pub use cursor::PostsCursor;
pub use error::{BlogClientError, BlogClientResult};
pub use models::{AuthResponse, ListPostsResponse, ListQuery, NewPost, Post, PostUpdate, User};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionManager, SessionStore};

use http_client::HttpClient;

#[derive(Debug, Clone)]
/// Клиент REST API блог-сервиса.
pub struct BlogClient {
    http_client: HttpClient,
    token: Option<String>,
}

impl BlogClient {
    /// Создаёт клиент для сервера с базовым URL, например `http://127.0.0.1:5000`.
    pub fn new(base_url: impl Into<String>) -> BlogClientResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(base_url)?,
            token: None,
        })
    }

    /// Устанавливает JWT-токен вручную (например, из восстановленной сессии).
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Возвращает текущий JWT-токен, если он установлен.
    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Очищает сохранённый JWT-токен.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Регистрирует пользователя и сохраняет полученный JWT-токен в клиенте.
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> BlogClientResult<AuthResponse> {
        let result = self.http_client.register(username, email, password).await?;
        self.token = Some(result.token.clone());
        Ok(result)
    }

    /// Выполняет вход по email и сохраняет полученный JWT-токен в клиенте.
    pub async fn login(&mut self, email: &str, password: &str) -> BlogClientResult<AuthResponse> {
        let result = self.http_client.login(email, password).await?;
        self.token = Some(result.token.clone());
        Ok(result)
    }

    /// Создаёт новый пост.
    ///
    /// Требует установленный JWT-токен.
    pub async fn create_post(&self, post: &NewPost) -> BlogClientResult<Post> {
        let token = self.require_token()?;
        self.http_client.create_post(token, post).await
    }

    /// Возвращает пост по идентификатору.
    pub async fn get_post(&self, id: i64) -> BlogClientResult<Post> {
        self.http_client.get_post(id).await
    }

    /// Частично обновляет пост. Требует токен владельца.
    pub async fn update_post(&self, id: i64, update: &PostUpdate) -> BlogClientResult<Post> {
        let token = self.require_token()?;
        self.http_client.update_post(token, id, update).await
    }

    /// Удаляет пост. Требует токен владельца.
    pub async fn delete_post(&self, id: i64) -> BlogClientResult<()> {
        let token = self.require_token()?;
        self.http_client.delete_post(token, id).await
    }

    /// Возвращает страницу постов, новые первыми.
    pub async fn list_posts(&self, query: &ListQuery) -> BlogClientResult<ListPostsResponse> {
        self.http_client.list_posts(query).await
    }

    /// Возвращает страницу постов текущего пользователя.
    ///
    /// Требует установленный JWT-токен.
    pub async fn list_my_posts(&self, page: u32, limit: u32) -> BlogClientResult<ListPostsResponse> {
        let token = self.require_token()?;
        self.http_client.list_my_posts(token, page, limit).await
    }

    fn require_token(&self) -> BlogClientResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| BlogClientError::Unauthorized("not logged in".to_string()))
    }
}
