use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Публичная модель пользователя.
pub struct User {
    /// Идентификатор пользователя.
    pub id: i64,
    /// Логин.
    pub username: String,
    /// Email (в нижнем регистре).
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Публичная модель поста.
pub struct Post {
    /// Идентификатор поста.
    pub id: i64,
    /// Заголовок поста.
    pub title: String,
    /// Ссылка на изображение, если есть.
    pub image_url: Option<String>,
    /// Содержимое поста.
    pub content: String,
    /// Имя автора на момент создания поста.
    pub username: String,
    /// Идентификатор автора.
    pub user_id: i64,
    /// Дата и время создания поста (UTC).
    pub created_at: DateTime<Utc>,
    /// Дата и время последнего обновления поста (UTC).
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
/// Ответ после успешной регистрации или входа.
pub struct AuthResponse {
    /// Сообщение сервера.
    pub message: String,
    /// JWT access token.
    pub token: String,
    /// Данные пользователя.
    pub user: User,
}

#[derive(Debug, Clone)]
/// Страница списка постов.
pub struct ListPostsResponse {
    /// Посты текущей страницы.
    pub posts: Vec<Post>,
    /// Всего страниц.
    pub total_pages: u32,
    /// Номер текущей страницы (с 1).
    pub current_page: u32,
    /// Общее количество постов.
    pub total: u64,
}

#[derive(Debug, Clone, Default)]
/// Данные для создания поста.
pub struct NewPost {
    /// Заголовок (5..120 символов).
    pub title: String,
    /// Текст (не короче 50 символов).
    pub content: String,
    /// Ссылка на jpg/jpeg/png/webp/gif.
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
/// Частичное обновление поста: `None` оставляет поле без изменений.
///
/// Пустая строка в `image_url` удаляет изображение.
pub struct PostUpdate {
    /// Новый заголовок.
    pub title: Option<String>,
    /// Новая ссылка на изображение.
    pub image_url: Option<String>,
    /// Новый текст.
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Параметры запроса списка постов.
pub struct ListQuery {
    /// Номер страницы (с 1).
    pub page: u32,
    /// Размер страницы (сервер ограничивает 1..=50).
    pub limit: u32,
    /// Поиск по заголовку или имени автора.
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
        }
    }
}
