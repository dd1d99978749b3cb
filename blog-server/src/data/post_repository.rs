use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::post::Post;

pub(crate) const DEFAULT_PAGE_SIZE: u32 = 10;
pub(crate) const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) image_url: Option<String>,
    pub(crate) content: String,
    pub(crate) username: String,
    pub(crate) user_id: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct PostPatch {
    pub(crate) title: String,
    pub(crate) image_url: Option<String>,
    pub(crate) content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pagination {
    pub(crate) page: u32,
    pub(crate) page_size: u32,
}

impl Pagination {
    /// Coerces raw paging input: page is at least 1, page size is clamped to 1..=50.
    pub(crate) fn new(page: i64, page_size: i64) -> Self {
        let page = page.clamp(1, i64::from(u32::MAX)) as u32;
        let page_size = page_size.clamp(1, i64::from(MAX_PAGE_SIZE)) as u32;
        Self { page, page_size }
    }

    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub(crate) fn total_pages(&self, total: i64) -> u32 {
        let total = total.max(0);
        let page_size = i64::from(self.page_size);
        ((total + page_size - 1) / page_size) as u32
    }
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PostFilter {
    /// Only posts owned by this user.
    pub(crate) user_id: Option<i64>,
    /// Case-insensitive substring of the title or the author's username.
    pub(crate) search: Option<String>,
}

impl PostFilter {
    pub(crate) fn search(term: &str) -> Self {
        let term = term.trim();
        Self {
            user_id: None,
            search: (!term.is_empty()).then(|| term.to_string()),
        }
    }

    pub(crate) fn by_author(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            search: None,
        }
    }
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    /// Returns `None` when no post with `post_id` is owned by `owner_id`.
    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError>;
    async fn delete_post_owned(&self, post_id: i64, owner_id: i64) -> Result<bool, DomainError>;
    /// Newest first; ties on `created_at` are broken by descending id.
    async fn list_posts(
        &self,
        filter: &PostFilter,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError>;
    async fn count_posts(&self, filter: &PostFilter) -> Result<i64, DomainError>;
}

pub(crate) type DynPostRepository = Arc<dyn PostRepository>;

#[async_trait]
impl<T> PostRepository for Arc<T>
where
    T: PostRepository + ?Sized,
{
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        (**self).create_post(input).await
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        (**self).get_post(id).await
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        (**self).update_post_owned(post_id, owner_id, patch).await
    }

    async fn delete_post_owned(&self, post_id: i64, owner_id: i64) -> Result<bool, DomainError> {
        (**self).delete_post_owned(post_id, owner_id).await
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        (**self).list_posts(filter, pagination).await
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<i64, DomainError> {
        (**self).count_posts(filter).await
    }
}
