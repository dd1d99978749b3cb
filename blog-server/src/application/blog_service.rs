use tracing::info;

use crate::data::post_repository::{NewPost, Pagination, PostFilter, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{CreatePostRequest, Post, UpdatePostRequest};

#[derive(Debug, Clone)]
pub(crate) struct ListPostsResult {
    pub(crate) posts: Vec<Post>,
    pub(crate) current_page: u32,
    pub(crate) total_pages: u32,
    pub(crate) total: i64,
}

pub(crate) struct BlogService<R: PostRepository> {
    repo: R,
}

impl<R: PostRepository> BlogService<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self { repo }
    }

    pub(crate) async fn create_post(
        &self,
        author_id: i64,
        author_username: &str,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let fields = req.validate()?;

        let new_post = NewPost {
            title: fields.title,
            image_url: fields.image_url,
            content: fields.content,
            username: author_username.to_string(),
            user_id: author_id,
        };
        let post = self.repo.create_post(new_post).await?;
        info!(post_id = post.id, user_id = author_id, "post created");
        Ok(post)
    }

    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        if id <= 0 {
            return Err(not_found(id));
        }
        self.repo.get_post(id).await?.ok_or_else(|| not_found(id))
    }

    pub(crate) async fn list_posts(
        &self,
        page: i64,
        page_size: i64,
        search: Option<&str>,
    ) -> Result<ListPostsResult, DomainError> {
        let filter = search.map(PostFilter::search).unwrap_or_default();
        self.list(filter, Pagination::new(page, page_size)).await
    }

    pub(crate) async fn list_user_posts(
        &self,
        user_id: i64,
        page: i64,
        page_size: i64,
    ) -> Result<ListPostsResult, DomainError> {
        self.list(
            PostFilter::by_author(user_id),
            Pagination::new(page, page_size),
        )
        .await
    }

    pub(crate) async fn update_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let current = self.owned_post(actor_user_id, post_id).await?;
        let fields = req.apply_to(&current)?;

        let patch = PostPatch {
            title: fields.title,
            image_url: fields.image_url,
            content: fields.content,
        };
        self.repo
            .update_post_owned(post_id, actor_user_id, patch)
            .await?
            .ok_or_else(|| not_found(post_id))
    }

    pub(crate) async fn delete_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
    ) -> Result<(), DomainError> {
        self.owned_post(actor_user_id, post_id).await?;

        let deleted = self.repo.delete_post_owned(post_id, actor_user_id).await?;
        if !deleted {
            return Err(not_found(post_id));
        }
        info!(post_id, user_id = actor_user_id, "post deleted");
        Ok(())
    }

    async fn owned_post(&self, actor_user_id: i64, post_id: i64) -> Result<Post, DomainError> {
        let post = self.get_post(post_id).await?;
        if !post.is_owned_by(actor_user_id) {
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    async fn list(
        &self,
        filter: PostFilter,
        pagination: Pagination,
    ) -> Result<ListPostsResult, DomainError> {
        let posts = self.repo.list_posts(&filter, pagination).await?;
        let total = self.repo.count_posts(&filter).await?;

        Ok(ListPostsResult {
            posts,
            current_page: pagination.page,
            total_pages: pagination.total_pages(total),
            total,
        })
    }
}

fn not_found(id: i64) -> DomainError {
    DomainError::NotFound(format!("post id: {id}"))
}
