use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::data::post_repository::{NewPost, Pagination, PostFilter, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Debug, Clone, Default)]
pub(crate) struct InMemoryPostRepository {
    posts: Arc<Mutex<Vec<Post>>>,
    next_id: Arc<Mutex<i64>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryPostRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `DomainError::Unexpected`.
    pub(crate) fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self, id: i64) -> Option<Post> {
        self.posts
            .lock()
            .expect("posts mutex poisoned")
            .iter()
            .find(|post| post.id == id)
            .cloned()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Unexpected("storage unavailable".to_string()));
        }
        Ok(())
    }
}

fn filter_matches(filter: &PostFilter, post: &Post) -> bool {
    if filter.user_id.is_some_and(|user_id| post.user_id != user_id) {
        return false;
    }
    match &filter.search {
        Some(term) => {
            let term = term.to_lowercase();
            post.title.to_lowercase().contains(&term)
                || post.username.to_lowercase().contains(&term)
        }
        None => true,
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        self.check_available()?;

        let id = {
            let mut next_id = self.next_id.lock().expect("next_id mutex poisoned");
            *next_id += 1;
            *next_id
        };
        // Spread creation times so newest-first ordering is observable.
        let created_at = Utc::now() + Duration::milliseconds(id);
        let post = Post::new(
            id,
            input.title,
            input.image_url,
            input.content,
            input.username,
            input.user_id,
            created_at,
            created_at,
        )?;

        self.posts
            .lock()
            .expect("posts mutex poisoned")
            .push(post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        self.check_available()?;
        Ok(self.snapshot(id))
    }

    async fn update_post_owned(
        &self,
        post_id: i64,
        owner_id: i64,
        patch: PostPatch,
    ) -> Result<Option<Post>, DomainError> {
        self.check_available()?;

        let mut posts = self.posts.lock().expect("posts mutex poisoned");
        let Some(post) = posts
            .iter_mut()
            .find(|post| post.id == post_id && post.user_id == owner_id)
        else {
            return Ok(None);
        };

        post.title = patch.title;
        post.image_url = patch.image_url;
        post.content = patch.content;
        post.updated_at = Utc::now().max(post.created_at);
        Ok(Some(post.clone()))
    }

    async fn delete_post_owned(&self, post_id: i64, owner_id: i64) -> Result<bool, DomainError> {
        self.check_available()?;

        let mut posts = self.posts.lock().expect("posts mutex poisoned");
        let before = posts.len();
        posts.retain(|post| !(post.id == post_id && post.user_id == owner_id));
        Ok(posts.len() < before)
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        pagination: Pagination,
    ) -> Result<Vec<Post>, DomainError> {
        self.check_available()?;

        let posts = self.posts.lock().expect("posts mutex poisoned");
        let mut selected: Vec<Post> = posts
            .iter()
            .filter(|post| filter_matches(filter, post))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(selected
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect())
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<i64, DomainError> {
        self.check_available()?;

        let posts = self.posts.lock().expect("posts mutex poisoned");
        Ok(posts.iter().filter(|post| filter_matches(filter, post)).count() as i64)
    }
}
