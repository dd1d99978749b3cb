use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::User;

#[derive(Debug, Clone, Default)]
pub(crate) struct InMemoryUserRepository {
    users: Arc<Mutex<Vec<UserCredentials>>>,
}

impl InMemoryUserRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn user_count(&self) -> usize {
        self.users.lock().expect("users mutex poisoned").len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned");

        if users.iter().any(|c| c.user.username == input.username) {
            return Err(DomainError::DuplicateField("username"));
        }
        if users.iter().any(|c| c.user.email == input.email) {
            return Err(DomainError::DuplicateField("email"));
        }

        let id = users.len() as i64 + 1;
        let user = User::new(id, input.username, input.email)?;
        users.push(UserCredentials {
            user: user.clone(),
            password_hash: input.password_hash,
        });
        Ok(user)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        let users = self.users.lock().expect("users mutex poisoned");
        Ok(users.iter().find(|c| c.user.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        let users = self.users.lock().expect("users mutex poisoned");
        Ok(users.iter().find(|c| c.user.email == email).cloned())
    }
}
