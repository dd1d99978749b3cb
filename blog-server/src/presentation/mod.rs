use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::blog_service::BlogService;
use crate::data::post_repository::DynPostRepository;
use crate::data::user_repository::DynUserRepository;
use crate::infrastructure::jwt::JwtService;

pub(crate) mod http;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<AuthService<DynUserRepository>>,
    pub(crate) blog_service: Arc<BlogService<DynPostRepository>>,
    pub(crate) jwt: Arc<JwtService>,
    pub(crate) environment: Arc<str>,
}

impl AppState {
    pub(crate) fn new(
        auth_service: Arc<AuthService<DynUserRepository>>,
        blog_service: Arc<BlogService<DynPostRepository>>,
        jwt: Arc<JwtService>,
        environment: &str,
    ) -> Self {
        Self {
            auth_service,
            blog_service,
            jwt,
            environment: Arc::from(environment),
        }
    }
}
