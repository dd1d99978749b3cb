//! In-process repositories backing service and router tests.

pub(crate) mod post_repository;
pub(crate) mod user_repository;
