use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};

use crate::presentation::AppState;
use crate::presentation::http::handlers::posts::{
    create_post, delete_post, get_post, list_my_posts, list_posts, update_post,
};
use crate::presentation::http::middleware::auth::jwt_auth_middleware;

// Fixed segments come before `/{id}` so `/user/me` never reaches the id parser.
pub(crate) fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_posts))
        .route("/{id}", get(get_post));

    let protected = Router::new()
        .route("/user/me", get(list_my_posts))
        .route("/", post(create_post))
        .route("/{id}", put(update_post).delete(delete_post))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware));

    protected.merge(public)
}
