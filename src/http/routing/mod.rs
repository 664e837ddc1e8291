pub mod todos;

use axum::Router;

/// Serves the todo routes at the root and again under `/api`.
pub fn app(router: Router) -> Router {
    Router::new()
        .merge(router.clone())
        .nest("/api", router)
}
