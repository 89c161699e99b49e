use axum::{routing::get, Router};
use crate::handlers::item;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(item::get_items).post(item::create_item))
        .route(
            "/items/{id}",
            get(item::get_item)
                .put(item::update_item)
                .delete(item::delete_item),
        )
        .route_layer(axum::middleware::from_fn(require_auth))
}
