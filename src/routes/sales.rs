use axum::{routing::get, Router};
use crate::handlers::sale;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sale::list_sales).post(sale::create_sale))
        .route(
            "/sales/{id}",
            get(sale::get_sale)
                .patch(sale::update_sale)
                .delete(sale::archive_sale),
        )
        .route_layer(axum::middleware::from_fn(require_auth))
}
