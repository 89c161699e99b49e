use axum::{routing::get, Router};
use crate::handlers::tax_rate;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tax-rates",
            get(tax_rate::get_tax_rates).post(tax_rate::create_tax_rate),
        )
        .route(
            "/tax-rates/{id}",
            get(tax_rate::get_tax_rate)
                .put(tax_rate::update_tax_rate)
                .delete(tax_rate::delete_tax_rate),
        )
        .route_layer(axum::middleware::from_fn(require_auth))
}
