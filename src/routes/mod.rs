pub mod items;
pub mod sales;
pub mod tax_rates;

use axum::Router;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(sales::routes())
        .merge(items::routes())
        .merge(tax_rates::routes())
}
