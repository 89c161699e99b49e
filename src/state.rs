// src/state.rs
use sqlx::PgPool;

use crate::services::sales::SalesService;

/// Shared application state, built once in `main` and cloned per handler.
///
/// Services are explicit members here rather than module-level singletons so
/// there is no hidden global mutable state.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub sales: SalesService,
}

impl AppState {
    pub fn new(db_pool: PgPool) -> Self {
        Self {
            db_pool,
            sales: SalesService::new(),
        }
    }
}
