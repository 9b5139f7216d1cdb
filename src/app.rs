//! HTTP router assembly.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, store::SharedStore};

/// Build the application router around an account store.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        // Account management routes
        .route(
            "/account",
            get(handlers::accounts::list_accounts).post(handlers::accounts::create_account),
        )
        .route(
            "/account/{id}",
            get(handlers::accounts::get_account)
                .delete(handlers::accounts::delete_account)
                .put(handlers::accounts::update_balance),
        )
        .route("/transfer", post(handlers::transfers::transfer))
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share the store with all handlers via State extraction
        .with_state(store)
}
