use super::routes;
use crate::service::Service;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn new(service: Arc<Service>) -> Router {
    Router::new()
        .route(
            "/accounts/:id",
            get(routes::show_account).delete(routes::delete_account),
        )
        .route(
            "/accounts/:id/transactions",
            post(routes::create_transaction).get(routes::list_transactions),
        )
        .with_state(service)
}
