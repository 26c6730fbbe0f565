use std::sync::Arc;

use crate::{
    models::{Account, AccountId},
    service::Service,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

pub async fn show(
    State(service): State<Arc<Service>>,
    Path(id): Path<AccountId>,
) -> Result<Json<Account>, StatusCode> {
    Ok(Json(service.get_account(id).await?))
}

pub async fn delete(
    State(service): State<Arc<Service>>,
    Path(id): Path<AccountId>,
) -> Result<Json<bool>, StatusCode> {
    Ok(Json(service.delete_account(id).await?))
}
