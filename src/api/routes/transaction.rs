use std::sync::Arc;

use crate::{
    models::{self, AccountId, ErrorInfo, TransactionRecord, TransactionType},
    service::Service,
    telemetry,
};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Path, Request as AxumRequest, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// The transaction type stays a plain string here so that an unknown type
/// reaches the service and comes back as a bad request.
#[cfg_attr(test, derive(Debug, PartialEq))]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub amount: Decimal,
    pub transaction_type: String,
}

#[cfg_attr(test, derive(Debug))]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub account_id: AccountId,
    pub transaction_type: TransactionType,
    pub transaction_amount: Decimal,
    pub post_balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl From<models::Transaction> for Response {
    fn from(transaction: models::Transaction) -> Self {
        Self {
            account_id: transaction.account_id,
            transaction_type: transaction.transaction_type,
            transaction_amount: transaction.amount,
            post_balance: transaction.outcome.post_balance(),
            error: transaction.outcome.error(),
        }
    }
}

pub async fn create(
    State(service): State<Arc<Service>>,
    Path(id): Path<AccountId>,
    ValidateCreate(payload): ValidateCreate<Request>,
) -> Result<Json<Response>, StatusCode> {
    let transaction = service
        .update_account(id, payload.amount, &payload.transaction_type)
        .await?;

    Ok(Json(transaction.into()))
}

pub async fn list(
    State(service): State<Arc<Service>>,
    Path(id): Path<AccountId>,
) -> Result<Json<Vec<TransactionRecord>>, StatusCode> {
    Ok(Json(service.transactions(id).await?))
}

pub struct ValidateCreate<Request>(pub Request);

#[async_trait]
impl<S> FromRequest<S> for ValidateCreate<Request>
where
    Request: DeserializeOwned,
    S: Send + Sync,
    Json<Request>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = StatusCode;

    async fn from_request(req: AxumRequest, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::from_request(req, state).await.map_err(
            #[cfg_attr(not(feature = "telemetry"), allow(unused_variables))]
            |e| {
                telemetry::error!("Failed to deserialize request JSON: {}", e);

                StatusCode::UNPROCESSABLE_ENTITY
            },
        )?;

        Ok(Self(data))
    }
}
