mod account;
mod transaction;

use axum::http::StatusCode;
pub use account::delete as delete_account;
pub use account::show as show_account;
pub use transaction::create as create_transaction;
pub use transaction::list as list_transactions;

use crate::persistence;
use crate::service;
use crate::telemetry;

impl From<service::Error> for StatusCode {
    fn from(err: service::Error) -> Self {
        match err {
            service::Error::AccountNotFound(_) => StatusCode::NOT_FOUND,
            service::Error::UnrecognizedTransactionType(_)
            | service::Error::InvalidAmount(_)
            | service::Error::AmountOutOfRange(_) => {
                telemetry::debug!("Bad request: {}", err);

                StatusCode::BAD_REQUEST
            }
            service::Error::Persistence(err) => err.into(),
        }
    }
}

impl From<persistence::Error> for StatusCode {
    fn from(err: persistence::Error) -> Self {
        telemetry::error!("Database error: {:?}", err);

        match err {
            persistence::Error::AccountNotFound => StatusCode::NOT_FOUND,
            persistence::Error::Conflict => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
