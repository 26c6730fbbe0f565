//! Account operations on top of the stores.
//!
//! A transaction request runs once through load, type check, validation and,
//! when the validator applies it, a commit that moves the balance by
//! compare-and-set and records the transaction. Business rejections come back
//! as a [`Transaction`] carrying the unchanged balance; nothing is stored for
//! them.

use crate::{
    models::{
        Account, AccountId, Transaction, TransactionRecord, TransactionType,
        UnrecognizedTransactionType,
    },
    persistence::{self, AccountStore, Ledger, TransactionRecorder},
    telemetry,
    validator::{self, Limits},
};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
    #[error("unrecognized transaction type: {0:?}")]
    UnrecognizedTransactionType(String),
    #[error("transaction amount must be positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("transaction amount {0} takes the balance out of range")]
    AmountOutOfRange(Decimal),
    #[error(transparent)]
    Persistence(persistence::Error),
}

impl Error {
    fn from_persistence(account_id: AccountId, err: persistence::Error) -> Self {
        match err {
            persistence::Error::AccountNotFound => Self::AccountNotFound(account_id),
            err => Self::Persistence(err),
        }
    }
}

impl From<validator::Error> for Error {
    fn from(err: validator::Error) -> Self {
        match err {
            validator::Error::InvalidAmount(amount) => Self::InvalidAmount(amount),
            validator::Error::OutOfRange(amount) => Self::AmountOutOfRange(amount),
        }
    }
}

pub struct Service {
    ledger: Arc<dyn Ledger>,
    limits: Limits,
}

impl Service {
    pub fn new(ledger: Arc<dyn Ledger>, limits: Limits) -> Self {
        Self { ledger, limits }
    }

    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, Error> {
        self.ledger
            .get(account_id)
            .await
            .map_err(|e| Error::from_persistence(account_id, e))
    }

    pub async fn update_account(
        &self,
        account_id: AccountId,
        amount: Decimal,
        transaction_type: &str,
    ) -> Result<Transaction, Error> {
        let account = self.get_account(account_id).await?;

        let transaction_type: TransactionType = transaction_type
            .parse()
            .map_err(|e: UnrecognizedTransactionType| {
                telemetry::debug!("Rejecting transaction type {:?}", e.0);

                Error::UnrecognizedTransactionType(e.0)
            })?;

        let outcome =
            validator::validate(&self.limits, account.balance, amount, transaction_type)?;

        let transaction = Transaction {
            account_id,
            transaction_type,
            amount,
            outcome,
        };

        if !transaction.outcome.is_applied() {
            telemetry::info!(
                "{} of {} on account {} rejected",
                transaction_type,
                amount,
                account_id
            );

            return Ok(transaction);
        }

        self.ledger
            .commit(&transaction, account.balance)
            .await
            .map_err(|e| Error::from_persistence(account_id, e))?;

        Ok(transaction)
    }

    pub async fn delete_account(&self, account_id: AccountId) -> Result<bool, Error> {
        self.ledger
            .delete(account_id)
            .await
            .map_err(|e| Error::from_persistence(account_id, e))
    }

    pub async fn transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<TransactionRecord>, Error> {
        self.get_account(account_id).await?;

        self.ledger
            .history(account_id)
            .await
            .map_err(|e| Error::from_persistence(account_id, e))
    }
}
