use crate::{
    models::{Account, AccountId, Transaction, TransactionRecord},
    telemetry,
};
use axum::async_trait;
use rust_decimal::Decimal;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not reach the database")]
    Connection,
    #[error("internal storage error: {0}")]
    Internal(String),
    #[error("account not found")]
    AccountNotFound,
    #[error("balance changed by a concurrent update")]
    Conflict,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get(&self, account_id: AccountId) -> Result<Account, Error>;

    /// Stores `balance` only if the current balance still equals `expected`,
    /// failing with [`Error::Conflict`] otherwise, or with
    /// [`Error::AccountNotFound`] when the account is gone.
    async fn update_balance(
        &self,
        account_id: AccountId,
        expected: Decimal,
        balance: Decimal,
    ) -> Result<(), Error>;

    async fn delete(&self, account_id: AccountId) -> Result<bool, Error>;
}

#[async_trait]
pub trait TransactionRecorder: Send + Sync {
    async fn record(&self, transaction: &Transaction) -> Result<(), Error>;

    /// Recorded transactions of an account, oldest first.
    async fn history(&self, account_id: AccountId) -> Result<Vec<TransactionRecord>, Error>;
}

/// Both stores behind one handle, so that an applied transaction can be
/// committed as a unit.
#[async_trait]
pub trait Ledger: AccountStore + TransactionRecorder {
    /// Moves the balance from `expected` to the transaction's post balance and
    /// records the transaction.
    ///
    /// Stores that can do both in one atomic write override this; the default
    /// leaves the balance committed when recording fails.
    async fn commit(&self, transaction: &Transaction, expected: Decimal) -> Result<(), Error> {
        self.update_balance(
            transaction.account_id,
            expected,
            transaction.outcome.post_balance(),
        )
        .await?;

        self.record(transaction).await.map_err(|err| {
            telemetry::error!(
                "Balance of account {} updated but recording the transaction failed: {}",
                transaction.account_id,
                err
            );

            err
        })
    }
}
