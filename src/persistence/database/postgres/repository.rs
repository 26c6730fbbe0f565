use super::statements_cache::{self, Statement};
use crate::{
    config,
    models::{Account, AccountId, Transaction, TransactionRecord},
    persistence::{AccountStore, Error, Ledger, TransactionRecorder},
    telemetry,
};
use axum::async_trait;
use bb8_postgres::{
    bb8::{self, Pool, PooledConnection},
    tokio_postgres::{self},
};
use rust_decimal::Decimal;
use std::str::FromStr;

type Manager = statements_cache::ConnectionManager<tokio_postgres::NoTls>;

#[derive(Clone)]
pub struct Repository {
    pool: Pool<Manager>,
}

impl Repository {
    pub async fn new(config: &config::Database) -> Result<Self, Error> {
        let manager = statements_cache::ConnectionManager::new(
            tokio_postgres::Config::from_str(&config.connection_string())?,
            tokio_postgres::NoTls,
        );

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .min_idle(Some(config.pool_size))
            .connection_customizer(Box::new(statements_cache::Cache))
            .connection_timeout(std::time::Duration::from_secs(5))
            .build(manager)
            .await?;

        Ok(Self { pool })
    }

    pub async fn connection(&self) -> Result<PooledConnection<'_, Manager>, Error> {
        let conn = self.pool.get().await?;
        Ok(conn)
    }
}

fn prepared(
    conn: &statements_cache::Connection,
    statement: Statement,
) -> Result<&tokio_postgres::Statement, Error> {
    conn.statement(statement)
        .ok_or(Error::Internal("Statement not found".into()))
}

/// Tells why a compare-and-set touched no row: the account is gone, or its
/// balance moved on.
async fn unchanged(conn: &statements_cache::Connection, account_id: AccountId) -> Error {
    let found = match prepared(conn, Statement::GetAccount) {
        Ok(statement) => conn.query_opt(statement, &[&account_id]).await,
        Err(err) => return err,
    };

    match found {
        Ok(Some(_)) => {
            telemetry::info!("Balance of account {} changed concurrently", account_id);

            Error::Conflict
        }
        Ok(None) => Error::AccountNotFound,
        Err(err) => err.into(),
    }
}

#[async_trait]
impl AccountStore for Repository {
    async fn get(&self, account_id: AccountId) -> Result<Account, Error> {
        let conn = self.connection().await?;

        let row = conn
            .query_opt(prepared(&conn, Statement::GetAccount)?, &[&account_id])
            .await?
            .ok_or(Error::AccountNotFound)?;

        row.try_into()
    }

    async fn update_balance(
        &self,
        account_id: AccountId,
        expected: Decimal,
        balance: Decimal,
    ) -> Result<(), Error> {
        let conn = self.connection().await?;

        let updated = conn
            .execute(
                prepared(&conn, Statement::UpdateBalance)?,
                &[&account_id, &expected, &balance],
            )
            .await?;

        match updated {
            0 => Err(unchanged(&conn, account_id).await),
            _ => Ok(()),
        }
    }

    async fn delete(&self, account_id: AccountId) -> Result<bool, Error> {
        let conn = self.connection().await?;

        let deleted = conn
            .execute(prepared(&conn, Statement::DeleteAccount)?, &[&account_id])
            .await?;

        match deleted {
            0 => Err(Error::AccountNotFound),
            _ => Ok(true),
        }
    }
}

#[async_trait]
impl TransactionRecorder for Repository {
    async fn record(&self, transaction: &Transaction) -> Result<(), Error> {
        let conn = self.connection().await?;

        conn.execute(
            prepared(&conn, Statement::RecordTransaction)?,
            &[
                &transaction.account_id,
                &transaction.transaction_type,
                &transaction.amount,
                &transaction.outcome.post_balance(),
            ],
        )
        .await?;

        Ok(())
    }

    async fn history(&self, account_id: AccountId) -> Result<Vec<TransactionRecord>, Error> {
        let conn = self.connection().await?;

        let rows = conn
            .query(prepared(&conn, Statement::ListTransactions)?, &[&account_id])
            .await?;

        rows.into_iter().map(TransactionRecord::try_from).collect()
    }
}

#[async_trait]
impl Ledger for Repository {
    async fn commit(&self, transaction: &Transaction, expected: Decimal) -> Result<(), Error> {
        let conn = self.connection().await?;

        let committed = conn
            .execute(
                prepared(&conn, Statement::CommitTransaction)?,
                &[
                    &transaction.account_id,
                    &expected,
                    &transaction.outcome.post_balance(),
                    &transaction.transaction_type,
                    &transaction.amount,
                ],
            )
            .await?;

        match committed {
            0 => Err(unchanged(&conn, transaction.account_id).await),
            _ => Ok(()),
        }
    }
}

impl TryFrom<tokio_postgres::Row> for Account {
    type Error = Error;

    fn try_from(row: tokio_postgres::Row) -> Result<Self, Self::Error> {
        Ok(Self {
            account_id: row.try_get("id")?,
            balance: row.try_get("balance")?,
        })
    }
}

impl TryFrom<tokio_postgres::Row> for TransactionRecord {
    type Error = Error;

    fn try_from(row: tokio_postgres::Row) -> Result<Self, Self::Error> {
        Ok(Self {
            account_id: row.try_get("account_id")?,
            transaction_type: row.try_get("transaction_type")?,
            transaction_amount: row.try_get("amount")?,
            post_balance: row.try_get("post_balance")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }
}

impl From<bb8::RunError<tokio_postgres::Error>> for Error {
    fn from(err: bb8::RunError<tokio_postgres::Error>) -> Self {
        telemetry::error!("Postgres error: {:?}", err);

        match err {
            bb8::RunError::User(e) => Self::Internal(e.to_string()),
            bb8::RunError::TimedOut => Self::Connection,
        }
    }
}

impl From<tokio_postgres::Error> for Error {
    fn from(err: tokio_postgres::Error) -> Self {
        telemetry::error!("Postgres error: {:?}", err);

        Self::Internal(err.to_string())
    }
}
