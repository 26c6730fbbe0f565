use std::{collections::BTreeMap, ops::Deref};

use axum::async_trait;
use bb8_postgres::{
    bb8::{self, CustomizeConnection},
    tokio_postgres, PostgresConnectionManager,
};

#[derive(Ord, PartialOrd, Eq, PartialEq)]
pub enum Statement {
    GetAccount,
    UpdateBalance,
    DeleteAccount,
    RecordTransaction,
    CommitTransaction,
    ListTransactions,
}

#[derive(Debug)]
pub struct Cache;

#[async_trait]
impl CustomizeConnection<Connection, tokio_postgres::Error> for Cache {
    async fn on_acquire(&self, conn: &mut Connection) -> Result<(), tokio_postgres::Error> {
        conn.statements.insert(
            Statement::GetAccount,
            conn.prepare("SELECT id, balance FROM accounts WHERE id = $1;")
                .await?,
        );

        conn.statements.insert(
            Statement::UpdateBalance,
            conn.prepare("UPDATE accounts SET balance = $3 WHERE id = $1 AND balance = $2;")
                .await?,
        );

        conn.statements.insert(
            Statement::DeleteAccount,
            conn.prepare("DELETE FROM accounts WHERE id = $1;").await?,
        );

        conn.statements.insert(
            Statement::RecordTransaction,
            conn.prepare(
                r#"
                    INSERT INTO transactions
                        (account_id, transaction_type, amount, post_balance)
                    VALUES
                        ($1, $2, $3, $4);
                "#,
            )
            .await?,
        );

        // Single statement, so the balance change and its history row
        // are written or dropped together.
        conn.statements.insert(
            Statement::CommitTransaction,
            conn.prepare(
                r#"
                    WITH updated AS (
                        UPDATE accounts
                        SET balance = $3
                        WHERE id = $1 AND balance = $2
                        RETURNING id, balance
                    )
                    INSERT INTO transactions
                        (account_id, transaction_type, amount, post_balance)
                    SELECT
                        id, $4::transaction_type, $5::numeric, balance
                    FROM
                        updated;
                "#,
            )
            .await?,
        );

        conn.statements.insert(
            Statement::ListTransactions,
            conn.prepare(
                r#"
                    SELECT
                        account_id,
                        transaction_type,
                        amount,
                        post_balance,
                        recorded_at
                    FROM
                        transactions
                    WHERE
                        account_id = $1
                    ORDER BY
                        id ASC;
                "#,
            )
            .await?,
        );

        Ok(())
    }
}

pub struct Connection {
    inner: tokio_postgres::Client,
    pub statements: BTreeMap<Statement, tokio_postgres::Statement>,
}

impl Connection {
    fn new(inner: tokio_postgres::Client) -> Self {
        Self {
            inner,
            statements: Default::default(),
        }
    }

    pub fn statement(&self, statement: Statement) -> Option<&tokio_postgres::Statement> {
        self.statements.get(&statement)
    }
}

impl Deref for Connection {
    type Target = tokio_postgres::Client;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub struct ConnectionManager<Tls>
where
    Tls: tokio_postgres::tls::MakeTlsConnect<tokio_postgres::Socket>,
{
    inner: PostgresConnectionManager<Tls>,
}

impl<Tls> ConnectionManager<Tls>
where
    Tls: tokio_postgres::tls::MakeTlsConnect<tokio_postgres::Socket>,
{
    pub fn new(config: tokio_postgres::Config, tls: Tls) -> Self {
        Self {
            inner: PostgresConnectionManager::new(config, tls),
        }
    }
}

#[async_trait]
impl<Tls> bb8::ManageConnection for ConnectionManager<Tls>
where
    Tls: tokio_postgres::tls::MakeTlsConnect<tokio_postgres::Socket>  + Clone + Send + Sync + 'static,
    <Tls as tokio_postgres::tls::MakeTlsConnect<tokio_postgres::Socket>>::Stream: Send + Sync,
    <Tls as tokio_postgres::tls::MakeTlsConnect<tokio_postgres::Socket>>::TlsConnect: Send,
    <<Tls as tokio_postgres::tls::MakeTlsConnect<tokio_postgres::Socket>>::TlsConnect as tokio_postgres::tls::TlsConnect<tokio_postgres::Socket>>::Future: Send,
{
    type Connection = Connection;
    type Error = tokio_postgres::Error;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let conn = self.inner.connect().await?;
        Ok(Connection::new(conn))
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.simple_query("").await.map(|_| ())
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        self.inner.has_broken(&mut conn.inner)
    }
}
