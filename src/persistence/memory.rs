use crate::{
    models::{Account, AccountId, Transaction, TransactionRecord},
    persistence::{AccountStore, Error, Ledger, TransactionRecorder},
};
use axum::async_trait;
use rust_decimal::Decimal;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::SystemTime,
};

#[derive(Default)]
struct State {
    balances: HashMap<AccountId, Decimal>,
    history: Vec<TransactionRecord>,
}

/// Account store and transaction recorder kept in process memory.
#[derive(Default)]
pub struct Repository {
    state: Mutex<State>,
}

impl Repository {
    pub fn with_accounts(accounts: impl IntoIterator<Item = (AccountId, Decimal)>) -> Self {
        let repo = Self::default();
        repo.lock().balances.extend(accounts);
        repo
    }

    pub fn balance(&self, account_id: AccountId) -> Option<Decimal> {
        self.lock().balances.get(&account_id).copied()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn record_of(transaction: &Transaction) -> TransactionRecord {
    TransactionRecord {
        account_id: transaction.account_id,
        transaction_type: transaction.transaction_type,
        transaction_amount: transaction.amount,
        post_balance: transaction.outcome.post_balance(),
        recorded_at: SystemTime::now(),
    }
}

fn compare_and_set(
    state: &mut State,
    account_id: AccountId,
    expected: Decimal,
    balance: Decimal,
) -> Result<(), Error> {
    let current = state
        .balances
        .get_mut(&account_id)
        .ok_or(Error::AccountNotFound)?;

    if *current != expected {
        return Err(Error::Conflict);
    }

    *current = balance;
    Ok(())
}

#[async_trait]
impl AccountStore for Repository {
    async fn get(&self, account_id: AccountId) -> Result<Account, Error> {
        self.lock()
            .balances
            .get(&account_id)
            .map(|balance| Account {
                account_id,
                balance: *balance,
            })
            .ok_or(Error::AccountNotFound)
    }

    async fn update_balance(
        &self,
        account_id: AccountId,
        expected: Decimal,
        balance: Decimal,
    ) -> Result<(), Error> {
        compare_and_set(&mut self.lock(), account_id, expected, balance)
    }

    async fn delete(&self, account_id: AccountId) -> Result<bool, Error> {
        let mut state = self.lock();

        state
            .balances
            .remove(&account_id)
            .ok_or(Error::AccountNotFound)?;
        state
            .history
            .retain(|record| record.account_id != account_id);

        Ok(true)
    }
}

#[async_trait]
impl TransactionRecorder for Repository {
    async fn record(&self, transaction: &Transaction) -> Result<(), Error> {
        self.lock().history.push(record_of(transaction));

        Ok(())
    }

    async fn history(&self, account_id: AccountId) -> Result<Vec<TransactionRecord>, Error> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|record| record.account_id == account_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Ledger for Repository {
    async fn commit(&self, transaction: &Transaction, expected: Decimal) -> Result<(), Error> {
        let mut state = self.lock();

        compare_and_set(
            &mut state,
            transaction.account_id,
            expected,
            transaction.outcome.post_balance(),
        )?;
        state.history.push(record_of(transaction));

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::{Outcome, TransactionType};
    use rstest::{fixture, rstest};

    #[fixture]
    fn repo() -> Repository {
        Repository::with_accounts([(50001, Decimal::from(150))])
    }

    #[rstest]
    #[tokio::test]
    async fn test_get(repo: Repository) {
        let account = repo.get(50001).await.unwrap();

        assert_eq!(account.balance, Decimal::from(150));
        assert!(matches!(repo.get(1).await, Err(Error::AccountNotFound)));
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_balance_compares_before_setting(repo: Repository) {
        repo.update_balance(50001, Decimal::from(150), Decimal::from(200))
            .await
            .unwrap();

        assert!(matches!(
            repo.update_balance(50001, Decimal::from(150), Decimal::from(300))
                .await,
            Err(Error::Conflict)
        ));
        assert_eq!(repo.balance(50001), Some(Decimal::from(200)));
    }

    #[rstest]
    #[case::applied(Decimal::from(150), Decimal::from(200), 1)]
    #[case::stale(Decimal::from(140), Decimal::from(150), 0)]
    #[tokio::test]
    async fn test_commit(
        repo: Repository,
        #[case] expected: Decimal,
        #[case] balance: Decimal,
        #[case] recorded: usize,
    ) {
        let transaction = Transaction {
            account_id: 50001,
            transaction_type: TransactionType::Deposit,
            amount: Decimal::from(50),
            outcome: Outcome::Applied {
                post_balance: Decimal::from(200),
            },
        };

        let committed = repo.commit(&transaction, expected).await;

        assert_eq!(committed.is_ok(), recorded == 1);
        assert_eq!(repo.balance(50001), Some(balance));
        assert_eq!(repo.history(50001).await.unwrap().len(), recorded);
    }

    #[rstest]
    #[tokio::test]
    async fn test_commit_to_deleted_account(repo: Repository) {
        repo.delete(50001).await.unwrap();

        let committed = repo
            .commit(
                &Transaction {
                    account_id: 50001,
                    transaction_type: TransactionType::Deposit,
                    amount: Decimal::from(50),
                    outcome: Outcome::Applied {
                        post_balance: Decimal::from(200),
                    },
                },
                Decimal::from(150),
            )
            .await;

        assert!(matches!(committed, Err(Error::AccountNotFound)));
        assert!(repo.history(50001).await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_drops_history(repo: Repository) {
        repo.record(&Transaction {
            account_id: 50001,
            transaction_type: TransactionType::Deposit,
            amount: Decimal::from(50),
            outcome: Outcome::Applied {
                post_balance: Decimal::from(200),
            },
        })
        .await
        .unwrap();

        assert_eq!(repo.history(50001).await.unwrap().len(), 1);
        assert!(repo.delete(50001).await.unwrap());
        assert!(repo.history(50001).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(50001).await,
            Err(Error::AccountNotFound)
        ));
    }
}
