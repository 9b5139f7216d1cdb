//! In-memory account store.
//!
//! Holds the write lock for the whole read-check-write sequence of every
//! mutation, which gives the same serialization as row locks in Postgres.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{RwLock, RwLockWriteGuard};

use super::{
    ACCOUNT_PAGE_LIMIT, AccountNumberGenerator, AccountStore, StoreError, credited, debited,
    insert_with_fresh_number, validate_new_balance, validate_transfer,
};
use crate::models::account::Account;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct State {
    accounts: BTreeMap<i64, Account>,
    /// account number -> id
    numbers: HashMap<i64, i64>,
    last_id: i64,
}

/// Process-local account store.
pub struct InMemoryAccountStore {
    state: RwLock<State>,
    numbers: Arc<dyn AccountNumberGenerator>,
    lock_timeout: Duration,
}

impl InMemoryAccountStore {
    pub fn new(numbers: Arc<dyn AccountNumberGenerator>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            numbers,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Bound how long a writer waits for the store lock.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    async fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        tokio::time::timeout(self.lock_timeout, self.state.write())
            .await
            .map_err(|_| StoreError::Unavailable("timed out waiting for account lock".to_string()))
    }

    async fn insert_account(
        &self,
        first_name: &str,
        last_name: &str,
        number: i64,
    ) -> Result<i64, StoreError> {
        let mut state = self.write().await?;

        if state.numbers.contains_key(&number) {
            return Err(StoreError::Conflict(format!(
                "account number {number} already exists"
            )));
        }

        state.last_id += 1;
        let id = state.last_id;
        let now = Utc::now();
        state.accounts.insert(
            id,
            Account {
                id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                number,
                balance: Decimal::ZERO,
                created_at: now,
                updated_at: now,
            },
        );
        state.numbers.insert(number, id);

        Ok(id)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    #[tracing::instrument(skip(self))]
    async fn create_account(&self, first_name: &str, last_name: &str) -> Result<i64, StoreError> {
        insert_with_fresh_number(self.numbers.as_ref(), move |number| {
            self.insert_account(first_name, last_name, number)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_account_by_id(&self, id: i64) -> Result<Account, StoreError> {
        let state = self.state.read().await;
        state.accounts.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    #[tracing::instrument(skip(self))]
    async fn get_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .take(ACCOUNT_PAGE_LIMIT as usize)
            .cloned()
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_account(&self, id: i64) -> Result<i64, StoreError> {
        let mut state = self.write().await?;
        let account = state.accounts.remove(&id).ok_or(StoreError::NotFound)?;
        state.numbers.remove(&account.number);
        Ok(id)
    }

    #[tracing::instrument(skip(self))]
    async fn update_account_balance(
        &self,
        id: i64,
        number: i64,
        balance: Decimal,
    ) -> Result<i64, StoreError> {
        validate_new_balance(balance)?;

        let mut state = self.write().await?;
        let account = state
            .accounts
            .get_mut(&id)
            .filter(|account| account.number == number)
            .ok_or(StoreError::NotFound)?;

        account.balance = balance;
        account.updated_at = Utc::now();
        Ok(id)
    }

    #[tracing::instrument(skip(self))]
    async fn transfer_money(
        &self,
        from_number: i64,
        to_number: i64,
        amount: Decimal,
    ) -> Result<(), StoreError> {
        validate_transfer(from_number, to_number, amount)?;

        let mut state = self.write().await?;

        let from_id = *state.numbers.get(&from_number).ok_or(StoreError::NotFound)?;
        let from_balance = state
            .accounts
            .get(&from_id)
            .ok_or(StoreError::NotFound)?
            .balance;
        let new_from = debited(from_balance, amount)?;

        let to_id = *state.numbers.get(&to_number).ok_or(StoreError::NotFound)?;
        let to_balance = state
            .accounts
            .get(&to_id)
            .ok_or(StoreError::NotFound)?
            .balance;
        let new_to = credited(to_balance, amount)?;

        // Both balances are computed; only plain assignments remain
        let now = Utc::now();
        if let Some(from) = state.accounts.get_mut(&from_id) {
            from.balance = new_from;
            from.updated_at = now;
        }
        if let Some(to) = state.accounts.get_mut(&to_id) {
            to.balance = new_to;
            to.updated_at = now;
        }

        tracing::info!("Transfer committed");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
