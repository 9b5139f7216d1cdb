//! PostgreSQL account store.
//!
//! All mutations run inside a database transaction with a bounded
//! `lock_timeout`, so a stalled writer makes other requests fail with a
//! retryable error instead of hanging them.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, Postgres, Transaction};

use super::{
    ACCOUNT_PAGE_LIMIT, AccountNumberGenerator, AccountStore, StoreError, credited, debited,
    insert_with_fresh_number, validate_new_balance, validate_transfer,
};
use crate::{db::DbPool, models::account::Account};

/// Account store backed by the `account` table.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: DbPool,
    numbers: Arc<dyn AccountNumberGenerator>,
    /// `lock_timeout` setting applied to every write transaction, e.g. `"5000ms"`
    lock_timeout: String,
}

impl PgAccountStore {
    pub fn new(
        pool: DbPool,
        numbers: Arc<dyn AccountNumberGenerator>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            numbers,
            lock_timeout: format!("{}ms", lock_timeout.as_millis()),
        }
    }

    /// Start a transaction whose row-lock waits are bounded.
    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Scoped to this transaction only (is_local = true)
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(&self.lock_timeout)
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }

    async fn insert_account(
        &self,
        first_name: &str,
        last_name: &str,
        number: i64,
    ) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO account (first_name, last_name, number, balance)
            VALUES ($1, $2, $3, 0)
            RETURNING id
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(number)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}

/// Lock an account row by number and read its balance.
///
/// FOR UPDATE keeps other transactions from modifying the row until we
/// commit or roll back.
async fn lock_balance(conn: &mut PgConnection, number: i64) -> Result<Option<Decimal>, StoreError> {
    let balance =
        sqlx::query_scalar::<_, Decimal>("SELECT balance FROM account WHERE number = $1 FOR UPDATE")
            .bind(number)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(balance)
}

async fn write_balance(conn: &mut PgConnection, number: i64, balance: Decimal) -> Result<(), StoreError> {
    sqlx::query("UPDATE account SET balance = $1, updated_at = NOW() WHERE number = $2")
        .bind(balance)
        .bind(number)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[async_trait]
impl AccountStore for PgAccountStore {
    #[tracing::instrument(skip(self))]
    async fn create_account(&self, first_name: &str, last_name: &str) -> Result<i64, StoreError> {
        insert_with_fresh_number(self.numbers.as_ref(), move |number| {
            self.insert_account(first_name, last_name, number)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_account_by_id(&self, id: i64) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, first_name, last_name, number, balance, created_at, updated_at
            FROM account
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    #[tracing::instrument(skip(self))]
    async fn get_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, first_name, last_name, number, balance, created_at, updated_at
            FROM account
            ORDER BY id ASC
            LIMIT $1
            "#,
        )
        .bind(ACCOUNT_PAGE_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_account(&self, id: i64) -> Result<i64, StoreError> {
        let mut tx = self.begin().await?;

        let deleted = sqlx::query_scalar::<_, i64>("DELETE FROM account WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(deleted) = deleted else {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        };

        tx.commit().await?;
        Ok(deleted)
    }

    #[tracing::instrument(skip(self))]
    async fn update_account_balance(
        &self,
        id: i64,
        number: i64,
        balance: Decimal,
    ) -> Result<i64, StoreError> {
        validate_new_balance(balance)?;

        let mut tx = self.begin().await?;

        // Both id and number must match, otherwise nothing is updated
        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE account
            SET balance = $1,
                updated_at = NOW()
            WHERE id = $2 AND number = $3
            RETURNING id
            "#,
        )
        .bind(balance)
        .bind(id)
        .bind(number)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        };

        tx.commit().await?;
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    async fn transfer_money(
        &self,
        from_number: i64,
        to_number: i64,
        amount: Decimal,
    ) -> Result<(), StoreError> {
        validate_transfer(from_number, to_number, amount)?;

        let mut tx = self.begin().await?;

        // Lock rows in ascending number order so crossing transfers can't deadlock
        let from_first = from_number < to_number;
        let (first, second) = if from_first {
            (from_number, to_number)
        } else {
            (to_number, from_number)
        };
        let first_balance = lock_balance(&mut tx, first).await?;
        let second_balance = lock_balance(&mut tx, second).await?;
        let (from_balance, to_balance) = if from_first {
            (first_balance, second_balance)
        } else {
            (second_balance, first_balance)
        };

        let Some(from_balance) = from_balance else {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        };

        let new_from = match debited(from_balance, amount) {
            Ok(balance) => balance,
            Err(err) => {
                tx.rollback().await?;
                return Err(err);
            }
        };

        let Some(to_balance) = to_balance else {
            tx.rollback().await?;
            return Err(StoreError::NotFound);
        };

        // Checked before writing so an overflow can't reach the column as a 22003
        let new_to = match credited(to_balance, amount) {
            Ok(balance) => balance,
            Err(err) => {
                tx.rollback().await?;
                return Err(err);
            }
        };

        write_balance(&mut tx, from_number, new_from).await?;
        write_balance(&mut tx, to_number, new_to).await?;

        // If this fails, everything rolls back
        tx.commit().await?;

        tracing::info!("Transfer committed");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
