//! Account storage.
//!
//! The `AccountStore` trait is the seam between HTTP handlers and persistence.
//! Two implementations exist:
//! - `PgAccountStore`: PostgreSQL with row-level locking (production)
//! - `InMemoryAccountStore`: process-local map (tests and local development)
//!
//! # Atomicity Guarantees
//!
//! Every mutation either applies completely or not at all. Transfers lock both
//! rows in ascending account-number order, so two transfers crossing the same
//! pair of accounts in opposite directions cannot deadlock.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::account::Account;

pub mod memory;
pub mod numbers;
pub mod postgres;

pub use memory::InMemoryAccountStore;
pub use numbers::{AccountNumberGenerator, RandomAccountNumbers, SequentialAccountNumbers};
pub use postgres::PgAccountStore;

/// Maximum number of accounts returned by `get_accounts`.
pub const ACCOUNT_PAGE_LIMIT: i64 = 10;

/// How many account numbers are drawn before giving up on a collision.
pub const MAX_NUMBER_ATTEMPTS: u32 = 5;

/// Fractional digits allowed on money amounts (`NUMERIC(20, 2)`).
pub const MONEY_SCALE: u32 = 2;

/// Largest balance or amount the `NUMERIC(20, 2)` column holds: 999999999999999999.99
pub const MAX_MONEY: Decimal = Decimal::from_parts(1_661_992_959, 1_808_227_885, 5, false, MONEY_SCALE);

/// Handle shared by all request handlers.
pub type SharedStore = Arc<dyn AccountStore>;

/// Errors produced by account storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No account matched the id, or the number/id pair did not match.
    #[error("Account not found")]
    NotFound,

    /// Input was out of range or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A uniqueness constraint was violated (e.g. duplicate account number).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Source account balance is lower than the requested transfer.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Storage could not be reached or a lock wait timed out. Safe to retry.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

/// SQLSTATE codes that signal a transient condition rather than a bug.
const RETRYABLE_SQLSTATES: &[&str] = &[
    "55P03", // lock_not_available (lock_timeout)
    "40P01", // deadlock_detected
    "40001", // serialization_failure
    "57014", // query_canceled (statement_timeout)
];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let code = match &err {
            sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
            _ => None,
        };

        // Database text names constraints and columns; clients get a fixed message
        match code.as_deref() {
            Some("23505") => {
                tracing::debug!(error = %err, "Unique constraint violated");
                return StoreError::Conflict("Account number already exists".to_string());
            }
            Some("23514") => {
                tracing::debug!(error = %err, "Check constraint violated");
                return StoreError::InvalidArgument("Balance cannot be negative".to_string());
            }
            Some("22003") => {
                tracing::debug!(error = %err, "Numeric value out of range");
                return StoreError::InvalidArgument(format!("Amounts cannot exceed {MAX_MONEY}"));
            }
            Some(code) if RETRYABLE_SQLSTATES.contains(&code) => {
                return StoreError::Unavailable(err.to_string());
            }
            _ => {}
        }

        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
            other => StoreError::Database(other),
        }
    }
}

/// Persistent account records.
///
/// Implementations must keep `number` unique and `balance` non-negative,
/// and must never expose a partially applied mutation.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Open an account with zero balance and a freshly drawn account number.
    async fn create_account(&self, first_name: &str, last_name: &str) -> Result<i64, StoreError>;

    async fn get_account_by_id(&self, id: i64) -> Result<Account, StoreError>;

    /// Up to `ACCOUNT_PAGE_LIMIT` accounts, ascending by id.
    async fn get_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Hard delete. Returns the id of the removed row.
    async fn delete_account(&self, id: i64) -> Result<i64, StoreError>;

    /// Set the balance of account `id`, provided its number equals `number`.
    async fn update_account_balance(
        &self,
        id: i64,
        number: i64,
        balance: Decimal,
    ) -> Result<i64, StoreError>;

    /// Atomically move `amount` from one account number to another.
    async fn transfer_money(
        &self,
        from_number: i64,
        to_number: i64,
        amount: Decimal,
    ) -> Result<(), StoreError>;

    /// Check that storage is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Reject amounts the balance column can't store: too many fractional
/// digits, or above `MAX_MONEY`.
pub fn check_money_scale(field: &str, value: Decimal) -> Result<(), StoreError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(StoreError::InvalidArgument(format!(
            "{field} must have at most {MONEY_SCALE} decimal places"
        )));
    }
    if value > MAX_MONEY {
        return Err(StoreError::InvalidArgument(format!(
            "{field} cannot exceed {MAX_MONEY}"
        )));
    }
    Ok(())
}

/// Source balance after sending `amount`.
pub(crate) fn debited(balance: Decimal, amount: Decimal) -> Result<Decimal, StoreError> {
    balance
        .checked_sub(amount)
        .filter(|remaining| *remaining >= Decimal::ZERO)
        .ok_or(StoreError::InsufficientFunds)
}

/// Destination balance after receiving `amount`.
pub(crate) fn credited(balance: Decimal, amount: Decimal) -> Result<Decimal, StoreError> {
    balance
        .checked_add(amount)
        .filter(|total| *total <= MAX_MONEY)
        .ok_or_else(|| {
            StoreError::InvalidArgument(format!(
                "Destination balance cannot exceed {MAX_MONEY}"
            ))
        })
}

/// Transfer preconditions, checked before any storage is touched.
pub fn validate_transfer(from_number: i64, to_number: i64, amount: Decimal) -> Result<(), StoreError> {
    if amount <= Decimal::ZERO {
        return Err(StoreError::InvalidArgument(
            "Amount must be positive".to_string(),
        ));
    }
    if from_number == to_number {
        return Err(StoreError::InvalidArgument(
            "Cannot transfer to same account".to_string(),
        ));
    }
    check_money_scale("amount", amount)
}

pub(crate) fn validate_new_balance(balance: Decimal) -> Result<(), StoreError> {
    if balance < Decimal::ZERO {
        return Err(StoreError::InvalidArgument(
            "Balance cannot be negative".to_string(),
        ));
    }
    check_money_scale("balance", balance)
}

/// Run `insert` with freshly drawn account numbers until it stops reporting a
/// `Conflict`, for at most `MAX_NUMBER_ATTEMPTS` draws.
pub(crate) async fn insert_with_fresh_number<F, Fut>(
    numbers: &dyn AccountNumberGenerator,
    mut insert: F,
) -> Result<i64, StoreError>
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<i64, StoreError>>,
{
    let mut attempt = 1;
    loop {
        let number = numbers.next_number();
        match insert(number).await {
            Err(StoreError::Conflict(reason)) if attempt < MAX_NUMBER_ATTEMPTS => {
                tracing::warn!(number, attempt, %reason, "Account number collision, drawing again");
                attempt += 1;
            }
            result => return result,
        }
    }
}
