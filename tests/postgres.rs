//! Account store tests against a live PostgreSQL.
//!
//! Set `TEST_DATABASE_URL` to run them; they are skipped otherwise. Every
//! test works on accounts it opened itself, so they can share one database.

use std::{sync::Arc, time::Duration};

use bank_account_service::{
    config::Config,
    db,
    store::{
        AccountNumberGenerator, AccountStore, MAX_MONEY, PgAccountStore, RandomAccountNumbers,
        StoreError,
    },
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct FixedNumber(i64);

impl AccountNumberGenerator for FixedNumber {
    fn next_number(&self) -> i64 {
        self.0
    }
}

async fn pool() -> Option<db::DbPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };
    let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
    let pool = db::create_pool(&url, &config).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    Some(pool)
}

fn store(pool: &db::DbPool, numbers: Arc<dyn AccountNumberGenerator>) -> PgAccountStore {
    PgAccountStore::new(pool.clone(), numbers, Duration::from_secs(5))
}

async fn funded(store: &PgAccountStore, balance: Decimal) -> (i64, i64) {
    let id = store.create_account("Ana", "Lee").await.unwrap();
    let number = store.get_account_by_id(id).await.unwrap().number;
    store.update_account_balance(id, number, balance).await.unwrap();
    (id, number)
}

#[tokio::test]
async fn create_fetch_and_delete() {
    let Some(pool) = pool().await else { return };
    let store = store(&pool, Arc::new(RandomAccountNumbers));

    let id = store.create_account("Ana", "Lee").await.unwrap();
    let account = store.get_account_by_id(id).await.unwrap();
    assert_eq!(account.first_name, "Ana");
    assert_eq!(account.last_name, "Lee");
    assert_eq!(account.balance, Decimal::ZERO);

    assert_eq!(store.delete_account(id).await.unwrap(), id);
    assert!(matches!(
        store.delete_account(id).await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
async fn duplicate_numbers_end_in_conflict() {
    let Some(pool) = pool().await else { return };
    let random = store(&pool, Arc::new(RandomAccountNumbers));
    let (_, taken) = funded(&random, dec!(0)).await;

    let colliding = store(&pool, Arc::new(FixedNumber(taken)));
    assert!(matches!(
        colliding.create_account("Bo", "Kim").await,
        Err(StoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn negative_balance_is_rejected_and_unchanged() {
    let Some(pool) = pool().await else { return };
    let store = store(&pool, Arc::new(RandomAccountNumbers));
    let (id, number) = funded(&store, dec!(12.50)).await;

    assert!(matches!(
        store.update_account_balance(id, number, dec!(-5)).await,
        Err(StoreError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.update_account_balance(id, number + 1, dec!(1)).await,
        Err(StoreError::NotFound)
    ));
    assert_eq!(store.get_account_by_id(id).await.unwrap().balance, dec!(12.50));
}

#[tokio::test]
async fn transfer_scenario() {
    let Some(pool) = pool().await else { return };
    let store = store(&pool, Arc::new(RandomAccountNumbers));
    let (a, a_number) = funded(&store, dec!(50)).await;
    let (b, b_number) = funded(&store, dec!(10)).await;

    store
        .transfer_money(a_number, b_number, dec!(30))
        .await
        .unwrap();
    assert_eq!(store.get_account_by_id(a).await.unwrap().balance, dec!(20));
    assert_eq!(store.get_account_by_id(b).await.unwrap().balance, dec!(40));

    assert!(matches!(
        store.transfer_money(a_number, b_number, dec!(30)).await,
        Err(StoreError::InsufficientFunds)
    ));
    assert_eq!(store.get_account_by_id(a).await.unwrap().balance, dec!(20));
    assert_eq!(store.get_account_by_id(b).await.unwrap().balance, dec!(40));
}

#[tokio::test]
async fn transfer_to_missing_account_rolls_back() {
    let Some(pool) = pool().await else { return };
    let store = store(&pool, Arc::new(RandomAccountNumbers));
    let (a, a_number) = funded(&store, dec!(50)).await;
    let (b, b_number) = funded(&store, dec!(0)).await;
    store.delete_account(b).await.unwrap();

    assert!(matches!(
        store.transfer_money(a_number, b_number, dec!(5)).await,
        Err(StoreError::NotFound)
    ));
    assert_eq!(store.get_account_by_id(a).await.unwrap().balance, dec!(50));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crossing_transfers_neither_deadlock_nor_overdraw() {
    let Some(pool) = pool().await else { return };
    let store = Arc::new(store(&pool, Arc::new(RandomAccountNumbers)));
    let (a, a_number) = funded(&store, dec!(100)).await;
    let (b, b_number) = funded(&store, dec!(100)).await;

    let mut tasks = Vec::new();
    for i in 0..40 {
        let store = Arc::clone(&store);
        let (from, to) = if i % 2 == 0 {
            (a_number, b_number)
        } else {
            (b_number, a_number)
        };
        tasks.push(tokio::spawn(async move {
            store.transfer_money(from, to, dec!(12.25)).await
        }));
    }

    for task in tasks {
        match task.await.unwrap() {
            Ok(()) | Err(StoreError::InsufficientFunds) => {}
            Err(other) => panic!("unexpected transfer error: {other}"),
        }
    }

    let a = store.get_account_by_id(a).await.unwrap().balance;
    let b = store.get_account_by_id(b).await.unwrap().balance;
    assert!(a >= Decimal::ZERO && b >= Decimal::ZERO);
    assert_eq!(a + b, dec!(200));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disjoint_pairs_transfer_independently() {
    let Some(pool) = pool().await else { return };
    let store = Arc::new(store(&pool, Arc::new(RandomAccountNumbers)));

    let mut pairs = Vec::new();
    for _ in 0..3 {
        let from = funded(&store, dec!(10)).await;
        let to = funded(&store, dec!(0)).await;
        pairs.push((from, to));
    }

    let mut tasks = Vec::new();
    for &((_, from_number), (_, to_number)) in &pairs {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            store.transfer_money(from_number, to_number, dec!(10)).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for ((from_id, _), (to_id, _)) in pairs {
        assert_eq!(store.get_account_by_id(from_id).await.unwrap().balance, Decimal::ZERO);
        assert_eq!(store.get_account_by_id(to_id).await.unwrap().balance, dec!(10));
    }
}

#[tokio::test]
async fn out_of_range_balances_are_invalid_not_internal() {
    let Some(pool) = pool().await else { return };
    let store = store(&pool, Arc::new(RandomAccountNumbers));
    let (a, a_number) = funded(&store, dec!(10)).await;
    let (b, b_number) = funded(&store, MAX_MONEY).await;

    assert!(matches!(
        store.update_account_balance(a, a_number, dec!(1000000000000000000)).await,
        Err(StoreError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.transfer_money(a_number, b_number, dec!(1)).await,
        Err(StoreError::InvalidArgument(_))
    ));
    assert_eq!(store.get_account_by_id(a).await.unwrap().balance, dec!(10));
    assert_eq!(store.get_account_by_id(b).await.unwrap().balance, MAX_MONEY);
}
