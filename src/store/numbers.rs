//! Account number generation.
//!
//! Numbers are drawn by an injected generator so stores can be tested
//! with predictable values.

use std::sync::atomic::{AtomicI64, Ordering};

use rand::Rng;

/// Exclusive upper bound for randomly drawn account numbers.
pub const ACCOUNT_NUMBER_UPPER_BOUND: i64 = 1_000_000_000;

/// Source of candidate account numbers.
///
/// Uniqueness is enforced by the store; a generator only proposes.
pub trait AccountNumberGenerator: Send + Sync {
    fn next_number(&self) -> i64;
}

/// Uniformly random numbers in `1..ACCOUNT_NUMBER_UPPER_BOUND`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomAccountNumbers;

impl AccountNumberGenerator for RandomAccountNumbers {
    fn next_number(&self) -> i64 {
        rand::rng().random_range(1..ACCOUNT_NUMBER_UPPER_BOUND)
    }
}

/// Consecutive numbers from a fixed start. Useful in tests.
#[derive(Debug)]
pub struct SequentialAccountNumbers {
    next: AtomicI64,
}

impl SequentialAccountNumbers {
    pub fn starting_at(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl AccountNumberGenerator for SequentialAccountNumbers {
    fn next_number(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
