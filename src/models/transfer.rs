//! Transfer request/response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, store::validate_transfer};

/// Request to transfer money between accounts, addressed by account number.
///
/// # JSON Example
///
/// ```json
/// {
///   "fromAccountNo": 482913377,
///   "toAccountNo": 119034552,
///   "amount": "30.00"
/// }
/// ```
///
/// # Atomicity Guarantee
///
/// BOTH accounts are updated in the same database transaction.
/// If the debit fails, the credit doesn't happen, and vice versa.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Account to transfer from (will decrease)
    #[serde(alias = "from_account_no")]
    pub from_account_no: i64,

    /// Account to transfer to (will increase)
    #[serde(alias = "to_account_no")]
    pub to_account_no: i64,

    pub amount: Decimal,
}

impl TransferRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.from_account_no <= 0 || self.to_account_no <= 0 {
            return Err(AppError::InvalidRequest(
                "Account numbers must be positive".to_string(),
            ));
        }
        validate_transfer(self.from_account_no, self.to_account_no, self.amount)?;
        Ok(())
    }
}

/// Response returned for a completed transfer.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub status: String,
}

impl TransferResponse {
    pub fn completed() -> Self {
        Self {
            status: "completed".to_string(),
        }
    }
}
