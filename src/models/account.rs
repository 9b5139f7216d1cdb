//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: Database entity representing a bank account
//! - `CreateAccountRequest`: Request body for opening accounts
//! - `UpdateBalanceRequest`: Request body for setting a balance
//! - `IdResponse`: Response body carrying an account id

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, store::check_money_scale};

/// Longest first or last name accepted, matching the `VARCHAR(100)` columns.
pub const MAX_NAME_LEN: usize = 100;

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `account` table. Each account:
/// - Is addressed internally by `id` and externally (in transfers) by `number`
/// - Has a balance stored as `NUMERIC(20, 2)` (never floats)
///
/// # JSON Example
///
/// ```json
/// {
///   "id": 1,
///   "firstName": "Ana",
///   "lastName": "Lee",
///   "number": 482913377,
///   "balance": "20.00",
///   "createdAt": "2025-12-20T10:00:00Z",
///   "updatedAt": "2025-12-20T10:05:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Surrogate key assigned by the store
    pub id: i64,

    pub first_name: String,

    pub last_name: String,

    /// Randomly assigned account number, unique and immutable
    pub number: i64,

    /// Current balance
    ///
    /// Must be >= 0 (enforced by database CHECK constraint).
    pub balance: Decimal,

    /// Timestamp when account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of last balance update
    pub updated_at: DateTime<Utc>,
}

/// Request body for opening a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "firstName": "Ana",
///   "lastName": "Lee"
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[serde(alias = "first_name")]
    pub first_name: String,

    #[serde(alias = "last_name")]
    pub last_name: String,
}

impl CreateAccountRequest {
    /// Trim both names and reject empty or over-long ones.
    pub fn validate(self) -> Result<Self, AppError> {
        let first_name = validate_name("firstName", &self.first_name)?;
        let last_name = validate_name("lastName", &self.last_name)?;
        Ok(Self {
            first_name,
            last_name,
        })
    }
}

fn validate_name(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidRequest(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Request body for setting an account's balance.
///
/// # JSON Example
///
/// ```json
/// {
///   "balance": "125.50",
///   "number": 482913377
/// }
/// ```
///
/// `number` must match the stored account number of the account in the path,
/// otherwise the update is treated as targeting a missing account.
#[derive(Debug, Deserialize)]
pub struct UpdateBalanceRequest {
    pub balance: Decimal,
    pub number: i64,
}

impl UpdateBalanceRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.number <= 0 {
            return Err(AppError::InvalidRequest(
                "Account number must be positive".to_string(),
            ));
        }
        if self.balance < Decimal::ZERO {
            return Err(AppError::InvalidRequest(
                "Balance cannot be negative".to_string(),
            ));
        }
        check_money_scale("balance", self.balance)?;
        Ok(())
    }
}

/// Response body carrying the id of the account that was touched.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct IdResponse {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn create_request_trims_names() {
        let request = CreateAccountRequest {
            first_name: "  Ana ".to_string(),
            last_name: "Lee".to_string(),
        }
        .validate()
        .unwrap();

        assert_eq!(request.first_name, "Ana");
        assert_eq!(request.last_name, "Lee");
    }

    #[test]
    fn create_request_rejects_blank_names() {
        let err = CreateAccountRequest {
            first_name: "Ana".to_string(),
            last_name: "   ".to_string(),
        }
        .validate()
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidRequest(msg) if msg.contains("lastName")));
    }

    #[test]
    fn create_request_rejects_long_names() {
        let err = CreateAccountRequest {
            first_name: "a".repeat(MAX_NAME_LEN + 1),
            last_name: "Lee".to_string(),
        }
        .validate()
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn create_request_accepts_snake_case_keys() {
        let request: CreateAccountRequest =
            serde_json::from_str(r#"{"first_name":"Ana","last_name":"Lee"}"#).unwrap();
        assert_eq!(request.first_name, "Ana");
    }

    #[test]
    fn balance_update_rules() {
        let ok = UpdateBalanceRequest {
            balance: dec!(0),
            number: 7,
        };
        assert!(ok.validate().is_ok());

        let negative = UpdateBalanceRequest {
            balance: dec!(-5),
            number: 7,
        };
        assert!(negative.validate().is_err());

        let bad_number = UpdateBalanceRequest {
            balance: dec!(5),
            number: 0,
        };
        assert!(bad_number.validate().is_err());

        let sub_cent = UpdateBalanceRequest {
            balance: dec!(1.005),
            number: 7,
        };
        assert!(sub_cent.validate().is_err());

        let too_large = UpdateBalanceRequest {
            balance: dec!(1000000000000000000),
            number: 7,
        };
        assert!(too_large.validate().is_err());
    }

    #[test]
    fn balance_accepts_numbers_and_strings() {
        let from_number: UpdateBalanceRequest =
            serde_json::from_str(r#"{"balance": 12.5, "number": 3}"#).unwrap();
        let from_string: UpdateBalanceRequest =
            serde_json::from_str(r#"{"balance": "12.50", "number": 3}"#).unwrap();
        assert_eq!(from_number.balance, from_string.balance);
    }

    #[test]
    fn account_serializes_camel_case() {
        let now = Utc::now();
        let account = Account {
            id: 1,
            first_name: "Ana".to_string(),
            last_name: "Lee".to_string(),
            number: 100,
            balance: dec!(20.00),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["firstName"], "Ana");
        assert_eq!(value["number"], 100);
        assert_eq!(value["balance"], "20.00");
        assert!(value.get("createdAt").is_some());
    }
}
