//! Account management HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - GET /account - List accounts (first page, ascending id)
//! - POST /account - Open new account
//! - GET /account/{id} - Get account by ID
//! - DELETE /account/{id} - Delete account
//! - PUT /account/{id} - Set account balance

use crate::{
    error::AppError,
    models::account::{Account, CreateAccountRequest, IdResponse, UpdateBalanceRequest},
    store::SharedStore,
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

/// List accounts.
///
/// # Endpoint
///
/// `GET /account`
///
/// # Response
///
/// - **Success (200 OK)**: Up to 10 accounts, ascending by id
/// - **Error (404)**: There are no accounts at all
pub async fn list_accounts(State(store): State<SharedStore>) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = store.get_accounts().await?;

    if accounts.is_empty() {
        return Err(AppError::NoAccounts);
    }

    Ok(Json(accounts))
}

/// Open a new account.
///
/// # Endpoint
///
/// `POST /account`
///
/// # Request Body
///
/// ```json
/// {
///   "firstName": "Ana",
///   "lastName": "Lee"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: `{"id": 1}`
/// - **Error (400)**: Missing or blank names, malformed JSON
/// - **Error (409)**: No free account number could be drawn
///
/// The account starts with a zero balance and a randomly drawn account number.
pub async fn create_account(
    State(store): State<SharedStore>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IdResponse>), AppError> {
    let Json(request) = payload?;
    let request = request.validate()?;

    let id = store
        .create_account(&request.first_name, &request.last_name)
        .await?;

    tracing::info!(id, "Account created");
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

/// Get a specific account by ID.
///
/// # Response
///
/// - **Success (200 OK)**: Returns account details
/// - **Error (400)**: Id is not an integer
/// - **Error (404)**: Account not found
pub async fn get_account(
    State(store): State<SharedStore>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Account>, AppError> {
    let Path(id) = path?;
    let account = store.get_account_by_id(id).await?;

    Ok(Json(account))
}

/// Delete an account (hard delete).
///
/// # Response
///
/// - **Success (200 OK)**: `{"id": 1}`
/// - **Error (404)**: Account not found (including when already deleted)
pub async fn delete_account(
    State(store): State<SharedStore>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<IdResponse>, AppError> {
    let Path(id) = path?;
    let id = store.delete_account(id).await?;

    tracing::info!(id, "Account deleted");
    Ok(Json(IdResponse { id }))
}

/// Set an account's balance.
///
/// # Endpoint
///
/// `PUT /account/{id}`
///
/// # Request Body
///
/// ```json
/// {
///   "balance": "125.50",
///   "number": 482913377
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{"id": 1}`
/// - **Error (400)**: Negative balance, non-positive number, sub-cent precision
/// - **Error (404)**: No account with this id and number
///
/// The update runs on its own task so a client disconnect can't cut it short.
pub async fn update_balance(
    State(store): State<SharedStore>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateBalanceRequest>, JsonRejection>,
) -> Result<Json<IdResponse>, AppError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    request.validate()?;

    let id = tokio::spawn(async move {
        store
            .update_account_balance(id, request.number, request.balance)
            .await
    })
    .await??;

    Ok(Json(IdResponse { id }))
}
