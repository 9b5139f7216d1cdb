//! Transfer HTTP handler.
//!
//! - POST /transfer - Move money between two accounts

use crate::{
    error::AppError,
    models::transfer::{TransferRequest, TransferResponse},
    store::SharedStore,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

/// Transfer money between accounts.
///
/// # Request Body
///
/// ```json
/// {
///   "fromAccountNo": 482913377,
///   "toAccountNo": 119034552,
///   "amount": "30.00"
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{"status": "completed"}`
/// - **Error (400)**: Same account on both sides, non-positive amount
/// - **Error (404)**: Either account doesn't exist
/// - **Error (409)**: Source balance is lower than the amount
/// - **Error (503)**: Lock wait timed out; safe to retry
///
/// # Atomicity
///
/// Both accounts are updated in a single database transaction.
/// Either both succeed or both fail. The transfer runs on a spawned task,
/// so if the client disconnects it still commits or rolls back as a whole.
pub async fn transfer(
    State(store): State<SharedStore>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, AppError> {
    let Json(request) = payload?;
    request.validate()?;

    let TransferRequest {
        from_account_no,
        to_account_no,
        amount,
    } = request;

    let result = tokio::spawn(async move {
        store
            .transfer_money(from_account_no, to_account_no, amount)
            .await
    })
    .await?;

    if let Err(err) = &result {
        tracing::info!(from_account_no, to_account_no, %amount, error = %err, "Transfer rejected");
    }
    result?;

    Ok(Json(TransferResponse::completed()))
}
