//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Decodes and validates the request (JSON body, URL params)
//! 2. Calls the account store
//! 3. Returns HTTP response (JSON, status code)

/// Account management endpoints
pub mod accounts;
pub mod health;
/// Money transfer endpoint
pub mod transfers;
