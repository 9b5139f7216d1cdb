//! Bank account service.
//!
//! A REST API for opening bank accounts, setting balances, and moving money
//! between accounts with atomic, deadlock-free transfers.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Storage**: `AccountStore` trait, backed by PostgreSQL with sqlx or by memory
//! - **Money**: `rust_decimal::Decimal`, two fractional digits
//! - **Format**: JSON requests/responses

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod store;
