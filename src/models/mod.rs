//! Data models representing database entities and API payloads.

/// Bank account model
pub mod account;
/// Money transfer payloads
pub mod transfer;
