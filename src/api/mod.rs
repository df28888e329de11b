//! Provider API client
//!
//! A thin request helper over the transport chain. Resource types and CRUD
//! operations are left to callers.

mod client;
mod rate;

pub use client::ApiClient;
pub use rate::Rate;
