//! Core types and REST API client for the OPD operations dashboard.
//!
//! The wire models mirror the backend's camelCase JSON. Everything that talks
//! HTTP lives behind the `api` feature so the pure data crates can depend on
//! the models without pulling in `reqwest`.

pub mod backend;
pub mod error;
pub mod fleet;
pub mod letters;
pub mod month_key;
pub mod pagination;
pub mod radio;
pub mod resource;
pub mod storage;
pub mod swr;

#[cfg(feature = "api")]
pub mod client;

pub use error::{ApiError, Result};
pub use month_key::MonthKey;
