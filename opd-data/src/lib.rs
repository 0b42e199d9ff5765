//! Client-side logic for the OPD operations dashboard.
//!
//! Nothing in here talks HTTP directly. Every operation is written against
//! the backend traits in [`opd_core::backend`] and the storage trait in
//! [`opd_core::storage`], so the same code drives the CLI and the tests.

pub mod fleet;
pub mod list;
pub mod navigation;
pub mod permissions;
pub mod scrap;
pub mod swr;
