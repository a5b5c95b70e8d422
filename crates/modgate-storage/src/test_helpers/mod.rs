//! Test helpers for crates that depend on storage
//!
//! In-memory [`MockStorage`] so dispatcher and API tests need no bucket.

mod mock_storage;

pub use mock_storage::*;
