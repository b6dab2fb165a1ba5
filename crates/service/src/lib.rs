//! Service layer for the user registry.
//! - `users` holds the record types and the repository seam used by the HTTP layer.
//! - `storage` holds the in-memory store that keeps ids densely packed.

pub mod errors;
pub mod users;
pub mod storage;
