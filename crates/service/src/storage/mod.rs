//! Storage backends for the service layer.
//!
//! Only a process-local store exists; its contents are lost on restart.

pub mod user_store;

pub use user_store::{SharedUserStore, UserStore};
