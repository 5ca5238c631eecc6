//! # prorab-memory
//!
//! In-memory per-session conversation store. Histories live for the process
//! lifetime only and are not persisted across restarts.

pub mod store;

pub use store::SessionStore;
