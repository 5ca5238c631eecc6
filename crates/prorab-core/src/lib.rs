//! # prorab-core
//!
//! Core types, traits, configuration, and error handling for the Prorab bot.

pub mod catalog;
pub mod config;
pub mod error;
pub mod history;
pub mod message;
pub mod traits;
