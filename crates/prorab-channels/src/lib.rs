//! # prorab-channels
//!
//! Messaging platform integrations for Prorab.

pub mod telegram;

pub use telegram::TelegramChannel;
