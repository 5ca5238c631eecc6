//! # prorab-providers
//!
//! Completion backends for Prorab. Currently the Yandex Cloud
//! foundation-models API with per-request IAM token exchange.

pub mod iam;
pub mod yandex;

pub use yandex::YandexGptProvider;
