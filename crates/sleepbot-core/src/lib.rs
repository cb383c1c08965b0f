//! Core domain + application logic for the sleep tracker bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! [`messaging::port::Notifier`] port, implemented in the adapter crate.

pub mod classifier;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod session;
pub mod store;
pub mod tracker;

pub use errors::{Error, Result};
