//! Core domain + application logic for the package notifier bot.
//!
//! This crate is intentionally framework-agnostic. Postgres / Messenger /
//! the inbound webhook live behind ports (traits) implemented in adapter
//! crates.

pub mod arrival;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod events;
pub mod logging;
pub mod ports;
pub mod registration;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
