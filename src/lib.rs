#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod modem;
pub mod monitor;
pub mod payload;
pub mod sensor;
pub mod state;
pub mod traits;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_helpers;
