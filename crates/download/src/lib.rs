#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Integrity-checked object transfers for the DRS client
//!
//! A [`DataAccessor`] owns the transfer of one blob. The [`DownloadManager`]
//! runs a batch of them over a bounded worker pool and assembles the report.

mod accessor;
mod config;
mod manager;
mod retry;
mod stream;
mod verify;

pub use accessor::{AccessContext, DataAccessor};
pub use config::{RetryConfig, TransferConfig};
pub use manager::DownloadManager;
