#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations orchestration for the DRS client
//!
//! This crate sits between the CLI and the specialized crates: it fetches the
//! root object, hands bundles to the resolver and runs the download manager.

mod context;
mod get;
mod settings;
mod types;

pub use context::{OpsContextBuilder, OpsCtx};
pub use get::get;
pub use settings::{net_config, transfer_config};
pub use types::{GetOutcome, GetRequest};
