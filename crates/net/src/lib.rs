#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for the DRS client
//!
//! This crate handles all HTTP operations: metadata and access-URL requests
//! against a DRS v1 server, byte streams for downloads, and connection pooling
//! with retry logic for metadata.

mod client;
#[cfg(feature = "test-util")]
pub mod memory;
mod transport;
mod validation;

pub use client::{NetClient, NetConfig};
pub use transport::{ByteStream, HttpTransport, Transport};
pub use validation::{validate_url, SUPPORTED_SCHEMES};
