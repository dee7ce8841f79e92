#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Bundle resolution for the DRS client
//!
//! This crate flattens a bundle's content graph into the ordered list of
//! blobs it reaches, fetching nested references as needed. Traversal is
//! deterministic: leaves come out in pre-order over the listed contents.

mod resolution;
mod resolver;

pub use resolution::Resolution;
pub use resolver::BundleResolver;
