#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the DRS client
//!
//! This crate provides the typed DRS object model, request headers and the
//! download report shared between the resolver, the download manager and the CLI.

pub mod headers;
pub mod object;
pub mod reports;

pub use headers::AuthHeaders;
pub use object::{AccessMethod, AccessUrl, Blob, Bundle, ContentRef, DeclaredChecksum, DrsObject};
pub use reports::{
    ChecksumStatus, FailureReason, Outcome, Report, ReportEntry, ResolutionIssue,
};
