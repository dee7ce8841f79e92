#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Checksum computation for DRS objects
//!
//! DRS documents declare checksums as `{type, checksum}` pairs. This crate maps
//! the declared types onto digest implementations and computes several digests
//! in a single pass over the data, so a transfer can be hashed while it streams.

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use drs_errors::{ConfigError, Error};
use std::fmt;
use std::str::FromStr;

/// Checksum algorithms this client can verify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChecksumAlgorithm {
    #[serde(rename = "sha-256")]
    Sha256,
    #[serde(rename = "sha-512")]
    Sha512,
    Md5,
}

impl ChecksumAlgorithm {
    /// All supported algorithms, strongest first
    pub const ALL: [Self; 3] = [Self::Sha512, Self::Sha256, Self::Md5];

    /// Map a DRS checksum `type` onto a supported algorithm
    ///
    /// Matching ignores case and accepts the undashed spellings some servers use.
    #[must_use]
    pub fn from_drs_type(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sha-256" | "sha256" => Some(Self::Sha256),
            "sha-512" | "sha512" => Some(Self::Sha512),
            "md5" => Some(Self::Md5),
            _ => None,
        }
    }

    /// Canonical DRS name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha-256",
            Self::Sha512 => "sha-512",
            Self::Md5 => "md5",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_drs_type(s).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "checksum".to_string(),
                value: s.to_string(),
            }
            .into()
        })
    }
}

/// A computed digest together with the algorithm that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    hex: String,
}

impl Checksum {
    /// Wrap an already computed digest
    #[must_use]
    pub fn from_bytes(algorithm: ChecksumAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            hex: hex::encode(bytes),
        }
    }

    /// Compute the digest of a byte slice
    #[must_use]
    pub fn from_data(algorithm: ChecksumAlgorithm, data: &[u8]) -> Self {
        let mut hasher = MultiHasher::new([algorithm]);
        hasher.update(data);
        hasher
            .finalize()
            .pop()
            .unwrap_or_else(|| Self::from_bytes(algorithm, &[]))
    }

    /// Lowercase hex encoding
    #[must_use]
    pub fn to_hex(&self) -> &str {
        &self.hex
    }

    /// Compare against a declared hex value, ignoring case and surrounding whitespace
    #[must_use]
    pub fn matches_hex(&self, declared: &str) -> bool {
        self.hex.eq_ignore_ascii_case(declared.trim())
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

enum AlgorithmState {
    Sha256(Sha256),
    Sha512(Sha512),
    Md5(Md5),
}

impl AlgorithmState {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
            ChecksumAlgorithm::Md5 => Self::Md5(Md5::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::Md5(h) => h.update(data),
        }
    }

    fn finalize(self) -> Checksum {
        match self {
            Self::Sha256(h) => Checksum::from_bytes(ChecksumAlgorithm::Sha256, &h.finalize()),
            Self::Sha512(h) => Checksum::from_bytes(ChecksumAlgorithm::Sha512, &h.finalize()),
            Self::Md5(h) => Checksum::from_bytes(ChecksumAlgorithm::Md5, &h.finalize()),
        }
    }
}

/// Incremental hasher feeding every chunk to several algorithms at once
pub struct MultiHasher {
    states: Vec<AlgorithmState>,
    bytes: u64,
}

impl MultiHasher {
    /// Create a hasher for the given algorithms; duplicates are collapsed
    pub fn new(algorithms: impl IntoIterator<Item = ChecksumAlgorithm>) -> Self {
        let mut seen: Vec<ChecksumAlgorithm> = Vec::new();
        for algorithm in algorithms {
            if !seen.contains(&algorithm) {
                seen.push(algorithm);
            }
        }
        Self {
            states: seen.into_iter().map(AlgorithmState::new).collect(),
            bytes: 0,
        }
    }

    /// Feed a chunk of data
    pub fn update(&mut self, data: &[u8]) {
        for state in &mut self.states {
            state.update(data);
        }
        self.bytes += data.len() as u64;
    }

    /// Number of bytes fed so far
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    /// Finish every digest, in the order the algorithms were first given
    #[must_use]
    pub fn finalize(self) -> Vec<Checksum> {
        self.states
            .into_iter()
            .map(AlgorithmState::finalize)
            .collect()
    }
}
