//! Typed DRS object documents
//!
//! A DRS object is either a Blob (bytes plus checksums and access methods) or
//! a Bundle (an ordered list of references to other objects). The wire format
//! only distinguishes them by which fields are present, so classification
//! happens here, once, at parse time.

use drs_errors::MetadataError;
use drs_hash::ChecksumAlgorithm;
use serde::Deserialize;
use std::collections::BTreeMap;

/// A parsed DRS object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawObject")]
pub enum DrsObject {
    Blob(Blob),
    Bundle(Bundle),
}

/// A downloadable object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub id: String,
    pub name: Option<String>,
    /// Declared size in bytes; 0 when the server did not declare one
    pub size: u64,
    pub checksums: Vec<DeclaredChecksum>,
    pub access_methods: Vec<AccessMethod>,
}

/// A named collection of other objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub id: String,
    pub name: Option<String>,
    pub contents: Vec<ContentRef>,
}

/// One entry of a bundle's contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    /// The nested object was expanded inline by the server
    Inline(Box<DrsObject>),
    /// Only the id is known; the object must be fetched
    ById { id: String, name: Option<String> },
}

impl ContentRef {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Inline(object) => object.id(),
            Self::ById { id, .. } => id,
        }
    }
}

/// A checksum as declared by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredChecksum {
    /// Raw `type` string, e.g. `sha-256`
    pub kind: String,
    pub value: String,
}

impl DeclaredChecksum {
    /// The algorithm, when this client supports it
    #[must_use]
    pub fn algorithm(&self) -> Option<ChecksumAlgorithm> {
        ChecksumAlgorithm::from_drs_type(&self.kind)
    }
}

/// A way to retrieve a blob's bytes
///
/// At least one of `access_url` and `access_id` is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessMethod {
    /// Transport type, e.g. `https` or `s3`
    pub kind: String,
    pub access_url: Option<AccessUrl>,
    pub access_id: Option<String>,
}

/// A resolved URL plus the headers the server asks the client to send
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessUrl {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl AccessUrl {
    /// Parse an `access_url` JSON object, e.g. the body of an access endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an access URL document or a
    /// header is not in `Name: value` form.
    pub fn from_json(owner_id: &str, value: serde_json::Value) -> Result<Self, MetadataError> {
        let raw: RawAccessUrl =
            serde_json::from_value(value).map_err(|e| MetadataError::InvalidJson {
                message: e.to_string(),
            })?;
        raw.into_access_url(owner_id)
    }
}

impl DrsObject {
    /// Parse and classify a metadata document
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid DRS JSON or cannot be
    /// classified as exactly one of Blob or Bundle.
    pub fn from_json(value: serde_json::Value) -> Result<Self, MetadataError> {
        let raw: RawObject =
            serde_json::from_value(value).map_err(|e| MetadataError::InvalidJson {
                message: e.to_string(),
            })?;
        Self::try_from(raw)
    }

    /// Parse a metadata document from raw bytes
    ///
    /// # Errors
    ///
    /// See [`DrsObject::from_json`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MetadataError> {
        let value = serde_json::from_slice(bytes).map_err(|e| MetadataError::InvalidJson {
            message: e.to_string(),
        })?;
        Self::from_json(value)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Blob(blob) => &blob.id,
            Self::Bundle(bundle) => &bundle.id,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Blob(blob) => blob.name.as_deref(),
            Self::Bundle(bundle) => bundle.name.as_deref(),
        }
    }

    #[must_use]
    pub fn is_bundle(&self) -> bool {
        matches!(self, Self::Bundle(_))
    }
}

// Wire representation. Every field is optional so classification errors can
// be reported precisely instead of as generic serde failures.

#[derive(Debug, Deserialize)]
struct RawObject {
    id: Option<String>,
    name: Option<String>,
    size: Option<u64>,
    #[serde(default)]
    checksums: Vec<RawChecksum>,
    contents: Option<Vec<RawObject>>,
    #[serde(default)]
    access_methods: Vec<RawAccessMethod>,
}

#[derive(Debug, Deserialize)]
struct RawChecksum {
    #[serde(rename = "type")]
    kind: String,
    checksum: String,
}

#[derive(Debug, Deserialize)]
struct RawAccessMethod {
    #[serde(rename = "type", default)]
    kind: String,
    access_url: Option<RawAccessUrl>,
    access_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAccessUrl {
    url: String,
    #[serde(default)]
    headers: RawHeaders,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawHeaders {
    Lines(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl Default for RawHeaders {
    fn default() -> Self {
        Self::Lines(Vec::new())
    }
}

impl RawAccessUrl {
    fn into_access_url(self, owner_id: &str) -> Result<AccessUrl, MetadataError> {
        let headers = match self.headers {
            RawHeaders::Map(map) => map.into_iter().collect(),
            RawHeaders::Lines(lines) => lines
                .into_iter()
                .map(|line| {
                    line.split_once(':')
                        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                        .filter(|(name, _)| !name.is_empty())
                        .ok_or_else(|| MetadataError::MalformedHeader {
                            id: owner_id.to_string(),
                            header: line.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(AccessUrl {
            url: self.url,
            headers,
        })
    }
}

impl RawObject {
    /// An entry of `contents` that carries its own payload is expanded inline
    fn is_inline(&self) -> bool {
        self.contents.is_some() || !self.access_methods.is_empty()
    }
}

impl TryFrom<RawObject> for DrsObject {
    type Error = MetadataError;

    fn try_from(raw: RawObject) -> Result<Self, Self::Error> {
        let id = raw.id.ok_or_else(|| MetadataError::InvalidJson {
            message: "missing field `id`".to_string(),
        })?;

        match (raw.contents, raw.access_methods.is_empty()) {
            (Some(_), false) => Err(MetadataError::AmbiguousObject { id }),
            (None, true) => Err(MetadataError::UnclassifiedObject { id }),
            (Some(contents), true) => {
                let contents = contents
                    .into_iter()
                    .enumerate()
                    .map(|(index, entry)| content_ref(&id, index, entry))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Bundle(Bundle {
                    id,
                    name: raw.name,
                    contents,
                }))
            }
            (None, false) => {
                if raw.checksums.is_empty() {
                    return Err(MetadataError::MissingChecksums { id });
                }
                let access_methods = raw
                    .access_methods
                    .into_iter()
                    .enumerate()
                    .map(|(index, method)| access_method(&id, index, method))
                    .collect::<Result<Vec<_>, _>>()?;
                let checksums = raw
                    .checksums
                    .into_iter()
                    .map(|c| DeclaredChecksum {
                        kind: c.kind,
                        value: c.checksum,
                    })
                    .collect();
                Ok(Self::Blob(Blob {
                    id,
                    name: raw.name,
                    size: raw.size.unwrap_or(0),
                    checksums,
                    access_methods,
                }))
            }
        }
    }
}

fn content_ref(parent_id: &str, index: usize, entry: RawObject) -> Result<ContentRef, MetadataError> {
    if entry.id.is_none() {
        return Err(MetadataError::MissingContentId {
            id: parent_id.to_string(),
            index,
        });
    }
    if entry.is_inline() {
        return DrsObject::try_from(entry).map(|object| ContentRef::Inline(Box::new(object)));
    }
    Ok(ContentRef::ById {
        id: entry.id.unwrap_or_default(),
        name: entry.name,
    })
}

fn access_method(
    owner_id: &str,
    index: usize,
    method: RawAccessMethod,
) -> Result<AccessMethod, MetadataError> {
    let access_id = method.access_id.filter(|id| !id.is_empty());
    if method.access_url.is_none() && access_id.is_none() {
        return Err(MetadataError::EmptyAccessMethod {
            id: owner_id.to_string(),
            index,
        });
    }
    let access_url = method
        .access_url
        .map(|raw| raw.into_access_url(owner_id))
        .transpose()?;
    Ok(AccessMethod {
        kind: method.kind,
        access_url,
        access_id,
    })
}
