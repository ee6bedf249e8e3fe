//! Project metadata consumed by the config synthesizer
//!
//! The metadata file is a JSON document (by default `package.json`) that may
//! carry an `sslDomain` object describing the certificate subject. Values of
//! the wrong JSON type are treated as absent rather than rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{CertError, Result};

/// Default metadata file, looked up in the working directory
pub const DEFAULT_METADATA_FILE: &str = "package.json";

/// Subject fields read from `sslDomain`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslDomain {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SslDomain {
    /// Copy every field set in `other` over this one
    pub fn merge(&mut self, other: SslDomain) {
        let SslDomain {
            country,
            state,
            city,
            organization,
            department,
            email,
        } = other;
        self.country = country.or(self.country.take());
        self.state = state.or(self.state.take());
        self.city = city.or(self.city.take());
        self.organization = organization.or(self.organization.take());
        self.department = department.or(self.department.take());
        self.email = email.or(self.email.take());
    }

    pub fn is_empty(&self) -> bool {
        *self == SslDomain::default()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default, rename = "sslDomain", deserialize_with = "lenient_domain")]
    ssl_domain: Option<SslDomain>,
}

/// Parsed project metadata
#[derive(Debug, Clone, Default)]
pub struct ProjectMetadata {
    /// File name used in warnings (e.g. `package.json`)
    pub source: String,
    pub ssl_domain: Option<SslDomain>,
}

impl ProjectMetadata {
    /// Metadata with the given subject fields, not backed by a file
    pub fn new(source: impl Into<String>, ssl_domain: Option<SslDomain>) -> Self {
        Self {
            source: source.into(),
            ssl_domain,
        }
    }

    /// Parse metadata from JSON text
    pub fn from_json(source: impl Into<String>, text: &str) -> serde_json::Result<Self> {
        let raw: RawMetadata = serde_json::from_str(text)?;
        Ok(Self {
            source: source.into(),
            ssl_domain: raw.ssl_domain,
        })
    }

    /// Load metadata from a file. A missing file yields empty metadata.
    pub fn load(path: &Path) -> Result<Self> {
        let source = source_name(path);
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No metadata file at {}", path.display());
                return Ok(Self::new(source, None));
            }
            Err(e) => return Err(CertError::io(path, e)),
        };

        Self::from_json(source, &text).map_err(|source| CertError::Metadata {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Write `domain` into the `sslDomain` object of the metadata file.
///
/// Other top-level keys keep their order. Existing `sslDomain` keys that
/// `domain` does not set are kept. The file is created if missing.
pub fn write_ssl_domain(path: &Path, domain: &SslDomain) -> Result<PathBuf> {
    let document = match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str::<Value>(&text).map_err(|source| CertError::Metadata {
            path: path.to_path_buf(),
            source,
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Value::Object(Map::new()),
        Err(e) => return Err(CertError::io(path, e)),
    };

    let Value::Object(mut root) = document else {
        return Err(CertError::MetadataRoot {
            path: path.to_path_buf(),
        });
    };

    let entry = root
        .entry("sslDomain")
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    let fields = serde_json::to_value(domain).map_err(|source| CertError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    if let (Some(target), Value::Object(fields)) = (entry.as_object_mut(), fields) {
        for (key, value) in fields {
            target.insert(key, value);
        }
    }

    let mut text = serde_json::to_string_pretty(&Value::Object(root)).map_err(|source| CertError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CertError::io(parent, e))?;
    }
    std::fs::write(path, text).map_err(|e| CertError::io(path, e))?;

    Ok(path.to_path_buf())
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_domain<'de, D>(deserializer: D) -> std::result::Result<Option<SslDomain>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}
