//! Self-signed certificate generation through the openssl CLI
//!
//! ## Module Organization
//!
//! - `config` - `[dn]`/`[alt_names]` request config synthesis
//! - `tool` - locating (or downloading) the openssl executable
//! - `download` - portable archive download and ZIP extraction
//! - `generator` - orchestration and the `openssl req` invocation

pub mod config;
mod download;
pub mod generator;
pub mod tool;

pub use config::{ConfigSynthesizer, DistinguishedName, DnField, SubjectAltNames};
pub use generator::{CertificateArtifacts, CertificateGenerator};
pub use tool::{ToolLocation, ToolPlatform, ToolResolver};
