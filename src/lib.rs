//! Self-signed TLS certificate generation
//!
//! Synthesizes an OpenSSL request config from project metadata and runs
//! `openssl req` to produce a key and certificate. On Windows a portable
//! openssl build is downloaded and cached on first use.

pub mod config;
pub mod error;
pub mod network;
pub mod openssl;
pub mod output;

pub use config::{ProjectMetadata, SslDomain};
pub use error::{CertError, Result};
pub use openssl::{CertificateArtifacts, CertificateGenerator, ToolLocation, ToolPlatform, ToolResolver};
pub use output::{GenerationOptions, OutputChannels};
