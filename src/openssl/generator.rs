//! Self-signed certificate generation
//!
//! Resolves the openssl executable, writes the request config and runs
//! `openssl req` to produce `{name}.key` and `{name}.crt`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use super::config::{ConfigSynthesizer, config_path};
use super::tool::{ToolLocation, ToolResolver, default_tool_dir};
use crate::config::ProjectMetadata;
use crate::error::{CertError, Result};
use crate::network::{AddressSource, SystemInterfaces};
use crate::output::GenerationOptions;

/// Files produced for one certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateArtifacts {
    pub config: PathBuf,
    pub key: PathBuf,
    pub certificate: PathBuf,
}

impl CertificateArtifacts {
    pub fn new(output_path: &Path, cert_name: &str) -> Self {
        Self {
            config: config_path(output_path, cert_name),
            key: output_path.join(format!("{cert_name}.key")),
            certificate: output_path.join(format!("{cert_name}.crt")),
        }
    }

    /// Arguments for `openssl req`: 2048-bit RSA, no passphrase, 365 days
    pub fn openssl_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["req", "-newkey", "rsa:2048", "-nodes", "-keyout"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(self.key.clone().into_os_string());
        args.extend(["-x509", "-days", "365", "-out"].map(OsString::from));
        args.push(self.certificate.clone().into_os_string());
        args.push(OsString::from("-config"));
        args.push(self.config.clone().into_os_string());
        args
    }
}

/// Orchestrates tool resolution, config synthesis and the openssl run
pub struct CertificateGenerator {
    options: GenerationOptions,
    metadata: ProjectMetadata,
    resolver: ToolResolver,
    addresses: Box<dyn AddressSource>,
    tool_dir: Option<PathBuf>,
    tool: Option<ToolLocation>,
}

impl CertificateGenerator {
    pub fn new(options: GenerationOptions, metadata: ProjectMetadata) -> Self {
        Self {
            options,
            metadata,
            resolver: ToolResolver::default(),
            addresses: Box::new(SystemInterfaces),
            tool_dir: None,
            tool: None,
        }
    }

    pub fn with_resolver(mut self, resolver: ToolResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Source for default alt names
    pub fn with_addresses(mut self, addresses: impl AddressSource + 'static) -> Self {
        self.addresses = Box::new(addresses);
        self
    }

    /// Base directory of the portable tool cache (defaults to the directory of
    /// the running executable)
    pub fn with_tool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tool_dir = Some(dir.into());
        self
    }

    /// Use this tool instead of resolving one
    pub fn with_tool(mut self, tool: ToolLocation) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Generate `{output_path}/{cert_name}.{conf,key,crt}`.
    ///
    /// Any failure is reported through the error channel and returned.
    pub async fn create_self_signed_certificate(
        &self,
        cert_name: &str,
        common_name: &str,
        output_path: &Path,
        alt_names: Option<&[String]>,
    ) -> Result<CertificateArtifacts> {
        match self
            .generate(cert_name, common_name, output_path, alt_names)
            .await
        {
            Ok(artifacts) => Ok(artifacts),
            Err(e) => {
                self.options.error(&e.to_string());
                Err(e)
            }
        }
    }

    async fn generate(
        &self,
        cert_name: &str,
        common_name: &str,
        output_path: &Path,
        alt_names: Option<&[String]>,
    ) -> Result<CertificateArtifacts> {
        self.options
            .step(&format!("\nCreating self-signed cert for {common_name}..."));

        let tool = match &self.tool {
            Some(tool) => tool.clone(),
            None => {
                let base_dir = match &self.tool_dir {
                    Some(dir) => dir.clone(),
                    None => default_tool_dir()?,
                };
                self.resolver.resolve(&base_dir, &self.options).await?
            }
        };
        self.options.debug(&format!("Using certificate tool: {tool}"));

        let synthesizer = ConfigSynthesizer::new(&self.options, &self.metadata, self.addresses.as_ref());
        synthesizer.synthesize(cert_name, common_name, output_path, alt_names)?;

        let artifacts = CertificateArtifacts::new(output_path, cert_name);
        self.options.step(&format!(
            "\tGenerating key file: '{}'",
            artifacts.key.display()
        ));
        self.options.step(&format!(
            "\tGenerating certificate: '{}'",
            artifacts.certificate.display()
        ));

        run_tool(&tool, &artifacts.openssl_args(), &self.options).await?;

        if self.options.summarize() {
            self.options
                .log(&format!("Successfully created self-signed cert for {common_name}"));
        } else {
            self.options.log("\nCert created successfully!");
        }

        Ok(artifacts)
    }
}

async fn run_tool(tool: &ToolLocation, args: &[OsString], options: &GenerationOptions) -> Result<()> {
    options.debug(&format!(
        "Running: {} {}",
        tool,
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    ));

    let output = tokio::process::Command::new(tool.program())
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| CertError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        return Err(CertError::ToolFailed {
            tool: tool.to_string(),
            status: output.status,
            stderr,
        });
    }

    if !stderr.is_empty() {
        options.debug(&stderr);
    }
    Ok(())
}
