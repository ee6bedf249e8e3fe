//! OpenSSL request config synthesis
//!
//! Builds the `[dn]` block from project metadata and the `[alt_names]` block
//! from explicit alt names (or local IPv4 addresses), then writes
//! `{path}/{name}.conf`.

use std::path::{Path, PathBuf};

use crate::config::{ProjectMetadata, SslDomain};
use crate::error::{CertError, Result};
use crate::network::AddressSource;
use crate::output::GenerationOptions;

/// Distinguished name fields, in the order they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnField {
    Country,
    State,
    City,
    Organization,
    Department,
    Email,
    CommonName,
}

impl DnField {
    /// The six fields read from `sslDomain`
    pub const OPTIONAL: [DnField; 6] = [
        DnField::Country,
        DnField::State,
        DnField::City,
        DnField::Organization,
        DnField::Department,
        DnField::Email,
    ];

    /// Key written in the config file
    pub fn code(self) -> &'static str {
        match self {
            DnField::Country => "C",
            DnField::State => "ST",
            DnField::City => "L",
            DnField::Organization => "O",
            DnField::Department => "OU",
            DnField::Email => "emailAddress",
            DnField::CommonName => "CN",
        }
    }

    /// Human name used in warnings
    pub fn label(self) -> &'static str {
        match self {
            DnField::Country => "Country",
            DnField::State => "State",
            DnField::City => "City",
            DnField::Organization => "Organization",
            DnField::Department => "Department",
            DnField::Email => "Email Address",
            DnField::CommonName => "Common Name",
        }
    }

    fn value(self, domain: &SslDomain) -> Option<&str> {
        match self {
            DnField::Country => domain.country.as_deref(),
            DnField::State => domain.state.as_deref(),
            DnField::City => domain.city.as_deref(),
            DnField::Organization => domain.organization.as_deref(),
            DnField::Department => domain.department.as_deref(),
            DnField::Email => domain.email.as_deref(),
            DnField::CommonName => None,
        }
    }
}

/// Ordered `(field, value)` pairs ending with the common name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguishedName {
    fields: Vec<(DnField, String)>,
}

impl DistinguishedName {
    /// Assemble the DN, warning once for every missing field.
    pub fn from_metadata(
        metadata: &ProjectMetadata,
        common_name: &str,
        options: &GenerationOptions,
    ) -> Self {
        let mut fields = Vec::with_capacity(DnField::OPTIONAL.len() + 1);

        match &metadata.ssl_domain {
            Some(domain) => {
                for field in DnField::OPTIONAL {
                    match field.value(domain) {
                        Some(value) => fields.push((field, value.to_string())),
                        None => options.warn(&format!(
                            "\t\t{} is not specified in {}!",
                            field.label(),
                            metadata.source
                        )),
                    }
                }
            }
            None => options.warn(&format!(
                "\nNo SSL settings found in {}! Please run 'self-signed-cert init'...\n",
                metadata.source
            )),
        }

        fields.push((DnField::CommonName, common_name.to_string()));
        Self { fields }
    }

    pub fn fields(&self) -> &[(DnField, String)] {
        &self.fields
    }

    pub fn lines(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(field, value)| format!("{} = {}", field.code(), value))
            .collect()
    }
}

/// Subject alternative names, rendered 1-indexed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAltNames(Vec<String>);

impl SubjectAltNames {
    /// Explicit names when any were given, otherwise the local IPv4 addresses
    pub fn resolve(explicit: Option<&[String]>, addresses: &dyn AddressSource) -> Self {
        match explicit {
            Some(names) if !names.is_empty() => Self(names.to_vec()),
            _ => Self(addresses.ipv4_addresses()),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn lines(&self) -> Vec<String> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, name)| format!("DNS.{} = {}", i + 1, name))
            .collect()
    }
}

/// Render the full request config
pub fn render(dn: &DistinguishedName, alt_names: &SubjectAltNames) -> String {
    let mut contents = String::from(
        "[req]\n\
         default_bits = 2048\n\
         prompt = no\n\
         default_md = sha256\n\
         x509_extensions = v3_req\n\
         distinguished_name = dn\n\
         \n\
         [dn]\n",
    );
    contents.push_str(&dn.lines().join("\n"));
    contents.push('\n');
    contents.push_str(
        "\n\
         [v3_req]\n\
         subjectAltName = @alt_names\n\
         \n\
         [alt_names]\n",
    );
    contents.push_str(&alt_names.lines().join("\n"));
    contents.push('\n');
    contents
}

/// Path of the config file for `cert_name` under `output_path`
pub fn config_path(output_path: &Path, cert_name: &str) -> PathBuf {
    output_path.join(format!("{cert_name}.conf"))
}

/// Writes `{path}/{name}.conf` from metadata and alt names
pub struct ConfigSynthesizer<'a> {
    options: &'a GenerationOptions,
    metadata: &'a ProjectMetadata,
    addresses: &'a dyn AddressSource,
}

impl<'a> ConfigSynthesizer<'a> {
    pub fn new(
        options: &'a GenerationOptions,
        metadata: &'a ProjectMetadata,
        addresses: &'a dyn AddressSource,
    ) -> Self {
        Self {
            options,
            metadata,
            addresses,
        }
    }

    /// Render the config text without touching the filesystem
    pub fn render(&self, common_name: &str, alt_names: Option<&[String]>) -> String {
        let dn = DistinguishedName::from_metadata(self.metadata, common_name, self.options);
        let sans = SubjectAltNames::resolve(alt_names, self.addresses);
        self.options
            .debug(&format!("Subject alt names: {:?}", sans.names()));
        render(&dn, &sans)
    }

    /// Render and write the config, replacing any existing file
    pub fn synthesize(
        &self,
        cert_name: &str,
        common_name: &str,
        output_path: &Path,
        alt_names: Option<&[String]>,
    ) -> Result<PathBuf> {
        let path = config_path(output_path, cert_name);
        self.options
            .step(&format!("\tCreating config file '{}'", path.display()));

        let contents = self.render(common_name, alt_names);

        std::fs::create_dir_all(output_path).map_err(|e| CertError::io(output_path, e))?;
        std::fs::write(&path, contents).map_err(|e| CertError::io(&path, e))?;

        Ok(path)
    }
}
