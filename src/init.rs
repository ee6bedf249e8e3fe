//! `init` command: record certificate subject settings in the metadata file

use std::path::Path;

use anyhow::{Context, Result};
use inquire::Text;
use self_signed_cert::config::{ProjectMetadata, SslDomain, write_ssl_domain};
use self_signed_cert::openssl::DnField;
use self_signed_cert::output::GenerationOptions;

fn slot(domain: &mut SslDomain, field: DnField) -> Option<&mut Option<String>> {
    match field {
        DnField::Country => Some(&mut domain.country),
        DnField::State => Some(&mut domain.state),
        DnField::City => Some(&mut domain.city),
        DnField::Organization => Some(&mut domain.organization),
        DnField::Department => Some(&mut domain.department),
        DnField::Email => Some(&mut domain.email),
        DnField::CommonName => None,
    }
}

/// Fill fields missing from `given` by asking `prompt`.
///
/// `prompt` receives the field and its current value from the metadata file.
/// Empty answers leave the field unset.
pub fn collect_fields<F>(given: SslDomain, existing: &SslDomain, mut prompt: F) -> Result<SslDomain>
where
    F: FnMut(DnField, Option<&str>) -> Result<Option<String>>,
{
    let mut domain = given;
    let mut existing = existing.clone();

    for field in DnField::OPTIONAL {
        let (Some(target), Some(current)) = (slot(&mut domain, field), slot(&mut existing, field))
        else {
            continue;
        };
        if target.is_some() {
            continue;
        }
        *target = prompt(field, current.as_deref())?.filter(|answer| !answer.is_empty());
    }

    Ok(domain)
}

fn ask(field: DnField, current: Option<&str>) -> Result<Option<String>> {
    let label = format!("{}:", field.label());
    let mut text = Text::new(&label).with_help_message("Leave empty to skip");
    if let Some(current) = current {
        text = text.with_default(current);
    }
    text.prompt_skippable()
        .with_context(|| format!("Failed to read {}", field.label()))
}

/// Run `init` against `metadata_path`
pub fn run_init(
    metadata_path: &Path,
    given: SslDomain,
    interactive: bool,
    options: &GenerationOptions,
) -> Result<()> {
    let current = ProjectMetadata::load(metadata_path)?
        .ssl_domain
        .unwrap_or_default();

    let domain = if interactive {
        collect_fields(given, &current, ask)?
    } else {
        given
    };

    if domain.is_empty() {
        options.warn("No SSL settings given, nothing to write.");
        return Ok(());
    }

    let path = write_ssl_domain(metadata_path, &domain)?;
    options.log(&format!("SSL settings written to '{}'", path.display()));

    let mut stored = current;
    stored.merge(domain);
    options.debug(&format!("sslDomain: {stored:?}"));
    Ok(())
}
