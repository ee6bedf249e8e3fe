mod cli;
mod init;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::error;
use self_signed_cert::config::{ProjectMetadata, SslDomain};
use self_signed_cert::{CertificateGenerator, GenerationOptions, ToolLocation};

fn main() {
    let args = cli::Args::parse();

    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_env("RUST_LOG")
        .init();

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // The only place the process is terminated on failure.
    match rt.block_on(real_main(args)) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    }
}

async fn real_main(args: cli::Args) -> Result<i32> {
    let options = GenerationOptions::new(args.debug, args.summarize, args.no_warnings);
    options.debug(&format!("{options:?}"));

    match args.sub {
        cli::Cmd::Create {
            name,
            cname,
            path,
            alt_names,
            tool_dir,
            openssl,
        } => {
            let alt_names = cli::split_alt_names(alt_names.as_deref());
            options.debug(&format!("cert name: {name}"));
            options.debug(&format!("cname: {cname}"));
            options.debug(&format!("path: {}", path.display()));
            options.debug(&format!("alt names: {alt_names:?}"));

            let metadata = match load_metadata(&args.metadata) {
                Ok(metadata) => metadata,
                Err(e) => {
                    options.error(&format!("{e:#}"));
                    return Ok(1);
                }
            };

            let mut generator = CertificateGenerator::new(options, metadata);
            if let Some(dir) = tool_dir {
                generator = generator.with_tool_dir(dir);
            }
            if let Some(openssl) = openssl {
                generator = generator.with_tool(ToolLocation::Path(openssl));
            }

            // Failures were already reported through the error channel.
            let result = generator
                .create_self_signed_certificate(&name, &cname, &path, alt_names.as_deref())
                .await;
            Ok(exit_code(&result))
        }
        cli::Cmd::Init {
            country,
            state,
            city,
            organization,
            department,
            email,
            no_interaction,
        } => {
            let given = SslDomain {
                country,
                state,
                city,
                organization,
                department,
                email,
            };
            let result = init::run_init(&args.metadata, given, !no_interaction, &options);
            if let Err(e) = &result {
                options.error(&format!("{e:#}"));
            }
            Ok(exit_code(&result))
        }
    }
}

/// 0 on success, 1 on any fatal error
fn exit_code<T, E>(result: &std::result::Result<T, E>) -> i32 {
    if result.is_ok() { 0 } else { 1 }
}

fn load_metadata(path: &Path) -> Result<ProjectMetadata> {
    ProjectMetadata::load(path)
        .with_context(|| format!("Failed to load project metadata from {}", path.display()))
}
