use std::path::PathBuf;

use clap::{Parser, Subcommand};
use self_signed_cert::config::DEFAULT_METADATA_FILE;

#[derive(Parser, Debug)]
#[command(name = "self-signed-cert", version, about = "Create self-signed TLS certificates with openssl")]
pub struct Args {
    /// Show debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Summarize console output
    #[arg(short, long, global = true)]
    pub summarize: bool,

    /// Hide warning messages
    #[arg(long, global = true)]
    pub no_warnings: bool,

    /// Project metadata file holding the `sslDomain` settings
    #[arg(long, global = true, default_value = DEFAULT_METADATA_FILE)]
    pub metadata: PathBuf,

    #[command(subcommand)]
    pub sub: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Create a self-signed certificate
    Create {
        /// Base file name for the .conf, .key and .crt outputs
        #[arg(long)]
        name: String,

        /// Certificate common name
        #[arg(long)]
        cname: String,

        /// Destination directory
        #[arg(long)]
        path: PathBuf,

        /// Comma-separated subject alternative names (default: local IPv4 addresses)
        #[arg(long)]
        alt_names: Option<String>,

        /// Directory for the portable openssl cache (default: the executable's directory)
        #[arg(long)]
        tool_dir: Option<PathBuf>,

        /// Use this openssl executable instead of resolving one
        #[arg(long)]
        openssl: Option<PathBuf>,
    },
    /// Write `sslDomain` settings into the metadata file
    Init {
        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        organization: Option<String>,

        #[arg(long)]
        department: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Don't prompt for fields missing from the command line
        #[arg(long)]
        no_interaction: bool,
    },
}

/// Split `--alt-names` on commas. Entries are not trimmed.
pub fn split_alt_names(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(|names| names.split(',').map(str::to_string).collect())
}
