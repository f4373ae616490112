use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::date_format::DateFormat;

/// Download transactions from Plaid and export them as QIF files.
#[derive(Parser, Debug)]
pub struct Args {
    /// Directory holding the database and its key
    #[arg(long, global = true, default_value_os_t = default_confdir())]
    pub confdir: PathBuf,

    /// Format of dates on the command line and in the QIF output
    #[arg(long, global = true, default_value = DateFormat::DEFAULT)]
    pub date_format: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new database in the config directory
    Init,

    /// Add an institution with an existing Plaid access token
    AddInstitution {
        /// Name of the institution, used in the names of exported files
        name: String,
    },

    /// List all institutions in the database
    ListInstitutions,

    /// List the accounts of institutions
    ListAccounts {
        /// Institutions to list accounts of. Defaults to all.
        institutions: Vec<String>,
    },

    /// Download transactions and write one QIF file per account
    Download {
        /// First day to download transactions for
        from: String,

        /// Last day to download transactions for. Defaults to today.
        #[arg(long)]
        until: Option<String>,

        /// Directory to write QIF files to. Defaults to the working directory.
        #[arg(long)]
        outdir: Option<PathBuf>,

        /// Institutions to download transactions from. Defaults to all.
        institutions: Vec<String>,
    },
}

fn default_confdir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".plaidqif")
}

pub fn parse() -> Args {
    Args::parse()
}
