//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Browse, search and contribute to the shared learning-resource library.
#[derive(Parser, Debug)]
#[command(name = "library-client")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Library service base URL (overrides LIBRARY_API_URL and config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Token file location (overrides LIBRARY_TOKEN_PATH and config)
    #[arg(long, global = true)]
    pub token_path: Option<PathBuf>,

    /// Config file to read instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Title ordering requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Asc,
    Desc,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List resources, optionally filtered and sorted by title
    List {
        /// Case-insensitive title filter
        #[arg(short, long)]
        search: Option<String>,
        /// Sort by title
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    /// Upload a file (requires upload permission)
    Upload {
        /// File to upload
        #[arg(short, long)]
        file: PathBuf,
        /// Resource title
        #[arg(short, long)]
        title: String,
    },
    /// Ask an administrator for upload permission
    RequestPermission,
    /// Delete a resource by id (admin)
    Delete {
        /// Resource id
        id: String,
    },
    /// Store a token issued by the login flow
    Login {
        /// Opaque auth token
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Show the resolved session
    Whoami,
}
