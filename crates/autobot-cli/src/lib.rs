//! Autobot CLI Library
//!
//! Command-line front-end for the vehicle store.
//!
//! # Overview
//!
//! - **Setup**: write a configuration template (`autobot init`)
//! - **Sync**: pull the newest feed file into the store (`autobot sync`)
//! - **Inspection**: history and lookups (`autobot status`, `autobot lookup`)
//! - **Maintenance**: hide, restore or wipe records (`autobot disable`,
//!   `autobot enable`, `autobot clear`)
//! - **Export**: filtered CSV dump (`autobot query`)
//! - **Service**: HTTP API plus scheduled syncs (`autobot serve`)

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod commands;
pub mod context;
pub mod error;

pub use context::AppContext;
pub use error::{CliError, Result};

use autobot_common::vehicle::RegCountry;
use autobot_server::config::DEFAULT_CONFIG_FILE;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Autobot - vehicle registry sync and lookup
#[derive(Parser, Debug)]
#[command(name = "autobot")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file
    #[arg(short, long, env = "AUTOBOT_CONFIG", default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a configuration template to the config path
    Init,

    /// Synchronise the newest feed file into the store
    Sync {
        /// Provider section of the configuration to use
        #[arg(short, long)]
        provider: String,

        /// Read a local feed file or directory instead of the provider's FTP server
        #[arg(short, long)]
        source_file: Option<PathBuf>,

        /// Sync the newest file even if it has been synced before
        #[arg(short, long)]
        force: bool,
    },

    /// Remove all records and indexes from the store
    Clear,

    /// Show sync history
    Status,

    /// Look a vehicle up in the store
    Lookup {
        /// Country of registration
        #[arg(long, default_value = "DK")]
        country: RegCountry,

        #[command(flatten)]
        key: LookupKey,

        /// Include disabled vehicles
        #[arg(short, long)]
        disabled: bool,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Hide a vehicle from lookups and exports
    Disable {
        /// Vehicle hash
        #[arg(long)]
        hash: u64,
    },

    /// Make a disabled vehicle visible again
    Enable {
        /// Vehicle hash
        #[arg(long)]
        hash: u64,
    },

    /// Export matching vehicles as CSV to stdout
    Query(QueryArgs),

    /// Run the HTTP API and the sync scheduler
    Serve {
        /// Port to listen on, overriding the configuration
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not run scheduled syncs
        #[arg(long)]
        no_sync: bool,

        /// Provider section used for scheduled syncs
        #[arg(long, default_value = autobot_server::config::DEFAULT_PROVIDER)]
        provider: String,
    },

    /// Print version information
    Version,
}

/// Exactly one of VIN or registration number.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct LookupKey {
    /// Vehicle identification number
    #[arg(long)]
    pub vin: Option<String>,

    /// Registration number
    #[arg(long)]
    pub regnr: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct QueryArgs {
    /// Maximum number of rows (0 = no limit)
    #[arg(short, long, default_value_t = 0)]
    pub limit: u64,

    /// Vehicle type
    #[arg(short = 't', long = "type")]
    pub vehicle_type: Option<String>,

    #[arg(short, long)]
    pub brand: Option<String>,

    #[arg(short, long)]
    pub model: Option<String>,

    #[arg(short, long)]
    pub fuel_type: Option<String>,

    /// Include disabled vehicles
    #[arg(long)]
    pub include_disabled: bool,
}
