//! Command-line surface of `ksafe`.

use clap::{Parser, Subcommand};
use ksafe::domain::LocalId;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ksafe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Personal credential vault")]
pub(crate) struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to ./keepsafe.* if present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read the master password and record passwords from stdin, one per line
    #[arg(long, global = true)]
    pub password_stdin: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Sign in and unlock the vault of an account
    Login {
        /// Account id issued by the identity provider
        user_id: String,
        #[arg(long, default_value = "")]
        id_token: String,
        #[arg(long, default_value = "")]
        refresh_token: String,
    },
    /// Forget the signed-in account on this device
    Logout,
    /// Store a new credential; the password is prompted for
    Add {
        #[arg(short, long)]
        description: String,
        #[arg(short, long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        url: String,
    },
    /// List every record with its security flags
    List,
    /// Delete a record by id
    Remove { id: LocalId },
    /// Re-run the security analysis and show flagged records
    Audit,
    /// Show records with identical content
    Duplicates,
    /// Remove identical records, keeping the newest of each group
    Dedupe,
}
