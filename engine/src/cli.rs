//! CLI interface for Leafdoc
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Leafdoc plant symptom triage
///
/// Answers small talk, looks catalogued symptoms up in a local knowledge base
/// and asks an AI service about everything else.
#[derive(Parser, Debug)]
#[command(name = "leafdoc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP adapter
    Serve {
        /// Override server.bind_addr
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Analyze one symptom description
    Analyze {
        /// What the user typed
        symptoms: String,
    },

    /// Seed an empty knowledge base
    Seed {
        /// JSON seed file (defaults to core.seed_path, then the bundled seed)
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// List catalogued symptoms
    Records {
        /// Number of records to show (default: 20)
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Manage the OpenRouter API key in the OS keychain
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

/// Keychain actions
#[derive(Subcommand, Debug)]
pub enum SecretAction {
    /// Store the API key
    Set {
        /// The key value
        value: String,
    },

    /// Remove the stored API key
    Delete,
}
