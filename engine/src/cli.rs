//! CLI interface for Polyglot
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for driving the translation
//! engine from a terminal.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Polyglot Translation Engine
///
/// Translates text through a local text-generation backend, escalating
/// through fallback prompt strategies when the backend refuses or fails.
#[derive(Parser, Debug)]
#[command(name = "polyglot")]
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
    /// Translate a single piece of text
    Run {
        /// The text to translate
        text: String,

        /// Surrounding context that may disambiguate the text
        #[arg(long)]
        context: Option<String>,

        /// Translation instructions (overrides the configured default)
        #[arg(short, long)]
        instructions: Option<String>,

        /// Skip the conversational strategy for this request
        #[arg(long)]
        no_conversation: bool,
    },

    /// Translate a file line by line
    Batch {
        /// File with one text fragment per line
        file: PathBuf,

        /// Translation instructions (overrides the configured default)
        #[arg(short, long)]
        instructions: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate,
}
