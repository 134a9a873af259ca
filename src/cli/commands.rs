//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: full pipeline (default)
//! - sweep: janitor only
//! - scan: hunt and select without judging or writing
//! - published: list published issues from the store
//! - categories: print the configured category map

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GitNova - finds approachable open-source issues and publishes them with a guide
#[derive(Parser, Debug)]
#[command(name = "gitnova")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Judge candidates but never write to or delete from the store
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the full pipeline: janitor, then hunt, select and publish per category
    Run,

    /// Delete published issues that were closed upstream
    Sweep,

    /// Hunt and select candidates without calling the judge or the store
    Scan {
        /// Only scan this category
        #[arg(long)]
        category: Option<String>,
    },

    /// List published issues, best first
    Published {
        /// Only this category; an empty category lists any published issues
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of issues to list
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the configured categories and repositories
    Categories,
}
