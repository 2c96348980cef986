use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tabsync")]
#[command(about = "Reconcile browser tab groups with a stored snapshot")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the sync/local storage scope files
    #[arg(long, global = true, value_name = "DIR", default_value = ".tabsync")]
    pub store: PathBuf,

    /// Path to the browser state JSON file
    #[arg(long, global = true, value_name = "PATH", default_value = "browser.json")]
    pub browser: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push local tab groups to the stored snapshot
    Push,
    /// Pull the stored snapshot into the browser state
    Pull,
    /// Merge the stored snapshot with local state
    Merge,
    /// List groups in the stored snapshot
    Groups {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export snapshot groups as pretty-printed JSON
    Export {
        /// Comma-separated group ids to export (all groups when omitted)
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        select: Option<Vec<i64>>,
        /// Output path (a timestamped tabgroups-*.json when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import groups from a JSON file and materialize them locally
    Import {
        /// Path to the JSON file to import
        input: PathBuf,
    },
}
