use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ubl",
    about = "User/Bank Ledger: users, banks, and indexed transactions over a versioned key-value store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Host configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// State directory; overrides `state_dir` from the config file
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Invoke a ledger operation
    Invoke(InvokeArgs),
    /// List the operations the ledger understands
    Functions,
    /// Show committed invocations from the commit log
    History(HistoryArgs),
}

#[derive(Args)]
pub struct InvokeArgs {
    /// Operation name, e.g. CreateUser
    pub function: String,
    /// Positional string arguments
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct HistoryArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}
