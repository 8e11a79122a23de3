use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use keymatch::store::DEFAULT_TABLE;

#[derive(Debug, Parser)]
#[command(
    name = "keymatch",
    about = "Find the record best matching a short query in a key-value store"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to the store database (default: <data-dir>/store.redb)
    #[arg(long, global = true, env = "KEYMATCH_STORE")]
    pub store: Option<PathBuf>,

    /// Table holding the records
    #[arg(long, global = true, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find the record best matching a query
    Search(SearchArgs),
    /// Resolve one query per line from a file or stdin
    Batch(BatchArgs),
    /// Show the prefixes a query is scanned with
    Terms(TermsArgs),
    /// Show how a key scores against a query
    Explain(ExplainArgs),
    /// Show store location and size
    Status(StatusArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query; join terms with '+' to require several
    pub query: String,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Batch --

#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Read queries from this file instead of stdin
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output one JSON object per line
    #[arg(long)]
    pub json: bool,
}

// -- Terms --

#[derive(Debug, Parser)]
pub struct TermsArgs {
    /// The query to expand
    pub query: String,

    /// Output as JSON array
    #[arg(long)]
    pub json: bool,
}

// -- Explain --

#[derive(Debug, Parser)]
pub struct ExplainArgs {
    /// Key to score
    pub key: String,

    /// Query to score it against
    pub query: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "keymatch",
            &mut std::io::stdout(),
        );
    }
}
