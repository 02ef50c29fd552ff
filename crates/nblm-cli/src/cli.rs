use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nblm")]
#[command(about = "NotebookLM RPC client", long_about = None)]
pub(crate) struct Cli {
    /// Config file (JSONC). Defaults to the user config directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) debug: bool,
    /// Write logs to a file under the local data directory instead of stderr.
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) log_file: bool,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    #[command(about = "Show credential status without contacting the service")]
    Status,
    #[command(about = "Extract (or re-extract) page tokens and report the result")]
    Tokens {
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
    #[command(about = "Call a raw batchexecute RPC and print its payload")]
    Exec {
        #[arg(value_name = "RPC_ID")]
        rpc_id: String,
        /// Positional parameters as a JSON array.
        #[arg(value_name = "PARAMS", default_value = "[]")]
        params: String,
        #[arg(long, default_value = "/")]
        source_path: String,
    },
    #[command(about = "List the sources of a notebook")]
    Sources {
        #[arg(value_name = "NOTEBOOK_ID")]
        notebook_id: String,
    },
    #[command(about = "Ask a notebook a question")]
    Query {
        #[arg(value_name = "NOTEBOOK_ID")]
        notebook_id: String,
        #[arg(value_name = "QUESTION", trailing_var_arg = true, required = true)]
        question: Vec<String>,
        /// Restrict the answer to these sources. Repeatable.
        #[arg(short = 's', long = "source")]
        sources: Vec<String>,
        /// Continue an existing conversation.
        #[arg(short = 'c', long)]
        conversation: Option<String>,
        #[arg(long, default_value_t = 120, value_name = "SECONDS")]
        timeout: u64,
    },
    #[command(about = "Print a name/code table, or list the tables")]
    Codes {
        #[arg(value_name = "TABLE")]
        table: Option<String>,
    },
}
