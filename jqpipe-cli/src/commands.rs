use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a pipeline spec and run it.
    Run {
        /// File path, `file://` URL, or `http(s)://` URL of the spec.
        location: String,
        /// JSON or YAML file with the initial parameters.
        #[arg(long)]
        params: Option<PathBuf>,
        /// Sets one top-level initial parameter; repeatable.
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        set_params: Vec<(String, String)>,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        exec: ExecArgs,
    },
    /// Parse and validate a spec, compiling every filter.
    Validate {
        location: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the items and steps of a spec.
    Inspect {
        location: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}
