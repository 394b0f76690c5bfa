use clap::Parser;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "jqpipe", version, about = "jq-driven HTTP pipeline runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Run {
            location,
            params,
            set_params,
            output,
            exec,
        } => cmd::run::run_cmd(&location, params.as_deref(), &set_params, output, exec).await,
        Command::Validate { location, output } => cmd::validate::validate_cmd(&location, output).await,
        Command::Inspect { location, output } => cmd::inspect::inspect_cmd(&location, output).await,
    }
}
