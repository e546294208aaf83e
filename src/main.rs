mod cmd;
mod itr;
mod tax;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "itrc", version, about = "Indian income-tax return computation: set-off, special-rate income and liability")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full computation for one return document
    Compute(cmd::compute::ComputeCommand),
    /// Check a return document and report input issues
    Validate(cmd::validate::ValidateCommand),
    /// Print the JSON Schema for the input document
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compute(cmd) => cmd.exec(),
        Command::Validate(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
