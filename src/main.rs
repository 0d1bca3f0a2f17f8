use clap::{Parser, Subcommand};

mod cli;

use cli::compile::{cmd_compile, CompileArgs};
use cli::decompile::{cmd_decompile, DecompileArgs};

#[derive(Parser)]
#[command(
    name = "kgraph",
    version,
    about = "Build, compile and decompile Keras-style layer graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a model definition into a trainable saved model
    Compile(CompileArgs),
    /// Reconstruct constructor statements from a saved model's graph
    Decompile(DecompileArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Compile(args) => cmd_compile(args),
        Command::Decompile(args) => cmd_decompile(args),
    }
}
