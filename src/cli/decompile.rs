use std::path::PathBuf;
use std::process;

use clap::Args;

use kgraph::decompile::{load_saved_graph_with, Decompiler};

use super::load_settings;

#[derive(Args)]
pub struct DecompileArgs {
    /// Saved model directory (saved_model.pb or graph_def.json)
    pub input: PathBuf,
    /// Decompile functions whose name contains this marker
    #[arg(long)]
    pub marker: Option<String>,
    /// Keep statements from the main graph
    #[arg(long)]
    pub include_main: bool,
    /// Write the statements to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn cmd_decompile(args: DecompileArgs) {
    let DecompileArgs {
        input,
        marker,
        include_main,
        output,
    } = args;

    let settings = load_settings();
    let mut options = settings.decompile.clone();
    if let Some(marker) = marker {
        options.function_marker = marker;
    }
    if include_main {
        options.include_main_graph = true;
    }

    let graph = match load_saved_graph_with(&input, &settings.bridge()) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let text = Decompiler::new(options).decompile(&graph);
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, format!("{}\n", text)) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
}
