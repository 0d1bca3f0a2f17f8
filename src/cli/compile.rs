use std::path::PathBuf;
use std::process;

use clap::Args;
use serde_json::Value;

use kgraph::compile::bridge::INTERPRETER_ENV;
use kgraph::compile::{Loss, ModelCompiler};

use super::{load_settings, parse_or_exit, read_or_exit};

#[derive(Args)]
pub struct CompileArgs {
    /// Model definition JSON (as written to model.json)
    pub input: PathBuf,
    /// Directory the saved model is written to (default from kgraph.toml)
    #[arg(short, long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,
    /// Batch size used to trace the entry points
    #[arg(long)]
    pub batch_size: Option<u64>,
    /// Loss: mse, binary_crossentropy or sparse_categorical_crossentropy
    #[arg(long)]
    pub loss: Option<String>,
    /// Optimizer: sgd, adam, adamax, nadam, rmsprop, adagrad, adadelta, ftrl
    #[arg(long)]
    pub optimizer: Option<String>,
    /// Learning rate for the optimizer
    #[arg(long)]
    pub learning_rate: Option<f64>,
    /// Also write model.json and a model summary here
    #[arg(long, value_name = "DIR")]
    pub info_dir: Option<PathBuf>,
    /// Also save a CPU-only copy for inference
    #[arg(long)]
    pub cpu_inference: bool,
}

pub fn cmd_compile(args: CompileArgs) {
    let CompileArgs {
        input,
        save_dir,
        batch_size,
        loss,
        optimizer,
        learning_rate,
        info_dir,
        cpu_inference,
    } = args;

    let settings = load_settings();
    let mut config = settings.compile_config();
    if let Some(dir) = save_dir {
        config.save_dir = dir;
    }
    if let Some(size) = batch_size {
        config = config.batch_size(size);
    }
    if let Some(loss) = loss {
        config = config.loss(parse_or_exit::<Loss>("loss", &loss));
    }
    if let Some(optimizer) = optimizer {
        match settings.optimizer_named(&optimizer) {
            Ok(optimizer) => config = config.optimizer(optimizer),
            Err(e) => {
                eprintln!("error: --optimizer: {}", e);
                process::exit(1);
            }
        }
    }
    if let Some(lr) = learning_rate {
        config.optimizer = config.optimizer.learning_rate(lr);
    }
    if let Some(dir) = info_dir {
        config = config.model_info_save_dir(dir);
    }
    if cpu_inference {
        config = config.cpu_inference(true);
    }

    let text = read_or_exit(&input);
    let definition: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("error: '{}' is not valid JSON: {}", input.display(), e);
            process::exit(1);
        }
    };

    let bridge = settings.bridge();
    if !bridge.available() {
        eprintln!(
            "error: runtime '{}' cannot be started (set {} or [runtime] interpreter)",
            bridge.program(),
            INTERPRETER_ENV
        );
        process::exit(1);
    }

    eprintln!("Compiling {}...", input.display());
    let compiler = ModelCompiler::new(bridge);
    match compiler.compile_definition(&definition, &[] as &[String], &config) {
        Ok(model) => {
            eprintln!(
                "Saved model to {} (signatures: {})",
                model.dir.display(),
                model.signatures.join(", ")
            );
            println!("{}", model.fingerprint);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
