pub mod compile;
pub mod decompile;

use std::path::{Path, PathBuf};
use std::process;

use kgraph::config::Settings;

/// Settings for the current directory, or exit.
pub fn load_settings() -> Settings {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match Settings::discover(&cwd) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

/// Read a file to a string, or exit.
pub fn read_or_exit(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

/// Parse a value with `FromStr`, or exit naming the flag.
pub fn parse_or_exit<T>(flag: &str, value: &str) -> T
where
    T: std::str::FromStr<Err = String>,
{
    match value.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: --{}: {}", flag, e);
            process::exit(1);
        }
    }
}
