use std::path::{Path, PathBuf};

use log::warn;

use crate::compile::bridge::{PythonBridge, DEFAULT_INTERPRETER};
use crate::compile::{CompileConfig, Loss};
use crate::decompile::DecompileOptions;
use crate::error::ConfigError;
use crate::optimizer::Optimizer;

pub const SETTINGS_FILE: &str = "kgraph.toml";

/// Settings from kgraph.toml, with defaults for everything left out.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Directory holding the settings file; relative paths resolve here.
    pub root_dir: PathBuf,
    pub interpreter: String,
    pub loss: Loss,
    pub optimizer: Optimizer,
    /// Learning rate set in the file, kept apart so it survives an
    /// optimizer override.
    pub learning_rate: Option<f64>,
    pub batch_size: u64,
    pub save_dir: PathBuf,
    pub model_info_dir: Option<PathBuf>,
    pub cpu_inference: bool,
    pub decompile: DecompileOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self::rooted(PathBuf::from("."))
    }
}

/// Parse a minimal TOML string array: `["a", "b"]` → `vec!["a", "b"]`.
fn parse_string_array(s: &str) -> Option<Vec<String>> {
    let inner = s.trim().strip_prefix('[')?.strip_suffix(']')?;
    Some(
        inner
            .split(',')
            .map(|part| part.trim().trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected true or false, found '{}'", other)),
    }
}

impl Settings {
    fn rooted(root_dir: PathBuf) -> Self {
        Self {
            save_dir: root_dir.join("model"),
            root_dir,
            interpreter: DEFAULT_INTERPRETER.to_string(),
            loss: Loss::default(),
            optimizer: Optimizer::default(),
            learning_rate: None,
            batch_size: 1,
            model_info_dir: None,
            cpu_inference: false,
            decompile: DecompileOptions::default(),
        }
    }

    /// Load settings from a kgraph.toml file.
    pub fn load(toml_path: &Path) -> Result<Settings, ConfigError> {
        let content = std::fs::read_to_string(toml_path).map_err(|source| ConfigError::Read {
            path: toml_path.to_path_buf(),
            source,
        })?;
        let root_dir = toml_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::parse(&content, root_dir).map_err(|(line, message)| ConfigError::Invalid {
            path: toml_path.to_path_buf(),
            line,
            message,
        })
    }

    /// Section-aware minimal TOML parsing. Errors carry a 1-based line.
    fn parse(content: &str, root_dir: PathBuf) -> Result<Settings, (usize, String)> {
        let mut settings = Settings::rooted(root_dir);
        let mut current_section = String::new();

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                current_section = trimmed[1..trimmed.len() - 1].trim().to_string();
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err((line_no, format!("expected 'key = value', found '{}'", trimmed)));
            };
            let key = key.trim().trim_matches('"');
            let raw = value.trim();
            let text = raw.trim_matches('"');
            let fail = |message: String| (line_no, message);

            match (current_section.as_str(), key) {
                ("runtime", "interpreter") => settings.interpreter = text.to_string(),
                ("compile", "batch_size") => {
                    settings.batch_size = raw
                        .parse()
                        .map_err(|_| fail(format!("invalid batch_size '{}'", raw)))?;
                    if settings.batch_size == 0 {
                        return Err(fail("batch_size must be at least 1".to_string()));
                    }
                }
                ("compile", "loss") => settings.loss = text.parse().map_err(fail)?,
                ("compile", "optimizer") => settings.optimizer = text.parse().map_err(fail)?,
                ("compile", "learning_rate") => {
                    settings.learning_rate = Some(
                        raw.parse()
                            .map_err(|_| fail(format!("invalid learning_rate '{}'", raw)))?,
                    )
                }
                ("compile", "save_dir") => settings.save_dir = settings.root_dir.join(text),
                ("compile", "model_info_dir") => {
                    settings.model_info_dir = Some(settings.root_dir.join(text))
                }
                ("compile", "cpu_inference") => {
                    settings.cpu_inference = parse_bool(raw).map_err(fail)?
                }
                ("decompile", "function_marker") => {
                    settings.decompile.function_marker = text.to_string()
                }
                ("decompile", "internal_call_prefixes") => {
                    settings.decompile.internal_call_prefixes = parse_string_array(raw)
                        .ok_or_else(|| fail(format!("expected a string array, found '{}'", raw)))?
                }
                ("decompile", "include_main_graph") => {
                    settings.decompile.include_main_graph = parse_bool(raw).map_err(fail)?
                }
                (section, key) => warn!("ignoring unknown setting [{}] {}", section, key),
            }
        }

        if let Some(lr) = settings.learning_rate {
            settings.optimizer = settings.optimizer.learning_rate(lr);
        }
        Ok(settings)
    }

    /// Try to find a kgraph.toml in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(SETTINGS_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Settings for `start_dir`: the nearest kgraph.toml, else defaults.
    pub fn discover(start_dir: &Path) -> Result<Settings, ConfigError> {
        match Self::find(start_dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::rooted(start_dir.to_path_buf())),
        }
    }

    pub fn compile_config(&self) -> CompileConfig {
        let mut config = CompileConfig::new(&self.save_dir)
            .loss(self.loss)
            .optimizer(self.optimizer.clone())
            .batch_size(self.batch_size)
            .cpu_inference(self.cpu_inference);
        config.model_info_save_dir = self.model_info_dir.clone();
        config
    }

    /// Optimizer `name` with the configured learning rate, if any.
    pub fn optimizer_named(&self, name: &str) -> Result<Optimizer, String> {
        let optimizer: Optimizer = name.parse()?;
        Ok(match self.learning_rate {
            Some(lr) => optimizer.learning_rate(lr),
            None => optimizer,
        })
    }

    /// Runtime bridge for the configured interpreter. `$KGRAPH_PYTHON`
    /// takes precedence.
    pub fn bridge(&self) -> PythonBridge {
        PythonBridge::from_env(&self.interpreter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_settings() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &toml_path,
            r#"# model build settings
[runtime]
interpreter = "/opt/venv/bin/python"

[compile]
batch_size = 32
loss = "sparse_categorical_crossentropy"
optimizer = "sgd"
learning_rate = 0.2
save_dir = "out/model"
model_info_dir = "out/info"
cpu_inference = true

[decompile]
function_marker = "__inference_evaluate"
internal_call_prefixes = ["StatefulPartitionedCall"]
include_main_graph = true
"#,
        )
        .unwrap();

        let settings = Settings::load(&toml_path).unwrap();
        assert_eq!(settings.interpreter, "/opt/venv/bin/python");
        assert_eq!(settings.batch_size, 32);
        assert_eq!(settings.loss, Loss::SparseCategoricalCrossentropy);
        assert_eq!(settings.optimizer.class_name(), "SGD");
        assert_eq!(settings.optimizer.learning_rate, 0.2);
        assert_eq!(settings.save_dir, dir.path().join("out/model"));
        assert_eq!(settings.model_info_dir, Some(dir.path().join("out/info")));
        assert!(settings.cpu_inference);
        assert_eq!(settings.decompile.function_marker, "__inference_evaluate");
        assert_eq!(
            settings.decompile.internal_call_prefixes,
            vec!["StatefulPartitionedCall"]
        );
        assert!(settings.decompile.include_main_graph);

        let config = settings.compile_config();
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.model_info_save_dir, settings.model_info_dir);
    }

    #[test]
    fn test_defaults_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::discover(dir.path()).unwrap();
        assert_eq!(settings.interpreter, DEFAULT_INTERPRETER);
        assert_eq!(settings.loss, Loss::Mse);
        assert_eq!(settings.optimizer, Optimizer::adam());
        assert_eq!(settings.batch_size, 1);
        assert_eq!(settings.save_dir, dir.path().join("model"));
        assert_eq!(settings.decompile, DecompileOptions::default());
    }

    #[test]
    fn test_find_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "[compile]\nbatch_size = 4\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            Settings::find(&nested),
            Some(dir.path().join(SETTINGS_FILE))
        );
        assert_eq!(Settings::discover(&nested).unwrap().batch_size, 4);
    }

    #[test]
    fn test_invalid_values_report_line() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join(SETTINGS_FILE);
        fs::write(&toml_path, "[compile]\nloss = \"mse\"\nbatch_size = 0\n").unwrap();
        match Settings::load(&toml_path) {
            Err(ConfigError::Invalid { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected invalid setting, got {:?}", other),
        }

        fs::write(&toml_path, "[compile]\nloss = \"hinge\"\n").unwrap();
        assert!(matches!(
            Settings::load(&toml_path),
            Err(ConfigError::Invalid { line: 2, .. })
        ));
    }

    #[test]
    fn test_optimizer_override_keeps_learning_rate() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join(SETTINGS_FILE);
        fs::write(&toml_path, "[compile]\noptimizer = \"sgd\"\nlearning_rate = 0.3\n").unwrap();
        let settings = Settings::load(&toml_path).unwrap();
        assert_eq!(settings.learning_rate, Some(0.3));

        let adam = settings.optimizer_named("adam").unwrap();
        assert_eq!(adam.class_name(), "Adam");
        assert_eq!(adam.learning_rate, 0.3);

        let defaults = Settings::discover(tempfile::tempdir().unwrap().path()).unwrap();
        assert_eq!(defaults.optimizer_named("sgd").unwrap(), Optimizer::sgd());
        assert!(settings.optimizer_named("lion").is_err());
    }

    #[test]
    fn test_parse_string_array() {
        assert_eq!(
            parse_string_array(r#"["a", "b", "c"]"#),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(parse_string_array("[]"), Some(Vec::new()));
        assert!(parse_string_array("not_an_array").is_none());
    }
}
