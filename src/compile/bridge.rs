//! Runtime bridge: run a script in the external runtime with a JSON
//! payload on stdin.
//!
//! The library never links the runtime. Every call spawns a fresh
//! interpreter process, writes the payload, waits, and hands back the
//! captured output. Calls block the caller.

use std::io::Write;
use std::process::{Command, Stdio};

use log::{debug, info, warn};

use crate::error::BridgeError;

/// Interpreter used when nothing else is configured.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Environment variable that overrides the interpreter.
pub const INTERPRETER_ENV: &str = "KGRAPH_PYTHON";

/// Captured output of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Anything that can execute a runtime script.
pub trait RuntimeBridge {
    /// Run `script` with `payload` on stdin. A non-zero exit is an error
    /// carrying the captured output.
    fn run(&self, script: &str, payload: &str) -> Result<BridgeOutput, BridgeError>;
}

impl<B: RuntimeBridge + ?Sized> RuntimeBridge for &B {
    fn run(&self, script: &str, payload: &str) -> Result<BridgeOutput, BridgeError> {
        (**self).run(script, payload)
    }
}

/// Bridge that shells out to a Python interpreter.
#[derive(Debug, Clone)]
pub struct PythonBridge {
    program: String,
}

impl Default for PythonBridge {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER)
    }
}

impl PythonBridge {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Interpreter from `$KGRAPH_PYTHON`, else `fallback`.
    pub fn from_env(fallback: &str) -> Self {
        match std::env::var(INTERPRETER_ENV) {
            Ok(program) if !program.trim().is_empty() => Self::new(program.trim()),
            _ => Self::new(fallback),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the interpreter can be started at all.
    pub fn available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl RuntimeBridge for PythonBridge {
    fn run(&self, script: &str, payload: &str) -> Result<BridgeOutput, BridgeError> {
        let mut file = tempfile::Builder::new()
            .prefix("kgraph-")
            .suffix(".py")
            .tempfile()?;
        file.write_all(script.as_bytes())?;
        file.flush()?;
        debug!(
            "running {} {} ({} byte payload)",
            self.program,
            file.path().display(),
            payload.len()
        );

        let mut child = Command::new(&self.program)
            .arg(file.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // The payload is fed from its own thread while the pipes drain,
        // so a chatty runtime cannot block on a full stdout or stderr.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            if let Some(mut stdin) = stdin {
                scope.spawn(move || {
                    // The script may exit before reading everything; its
                    // exit status is what gets reported.
                    if let Err(e) = stdin.write_all(payload.as_bytes()) {
                        warn!("runtime closed stdin early: {}", e);
                    }
                });
            }
            child.wait_with_output()
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        for line in stdout.lines() {
            info!("runtime: {}", line);
        }

        if !output.status.success() {
            return Err(BridgeError::Exit {
                status: output.status.to_string(),
                stdout,
                stderr,
            });
        }
        Ok(BridgeOutput { stdout, stderr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_interpreter_is_spawn_error() {
        let bridge = PythonBridge::new("kgraph-no-such-interpreter");
        assert!(!bridge.available());
        match bridge.run("print(1)", "{}") {
            Err(BridgeError::Spawn { program, .. }) => {
                assert_eq!(program, "kgraph-no-such-interpreter")
            }
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_and_stdout_through_shell() {
        // `sh <script>` reads the payload from stdin like the Python scripts do.
        let bridge = PythonBridge::new("sh");
        let out = bridge.run("cat\necho done\n", "{\"x\":1}").unwrap();
        assert_eq!(out.stdout, "{\"x\":1}done\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_carries_output() {
        let bridge = PythonBridge::new("sh");
        let err = bridge
            .run("echo partial\necho broken >&2\nexit 3\n", "")
            .unwrap_err();
        match err {
            BridgeError::Exit {
                stdout, stderr, ..
            } => {
                assert_eq!(stdout.trim(), "partial");
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("expected exit error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_large_payload_with_early_stderr_completes() {
        use std::sync::mpsc;
        use std::time::Duration;

        let payload = "x".repeat(200_000);
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let bridge = PythonBridge::new("sh");
            let result = bridge.run(
                "head -c 200000 /dev/zero >&2\ncat >/dev/null\necho ok\n",
                &payload,
            );
            let _ = tx.send(result);
        });

        let out = rx
            .recv_timeout(Duration::from_secs(30))
            .expect("bridge did not finish")
            .unwrap();
        assert_eq!(out.stdout, "ok\n");
        assert_eq!(out.stderr.len(), 200_000);
    }
}
