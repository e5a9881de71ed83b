use std::path::PathBuf;

/// How the interpreter process is started and primed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Interpreter executable. Default: `python3`.
    pub program: PathBuf,
    /// Arguments placed before `script`. Default: `-i -u` (forced
    /// interactive mode, unbuffered output).
    pub args: Vec<String>,
    /// Optional script run before the interactive prompt.
    pub script: Option<PathBuf>,
    /// Lines written right after start-up.
    pub preamble: Vec<String>,
    /// Write outbound literals as `b"..."` so Python 3 reads them as bytes.
    pub bytes_prefix: bool,
    /// Pass the interpreter's stderr (prompts, tracebacks) through.
    pub inherit_stderr: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("python3"),
            args: vec!["-i".to_string(), "-u".to_string()],
            script: None,
            preamble: vec!["import numpy as np".to_string(), "import io".to_string()],
            bytes_prefix: true,
            inherit_stderr: false,
        }
    }
}
