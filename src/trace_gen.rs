//! External trace generation.
//!
//! Invokes the configured rule-simulation binary on a synthesized rule
//! document and captures the raw timestamped trace it emits. The generator
//! is an opaque process; only its output contract (`at time T: ...` lines)
//! is consumed, by [`crate::trace::parse_trace`].

use crate::error::{Error, TraceGenError};
use crate::util::{run_with_timeout, CommandFailure};
use std::path::PathBuf;
use tracing::{debug, info};

/// Configuration for external trace generation.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TraceGenConfig {
    /// Generator binary to invoke.
    pub generator_bin: String,

    /// Extra arguments placed before the document path.
    pub args: Vec<String>,

    /// Simulation time window passed as `--time-window=N`.
    pub time_window: u64,

    /// File the generator writes its trace to. When `None`, the trace is
    /// taken from stdout.
    pub output_file: Option<PathBuf>,

    /// Kill the generator after this long (default: no timeout).
    pub timeout: Option<std::time::Duration>,

    /// Keep the temp work directory after the run.
    pub keep_outputs: bool,
}

impl Default for TraceGenConfig {
    fn default() -> Self {
        Self {
            generator_bin: String::new(),
            args: Vec::new(),
            time_window: 15,
            output_file: None,
            timeout: None,
            keep_outputs: false,
        }
    }
}

impl TraceGenConfig {
    pub fn builder() -> TraceGenConfigBuilder {
        TraceGenConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct TraceGenConfigBuilder {
    generator_bin: Option<String>,
    args: Option<Vec<String>>,
    time_window: Option<u64>,
    output_file: Option<PathBuf>,
    timeout: Option<std::time::Duration>,
    keep_outputs: Option<bool>,
}

impl TraceGenConfigBuilder {
    pub fn generator_bin(mut self, bin: impl Into<String>) -> Self {
        self.generator_bin = Some(bin.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn time_window(mut self, window: u64) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn keep_outputs(mut self, keep: bool) -> Self {
        self.keep_outputs = Some(keep);
        self
    }

    pub fn build(self) -> Result<TraceGenConfig, crate::error::BuilderError> {
        let defaults = TraceGenConfig::default();
        let generator_bin =
            self.generator_bin
                .ok_or(crate::error::BuilderError::MissingRequiredField {
                    builder: "TraceGenConfigBuilder",
                    field: "generator_bin",
                })?;
        Ok(TraceGenConfig {
            generator_bin,
            args: self.args.unwrap_or(defaults.args),
            time_window: self.time_window.unwrap_or(defaults.time_window),
            output_file: self.output_file.or(defaults.output_file),
            timeout: self.timeout.or(defaults.timeout),
            keep_outputs: self.keep_outputs.unwrap_or(defaults.keep_outputs),
        })
    }
}

/// Run the external generator on a rule document and return the raw trace
/// text. The document is written into a temp work directory so the
/// generator sees a plain file path.
pub fn generate_trace(config: &TraceGenConfig, rules_document: &str) -> Result<String, Error> {
    let work_dir = tempfile::Builder::new()
        .prefix("sleec_trace_")
        .tempdir()
        .map_err(|e| TraceGenError::WorkDir(e.to_string()))?;

    let doc_path = work_dir.path().join("rules.sleec");
    std::fs::write(&doc_path, rules_document)?;

    let mut cmd = std::process::Command::new(&config.generator_bin);
    cmd.args(&config.args)
        .arg(&doc_path)
        .arg(format!("--time-window={}", config.time_window))
        .current_dir(work_dir.path());

    info!(
        bin = %config.generator_bin,
        time_window = config.time_window,
        "Running external trace generator"
    );
    debug!("Command: {:?}", cmd);

    let output = run_with_timeout(&mut cmd, config.timeout).map_err(|e| match e {
        CommandFailure::Spawn(reason) => TraceGenError::GeneratorNotFound {
            bin: config.generator_bin.clone(),
            reason,
        },
        CommandFailure::Timeout(duration) => TraceGenError::Timeout { duration },
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        return Err(TraceGenError::GeneratorExecution {
            exit_code: output.status.code(),
            message: format!("stdout: {stdout}\nstderr: {stderr}"),
        }
        .into());
    }

    let trace = match &config.output_file {
        Some(path) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                work_dir.path().join(path)
            };
            std::fs::read_to_string(&path).map_err(|e| TraceGenError::OutputRead {
                path: path.clone(),
                reason: e.to_string(),
            })?
        }
        None => stdout,
    };

    if config.keep_outputs {
        let kept = work_dir.path().to_path_buf();
        // Prevent cleanup by forgetting the TempDir
        std::mem::forget(work_dir);
        debug!(path = %kept.display(), "Kept trace generation work directory");
    }

    if trace.trim().is_empty() {
        return Err(TraceGenError::EmptyOutput.into());
    }

    info!(bytes = trace.len(), "Captured generated trace");
    Ok(trace)
}
