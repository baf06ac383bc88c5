//! CADP equivalence checking.
//!
//! Drives the external toolchain over two `.aut` automata: both are
//! converted to BCG form (`bcg_io`), the second is renamed through an SVL
//! `total rename` script generated from a [`RenameMap`], and the pair is
//! compared with `bcg_open ... bisimulator -weaktrace`. The toolchain is
//! opaque; this module owns only the file formats and the verdict parse.

use crate::error::{CheckError, Error};
use crate::util::{run_with_timeout, CommandFailure};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Label rename mapping applied to the augmented automaton before
/// comparison.
///
/// Text form, one pair per line, `"i"` denoting the invisible action:
///
/// ```text
/// "Inform(time=0)" -> "explains the result"
/// "Tick(time=1)" -> "i"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameMap {
    pairs: Vec<(String, String)>,
}

impl RenameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one `old -> new` pair.
    #[must_use]
    pub fn with_rename(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.pairs.push((old.into(), new.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Parse the textual mapping format. Blank lines are skipped; any other
    /// line must contain `->`.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut map = Self::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((old, new)) = line.split_once("->") else {
                return Err(CheckError::RenameParse {
                    line: idx + 1,
                    content: line.to_string(),
                }
                .into());
            };
            let unquote = |s: &str| {
                s.trim()
                    .trim_matches(|c: char| c == '"' || c == ',')
                    .to_string()
            };
            map.pairs.push((unquote(old), unquote(new)));
        }
        Ok(map)
    }

    /// Render the textual mapping format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (old, new) in &self.pairs {
            let _ = writeln!(out, "\"{old}\" -> \"{new}\"");
        }
        out
    }

    /// Generate the SVL `total rename` script applied to `l2.bcg`. Square
    /// brackets in the old labels are escaped for the SVL regex engine.
    pub fn to_svl_script(&self) -> String {
        let rules: Vec<String> = self
            .pairs
            .iter()
            .map(|(old, new)| {
                let old = old.replace('[', "\\[").replace(']', "\\]");
                format!("    \"{old}\" -> \"{new}\"")
            })
            .collect();

        format!(
            "property RENAME_RULES\n    \
             \"Rename transitions to their abstract form\"\n\
             is\n    \
             \"renamed.bcg\" = total rename\n\
             {}\n    \
             in \"l2.bcg\";\n    \
             % bcg_io \"renamed.bcg\" \"renamed.aut\"\n\
             end property",
            rules.join(",\n")
        )
    }
}

/// Verdict of an equivalence check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "equivalence verdict should be checked"]
pub enum Verdict {
    /// The automata are weak-trace equivalent after renaming.
    Equivalent,

    /// The automata differ; `diagnostic` is the comparator's raw output.
    NotEquivalent { diagnostic: String },
}

/// Configuration for the CADP toolchain.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CheckConfig {
    /// `bcg_io` binary (aut/bcg conversion).
    pub bcg_io_bin: String,

    /// `svl` binary (rename script runner).
    pub svl_bin: String,

    /// `bcg_open` binary (bisimulator launcher).
    pub bcg_open_bin: String,

    /// Per-tool timeout (default: no timeout).
    pub timeout: Option<std::time::Duration>,

    /// Work directory override (default: temp directory).
    pub work_dir: Option<PathBuf>,

    /// Keep the temp work directory after the run.
    pub keep_outputs: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            bcg_io_bin: "bcg_io".into(),
            svl_bin: "svl".into(),
            bcg_open_bin: "bcg_open".into(),
            timeout: None,
            work_dir: None,
            keep_outputs: false,
        }
    }
}

impl CheckConfig {
    pub fn builder() -> CheckConfigBuilder {
        CheckConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct CheckConfigBuilder {
    bcg_io_bin: Option<String>,
    svl_bin: Option<String>,
    bcg_open_bin: Option<String>,
    timeout: Option<std::time::Duration>,
    work_dir: Option<PathBuf>,
    keep_outputs: Option<bool>,
}

impl CheckConfigBuilder {
    pub fn bcg_io_bin(mut self, bin: impl Into<String>) -> Self {
        self.bcg_io_bin = Some(bin.into());
        self
    }

    pub fn svl_bin(mut self, bin: impl Into<String>) -> Self {
        self.svl_bin = Some(bin.into());
        self
    }

    pub fn bcg_open_bin(mut self, bin: impl Into<String>) -> Self {
        self.bcg_open_bin = Some(bin.into());
        self
    }

    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn keep_outputs(mut self, keep: bool) -> Self {
        self.keep_outputs = Some(keep);
        self
    }

    pub fn build(self) -> CheckConfig {
        let defaults = CheckConfig::default();
        CheckConfig {
            bcg_io_bin: self.bcg_io_bin.unwrap_or(defaults.bcg_io_bin),
            svl_bin: self.svl_bin.unwrap_or(defaults.svl_bin),
            bcg_open_bin: self.bcg_open_bin.unwrap_or(defaults.bcg_open_bin),
            timeout: self.timeout.or(defaults.timeout),
            work_dir: self.work_dir.or(defaults.work_dir),
            keep_outputs: self.keep_outputs.unwrap_or(defaults.keep_outputs),
        }
    }
}

/// Compare two `.aut` automata for weak-trace equivalence after applying
/// the rename mapping to the second one.
///
/// The verdict carries the comparator's raw output either way; this crate
/// never inspects the toolchain beyond `TRUE` appearing in it.
pub fn check_equivalence(
    config: &CheckConfig,
    reference_aut: &str,
    augmented_aut: &str,
    rename: &RenameMap,
) -> Result<Verdict, Error> {
    if reference_aut.trim().is_empty() {
        return Err(CheckError::EmptyAutomaton { role: "reference" }.into());
    }
    if augmented_aut.trim().is_empty() {
        return Err(CheckError::EmptyAutomaton { role: "augmented" }.into());
    }

    let (work_dir, temp) = match &config.work_dir {
        Some(dir) => (dir.clone(), None),
        None => {
            let tmp = tempfile::Builder::new()
                .prefix("sleec_check_")
                .tempdir()
                .map_err(|e| CheckError::WorkDir(e.to_string()))?;
            let path = tmp.path().to_path_buf();
            if config.keep_outputs {
                // Prevent cleanup by forgetting the TempDir
                std::mem::forget(tmp);
                (path, None)
            } else {
                (path, Some(tmp))
            }
        }
    };

    std::fs::write(work_dir.join("l1.aut"), reference_aut)?;
    std::fs::write(work_dir.join("l2.aut"), augmented_aut)?;
    std::fs::write(work_dir.join("rename.svl"), rename.to_svl_script())?;
    std::fs::write(work_dir.join("rename.ren"), rename.render())?;

    info!(work_dir = %work_dir.display(), "Running CADP equivalence check");

    run_tool(config, &work_dir, &config.bcg_io_bin, &["l1.aut", "l1.bcg"])?;
    run_tool(config, &work_dir, &config.bcg_io_bin, &["l2.aut", "l2.bcg"])?;
    run_tool(config, &work_dir, &config.svl_bin, &["rename.svl"])?;
    let stdout = run_tool(
        config,
        &work_dir,
        &config.bcg_open_bin,
        &["l1.bcg", "bisimulator", "-weaktrace", "renamed.bcg"],
    )?;

    drop(temp);

    if stdout.to_uppercase().contains("TRUE") {
        info!("Automata are weak-trace equivalent");
        Ok(Verdict::Equivalent)
    } else {
        info!("Automata are not equivalent");
        Ok(Verdict::NotEquivalent { diagnostic: stdout })
    }
}

/// Run one toolchain step in the work directory, returning its stdout.
fn run_tool(
    config: &CheckConfig,
    work_dir: &Path,
    bin: &str,
    args: &[&str],
) -> Result<String, Error> {
    let mut cmd = std::process::Command::new(bin);
    cmd.args(args).current_dir(work_dir);
    debug!("Command: {:?}", cmd);

    let output = run_with_timeout(&mut cmd, config.timeout).map_err(|e| match e {
        CommandFailure::Spawn(reason) => CheckError::ToolNotFound {
            tool: bin.to_string(),
            reason,
        },
        CommandFailure::Timeout(duration) => CheckError::Timeout {
            tool: bin.to_string(),
            duration,
        },
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        return Err(CheckError::ToolExecution {
            tool: bin.to_string(),
            exit_code: output.status.code(),
            message: format!("stdout: {stdout}\nstderr: {stderr}"),
        }
        .into());
    }

    Ok(stdout)
}
