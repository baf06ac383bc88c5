//! Internal utility functions.

/// Why a subprocess run failed before producing an `Output`.
#[cfg(any(feature = "trace-gen", feature = "check"))]
#[derive(Debug)]
pub(crate) enum CommandFailure {
    /// The binary could not be spawned.
    Spawn(String),

    /// The process exceeded the timeout and was killed.
    Timeout(std::time::Duration),
}

/// Run a subprocess command with an optional timeout.
///
/// If `timeout` is `Some`, spawns the process and polls `try_wait` in a
/// loop, killing the child if it exceeds the timeout. If `timeout` is
/// `None`, uses the standard blocking `output()` call.
#[cfg(any(feature = "trace-gen", feature = "check"))]
pub(crate) fn run_with_timeout(
    cmd: &mut std::process::Command,
    timeout: Option<std::time::Duration>,
) -> Result<std::process::Output, CommandFailure> {
    let Some(timeout) = timeout else {
        let output = cmd
            .output()
            .map_err(|e| CommandFailure::Spawn(e.to_string()))?;
        return Ok(output);
    };

    let mut child = cmd
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| CommandFailure::Spawn(e.to_string()))?;

    let start = std::time::Instant::now();
    let poll_interval = std::time::Duration::from_millis(100);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = child.stdout.take().map_or_else(Vec::new, |mut s| {
                    let mut buf = Vec::new();
                    let _ = std::io::Read::read_to_end(&mut s, &mut buf);
                    buf
                });
                let stderr = child.stderr.take().map_or_else(Vec::new, |mut s| {
                    let mut buf = Vec::new();
                    let _ = std::io::Read::read_to_end(&mut s, &mut buf);
                    buf
                });
                return Ok(std::process::Output {
                    status,
                    stdout,
                    stderr,
                });
            }
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(CommandFailure::Timeout(timeout));
                }
                std::thread::sleep(poll_interval);
            }
            Err(e) => {
                return Err(CommandFailure::Spawn(e.to_string()));
            }
        }
    }
}
