//! External Tool Runner (C4): a uniform wrapper around bounded-time
//! subprocess invocations. Every external binary (qpdf, mutool, gs,
//! pdfsizeopt, jbig2, soffice, tesseract, pdftoppm) goes through this.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Outcome of a bounded subprocess call. The caller never matches on an
/// exception type; a timeout just sets `timeout=true, ok=false`.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub ok: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timeout: bool,
    pub elapsed_ms: u64,
}

impl ToolOutcome {
    fn timed_out(elapsed_ms: u64) -> Self {
        Self {
            ok: false,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            timeout: true,
            elapsed_ms,
        }
    }
}

/// Run `binary` with `args`, bounded to `timeout_duration`, in `cwd` with an
/// optional environment overlay applied on top of the inherited environment.
pub async fn run_bounded(
    binary: &str,
    args: &[&str],
    cwd: Option<&Path>,
    env_overlay: &HashMap<String, String>,
    timeout_duration: Duration,
) -> ToolOutcome {
    let mut command = Command::new(binary);
    command.args(args);
    command.kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    for (key, value) in env_overlay {
        command.env(key, value);
    }

    debug!(binary, ?args, "spawning external tool");
    let start = Instant::now();

    let output = timeout(timeout_duration, command.output()).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match output {
        Ok(Ok(output)) => ToolOutcome {
            ok: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            timeout: false,
            elapsed_ms,
        },
        Ok(Err(err)) => ToolOutcome {
            ok: false,
            exit_code: None,
            stdout: String::new(),
            stderr: format!("failed to spawn {binary}: {err}"),
            timeout: false,
            elapsed_ms,
        },
        Err(_) => ToolOutcome::timed_out(elapsed_ms),
    }
}

/// Whether `binary` is present on `PATH`.
pub fn binary_available(binary: &str) -> bool {
    which::which(binary).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_not_ok_and_not_a_timeout() {
        let outcome = run_bounded(
            "zenpdf-worker-definitely-not-a-real-binary",
            &[],
            None,
            &HashMap::new(),
            Duration::from_secs(2),
        )
        .await;
        assert!(!outcome.ok);
        assert!(!outcome.timeout);
    }

    #[tokio::test]
    async fn slow_command_is_reported_as_timeout() {
        let outcome = run_bounded(
            "sleep",
            &["5"],
            None,
            &HashMap::new(),
            Duration::from_millis(50),
        )
        .await;
        assert!(outcome.timeout);
        assert!(!outcome.ok);
    }

    #[test]
    fn which_reports_presence_for_common_shell_builtin_path() {
        assert!(!binary_available("zenpdf-worker-definitely-not-a-real-binary"));
    }
}
