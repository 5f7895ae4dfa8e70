//! Foreground application queries
//!
//! Capability interface over the OS-specific "which app is frontmost" call.
//! Each platform family shells out to its native helper (osascript on macOS,
//! xdotool on X11, PowerShell on Windows). All queries are bounded by a
//! timeout and resolve to None on any failure; the caller substitutes a
//! default label. A hung helper must never block the sampling loop.

use std::process::Command;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, warn};

/// Capability interface for frontmost-application detection.
///
/// Implementations must be cheap to call repeatedly and must respect the
/// timeout; they return None rather than erroring.
pub trait ForegroundQuery: Send + Sync {
    fn query(&self, timeout: Duration) -> Option<String>;
}

/// Platform-dispatching implementation backed by external helper processes.
pub struct SystemForegroundQuery;

impl ForegroundQuery for SystemForegroundQuery {
    fn query(&self, timeout: Duration) -> Option<String> {
        run_with_timeout(build_query_command()?, timeout)
    }
}

#[cfg(target_os = "macos")]
fn build_query_command() -> Option<Command> {
    let mut cmd = Command::new("osascript");
    cmd.args([
        "-e",
        "tell application \"System Events\" to get name of first application process whose frontmost is true",
    ]);
    Some(cmd)
}

#[cfg(target_os = "linux")]
fn build_query_command() -> Option<Command> {
    // xdotool only covers X11; on Wayland the query degrades to None and
    // attribution falls back to content heuristics.
    if which::which("xdotool").is_err() {
        return None;
    }
    let mut cmd = Command::new("xdotool");
    cmd.args(["getactivewindow", "getwindowclassname"]);
    Some(cmd)
}

#[cfg(target_os = "windows")]
fn build_query_command() -> Option<Command> {
    let mut cmd = Command::new("powershell");
    cmd.args([
        "-NoProfile",
        "-Command",
        "Get-Process | Where-Object { $_.MainWindowHandle -eq (Add-Type -MemberDefinition '[DllImport(\"user32.dll\")] public static extern IntPtr GetForegroundWindow();' -Name U32 -PassThru)::GetForegroundWindow() } | Select-Object -First 1 -ExpandProperty ProcessName",
    ]);
    Some(cmd)
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn build_query_command() -> Option<Command> {
    None
}

/// Run a helper command, waiting at most `timeout` for its output.
///
/// The wait happens on a throwaway thread; on timeout the thread is
/// abandoned with its child and the caller moves on.
fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Option<String> {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let output = cmd.output();
        let _ = tx.send(output);
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(output)) if output.status.success() => {
            let label = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if label.is_empty() {
                None
            } else {
                Some(label)
            }
        }
        Ok(Ok(output)) => {
            debug!(
                stderr = %String::from_utf8_lossy(&output.stderr),
                "Foreground query helper exited non-zero"
            );
            None
        }
        Ok(Err(e)) => {
            debug!(error = %e, "Failed to spawn foreground query helper");
            None
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "Foreground query timed out");
            None
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => None,
    }
}

/// Deterministic stand-in used by tracker and detector tests.
#[cfg(test)]
pub struct FakeForegroundQuery {
    pub label: Option<String>,
}

#[cfg(test)]
impl ForegroundQuery for FakeForegroundQuery {
    fn query(&self, _timeout: Duration) -> Option<String> {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_query_returns_label() {
        let query = FakeForegroundQuery {
            label: Some("Terminal".to_string()),
        };
        assert_eq!(query.query(Duration::from_millis(1)), Some("Terminal".to_string()));
    }

    #[test]
    fn test_run_with_timeout_abandons_hung_command() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let start = std::time::Instant::now();
        let result = run_with_timeout(cmd, Duration::from_millis(50));
        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_run_with_timeout_captures_output() {
        let mut cmd = Command::new("echo");
        cmd.arg("Safari");
        let result = run_with_timeout(cmd, Duration::from_secs(2));
        assert_eq!(result, Some("Safari".to_string()));
    }

    #[test]
    fn test_run_with_timeout_missing_binary_is_none() {
        let cmd = Command::new("definitely-not-a-real-binary-xyz");
        assert_eq!(run_with_timeout(cmd, Duration::from_secs(1)), None);
    }

    #[cfg(feature = "system-tests")]
    #[test]
    fn test_system_query_does_not_hang() {
        let query = SystemForegroundQuery;
        // Either answers or times out; must return within the bound
        let _ = query.query(Duration::from_secs(2));
    }
}
