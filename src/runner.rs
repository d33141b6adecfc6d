//! Runs shell commands for the assistants and reports the result

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;

use crate::console::Console;

/// Per-stream capture ceiling
pub const DEFAULT_OUTPUT_LIMIT: usize = 8 * 1024 * 1024;

/// A command whose successful run still counts as failed when its stdout
/// contains `needle` (case-sensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureMarker {
    pub label: &'static str,
    pub needle: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Spawn(String),
    Exit(Option<i32>),
    Marker(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed(Failure),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }
}

#[derive(Debug, Clone)]
pub struct CommandRunner {
    markers: Vec<FailureMarker>,
    output_limit: usize,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            output_limit: DEFAULT_OUTPUT_LIMIT,
        }
    }
}

fn shell_command(command: &str) -> Command {
    #[cfg(target_os = "windows")]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(target_os = "windows"))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Read up to `limit` bytes, then drain the rest so the child never blocks.
///
/// The flag is set when output was cut short, either by the limit or by a
/// failed read.
fn capture<R: Read>(stream: Option<R>, limit: usize) -> (String, bool) {
    let Some(mut stream) = stream else {
        return (String::new(), false);
    };
    let mut buffer = Vec::new();
    if let Err(e) = stream.by_ref().take(limit as u64).read_to_end(&mut buffer) {
        log::warn!("Reading command output failed after {} bytes: {}", buffer.len(), e);
        return (String::from_utf8_lossy(&buffer).into_owned(), true);
    }
    let truncated = match io::copy(&mut stream, &mut io::sink()) {
        Ok(rest) => rest > 0,
        Err(e) => {
            log::warn!("Draining command output failed: {}", e);
            true
        }
    };
    (String::from_utf8_lossy(&buffer).into_owned(), truncated)
}

impl CommandRunner {
    pub fn new(markers: Vec<FailureMarker>) -> Self {
        Self {
            markers,
            ..Self::default()
        }
    }

    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }

    /// Run through the platform shell and capture both streams.
    pub fn execute(&self, command: &str) -> io::Result<CommandOutput> {
        log::debug!("Spawning: {}", command);
        let mut child = shell_command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.output_limit;

        let ((stdout, out_truncated), (stderr, err_truncated)) = thread::scope(|scope| {
            let out = scope.spawn(move || capture(stdout, limit));
            let err = scope.spawn(move || capture(stderr, limit));
            (
                out.join().unwrap_or_default(),
                err.join().unwrap_or_default(),
            )
        });

        let status = child.wait()?;
        log::debug!("'{}' exited with {:?}", command, status.code());

        Ok(CommandOutput {
            success: status.success(),
            exit_code: status.code(),
            stdout,
            stderr,
            truncated: out_truncated || err_truncated,
        })
    }

    /// Outcome of a finished command.
    pub fn classify(&self, label: &str, output: &CommandOutput) -> RunOutcome {
        if !output.success {
            return RunOutcome::Failed(Failure::Exit(output.exit_code));
        }
        match self
            .markers
            .iter()
            .find(|m| m.label == label && output.stdout.contains(m.needle))
        {
            Some(marker) => RunOutcome::Failed(Failure::Marker(marker.needle)),
            None => RunOutcome::Succeeded,
        }
    }

    fn marker_message(&self, label: &str, needle: &str) -> Option<&'static str> {
        self.markers
            .iter()
            .find(|m| m.label == label && m.needle == needle)
            .map(|m| m.message)
    }

    /// Run `command`, echo its output and print the verdict for `label`.
    pub fn run<O: Write, E: Write>(&self, command: &str, label: &str, console: &mut Console<O, E>) -> RunOutcome {
        console.info(&format!("Running: {}", command));

        let output = match self.execute(command) {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Could not start '{}': {}", command, e);
                console.fail(&format!("{} failed. Details below:", label));
                console.echo_err(&e.to_string());
                return RunOutcome::Failed(Failure::Spawn(e.to_string()));
            }
        };

        if output.truncated {
            console.warn(&format!("{} output truncated at {} bytes per stream", label, self.output_limit));
        }

        let outcome = self.classify(label, &output);
        match &outcome {
            RunOutcome::Failed(Failure::Exit(code)) => {
                console.fail(&format!("{} failed. Details below:", label));
                if output.stderr.is_empty() {
                    let reason = match code {
                        Some(code) => format!("exit code {}", code),
                        None => "terminated by signal".to_string(),
                    };
                    console.echo_err(&format!("Command failed: {} ({})", command, reason));
                } else {
                    console.echo_err(&output.stderr);
                }
            }
            RunOutcome::Failed(Failure::Marker(needle)) => {
                self.echo_streams(&output, console);
                let message = self.marker_message(label, needle).unwrap_or("Run reported errors.");
                console.fail(message);
            }
            RunOutcome::Failed(Failure::Spawn(_)) => {}
            RunOutcome::Succeeded => {
                self.echo_streams(&output, console);
                console.ok(&format!(
                    "{} completed. If you see warnings or errors above, address them.",
                    label
                ));
            }
        }
        outcome
    }

    fn echo_streams<O: Write, E: Write>(&self, output: &CommandOutput, console: &mut Console<O, E>) {
        if !output.stdout.is_empty() {
            console.echo(&output.stdout);
        }
        if !output.stderr.is_empty() {
            console.echo_err(&output.stderr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOY_ERROR: FailureMarker = FailureMarker {
        label: "deploy",
        needle: "error",
        message: "Deployment failed. Fix all errors before retrying.",
    };

    fn ok_output(stdout: &str) -> CommandOutput {
        CommandOutput {
            success: true,
            exit_code: Some(0),
            stdout: stdout.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_marker_only_for_its_label() {
        let runner = CommandRunner::new(vec![DEPLOY_ERROR]);
        let output = ok_output("built with 1 error in main.ts");
        assert_eq!(runner.classify("deploy", &output), RunOutcome::Failed(Failure::Marker("error")));
        assert_eq!(runner.classify("git-status", &output), RunOutcome::Succeeded);
    }

    #[test]
    fn test_classify_marker_is_case_sensitive() {
        let runner = CommandRunner::new(vec![DEPLOY_ERROR]);
        assert!(runner.classify("deploy", &ok_output("ERROR budget ok")).is_success());
        assert!(!runner.classify("deploy", &ok_output("no_errors_found")).is_success());
    }

    #[test]
    fn test_classify_exit_status_wins() {
        let runner = CommandRunner::new(vec![DEPLOY_ERROR]);
        let output = CommandOutput {
            success: false,
            exit_code: Some(2),
            ..Default::default()
        };
        assert_eq!(runner.classify("deploy", &output), RunOutcome::Failed(Failure::Exit(Some(2))));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_deploy_with_error_text_fails_despite_zero_exit() {
        let runner = CommandRunner::new(vec![DEPLOY_ERROR]);
        let mut console = Console::buffered();
        let outcome = runner.run("printf 'compiled with error\\n'; exit 0", "deploy", &mut console);

        assert_eq!(outcome, RunOutcome::Failed(Failure::Marker("error")));
        assert!(console.out_text().contains("[INFO] Running: printf"));
        assert!(console.out_text().contains("compiled with error"));
        assert!(console.err_text().contains("[FAIL] Deployment failed."));
        assert!(!console.out_text().contains("[OK]"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_success_echoes_both_streams() {
        let runner = CommandRunner::default();
        let mut console = Console::buffered();
        let outcome = runner.run("echo out; echo warn 1>&2", "lint", &mut console);

        assert!(outcome.is_success());
        assert!(console.out_text().contains("out\n"));
        assert!(console.err_text().contains("warn\n"));
        assert!(console.out_text().contains("[OK] lint completed."));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_nonzero_exit_reports_stderr() {
        let runner = CommandRunner::default();
        let mut console = Console::buffered();
        let outcome = runner.run("echo visible; echo broken 1>&2; exit 3", "test", &mut console);

        assert_eq!(outcome, RunOutcome::Failed(Failure::Exit(Some(3))));
        assert!(console.err_text().contains("[FAIL] test failed. Details below:"));
        assert!(console.err_text().contains("broken"));
        assert!(!console.out_text().contains("visible"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_nonzero_exit_without_stderr_describes_exit() {
        let runner = CommandRunner::default();
        let mut console = Console::buffered();
        runner.run("exit 7", "git-status", &mut console);
        assert!(console.err_text().contains("Command failed: exit 7 (exit code 7)"));
    }

    struct BrokenPipe {
        sent: bool,
    }

    impl Read for BrokenPipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"part");
            Ok(4)
        }
    }

    #[test]
    fn test_capture_read_error_marks_output_truncated() {
        let (text, truncated) = capture(Some(BrokenPipe { sent: false }), 1024);
        assert_eq!(text, "part");
        assert!(truncated);
    }

    #[test]
    fn test_capture_short_stream_is_complete() {
        let (text, truncated) = capture(Some(&b"all of it"[..]), 1024);
        assert_eq!(text, "all of it");
        assert!(!truncated);
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_truncates_large_output() {
        let runner = CommandRunner::default().with_output_limit(16);
        let output = runner.execute("printf '%064d' 0").unwrap();
        assert!(output.success);
        assert!(output.truncated);
        assert_eq!(output.stdout.len(), 16);
    }
}
