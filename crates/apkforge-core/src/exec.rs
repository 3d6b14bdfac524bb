//! Subprocess facility shared by the provisioner, builder, and deployer.
//!
//! External tools are described by a [`ToolInvocation`] and executed through
//! the [`ToolRunner`] capability interface. Production code uses
//! [`ProcessRunner`], which blocks on the child process; tests substitute a
//! recording fake to assert which tools ran, with what arguments, in what
//! order.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::types::ForgeError;

/// One external tool invocation: program, arguments, working directory,
/// environment overlay, and an optional stdin payload.
#[derive(Debug, Clone, Default)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Variables merged over the inherited environment for this child only.
    pub env: Vec<(String, String)>,
    pub stdin: Option<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Command-line rendering used in error messages and verbose echo.
    pub fn display(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

/// Captured output of a completed tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Stdout and stderr joined for diagnostics, trimmed of trailing noise.
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.trim_end().to_string();
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(stderr);
        }
        combined
    }
}

/// Capability interface over subprocess execution.
///
/// Implementations run the invocation to completion. A non-zero exit is an
/// error carrying the rendered command line and the captured output.
pub trait ToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ForgeError>;
}

/// Merges an environment overlay over a base environment, returning the new
/// mapping. Overlay entries win; the base is never mutated.
pub fn overlay_env<I>(base: I, overlay: &[(String, String)]) -> BTreeMap<OsString, OsString>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut merged: BTreeMap<OsString, OsString> = base.into_iter().collect();
    for (key, value) in overlay {
        merged.insert(OsString::from(key), OsString::from(value));
    }
    merged
}

/// Blocking runner over `std::process`.
///
/// There is no cancellation once the child has started; invocations run to
/// their own completion.
pub struct ProcessRunner {
    verbose: bool,
}

impl ProcessRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ForgeError> {
        if self.verbose {
            println!("  running: {}", invocation.display());
        }

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }
        command.env_clear();
        command.envs(overlay_env(std::env::vars_os(), &invocation.env));
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        command.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = command.spawn().map_err(|e| ForgeError::Tool {
            command: invocation.display(),
            output: format!("failed to start: {e}"),
        })?;

        if let Some(input) = &invocation.stdin {
            if let Some(mut pipe) = child.stdin.take() {
                // The child may stop reading before the payload is spent
                // (e.g. once every license prompt has been answered); a
                // broken pipe here is not a failure.
                let _ = pipe.write_all(input.as_bytes());
            }
        }

        let raw = child.wait_with_output().map_err(|e| ForgeError::Tool {
            command: invocation.display(),
            output: format!("failed to collect output: {e}"),
        })?;

        let output = ToolOutput {
            stdout: String::from_utf8_lossy(&raw.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&raw.stderr).into_owned(),
        };

        if !raw.status.success() {
            let mut detail = output.combined();
            if detail.is_empty() {
                detail = format!("exited with {}", raw.status);
            }
            return Err(ForgeError::Tool {
                command: invocation.display(),
                output: detail,
            });
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_wins_over_base() {
        let base = vec![
            (OsString::from("PATH"), OsString::from("/usr/bin")),
            (OsString::from("HOME"), OsString::from("/home/dev")),
        ];
        let overlay = vec![("PATH".to_string(), "/sdk/bin".to_string())];
        let merged = overlay_env(base, &overlay);
        assert_eq!(merged[&OsString::from("PATH")], OsString::from("/sdk/bin"));
        assert_eq!(merged[&OsString::from("HOME")], OsString::from("/home/dev"));
    }

    #[test]
    fn overlay_adds_missing_keys() {
        let merged = overlay_env(
            Vec::new(),
            &[("ANDROID_SDK_ROOT".to_string(), "/sdk".to_string())],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[&OsString::from("ANDROID_SDK_ROOT")],
            OsString::from("/sdk")
        );
    }

    #[test]
    fn invocation_display_includes_args() {
        let invocation = ToolInvocation::new("/sdk/platform-tools/adb")
            .arg("-s")
            .arg("emulator-5554")
            .arg("install");
        assert_eq!(
            invocation.display(),
            "/sdk/platform-tools/adb -s emulator-5554 install"
        );
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_captures_stdout() {
        let runner = ProcessRunner::new(false);
        let output = runner
            .run(&ToolInvocation::new("/bin/sh").args(["-c", "echo out; echo err >&2"]))
            .unwrap();
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_merges_env_overlay() {
        let runner = ProcessRunner::new(false);
        let output = runner
            .run(
                &ToolInvocation::new("/bin/sh")
                    .args(["-c", "printf '%s' \"$FORGE_TEST_VAR\""])
                    .env("FORGE_TEST_VAR", "overlaid"),
            )
            .unwrap();
        assert_eq!(output.stdout, "overlaid");
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_reports_nonzero_exit_with_output() {
        let runner = ProcessRunner::new(false);
        let err = runner
            .run(&ToolInvocation::new("/bin/sh").args(["-c", "echo broken >&2; exit 3"]))
            .unwrap_err();
        match err {
            ForgeError::Tool { command, output } => {
                assert!(command.starts_with("/bin/sh"));
                assert!(output.contains("broken"));
            }
            other => panic!("expected Tool error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_feeds_stdin() {
        let runner = ProcessRunner::new(false);
        let output = runner
            .run(&ToolInvocation::new("/bin/cat").stdin("y\ny\n"))
            .unwrap();
        assert_eq!(output.stdout, "y\ny\n");
    }
}
