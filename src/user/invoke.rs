//! Synchronous execution of native account tools.
//!
//! Every invocation blocks until the child exits; no timeout is applied. Output
//! from stdout and stderr is merged so native diagnostics end up in errors.

use std::fmt;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use super::error::UserError;
use crate::common::shell::command_line;
use crate::ui::prelude::*;

const MASK: &str = "******";

/// Scripted answers for the interactive `passwd` prompt sequence.
///
/// `passwd <user>` run as root asks for the new password and then for a
/// confirmation. When it additionally asks for the current password, the
/// extra copy answers that prompt. The payload is the password followed by
/// `\n`, [`PasswordScript::COPIES`] times, and only ever travels over stdin.
pub struct PasswordScript(String);

impl PasswordScript {
    pub const COPIES: usize = 3;

    pub fn confirm(password: &str) -> Self {
        Self(format!("{password}\n").repeat(Self::COPIES))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }
}

impl fmt::Debug for PasswordScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordScript({MASK})")
    }
}

enum Arg {
    Plain(String),
    Secret(String),
}

impl Arg {
    fn value(&self) -> &str {
        match self {
            Arg::Plain(v) | Arg::Secret(v) => v,
        }
    }

    fn shown(&self) -> &str {
        match self {
            Arg::Plain(v) => v,
            Arg::Secret(_) => MASK,
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shown())
    }
}

#[derive(Debug)]
pub struct NativeCommand {
    program: String,
    args: Vec<Arg>,
    stdin: Option<PasswordScript>,
}

impl NativeCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|a| Arg::Plain(a.into())));
        self
    }

    /// An argument that is passed through unchanged but masked in logs
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::Secret(arg.into()));
        self
    }

    pub fn stdin(mut self, script: PasswordScript) -> Self {
        self.stdin = Some(script);
        self
    }

    /// Command line with secrets masked
    pub fn display(&self) -> String {
        command_line(&self.program, self.args.iter().map(Arg::shown))
    }

    fn raw_args(&self) -> Vec<String> {
        self.args.iter().map(|a| a.value().to_string()).collect()
    }

    fn resolve(&self) -> Result<PathBuf, UserError> {
        which::which(&self.program).map_err(|e| UserError::Launch {
            program: self.program.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, e),
        })
    }

    fn log_start(&self) {
        emit(
            Level::Debug,
            "user.invoke",
            &format!("running {}", self.display()),
            None,
        );
    }

    /// Run to completion and return the merged output
    pub fn run(self) -> Result<String, UserError> {
        let exe = self.resolve()?;
        self.log_start();

        let expression = duct::cmd(exe, self.raw_args())
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked();
        let expression = match self.stdin {
            Some(script) => expression.stdin_bytes(script.into_bytes()),
            None => expression.stdin_null(),
        };

        let output = expression.run().map_err(|source| UserError::Launch {
            program: self.program.clone(),
            source,
        })?;
        let text = String::from_utf8_lossy(&output.stdout).trim_end().to_string();

        if !output.status.success() {
            return Err(UserError::CommandFailed {
                program: self.program,
                status: output.status.to_string(),
                output: text,
            });
        }

        if !text.is_empty() {
            emit(
                Level::Debug,
                "user.invoke.output",
                &format!("{}: {}", self.program, text),
                None,
            );
        }
        Ok(text)
    }

    /// Feed stdout to `on_line` one line at a time without buffering the whole
    /// output. Stderr is captured separately so it cannot pollute the stream;
    /// a non-zero exit turns it into the error text.
    pub fn stream_lines<F>(self, mut on_line: F) -> Result<(), UserError>
    where
        F: FnMut(&str),
    {
        let exe = self.resolve()?;
        self.log_start();

        let handle = duct::cmd(exe, self.raw_args())
            .stdin_null()
            .stderr_capture()
            .unchecked()
            .reader()
            .map_err(|source| UserError::Launch {
                program: self.program.clone(),
                source,
            })?;

        // Account data may hold non-UTF-8 bytes (Latin-1 GECOS, OEM code pages)
        let mut reader = BufReader::new(handle);
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|source| UserError::Stream {
                    program: self.program.clone(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            let text = String::from_utf8_lossy(&line);
            on_line(text.trim_end_matches(['\n', '\r']));
        }

        let finished = reader.get_ref().try_wait().map_err(|source| UserError::Stream {
            program: self.program.clone(),
            source,
        })?;
        match finished {
            Some(output) if !output.status.success() => Err(UserError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                output: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            }),
            Some(_) => Ok(()),
            None => Err(UserError::Stream {
                program: self.program.clone(),
                source: io::Error::other("output ended before the process exited"),
            }),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::user::testutil::StubDir;
    use serial_test::serial;

    #[test]
    fn display_masks_secret_arguments() {
        let cmd = NativeCommand::new("net")
            .args(["user", "alice"])
            .secret_arg("hunter2")
            .arg("/ADD");
        assert_eq!(cmd.display(), "net user alice ****** /ADD");
        assert!(!format!("{:?}", cmd).contains("hunter2"));
        assert!(!format!("{:?}", PasswordScript::confirm("hunter2")).contains("hunter2"));
    }

    #[test]
    fn password_script_repeats_each_copy_on_its_own_line() {
        let bytes = PasswordScript::confirm("s3cret").into_bytes();
        assert_eq!(bytes, b"s3cret\ns3cret\ns3cret\n");
    }

    #[test]
    #[serial]
    fn run_delivers_stdin_and_merges_stderr() {
        let stubs = StubDir::new();
        let tool = stubs.script("echo-stdin", "cat\necho 'done' >&2\n");
        let out = NativeCommand::new(tool)
            .stdin(PasswordScript::confirm("pw"))
            .run()
            .unwrap();
        assert_eq!(out, "pw\npw\npw\ndone");
    }

    #[test]
    #[serial]
    fn run_reports_failure_with_output() {
        let stubs = StubDir::new();
        let tool = stubs.script("fail", "echo 'fail: permission denied' >&2\nexit 3\n");
        let err = NativeCommand::new(tool).run().unwrap_err();
        match err {
            UserError::CommandFailed { status, output, .. } => {
                assert!(status.contains('3'), "unexpected status {status}");
                assert_eq!(output, "fail: permission denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn missing_program_is_a_launch_error() {
        let err = NativeCommand::new("/nonexistent/userctl-missing-tool")
            .run()
            .unwrap_err();
        assert!(matches!(err, UserError::Launch { .. }), "got {err:?}");
    }

    #[test]
    #[serial]
    fn stream_lines_yields_each_line() {
        let stubs = StubDir::new();
        let tool = stubs.script("lines", "printf 'a\\nb\\r\\nc'\n");
        let mut seen = Vec::new();
        NativeCommand::new(tool)
            .stream_lines(|l| seen.push(l.to_string()))
            .unwrap();
        assert_eq!(seen, ["a", "b", "c"]);
    }

    #[test]
    #[serial]
    fn stream_lines_tolerates_non_utf8_bytes() {
        let stubs = StubDir::new();
        let tool = stubs.script("latin1", "printf 'Jos\\351\\nnext\\n'\n");
        let mut seen = Vec::new();
        NativeCommand::new(tool)
            .stream_lines(|l| seen.push(l.to_string()))
            .unwrap();
        assert_eq!(seen, ["Jos\u{FFFD}", "next"]);
    }

    #[test]
    #[serial]
    fn stream_lines_fails_on_nonzero_exit_with_stderr() {
        let stubs = StubDir::new();
        let tool = stubs.script("broken", "echo partial\necho 'db unavailable' >&2\nexit 2\n");
        let err = NativeCommand::new(tool).stream_lines(|_| {}).unwrap_err();
        assert!(err.to_string().contains("db unavailable"), "got {err}");
    }
}
