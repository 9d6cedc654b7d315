use anyhow::Result;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run the userctl binary with `--config <config>` and colors disabled
pub fn run_userctl(config: &Path, args: &[&str], stdin: Option<&str>) -> Result<CommandOutput> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_userctl"));
    cmd.arg("--no-color")
        .arg("--config")
        .arg(config)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    if let Some(mut pipe) = child.stdin.take() {
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes())?;
        }
    }
    let output = child.wait_with_output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
