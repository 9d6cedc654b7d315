//! Stub native tools for backend tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

pub(crate) struct StubDir {
    dir: TempDir,
}

impl StubDir {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("creating stub directory"),
        }
    }

    pub(crate) fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write an executable `/bin/sh` script and return its absolute path
    pub(crate) fn script(&self, name: &str, body: &str) -> String {
        let path = self.path(name);
        fs::write(&path, format!("#!/bin/sh\n{body}")).expect("writing stub script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("marking stub executable");
        path.to_string_lossy().into_owned()
    }

    /// A stub that appends its arguments and stdin to `<name>.log` and exits with `code`
    pub(crate) fn recording(&self, name: &str, code: i32) -> String {
        let log = self.path(&format!("{name}.log"));
        self.script(
            name,
            &format!(
                "echo \"args: $*\" >> '{log}'\ncat >> '{log}'\nexit {code}\n",
                log = log.display()
            ),
        )
    }

    /// A stub that prints `message` to stderr and exits non-zero
    pub(crate) fn failing(&self, name: &str, message: &str) -> String {
        self.script(name, &format!("echo '{message}' >&2\nexit 1\n"))
    }

    pub(crate) fn log(&self, name: &str) -> String {
        fs::read_to_string(self.path(&format!("{name}.log"))).unwrap_or_default()
    }
}
