use anyhow::Result;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory holding stub native tools and a config pointing at them
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write an executable shell script stub
    pub fn stub(&self, name: &str, body: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}"))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    /// A stub that records its arguments and stdin to `<name>.log`
    pub fn recording_stub(&self, name: &str, exit_code: i32) -> Result<PathBuf> {
        let log = self.path().join(format!("{name}.log"));
        self.stub(
            name,
            &format!(
                "echo \"args: $*\" >> '{log}'\ncat >> '{log}'\nexit {exit_code}\n",
                log = log.display()
            ),
        )
    }

    pub fn log(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(format!("{name}.log"))).unwrap_or_default()
    }

    /// Write a config.toml whose `[unix]` table points at the given tools
    pub fn write_config(&self, extra: &str, tools: &[(&str, &Path)]) -> Result<PathBuf> {
        let mut contents = format!("{extra}\n[unix]\n");
        for (key, path) in tools {
            contents.push_str(&format!("{key} = \"{}\"\n", path.display()));
        }
        let path = self.path().join("config.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Config with recording stubs for every unix tool and the given getent output
    pub fn default_stubs(&self, passwd_db: &str) -> Result<PathBuf> {
        let useradd = self.recording_stub("useradd", 0)?;
        let userdel = self.recording_stub("userdel", 0)?;
        let passwd = self.recording_stub("passwd", 0)?;
        let db = self.path().join("passwd.db");
        fs::write(&db, passwd_db)?;
        let getent = self.stub("getent", &format!("cat '{}'\n", db.display()))?;
        self.write_config(
            "",
            &[
                ("useradd", &useradd),
                ("userdel", &userdel),
                ("passwd", &passwd),
                ("getent", &getent),
            ],
        )
    }
}
