use super::error::UserError;
use super::invoke::{NativeCommand, PasswordScript};
use super::record::UserRecord;
use super::{AccountBackend, require_password, require_username};
use crate::common::config::UnixTools;
use crate::ui::prelude::*;

/// Attribute names for the seven colon-separated passwd(5) fields, in order
pub const PASSWD_FIELDS: [&str; 7] = ["Name", "Passwd", "UID", "GID", "Desc", "Home", "Shell"];

/// Parse one `getent passwd` line. Missing trailing fields become empty strings.
pub fn parse_passwd_line(line: &str) -> UserRecord {
    let mut parts = line.split(':');
    let mut record = UserRecord::new();
    for field in PASSWD_FIELDS {
        record.set(field, parts.next().unwrap_or_default());
    }
    record
}

/// Backend driving shadow-utils (`useradd`, `userdel`, `passwd`) and `getent`
#[derive(Debug, Clone)]
pub struct UnixBackend {
    tools: UnixTools,
    rollback_partial_create: bool,
}

impl UnixBackend {
    pub fn new(tools: UnixTools, rollback_partial_create: bool) -> Self {
        Self {
            tools,
            rollback_partial_create,
        }
    }

    fn set_password(&self, username: &str, password: &str) -> Result<(), UserError> {
        NativeCommand::new(&self.tools.passwd)
            .arg(username)
            .stdin(PasswordScript::confirm(password))
            .run()
            .map(drop)
    }

    fn remove(&self, username: &str) -> Result<(), UserError> {
        NativeCommand::new(&self.tools.userdel)
            .args(["-r", username])
            .run()
            .map(drop)
    }

    fn handle_partial_create(&self, username: &str, source: UserError) -> UserError {
        let source = Box::new(source);
        if !self.rollback_partial_create {
            return UserError::PasswordAfterCreate {
                username: username.to_string(),
                source,
            };
        }

        match self.remove(username) {
            Ok(()) => UserError::CreateRolledBack {
                username: username.to_string(),
                source,
            },
            Err(rollback) => {
                emit(
                    Level::Warn,
                    "user.create.rollback_failed",
                    &format!("could not remove half-created user '{username}': {rollback}"),
                    None,
                );
                UserError::PasswordAfterCreate {
                    username: username.to_string(),
                    source,
                }
            }
        }
    }
}

impl AccountBackend for UnixBackend {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn list(&self) -> Result<Vec<UserRecord>, UserError> {
        let mut users = Vec::new();
        NativeCommand::new(&self.tools.getent)
            .arg("passwd")
            .stream_lines(|line| {
                if !line.trim().is_empty() {
                    users.push(parse_passwd_line(line));
                }
            })
            .map_err(UserError::during("get user list"))?;
        Ok(users)
    }

    fn create(&self, username: &str, password: &str) -> Result<(), UserError> {
        require_username(username)?;
        require_password(password)?;

        NativeCommand::new(&self.tools.useradd)
            .arg(username)
            .run()
            .map_err(UserError::during("create user"))?;

        self.set_password(username, password)
            .map_err(|e| self.handle_partial_create(username, e))
    }

    fn delete(&self, username: &str) -> Result<(), UserError> {
        require_username(username)?;
        self.remove(username)
            .map_err(UserError::during("delete user"))
    }

    fn lock(&self, username: &str) -> Result<(), UserError> {
        require_username(username)?;
        NativeCommand::new(&self.tools.passwd)
            .args(["-l", username])
            .run()
            .map(drop)
            .map_err(UserError::during("lock user account"))
    }

    fn unlock(&self, username: &str) -> Result<(), UserError> {
        require_username(username)?;
        NativeCommand::new(&self.tools.passwd)
            .args(["-u", username])
            .run()
            .map(drop)
            .map_err(UserError::during("unlock user account"))
    }

    fn change_password(&self, username: &str, password: &str) -> Result<(), UserError> {
        require_username(username)?;
        require_password(password)?;
        self.set_password(username, password)
            .map_err(UserError::during("change password"))
    }
}
