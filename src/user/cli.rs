use std::io::BufRead;

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Args};

use super::{AccountBackend, UserRecord};
use crate::ui::prelude::*;

#[derive(Args, Debug, Clone, Default)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["list", "create", "delete", "lock", "unlock", "changepasswd"])
))]
pub struct UserArgs {
    /// List all users
    #[arg(long)]
    pub list: bool,
    /// Create user
    #[arg(long)]
    pub create: bool,
    /// Delete user
    #[arg(long)]
    pub delete: bool,
    /// Lock user
    #[arg(long)]
    pub lock: bool,
    /// Unlock user
    #[arg(long)]
    pub unlock: bool,
    /// Change user password
    #[arg(long)]
    pub changepasswd: bool,

    /// Username
    #[arg(long, default_value = "")]
    pub username: String,
    /// User password (visible in the process list, prefer --passwd-stdin)
    #[arg(long, default_value = "", conflicts_with = "passwd_stdin")]
    pub passwd: String,
    /// Read the password from the first line of standard input
    #[arg(long)]
    pub passwd_stdin: bool,

    /// Re-run through sudo first when not already root
    #[arg(long)]
    pub sudo: bool,
}

/// The single operation requested on the command line, validated
#[derive(Debug, PartialEq, Eq)]
pub enum UserOperation {
    List,
    Create { username: String, password: String },
    Delete { username: String },
    Lock { username: String },
    Unlock { username: String },
    ChangePassword { username: String, password: String },
}

impl UserArgs {
    /// Every action except `--list` changes system state
    pub fn is_mutating(&self) -> bool {
        !self.list
    }

    fn check_fields(&self, has_password: bool) -> Result<()> {
        if self.list {
            return Ok(());
        }
        let needs_password = self.create || self.changepasswd;
        if needs_password && (self.username.is_empty() || !has_password) {
            bail!("username or password is empty");
        }
        if self.username.is_empty() {
            bail!("username is empty");
        }
        Ok(())
    }

    /// Checks that do not need the password itself. Run before re-executing
    /// through sudo; a `--passwd-stdin` password is only read afterwards.
    pub fn precheck(&self) -> Result<()> {
        self.check_fields(self.passwd_stdin || !self.passwd.is_empty())
    }

    /// Resolve the switches into one operation, rejecting missing fields.
    /// `password` is the already resolved password (flag or stdin).
    pub fn operation(&self, password: String) -> Result<UserOperation> {
        self.check_fields(!password.is_empty())?;
        if self.list {
            return Ok(UserOperation::List);
        }

        let username = self.username.clone();

        let op = if self.create {
            UserOperation::Create { username, password }
        } else if self.delete {
            UserOperation::Delete { username }
        } else if self.lock {
            UserOperation::Lock { username }
        } else if self.unlock {
            UserOperation::Unlock { username }
        } else if self.changepasswd {
            UserOperation::ChangePassword { username, password }
        } else {
            bail!("no user action given, pass one of --list, --create, --delete, --lock, --unlock or --changepasswd");
        };
        Ok(op)
    }

    /// Password from `--passwd`, or the first line of `input` with `--passwd-stdin`
    pub fn resolve_password(&self, mut input: impl BufRead) -> Result<String> {
        if !self.passwd_stdin {
            return Ok(self.passwd.clone());
        }
        let mut line = String::new();
        input
            .read_line(&mut line)
            .context("reading password from stdin")?;
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

pub fn handle_user_command(backend: &dyn AccountBackend, op: UserOperation) -> Result<()> {
    emit(
        Level::Debug,
        "user.dispatch",
        &format!("using {} backend", backend.name()),
        None,
    );

    match op {
        UserOperation::List => {
            let users = backend.list()?;
            print_users(&users);
        }
        UserOperation::Create { username, password } => {
            backend.create(&username, &password)?;
            emit(
                Level::Success,
                "user.create",
                &format!("Created user {}", username),
                None,
            );
        }
        UserOperation::Delete { username } => {
            backend.delete(&username)?;
            emit(
                Level::Success,
                "user.delete",
                &format!("Deleted user {}", username),
                None,
            );
        }
        UserOperation::Lock { username } => {
            backend.lock(&username)?;
            emit(
                Level::Success,
                "user.lock",
                &format!("Locked user {}", username),
                None,
            );
        }
        UserOperation::Unlock { username } => {
            backend.unlock(&username)?;
            emit(
                Level::Success,
                "user.unlock",
                &format!("Unlocked user {}", username),
                None,
            );
        }
        UserOperation::ChangePassword { username, password } => {
            backend.change_password(&username, &password)?;
            emit(
                Level::Success,
                "user.changepasswd",
                &format!("Password updated for {}", username),
                None,
            );
        }
    }
    Ok(())
}

/// One `Key : value` line per attribute, delimiter after each record
pub fn render_text(record: &UserRecord) -> Vec<String> {
    record
        .iter()
        .map(|(key, value)| format!("{} : {}", key, value))
        .collect()
}

fn print_users(users: &[UserRecord]) {
    match get_output_format() {
        OutputFormat::Text => {
            for user in users {
                for line in render_text(user) {
                    println!("{}", line);
                }
                separator();
            }
        }
        OutputFormat::Json => {
            for user in users {
                emit(
                    Level::Info,
                    "user.list.record",
                    user.name(),
                    serde_json::to_value(user).ok(),
                );
            }
        }
    }
}
