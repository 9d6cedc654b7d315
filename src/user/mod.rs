//! Local account management on top of the platform's native tools.

pub mod cli;
pub mod error;
pub mod invoke;
pub mod record;
pub mod unix;
pub mod windows;

#[cfg(all(test, unix))]
pub(crate) mod testutil;

pub use cli::UserArgs;
pub use error::UserError;
pub use record::UserRecord;

use crate::common::config::UserctlConfig;

/// The operations every platform backend provides.
///
/// Mutating operations are one-shot calls to a privileged native tool and
/// return nothing on success. Inputs are validated before anything is launched.
pub trait AccountBackend {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    fn list(&self) -> Result<Vec<UserRecord>, UserError>;

    fn create(&self, username: &str, password: &str) -> Result<(), UserError>;

    fn delete(&self, username: &str) -> Result<(), UserError>;

    fn lock(&self, username: &str) -> Result<(), UserError>;

    fn unlock(&self, username: &str) -> Result<(), UserError>;

    fn change_password(&self, username: &str, password: &str) -> Result<(), UserError>;
}

/// Pick the backend for the operating system we are running on
pub fn backend_for_current_os(config: &UserctlConfig) -> Box<dyn AccountBackend> {
    if cfg!(windows) {
        Box::new(windows::WindowsBackend::new(config.windows.clone()))
    } else {
        Box::new(unix::UnixBackend::new(
            config.unix.clone(),
            config.rollback_partial_create,
        ))
    }
}

pub(crate) fn require_username(username: &str) -> Result<(), UserError> {
    if username.is_empty() {
        return Err(UserError::UsernameRequired);
    }
    Ok(())
}

pub(crate) fn require_password(password: &str) -> Result<(), UserError> {
    if password.is_empty() {
        return Err(UserError::PasswordRequired);
    }
    Ok(())
}
