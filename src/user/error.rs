use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("username is empty")]
    UsernameRequired,

    #[error("password is empty")]
    PasswordRequired,

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {output}")]
    CommandFailed {
        program: String,
        status: String,
        output: String,
    },

    #[error("failed to read output of {program}: {source}")]
    Stream {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode account query output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to {action}: {source}")]
    Operation {
        action: &'static str,
        #[source]
        source: Box<UserError>,
    },

    #[error("user '{username}' was created but setting its password failed: {source}")]
    PasswordAfterCreate {
        username: String,
        #[source]
        source: Box<UserError>,
    },

    #[error("setting the password for '{username}' failed, the account was removed again: {source}")]
    CreateRolledBack {
        username: String,
        #[source]
        source: Box<UserError>,
    },
}

impl UserError {
    /// Wrap an error with the operation that was being attempted
    pub fn during(action: &'static str) -> impl FnOnce(UserError) -> UserError {
        move |source| UserError::Operation {
            action,
            source: Box::new(source),
        }
    }

    /// Stable identifier used for structured output
    pub fn code(&self) -> &'static str {
        match self {
            Self::UsernameRequired => "user.username_required",
            Self::PasswordRequired => "user.password_required",
            Self::Launch { .. } => "user.launch_failed",
            Self::CommandFailed { .. } => "user.command_failed",
            Self::Stream { .. } => "user.stream_failed",
            Self::Decode(_) => "user.decode_failed",
            Self::Operation { source, .. } => source.code(),
            Self::PasswordAfterCreate { .. } => "user.password_after_create",
            Self::CreateRolledBack { .. } => "user.create_rolled_back",
        }
    }

    #[cfg(test)]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UsernameRequired | Self::PasswordRequired)
    }
}
