use anyhow::Result;

use crate::ui::prelude::*;

/// Restart the current process through sudo unless it already runs as root.
///
/// On success this does not return in the unprivileged process: the sudo
/// child takes over with the same arguments.
#[cfg(unix)]
pub fn escalate_if_needed() -> Result<()> {
    use sudo::RunningAs;

    if matches!(sudo::check(), RunningAs::Root) {
        return Ok(());
    }

    emit(
        Level::Info,
        "user.escalate",
        "Root privileges required, restarting through sudo",
        None,
    );
    sudo::escalate_if_needed()
        .map_err(|e| anyhow::anyhow!("Failed to escalate privileges: {}", e))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn escalate_if_needed() -> Result<()> {
    emit(
        Level::Warn,
        "user.escalate",
        "Privilege escalation is not supported on this platform, run from an elevated prompt",
        None,
    );
    Ok(())
}
