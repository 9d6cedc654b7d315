use serde::Deserialize;

use super::error::UserError;
use super::invoke::NativeCommand;
use super::record::UserRecord;
use super::{AccountBackend, require_password, require_username};
use crate::common::config::WindowsTools;

/// CIM query listing local and domain accounts as compact JSON.
///
/// `InstallDate` is formatted explicitly because ConvertTo-Json renders
/// DateTime values differently across PowerShell versions.
const ACCOUNT_QUERY: &str = "Get-CimInstance -ClassName Win32_UserAccount | \
    Select-Object AccountType,Caption,Description,Disabled,Domain,FullName,\
    @{Name='InstallDate';Expression={if ($_.InstallDate) { $_.InstallDate.ToString('o') } else { $null }}},\
    LocalAccount,Lockout,Name,SID,SIDType,Status | \
    ConvertTo-Json -Compress";

/// One `Win32_UserAccount` instance as returned by the query
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Win32UserAccount {
    #[serde(rename = "AccountType")]
    account_type: Option<i64>,
    #[serde(rename = "Caption")]
    caption: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Disabled")]
    disabled: Option<bool>,
    #[serde(rename = "Domain")]
    domain: Option<String>,
    #[serde(rename = "FullName")]
    full_name: Option<String>,
    #[serde(rename = "InstallDate")]
    install_date: Option<String>,
    #[serde(rename = "LocalAccount")]
    local_account: Option<bool>,
    #[serde(rename = "Lockout")]
    lockout: Option<bool>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "SID")]
    sid: Option<String>,
    #[serde(rename = "SIDType")]
    sid_type: Option<i64>,
    #[serde(rename = "Status")]
    status: Option<String>,
}

impl From<Win32UserAccount> for UserRecord {
    fn from(account: Win32UserAccount) -> Self {
        UserRecord::new()
            .with("AccountType", account.account_type.unwrap_or_default())
            .with("Caption", account.caption.unwrap_or_default())
            .with("Description", account.description.unwrap_or_default())
            .with("Disabled", account.disabled.unwrap_or_default())
            .with("Domain", account.domain.unwrap_or_default())
            .with("FullName", account.full_name.unwrap_or_default())
            .with("InstallDate", account.install_date.unwrap_or_default())
            .with("LocalAccount", account.local_account.unwrap_or_default())
            .with("Lockout", account.lockout.unwrap_or_default())
            .with("Name", account.name.unwrap_or_default())
            .with("SID", account.sid.unwrap_or_default())
            .with("SIDType", account.sid_type.unwrap_or_default())
            .with("Status", account.status.unwrap_or_default())
    }
}

/// Decode the account query output.
///
/// ConvertTo-Json emits a bare object for a single result and nothing at all
/// for zero results.
pub fn parse_account_query(output: &str) -> Result<Vec<UserRecord>, UserError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let accounts: Vec<Win32UserAccount> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        vec![serde_json::from_str(trimmed)?]
    };

    Ok(accounts.into_iter().map(UserRecord::from).collect())
}

/// Backend driving `net user` and the `Win32_UserAccount` management class
#[derive(Debug, Clone)]
pub struct WindowsBackend {
    tools: WindowsTools,
}

impl WindowsBackend {
    pub fn new(tools: WindowsTools) -> Self {
        Self { tools }
    }

    fn net_user(&self, username: &str) -> NativeCommand {
        NativeCommand::new(&self.tools.net).args(["user", username])
    }
}

impl AccountBackend for WindowsBackend {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn list(&self) -> Result<Vec<UserRecord>, UserError> {
        let mut output = String::new();
        NativeCommand::new(&self.tools.powershell)
            .args(["-NoProfile", "-NonInteractive", "-Command", ACCOUNT_QUERY])
            .stream_lines(|line| {
                output.push_str(line);
                output.push('\n');
            })
            .map_err(UserError::during("get user list"))?;

        parse_account_query(&output).map_err(UserError::during("get user list"))
    }

    fn create(&self, username: &str, password: &str) -> Result<(), UserError> {
        require_username(username)?;
        require_password(password)?;
        self.net_user(username)
            .secret_arg(password)
            .arg("/ADD")
            .run()
            .map(drop)
            .map_err(UserError::during("create user"))
    }

    fn delete(&self, username: &str) -> Result<(), UserError> {
        require_username(username)?;
        self.net_user(username)
            .arg("/delete")
            .run()
            .map(drop)
            .map_err(UserError::during("delete user"))
    }

    fn lock(&self, username: &str) -> Result<(), UserError> {
        require_username(username)?;
        self.net_user(username)
            .arg("/active:no")
            .run()
            .map(drop)
            .map_err(UserError::during("lock user"))
    }

    fn unlock(&self, username: &str) -> Result<(), UserError> {
        require_username(username)?;
        self.net_user(username)
            .arg("/active:yes")
            .run()
            .map(drop)
            .map_err(UserError::during("activate user"))
    }

    fn change_password(&self, username: &str, password: &str) -> Result<(), UserError> {
        require_username(username)?;
        require_password(password)?;
        self.net_user(username)
            .secret_arg(password)
            .run()
            .map(drop)
            .map_err(UserError::during("change user password"))
    }
}
