//! Action identifiers decoded from request paths

use std::fmt;

use crate::error::ControlError;

/// Suffix marking paths handled by the front controller
pub const ACTION_SUFFIX: &str = ".do";

/// Action requested by a `.../<action>.do` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Logon,
    LogonAction,
    Home,
    Unknown(String),
}

impl Action {
    /// Decode the action from a request path.
    ///
    /// The identifier is whatever lies between the last `/` and the last
    /// `.do`, compared case-sensitively and without trimming.
    pub fn from_path(path: &str) -> Result<Self, ControlError> {
        Ok(Self::from_identifier(extract_identifier(path)?))
    }

    pub fn from_identifier(identifier: &str) -> Self {
        match identifier {
            "logon" => Action::Logon,
            "logonAction" => Action::LogonAction,
            "home" => Action::Home,
            other => Action::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Logon => "logon",
            Action::LogonAction => "logonAction",
            Action::Home => "home",
            Action::Unknown(identifier) => identifier,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw identifier between the last `/` and the last [`ACTION_SUFFIX`]
pub fn extract_identifier(path: &str) -> Result<&str, ControlError> {
    let start = path.rfind('/').map_or(0, |i| i + 1);
    let end = path
        .rfind(ACTION_SUFFIX)
        .filter(|&end| end >= start)
        .ok_or_else(|| ControlError::MalformedActionPath(path.to_string()))?;

    Ok(&path[start..end])
}
