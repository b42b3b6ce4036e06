//! Menu options, commands and results.

use std::fmt;
use std::path::PathBuf;

use crate::broadcast::ExportFormat;

/// Entries of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    /// Fetch the admins of a single group.
    FetchGroup,

    /// Fetch every group listed in a file.
    LoadGroups,

    /// Message every admin of the current group.
    SendMessage,

    /// Export the admins as txt, csv or json.
    Export,

    /// Save the admins as text under a chosen name.
    Save,

    /// Forget the current group. Only offered while one is loaded.
    LeaveGroup,

    /// Quit the tool.
    Exit,
}

impl MenuOption {
    /// Parses a menu selection by number or name.
    ///
    /// `has_group` controls whether [`MenuOption::LeaveGroup`] is selectable.
    #[must_use]
    pub fn parse(input: &str, has_group: bool) -> Option<Self> {
        let option = match input.trim().to_lowercase().as_str() {
            "1" | "fetch" | "f" => Self::FetchGroup,
            "2" | "load" | "batch" => Self::LoadGroups,
            "3" | "send" | "message" => Self::SendMessage,
            "4" | "export" => Self::Export,
            "5" | "save" => Self::Save,
            "6" | "leave" | "clear" => Self::LeaveGroup,
            "0" | "exit" | "quit" | "q" => Self::Exit,
            _ => return None,
        };

        (option != Self::LeaveGroup || has_group).then_some(option)
    }

    /// Options shown for the current state, in display order.
    #[must_use]
    pub fn available(has_group: bool) -> Vec<Self> {
        let mut options = vec![
            Self::FetchGroup,
            Self::LoadGroups,
            Self::SendMessage,
            Self::Export,
            Self::Save,
        ];
        if has_group {
            options.push(Self::LeaveGroup);
        }
        options.push(Self::Exit);
        options
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::FetchGroup => "1",
            Self::LoadGroups => "2",
            Self::SendMessage => "3",
            Self::Export => "4",
            Self::Save => "5",
            Self::LeaveGroup => "6",
            Self::Exit => "0",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FetchGroup => "Fetch group admins (single group)",
            Self::LoadGroups => "Load groups from file",
            Self::SendMessage => "Send message to admins",
            Self::Export => "Export admin data",
            Self::Save => "Save admin list to file",
            Self::LeaveGroup => "Exit from current group",
            Self::Exit => "Exit",
        }
    }
}

impl fmt::Display for MenuOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.key(), self.label())
    }
}

/// A fully specified action ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    FetchGroup(String),
    LoadGroups(PathBuf),
    SendMessage(String),
    Export(ExportFormat),
    Save(PathBuf),
    LeaveGroup,
}

impl fmt::Display for MenuCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchGroup(group) => write!(f, "fetch {group}"),
            Self::LoadGroups(path) => write!(f, "load {}", path.display()),
            Self::SendMessage(_) => write!(f, "send"),
            Self::Export(format) => write!(f, "export {format}"),
            Self::Save(path) => write!(f, "save {}", path.display()),
            Self::LeaveGroup => write!(f, "leave"),
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
