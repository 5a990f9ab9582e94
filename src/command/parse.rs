//! Bot comment parsing

use crate::stack::Scope;

/// Prefix every bot command starts with
pub const BOT_COMMAND: &str = "/stackbot";

/// Top-level bot command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Squash each selected PR into one commit
    Squash,
    /// Fold the selected PRs into trunk
    Fold,
    /// Show usage
    Help,
}

impl Command {
    /// Scope used when the comment names none
    pub const fn default_scope(self) -> Scope {
        match self {
            Self::Fold => Scope::Down,
            Self::Squash | Self::Help => Scope::Only,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Fold => write!(f, "fold"),
            Self::Help => write!(f, "help"),
        }
    }
}

/// A recognised bot command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Command to run
    pub command: Command,
    /// Explicit scope, if given
    pub scope: Option<Scope>,
}

impl ParsedCommand {
    /// Explicit scope or the command's default
    pub fn scope_or_default(&self) -> Scope {
        self.scope.unwrap_or_else(|| self.command.default_scope())
    }
}

/// Whether a comment is addressed to the bot
pub fn is_bot_command(comment: &str) -> bool {
    comment.trim().starts_with(BOT_COMMAND)
}

/// Parse `/stackbot <command> [scope]`
///
/// Returns `None` for anything that is not exactly a known command with an
/// optional known scope. Trailing words are ignored.
pub fn parse_command(comment: &str) -> Option<ParsedCommand> {
    let mut words = comment.split_whitespace();
    if words.next()? != BOT_COMMAND {
        return None;
    }

    let command = match words.next()? {
        "squash" => Command::Squash,
        "fold" => Command::Fold,
        "help" => Command::Help,
        _ => return None,
    };

    let scope = match words.next() {
        None => None,
        Some(word) => Some(word.parse().ok()?),
    };

    Some(ParsedCommand { command, scope })
}
