// crates/dockgate-server/src/commands.rs
// ============================================================================
// Module: Command Parsing
// Description: Closed command grammar for operator text.
// Purpose: Turn prefixed chat lines into typed commands.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Operator text is parsed into the closed [`Command`] enum; anything that
//! does not match the grammar yields `None` and is ignored silently.
//!
//! Grammar (prefix `!` by default):
//! - `start|stop|restart|status [target]`
//! - `announce [target] <message>` (target disambiguated by the router)
//! - `perm list`, `perm add <action> <role...>`, `perm remove <action> <role...>`
//!
//! Role names are rest-of-line and may contain spaces.

// ============================================================================
// SECTION: Types
// ============================================================================

/// Permission management subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermCommand {
    /// Show the subcommand help.
    Help,
    /// List every action with its roles.
    List,
    /// Grant `role` for `action`.
    Add {
        /// Action name as typed.
        action: String,
        /// Role name as typed.
        role: String,
    },
    /// Revoke `role` for `action`.
    Remove {
        /// Action name as typed.
        action: String,
        /// Role name as typed.
        role: String,
    },
}

/// Parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a container.
    Start {
        /// Optional raw target.
        target: Option<String>,
    },
    /// Stop a container after the countdown.
    Stop {
        /// Optional raw target.
        target: Option<String>,
    },
    /// Restart a container after the countdown.
    Restart {
        /// Optional raw target.
        target: Option<String>,
    },
    /// Report a container's state.
    Status {
        /// Optional raw target.
        target: Option<String>,
    },
    /// Broadcast a message inside a container.
    Announce {
        /// Everything after the command word.
        text: String,
    },
    /// Permission management.
    Perm(PermCommand),
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses `text` using `prefix`; returns `None` for anything unrecognized.
#[must_use]
pub fn parse_command(prefix: &str, text: &str) -> Option<Command> {
    let body = text.trim().strip_prefix(prefix)?;
    let (name, rest) = split_word(body);
    let target = || split_word(rest).0.map(str::to_string);
    match name? {
        "start" => Some(Command::Start {
            target: target(),
        }),
        "stop" => Some(Command::Stop {
            target: target(),
        }),
        "restart" => Some(Command::Restart {
            target: target(),
        }),
        "status" => Some(Command::Status {
            target: target(),
        }),
        "announce" => Some(Command::Announce {
            text: rest.to_string(),
        }),
        "perm" => Some(Command::Perm(parse_perm(rest))),
        _ => None,
    }
}

/// Parses the `perm` subcommand.
fn parse_perm(rest: &str) -> PermCommand {
    let (sub, rest) = split_word(rest);
    let (action, role) = split_word(rest);
    match (sub, action) {
        (Some("list"), _) => PermCommand::List,
        (Some("add"), Some(action)) if !role.is_empty() => PermCommand::Add {
            action: action.to_string(),
            role: role.to_string(),
        },
        (Some("remove"), Some(action)) if !role.is_empty() => PermCommand::Remove {
            action: action.to_string(),
            role: role.to_string(),
        },
        _ => PermCommand::Help,
    }
}

/// Splits off the first whitespace-delimited word; the rest is trimmed.
pub(crate) fn split_word(text: &str) -> (Option<&str>, &str) {
    let text = text.trim_start();
    if text.is_empty() {
        return (None, "");
    }
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (Some(word), rest.trim()),
        None => (Some(text), ""),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Command;
    use super::PermCommand;
    use super::parse_command;

    #[test]
    fn lifecycle_commands_take_an_optional_target() {
        assert_eq!(
            parse_command("!", "!start"),
            Some(Command::Start {
                target: None
            })
        );
        assert_eq!(
            parse_command("!", "  !stop game1 extra words"),
            Some(Command::Stop {
                target: Some("game1".to_string())
            })
        );
        assert_eq!(
            parse_command("!", "!status\tgame2"),
            Some(Command::Status {
                target: Some("game2".to_string())
            })
        );
    }

    #[test]
    fn unknown_or_unprefixed_text_is_ignored() {
        assert_eq!(parse_command("!", "start game1"), None);
        assert_eq!(parse_command("!", "!shutdown"), None);
        assert_eq!(parse_command("!", "!"), None);
        assert_eq!(parse_command("!", "!Start"), None);
    }

    #[test]
    fn custom_prefix_is_honoured() {
        assert_eq!(
            parse_command("dg:", "dg:restart"),
            Some(Command::Restart {
                target: None
            })
        );
        assert_eq!(parse_command("dg:", "!restart"), None);
    }

    #[test]
    fn announce_keeps_the_whole_remainder() {
        assert_eq!(
            parse_command("!", "!announce game1 Restart in 5, be ready!"),
            Some(Command::Announce {
                text: "game1 Restart in 5, be ready!".to_string()
            })
        );
    }

    #[test]
    fn perm_roles_are_rest_of_line() {
        assert_eq!(
            parse_command("!", "!perm add stop Server Moderators"),
            Some(Command::Perm(PermCommand::Add {
                action: "stop".to_string(),
                role: "Server Moderators".to_string(),
            }))
        );
        assert_eq!(
            parse_command("!", "!perm remove start Mod"),
            Some(Command::Perm(PermCommand::Remove {
                action: "start".to_string(),
                role: "Mod".to_string(),
            }))
        );
        assert_eq!(parse_command("!", "!perm list"), Some(Command::Perm(PermCommand::List)));
    }

    #[test]
    fn incomplete_perm_shows_help() {
        assert_eq!(parse_command("!", "!perm"), Some(Command::Perm(PermCommand::Help)));
        assert_eq!(parse_command("!", "!perm add stop"), Some(Command::Perm(PermCommand::Help)));
        assert_eq!(parse_command("!", "!perm grant x y"), Some(Command::Perm(PermCommand::Help)));
    }
}
