use std::str::FromStr;

use crate::events::ConversationRole;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Archive the current conversation and start a new one
    New,
    /// Browse and search archived conversations
    History,
    /// Reopen an archived conversation
    Select,
    /// Change the role attached to submitted messages
    Role,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    pub fn role_target(&self) -> Option<ConversationRole> {
        if self.command != SlashCommand::Role {
            return None;
        }

        let arg = self.argument()?.trim().to_lowercase();
        match arg.as_str() {
            "u" | "me" => Some(ConversationRole::User),
            "a" | "bot" => Some(ConversationRole::Assistant),
            "s" => Some(ConversationRole::System),
            other => ConversationRole::from_str(other).ok(),
        }
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::New => "archive this chat and start a new one",
            SlashCommand::History => "browse past conversations, optionally filtered by name",
            SlashCommand::Select => "reopen a past conversation by id or id prefix",
            SlashCommand::Role => "send as user, assistant or system",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Return all built-in commands in a Vec paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim_start();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let rest: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(&head)
        .ok()
        .or_else(|| match head.as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "n" | "clear" => Some(SlashCommand::New),
            "h" | "hist" => Some(SlashCommand::History),
            "s" | "open" => Some(SlashCommand::Select),
            _ => None,
        })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str("\nAliases: /q for /bye, /n for /new, /h for /history, /s for /select");
    help.push_str("\nUse /role <u|a|s> to switch between user, assistant and system messages.");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_argument() {
        let parsed = parse_slash_command("/history weather  report").unwrap();
        assert_eq!(parsed.command, SlashCommand::History);
        assert_eq!(parsed.argument(), Some("weather report"));
    }

    #[test]
    fn parses_aliases_and_case() {
        assert_eq!(parse_slash_command("/Q").unwrap().command, SlashCommand::Bye);
        assert_eq!(parse_slash_command("/exit").unwrap().command, SlashCommand::Bye);
        assert_eq!(parse_slash_command("  /NEW").unwrap().command, SlashCommand::New);
        assert_eq!(parse_slash_command("/s 1a2b").unwrap().command, SlashCommand::Select);
    }

    #[test]
    fn plain_text_and_unknown_commands_are_not_commands() {
        assert!(parse_slash_command("hello /new").is_none());
        assert!(parse_slash_command("/").is_none());
        assert!(parse_slash_command("/teleport now").is_none());
    }

    #[test]
    fn role_target_accepts_names_and_shorthands() {
        let target = |input: &str| parse_slash_command(input).unwrap().role_target();
        assert_eq!(target("/role assistant"), Some(ConversationRole::Assistant));
        assert_eq!(target("/role S"), Some(ConversationRole::System));
        assert_eq!(target("/role u"), Some(ConversationRole::User));
        assert_eq!(target("/role narrator"), None);
        assert_eq!(target("/role"), None);
        assert_eq!(target("/new assistant"), None);
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for entry in command_entries() {
            assert!(help.contains(&format!("/{}", entry.keyword)));
        }
    }
}
