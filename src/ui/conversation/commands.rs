use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Show the mood dashboard for this session
    Stats,
    /// List the server-side history for this session
    History,
    /// Dictate a message
    Mic,
    /// Toggle spoken replies
    Mute,
    /// Show help
    Help,
    /// Exit the application
    Bye,
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
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Stats => "show your mood dashboard; /stats <id> for another session",
            SlashCommand::History => "list this session's conversation history; /history <id> for another",
            SlashCommand::Mic => "dictate a message (same as F2)",
            SlashCommand::Mute => "turn spoken replies on or off",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
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

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim_start();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let argument: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(&head).ok().or_else(|| match head.as_str() {
        "q" | "quit" | "exit" => Some(SlashCommand::Bye),
        "dashboard" | "mood" => Some(SlashCommand::Stats),
        "voice" | "dictate" => Some(SlashCommand::Mic),
        "?" | "h" => Some(SlashCommand::Help),
        _ => None,
    })?;

    let argument = if argument.is_empty() {
        None
    } else {
        Some(argument.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n");
    for entry in command_entries() {
        help.push_str(&format!("/{} - {}\n", entry.keyword, entry.description));
    }
    help.push_str("\nKeys: Enter send · F2 dictate · PgUp/PgDn scroll · Esc close dashboard · Ctrl+C quit");
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        let parsed = parse_slash_command("/stats").unwrap();
        assert_eq!(parsed.command, SlashCommand::Stats);
        assert_eq!(parsed.argument(), None);
    }

    #[test]
    fn parses_aliases_and_arguments() {
        assert_eq!(parse_slash_command("/quit").unwrap().command, SlashCommand::Bye);
        let parsed = parse_slash_command("/History  extra words").unwrap();
        assert_eq!(parsed.command, SlashCommand::History);
        assert_eq!(parsed.argument(), Some("extra words"));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert!(parse_slash_command("I feel awful").is_none());
        assert!(parse_slash_command("/").is_none());
        assert!(parse_slash_command("/unknown").is_none());
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for entry in command_entries() {
            assert!(help.contains(&format!("/{}", entry.keyword)));
        }
    }
}
