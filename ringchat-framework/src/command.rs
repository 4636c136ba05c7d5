//! Interpretation of user input lines into chat commands
//!
//! This layer carries no protocol state; each parsed command maps to exactly
//! one routed message or listener notification in
//! [ChatApp::handle_command](crate::app::ChatApp::handle_command).

/// A parsed user command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Join(String),
    Leave(String),
    Msg { user: String, text: String },
    Send { channel: String, text: String },
    Unknown,
}

impl Command {
    /// Interpret one line of user input. Anything malformed, including a
    /// known keyword with missing arguments, parses to [Command::Unknown].
    pub fn parse(input: &str) -> Self {
        let input = input.trim_end_matches(['\r', '\n']);

        match input {
            "quit" => return Self::Quit,
            "help" => return Self::Help,
            _ => (),
        }

        if let Some(channel) = input.strip_prefix("join ") {
            if !channel.is_empty() {
                return Self::Join(channel.to_owned());
            }
        } else if let Some(channel) = input.strip_prefix("leave ") {
            if !channel.is_empty() {
                return Self::Leave(channel.to_owned());
            }
        } else if let Some(rest) = input.strip_prefix("msg ") {
            if let Some((user, text)) = rest.split_once(' ') {
                if !user.is_empty() {
                    return Self::Msg {
                        user: user.to_owned(),
                        text: text.to_owned(),
                    };
                }
            }
        } else if let Some(rest) = input.strip_prefix("send ") {
            if let Some((channel, text)) = rest.split_once(' ') {
                if !channel.is_empty() {
                    return Self::Send {
                        channel: channel.to_owned(),
                        text: text.to_owned(),
                    };
                }
            }
        }

        Self::Unknown
    }
}

/// Lines printed in response to the `help` command
pub(crate) const HELP_LINES: &[&str] = &[
    "List of commands:",
    "quit - terminates the application",
    "join <channel> - joins the given channel",
    "leave <channel> - leaves the given channel",
    "send <channel> <message> - send the message to the given channel",
    "msg <user> <message> - send the message to the given user",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands_parse() {
        assert_eq!(Command::parse("quit"), Command::Quit);
        assert_eq!(Command::parse("help"), Command::Help);
        assert_eq!(Command::parse("join general"), Command::Join("general".into()));
        assert_eq!(Command::parse("leave general"), Command::Leave("general".into()));
        assert_eq!(
            Command::parse("msg bob hi there"),
            Command::Msg {
                user: "bob".into(),
                text: "hi there".into()
            }
        );
        assert_eq!(
            Command::parse("send general hello all"),
            Command::Send {
                channel: "general".into(),
                text: "hello all".into()
            }
        );
    }

    #[test]
    fn malformed_input_is_unknown() {
        for input in ["", "quit now", "join", "join ", "msg bob", "send general", "wat"] {
            assert_eq!(Command::parse(input), Command::Unknown, "input: {:?}", input);
        }
    }
}
