//! Command parsing for the input line.
//!
//! Input starting with `/` is a command; anything else is a chat message.

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the direct room with a participant.
    Direct {
        /// Participant id, as shown by `/who`.
        peer: String,
    },

    /// Go back to the general room.
    General,

    /// Show who is online.
    Who,

    /// Quit the application.
    Quit,

    /// Send a message to the current room.
    Message {
        /// Message content.
        content: String,
    },

    /// Unknown command.
    Unknown {
        /// The raw input line.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Parse a user input string into a command.
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();

    let Some(cmd_str) = trimmed.strip_prefix('/') else {
        return Command::Message { content: trimmed.to_string() };
    };

    let parts: Vec<&str> = cmd_str.split_whitespace().collect();
    let command = parts.first().copied().unwrap_or("");

    match command {
        "dm" | "msg" => match parts.as_slice() {
            [_, peer] => Command::Direct { peer: (*peer).to_string() },
            _ => Command::InvalidArgs {
                command: command.into(),
                error: format!("Usage: /{command} <participant id>"),
            },
        },

        "general" | "g" => Command::General,

        "who" => Command::Who,

        "quit" | "q" => Command::Quit,

        _ => Command::Unknown { input: trimmed.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parse_message() {
        assert_eq!(parse("hello world"), Command::Message { content: "hello world".into() });
    }

    #[test]
    fn parse_message_is_trimmed() {
        assert_eq!(parse("  hi  "), Command::Message { content: "hi".into() });
    }

    #[test]
    fn parse_direct() {
        assert_eq!(parse("/dm 10.0.0.2"), Command::Direct { peer: "10.0.0.2".into() });
        assert_eq!(parse("/msg 10.0.0.2"), Command::Direct { peer: "10.0.0.2".into() });
    }

    #[test]
    fn parse_direct_missing_peer() {
        assert!(matches!(parse("/dm"), Command::InvalidArgs { command, .. } if command == "dm"));
    }

    #[test]
    fn parse_direct_too_many_args() {
        assert!(matches!(parse("/msg a b"), Command::InvalidArgs { command, .. } if command == "msg"));
    }

    #[test]
    fn parse_general() {
        assert_eq!(parse("/general"), Command::General);
        assert_eq!(parse("/g"), Command::General);
    }

    #[test]
    fn parse_who() {
        assert_eq!(parse("/who"), Command::Who);
    }

    #[test]
    fn parse_quit() {
        assert_eq!(parse("/quit"), Command::Quit);
        assert_eq!(parse("/q"), Command::Quit);
    }

    #[test]
    fn parse_unknown_command() {
        assert_eq!(parse("/nope"), Command::Unknown { input: "/nope".into() });
        assert!(matches!(parse("/"), Command::Unknown { .. }));
    }

    #[test]
    fn parse_empty() {
        assert_eq!(parse("   "), Command::Message { content: String::new() });
    }

    proptest! {
        #[test]
        fn plain_text_is_a_trimmed_message(text in "[^/\\s][^\n]{0,40}") {
            let expected = Command::Message { content: text.trim().to_string() };
            prop_assert_eq!(parse(&format!("  {text} ")), expected);
        }

        #[test]
        fn parse_never_panics(input in ".{0,64}") {
            let _ = parse(&input);
        }
    }
}
