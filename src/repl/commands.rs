//! REPL built-in commands
//!
//! Slash commands plus the bare words `quit`, `exit`, `q` and `clear`.
//! Anything else is a research question.

/// REPL command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Reset memory and detach from the current session
    Clear,
    Memory,
    Save { description: Option<String> },
    Load { id: String },
    Sessions,
    Delete { id: String },
    Preview { id: String },
    Timing,
    /// Export the last question and answer as a markdown report
    Report,
    Tools,
    Exit,
    /// Slash command that is unknown or missing its argument
    Invalid { message: String },
}

/// Help table: usage and description
pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("/help", "Show this help message"),
    ("/clear", "Clear conversation memory and start a new session"),
    ("/memory", "Show the conversation history"),
    ("/save [description]", "Save the conversation as a session"),
    ("/load <id>", "Load a saved session"),
    ("/sessions", "List saved sessions"),
    ("/delete <id>", "Delete a saved session"),
    ("/preview <id>", "Preview a saved session"),
    ("/timing", "Show tool timing for the last query"),
    ("/report", "Export the last answer as a markdown report"),
    ("/tools", "List available tools by category"),
    ("/exit", "Exit (also: quit, exit, q)"),
];

/// Check if input is a slash command
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}

fn required(name: &str, arg: Option<String>, build: impl FnOnce(String) -> Command) -> Command {
    match arg {
        Some(arg) => build(arg),
        None => Command::Invalid {
            message: format!("Usage: /{} <session_id>", name),
        },
    }
}

/// Parse a REPL line; `None` means the line is a question
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();

    match trimmed.to_lowercase().as_str() {
        "quit" | "exit" | "q" => return Some(Command::Exit),
        "clear" => return Some(Command::Clear),
        _ => {}
    }

    let body = trimmed.strip_prefix('/')?;
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    let command = match name.to_lowercase().as_str() {
        "help" | "h" => Command::Help,
        "clear" => Command::Clear,
        "memory" | "history" => Command::Memory,
        "save" => Command::Save { description: arg },
        "load" => required("load", arg, |id| Command::Load { id }),
        "sessions" => Command::Sessions,
        "delete" => required("delete", arg, |id| Command::Delete { id }),
        "preview" => required("preview", arg, |id| Command::Preview { id }),
        "timing" => Command::Timing,
        "report" => Command::Report,
        "tools" => Command::Tools,
        "exit" | "quit" | "q" => Command::Exit,
        other => Command::Invalid {
            message: format!("Unknown command: /{}", other),
        },
    };

    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_command() {
        assert!(is_command("/help"));
        assert!(is_command(" /help"));
        assert!(!is_command("help"));
        assert!(!is_command("what is the speed of light"));
    }

    #[test]
    fn test_questions_are_not_commands() {
        assert_eq!(parse_command("What is the capital of France?"), None);
        assert_eq!(parse_command("clear skies in Paris?"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_bare_words() {
        assert_eq!(parse_command("quit"), Some(Command::Exit));
        assert_eq!(parse_command("EXIT"), Some(Command::Exit));
        assert_eq!(parse_command(" q "), Some(Command::Exit));
        assert_eq!(parse_command("clear"), Some(Command::Clear));
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("/help"), Some(Command::Help));
        assert_eq!(parse_command("/memory"), Some(Command::Memory));
        assert_eq!(parse_command("/sessions"), Some(Command::Sessions));
        assert_eq!(parse_command("/timing"), Some(Command::Timing));
        assert_eq!(parse_command("/report"), Some(Command::Report));
        assert_eq!(parse_command("/tools"), Some(Command::Tools));
        assert_eq!(parse_command("/exit"), Some(Command::Exit));
    }

    #[test]
    fn test_parse_save() {
        assert_eq!(
            parse_command("/save"),
            Some(Command::Save { description: None })
        );
        assert_eq!(
            parse_command("/save  Tesla stock research "),
            Some(Command::Save {
                description: Some("Tesla stock research".to_string())
            })
        );
    }

    #[test]
    fn test_parse_id_commands() {
        assert_eq!(
            parse_command("/load 22.01.2026_tesla"),
            Some(Command::Load {
                id: "22.01.2026_tesla".to_string()
            })
        );
        assert_eq!(
            parse_command("/delete abc"),
            Some(Command::Delete { id: "abc".to_string() })
        );
        assert_eq!(
            parse_command("/preview abc"),
            Some(Command::Preview { id: "abc".to_string() })
        );
        assert_eq!(
            parse_command("/load"),
            Some(Command::Invalid {
                message: "Usage: /load <session_id>".to_string()
            })
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse_command("/telescope"),
            Some(Command::Invalid {
                message: "Unknown command: /telescope".to_string()
            })
        );
    }
}
