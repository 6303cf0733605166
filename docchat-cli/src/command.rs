//! Parsing of REPL input lines.

use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  /ingest <file>...  add PDF, text or markdown files to the index
  /files             list ingested documents
  /status            show session counters
  /reset             clear the conversation (documents stay indexed)
  /help              show this message
  /quit              exit
Anything else is sent as a question.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ingest(Vec<PathBuf>),
    Files,
    Status,
    Reset,
    Help,
    Quit,
    Ask(String),
    /// An unrecognized slash command or a command missing its arguments.
    Invalid(String),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Command::Ask(line.to_string()));
        };

        let mut words = rest.split_whitespace();
        let command = match words.next().unwrap_or_default() {
            "ingest" | "upload" => {
                let paths: Vec<PathBuf> = words.map(PathBuf::from).collect();
                if paths.is_empty() {
                    Command::Invalid("usage: /ingest <file>...".to_string())
                } else {
                    Command::Ingest(paths)
                }
            }
            "files" => Command::Files,
            "status" => Command::Status,
            "reset" | "clear" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Invalid(format!("unknown command '/{other}', try /help")),
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            Command::parse("  what is the capital of France? "),
            Some(Command::Ask("what is the capital of France?".to_string()))
        );
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn ingest_takes_paths() {
        assert_eq!(
            Command::parse("/ingest a.pdf notes.md"),
            Some(Command::Ingest(vec![PathBuf::from("a.pdf"), PathBuf::from("notes.md")]))
        );
        assert!(matches!(Command::parse("/ingest"), Some(Command::Invalid(_))));
    }

    #[test]
    fn session_commands() {
        assert_eq!(Command::parse("/reset"), Some(Command::Reset));
        assert_eq!(Command::parse("/status"), Some(Command::Status));
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
        assert!(matches!(Command::parse("/frobnicate"), Some(Command::Invalid(_))));
    }
}
