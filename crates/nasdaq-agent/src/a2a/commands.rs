//! Slash command dispatch

/// What an inbound text asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Ping,
    /// Slash-prefixed text that is not a known command
    Unknown(String),
    /// Anything else is a stock query
    Query(String),
}

impl Command {
    /// Classify `text`. Every text starting with `/` is a command, so `/AAPL`
    /// is rejected rather than analysed.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if !text.starts_with('/') {
            return Self::Query(text.to_string());
        }

        match text.to_ascii_lowercase().as_str() {
            "/help" => Self::Help,
            "/status" => Self::Status,
            "/ping" => Self::Ping,
            _ => Self::Unknown(text.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_commands() {
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("  /STATUS "), Command::Status);
        assert_eq!(Command::parse("/Ping"), Command::Ping);
    }

    #[test]
    fn test_slash_ticker_is_unknown_command() {
        assert_eq!(
            Command::parse("/AAPL"),
            Command::Unknown("/AAPL".to_string())
        );
        assert_eq!(
            Command::parse("/help me please"),
            Command::Unknown("/help me please".to_string())
        );
        assert_eq!(Command::parse("/"), Command::Unknown("/".to_string()));
    }

    #[test]
    fn test_plain_text_is_query() {
        assert_eq!(
            Command::parse(" What about Tesla? "),
            Command::Query("What about Tesla?".to_string())
        );
        assert_eq!(Command::parse("AAPL /help"), Command::Query("AAPL /help".to_string()));
    }
}
