//! Slash-command parsing.

/// Commands the bot recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Begin,
    End,
    Help,
    Start,
}

impl Command {
    /// Parse a command out of a message body.
    ///
    /// Returns `None` for ordinary conversation text: anything that doesn't
    /// start with `/` or whose name token isn't recognized. Matching is
    /// exact and case-sensitive; text after the first whitespace is ignored.
    pub fn parse(text: &str) -> Option<Command> {
        let rest = text.strip_prefix('/')?;
        let name = rest.split(char::is_whitespace).next().unwrap_or_default();
        match name {
            "begin" => Some(Command::Begin),
            "end" => Some(Command::End),
            "help" => Some(Command::Help),
            "start" => Some(Command::Start),
            _ => None,
        }
    }
}
