//! Chat-command tokenizer.
//!
//! A chat line is a command when it starts with the command prefix or with
//! `<nick>,`. The remainder is split on spaces; an argument starting with
//! `/` swallows the rest of the line so it can carry spaces:
//!
//! ```
//! use slircbot::commands::ParsedCommand;
//!
//! let cmd = ParsedCommand::tokenize(".say #rust /hello there", '.', "bot").unwrap();
//! assert_eq!(cmd.name, "say");
//! assert_eq!(cmd.args, ["#rust", "hello there"]);
//! ```

use crate::casemap::irc_eq;

/// A command name plus its arguments, built per line and consumed by one
/// dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lower-cased command name.
    pub name: String,
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// Recognize and split a chat line. Returns `None` if the line is not a
    /// command.
    pub fn tokenize(line: &str, prefix: char, nick: &str) -> Option<Self> {
        if line.chars().count() <= 1 {
            return None;
        }
        let body = match line.strip_prefix(prefix) {
            Some(rest) => rest,
            None => strip_nick_address(line, nick)?,
        };
        split(body)
    }

    /// Split a console line. There is no recognition step; blank lines
    /// yield `None`.
    pub fn from_console(line: &str) -> Option<Self> {
        split(line.trim())
    }
}

/// `"bot, join #x"` -> `", join #x"` when `nick` is `bot`.
fn strip_nick_address<'a>(line: &'a str, nick: &str) -> Option<&'a str> {
    if nick.is_empty() {
        return None;
    }
    let (head, _) = line.split_once(',')?;
    if irc_eq(head, nick) {
        Some(&line[head.len()..])
    } else {
        None
    }
}

fn split(body: &str) -> Option<ParsedCommand> {
    let body = body.trim_start_matches(['.', ',', ' ']);
    let (name, mut rest) = body.split_once(' ').unwrap_or((body, ""));
    if name.is_empty() {
        return None;
    }

    let mut args = Vec::new();
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }
        if let Some(tail) = rest.strip_prefix('/') {
            args.push(tail.to_string());
            break;
        }
        let (token, remainder) = rest.split_once(' ').unwrap_or((rest, ""));
        args.push(token.to_string());
        rest = remainder;
    }

    Some(ParsedCommand {
        name: name.to_lowercase(),
        args,
    })
}
