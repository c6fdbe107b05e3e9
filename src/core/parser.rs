//! Command Parser
//!
//! Turns one console line into a [`ParsedLine`]: blank input, or a foreground
//! or background [`Command`]. A line containing a character that is neither
//! printable nor whitespace is rejected with a syntax error.
//!
//! Tokens are maximal runs of
//! non-whitespace characters, and the first `&` on the line marks the command
//! as a background command and ends token scanning. There is no quoting,
//! escaping, expansion, piping or redirection.

use std::ffi::CString;

use log::debug;

use crate::errors::{Error, ErrorKind, Result, ResultExt};

const BACKGROUND_MARKER: char = '&';

/// An external or builtin command extracted from one input line.
///
/// `argv` is never empty; its first element is the program name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
}

/// Classification of an input line.
///
/// A parse failure is reported as `Err(ErrorKind::Syntax)` by
/// [`Command::parse`] rather than as a variant here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedLine {
    /// Empty or whitespace-only input, including a lone `&`.
    Blank,
    /// Run the command and wait for it.
    Foreground(Command),
    /// Run the command without waiting; the line contained `&`.
    Background(Command),
}

impl ParsedLine {
    /// Returns the command, if the line produced one.
    pub fn into_command(self) -> Option<Command> {
        match self {
            ParsedLine::Blank => None,
            ParsedLine::Foreground(command) | ParsedLine::Background(command) => Some(command),
        }
    }

    pub fn is_background(&self) -> bool {
        matches!(*self, ParsedLine::Background(_))
    }
}

impl Command {
    /// Parses a line, with or without its trailing newline.
    pub fn parse(input: &str) -> Result<ParsedLine> {
        if input.chars().any(|c| !is_printable(c) && !is_space(c)) {
            return Err(Error::syntax(input.trim_end_matches('\n')));
        }

        let (body, background) = match input.find(BACKGROUND_MARKER) {
            Some(index) => (&input[..index], true),
            None => (input, false),
        };

        let num_args = tokens(body).count();
        if num_args == 0 {
            debug!("blank line: {:?}", input);
            return Ok(ParsedLine::Blank);
        }

        let mut argv = Vec::with_capacity(num_args);
        argv.extend(tokens(body).map(str::to_owned));
        let command = Command { argv };

        let result = if background {
            ParsedLine::Background(command)
        } else {
            ParsedLine::Foreground(command)
        };
        debug!("parsed Command: {:?}", result);
        Ok(result)
    }

    /// The first token, used both as the program to execute and as the job's
    /// display name.
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Every token, including the program name.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Tokens following the program name.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    /// Converts the tokens to the C strings handed to `execvp`.
    ///
    /// nix appends the terminating null pointer when it builds the vector
    /// passed to the system call.
    pub fn to_exec_args(&self) -> Result<Vec<CString>> {
        self.argv
            .iter()
            .map(|arg| {
                CString::new(arg.as_bytes())
                    .chain_err(|| ErrorKind::Syntax(arg.escape_debug().to_string()))
            })
            .collect()
    }
}

fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(is_space).filter(|token| !token.is_empty())
}

/// Same set as C's `isspace` in the "C" locale.
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

fn is_printable(c: char) -> bool {
    !c.is_control()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foreground(line: &str) -> Command {
        match Command::parse(line).unwrap() {
            ParsedLine::Foreground(command) => command,
            other => panic!("expected foreground command, got {:?}", other),
        }
    }

    fn background(line: &str) -> Command {
        match Command::parse(line).unwrap() {
            ParsedLine::Background(command) => command,
            other => panic!("expected background command, got {:?}", other),
        }
    }

    #[test]
    fn simple_foreground_command() {
        let command = foreground("echo hi\n");
        assert_eq!(command.program(), "echo");
        assert_eq!(command.argv(), ["echo", "hi"]);
        assert_eq!(command.args(), ["hi"]);
    }

    #[test]
    fn surrounding_and_repeated_whitespace() {
        let command = foreground("  \tls   -l \t /tmp  \r\n");
        assert_eq!(command.argv(), ["ls", "-l", "/tmp"]);
    }

    #[test]
    fn single_character_tokens() {
        assert_eq!(foreground("a b c").argv(), ["a", "b", "c"]);
    }

    #[test]
    fn long_tokens_are_kept_whole() {
        let long = "x".repeat(10_000);
        assert_eq!(foreground(&format!("echo {}\n", long)).args(), [long]);
    }

    #[test]
    fn blank_lines() {
        for line in &["", "\n", "   ", " \t \n", "\x0b\x0c\r\n"] {
            assert_eq!(Command::parse(line).unwrap(), ParsedLine::Blank, "{:?}", line);
        }
    }

    #[test]
    fn lone_background_marker_is_blank() {
        assert_eq!(Command::parse("&\n").unwrap(), ParsedLine::Blank);
        assert_eq!(Command::parse("   &   \n").unwrap(), ParsedLine::Blank);
    }

    #[test]
    fn trailing_background_marker() {
        let command = background("sleep 5 &\n");
        assert_eq!(command.program(), "sleep");
        assert_eq!(command.argv(), ["sleep", "5"]);
    }

    #[test]
    fn background_marker_without_space() {
        assert_eq!(background("sleep 5&").argv(), ["sleep", "5"]);
    }

    #[test]
    fn tokens_after_background_marker_are_ignored() {
        assert_eq!(background("sleep 5 & echo hi\n").argv(), ["sleep", "5"]);
        assert_eq!(background("a & & b").argv(), ["a"]);
    }

    #[test]
    fn control_characters_fail() {
        for line in &["echo \u{1}\n", "\u{7f}", "ls\u{0}", "\u{1b}[A"] {
            let err = Command::parse(line).unwrap_err();
            match *err.kind() {
                ErrorKind::Syntax(_) => {}
                ref other => panic!("unexpected error kind {:?}", other),
            }
        }
    }

    #[test]
    fn control_characters_after_marker_fail() {
        assert!(Command::parse("sleep 1 & \u{2}").is_err());
    }

    #[test]
    fn non_ascii_printable_characters_are_accepted() {
        assert_eq!(foreground("echo héllo").args(), ["héllo"]);
    }

    #[test]
    fn into_command() {
        assert_eq!(Command::parse(" ").unwrap().into_command(), None);
        let parsed = Command::parse("true &").unwrap();
        assert!(parsed.is_background());
        assert_eq!(parsed.into_command().unwrap().program(), "true");
    }

    #[test]
    fn exec_args_match_tokens() {
        let args = foreground("ls -a").to_exec_args().unwrap();
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(args, ["ls", "-a"]);
    }
}
