use std::fmt;
use std::io;

use rustyline::{
    self,
    completion::{Completer, FilenameCompleter, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::{DefaultHistory, History},
    validate::Validator,
    CompletionType, Config, Helper,
};

use crate::errors::{Error, ErrorKind, Result, ResultExt};

struct EditorHelper(FilenameCompleter);

impl Completer for EditorHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.0.complete(line, pos, ctx)
    }
}

impl Hinter for EditorHelper {
    type Hint = String;
}

impl Highlighter for EditorHelper {}

impl Validator for EditorHelper {}

impl Helper for EditorHelper {}

/// Reads command lines from the console.
pub struct Editor {
    internal: rustyline::Editor<EditorHelper, DefaultHistory>,
    history_enabled: bool,
}

impl Editor {
    /// Creates an editor remembering up to `history_capacity` lines; a
    /// capacity of zero disables history.
    pub fn with_capacity(history_capacity: usize) -> Result<Editor> {
        let config = Config::builder()
            .max_history_size(history_capacity.max(1))
            .chain_err(|| ErrorKind::ReadInput)?
            .history_ignore_space(true)
            .completion_type(CompletionType::Circular)
            .build();

        let mut internal =
            rustyline::Editor::with_config(config).chain_err(|| ErrorKind::ReadInput)?;
        internal.set_helper(Some(EditorHelper(FilenameCompleter::new())));

        Ok(Editor {
            internal,
            history_enabled: history_capacity > 0,
        })
    }

    /// Reads one line. Returns `None` when end of file is reached.
    ///
    /// Ctrl-C abandons the current line and yields an empty one. Input that
    /// is not valid UTF-8 is reported as a syntax error so the caller can
    /// skip it and keep reading.
    pub fn readline(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.internal.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Io(ref e)) if e.kind() == io::ErrorKind::InvalidData => {
                Err(Error::syntax("<invalid UTF-8>"))
            }
            Err(e) => Err(Error::with_chain(e, ErrorKind::ReadInput)),
        }
    }

    pub fn add_history_entry(&mut self, line: &str) {
        if !self.history_enabled || line.trim().is_empty() {
            return;
        }

        let temp_result = self.internal.add_history_entry(line);
        log_if_err!(temp_result, "add_history_entry");
    }

    pub fn history_len(&self) -> usize {
        self.internal.history().len()
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "history enabled: {}", self.history_enabled)?;
        write!(f, "history entries: {}", self.history_len())
    }
}
