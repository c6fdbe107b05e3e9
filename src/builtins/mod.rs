//! sh308 builtins
//!
//! Commands the shell runs in its own process instead of launching a child.

use std::io::Write;

use log::debug;

use self::dirs::{Cd, Pwd};
use self::jobs::Jobs;
use self::process::{Pid, Ppid};
use crate::core::parser::Command;
use crate::errors::Result;
use crate::shell::Shell;

pub mod prelude {
    pub use std::io::Write;

    pub use crate::core::parser::Command;
    pub use crate::errors::{Error, ErrorKind, Result, ResultExt};
    pub use crate::shell::Shell;
}

mod dirs;
mod jobs;
mod process;

const CD_NAME: &str = "cd";
const EXIT_NAME: &str = "exit";
const JOBS_NAME: &str = "jobs";
const PID_NAME: &str = "pid";
const PPID_NAME: &str = "ppid";
const PWD_NAME: &str = "pwd";

/// Represents a builtin command such as cd or jobs.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// Runs the command in the `shell` environment, writing output to `stdout`.
    fn run(shell: &mut Shell, command: &Command, stdout: &mut dyn Write) -> Result<()>;
}

/// What the driving loop should do after offering a command to the builtins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// `exit`: leave the loop.
    Exit,
    /// A builtin ran successfully.
    Ran,
    /// Not a builtin; launch it as a process.
    NotBuiltin,
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, EXIT_NAME, JOBS_NAME, PID_NAME, PPID_NAME, PWD_NAME].contains(&program.as_ref())
}

/// Runs `command` if it names a builtin.
///
/// A failing builtin still counts as handled; the error is returned for the
/// caller to report.
pub fn run(shell: &mut Shell, command: &Command, stdout: &mut dyn Write) -> Result<Dispatch> {
    if !is_builtin(command.program()) {
        return Ok(Dispatch::NotBuiltin);
    }

    let result = match command.program() {
        EXIT_NAME => return Ok(Dispatch::Exit),
        PID_NAME => Pid::run(shell, command, stdout),
        PPID_NAME => Ppid::run(shell, command, stdout),
        CD_NAME => Cd::run(shell, command, stdout),
        PWD_NAME => Pwd::run(shell, command, stdout),
        JOBS_NAME => Jobs::run(shell, command, stdout),
        _ => return Ok(Dispatch::NotBuiltin),
    };

    debug!("builtin {} finished: {:?}", command.program(), result);
    result.map(|()| Dispatch::Ran)
}
