//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.

/// Startup arguments did not match the usage string.
pub const USAGE_EXIT_STATUS: i32 = 1;
/// A line could not be parsed into a command.
pub const SYNTAX_ERROR_EXIT_STATUS: i32 = 2;
/// The console could not be read.
pub const READ_ERROR_EXIT_STATUS: i32 = 3;
/// A child process could not be created.
pub const FORK_ERROR_EXIT_STATUS: i32 = 4;
/// Exit status of a child whose program could not replace its image.
pub const COMMAND_NOT_FOUND_EXIT_STATUS: i32 = 127;

error_chain! {
    foreign_links {
        Docopt(::docopt::Error);
        Io(::std::io::Error);
        Nix(::nix::Error);
        Readline(::rustyline::error::ReadlineError);
    }

    errors {
        Syntax(line: String) {
            description("syntax error")
            display("syntax error: '{}'", line)
        }
        ReadInput {
            description("failed to read command line")
            display("failed to read command line")
        }
        Fork {
            description("failed to create process")
            display("failed to create process")
        }
        BuiltinCommand(message: String) {
            description("builtin command failed")
            display("{}", message)
        }
    }
}

impl Error {
    pub(crate) fn syntax<T: AsRef<str>>(line: T) -> Error {
        ErrorKind::Syntax(line.as_ref().escape_debug().to_string()).into()
    }

    pub(crate) fn builtin_command<T: AsRef<str>>(message: T) -> Error {
        ErrorKind::BuiltinCommand(message.as_ref().to_string()).into()
    }

    /// Message followed by every cause in the chain, separated by `: `.
    pub fn display_causes(&self) -> String {
        self.iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ")
    }
}

impl ErrorKind {
    /// Diagnostic exit status associated with this kind of failure.
    pub fn exit_status(&self) -> i32 {
        match *self {
            ErrorKind::Docopt(_) => USAGE_EXIT_STATUS,
            ErrorKind::Syntax(_) => SYNTAX_ERROR_EXIT_STATUS,
            ErrorKind::ReadInput | ErrorKind::Readline(_) => READ_ERROR_EXIT_STATUS,
            ErrorKind::Fork => FORK_ERROR_EXIT_STATUS,
            _ => 1,
        }
    }
}
