//! sh308 - a small interactive command interpreter
//!
//! Lines are parsed into commands; builtins run in the shell itself and
//! everything else is forked and executed, either in the foreground or as a
//! background job that is reported once it terminates.

#![recursion_limit = "1024"]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces
)]

#[macro_use]
extern crate error_chain;

/// Logs `$result` at error level if it is an `Err`, without propagating it.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(ref e) = $result {
            log::error!("{}: {}", $fmt, e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(ref e) = $result {
            log::error!("{}: {}", format_args!($fmt, $($arg)*), e);
        }
    }};
}

mod builtins;
pub mod core;
mod editor;
pub mod errors;
pub mod execute_command;
pub mod shell;

pub use crate::shell::{Flow, Shell, ShellConfig, DEFAULT_PROMPT};
