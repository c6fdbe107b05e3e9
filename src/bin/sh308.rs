use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;

use docopt::Docopt;
use log::{debug, error};
use nix::unistd::Pid;
use serde_derive::Deserialize;

use sh308::errors::Error;
use sh308::{Shell, ShellConfig, DEFAULT_PROMPT};

const COMMAND_HISTORY_CAPACITY: usize = 10;
const LOG_FILE_NAME: &str = ".sh308_log";
const LOG_PATH_VAR: &str = "SH308_LOG";

const USAGE: &str = "
sh308.

Usage:
    sh308
    sh308 -p <prompt>
    sh308 (-h | --help)
    sh308 --version

Options:
    -h --help       Show this screen.
    --version       Show version.
    -p              Show <prompt> instead of the default prompt before each line.
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_prompt: Option<String>,
    flag_p: bool,
    flag_version: bool,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| {
            if !e.fatal() {
                e.exit();
            }
            display_error_and_exit(&Error::from(e))
        });

    init_logger();
    debug!("{:?}", args);

    if args.flag_version {
        println!("sh308 version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let prompt = match args.arg_prompt {
        Some(prompt) if args.flag_p => prompt,
        _ => DEFAULT_PROMPT.to_string(),
    };

    let config = if io::stdin().is_terminal() {
        ShellConfig::interactive(prompt, COMMAND_HISTORY_CAPACITY)
    } else {
        ShellConfig::noninteractive(prompt)
    };

    let mut shell = Shell::new(config).unwrap_or_else(|e| display_error_and_exit(&e));
    let status = shell.execute_from_stdin();
    shell.exit(status)
}

/// Sends log records to `$SH308_LOG`, or `~/.sh308_log`. Logging stays off if
/// neither can be opened.
fn init_logger() {
    let log_path = match env::var_os(LOG_PATH_VAR)
        .map(PathBuf::from)
        .or_else(default_log_path)
    {
        Some(log_path) => log_path,
        None => return,
    };

    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(_) => return,
    };

    let pid = Pid::this();
    let result = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Trace)
        .chain(log_file)
        .apply();
    if let Err(e) = result {
        eprintln!("sh308: unable to start logging to {}: {}", log_path.display(), e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}

fn display_error_and_exit(error: &Error) -> ! {
    error!("{}", error.display_causes());
    eprintln!("sh308: {}", error.display_causes());
    process::exit(error.kind().exit_status());
}
