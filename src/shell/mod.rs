//! sh308 - Shell Module
//!
//! The Shell reads lines, hands them to the parser, runs builtins in process,
//! launches everything else, and reports background jobs as they change
//! state.

use std::fmt;
use std::io;
use std::process;

use log::{debug, error, info, warn};
use nix::unistd::Pid;

use crate::{
    builtins::{self, Dispatch},
    core::{
        job::JobRegistry,
        parser::{Command, ParsedLine},
    },
    editor::Editor,
    errors::{Error, ErrorKind, Result},
    execute_command::{self, Outcome},
};

pub const DEFAULT_PROMPT: &str = "308sh> ";

/// Whether the driving loop keeps reading after a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// sh308 Shell
pub struct Shell {
    /// Responsible for readline and history.
    editor: Editor,
    config: ShellConfig,
    /// Background jobs; created by the first background command.
    jobs: Option<JobRegistry>,
    /// Status of the most recent failed iteration, used as the exit status
    /// when input runs out.
    last_error_status: i32,
}

impl Shell {
    /// Constructs a new Shell with no background jobs.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        let shell = Shell {
            editor: Editor::with_capacity(config.command_history_capacity)?,
            config,
            jobs: None,
            last_error_status: 0,
        };

        info!("sh308 started up");
        Ok(shell)
    }

    /// Live background jobs, or `None` if no command was ever backgrounded.
    pub fn jobs(&self) -> Option<&JobRegistry> {
        self.jobs.as_ref()
    }

    pub(crate) fn jobs_mut(&mut self) -> &mut JobRegistry {
        self.jobs.get_or_insert_with(|| {
            debug!("creating job registry");
            JobRegistry::new()
        })
    }

    pub fn last_error_status(&self) -> i32 {
        self.last_error_status
    }

    /// Runs lines from stdin until `exit` or end of input.
    ///
    /// Returns the status the shell should exit with: 0 after `exit`,
    /// otherwise the status of the last failed line (0 if none failed).
    ///
    /// A line that cannot be decoded is reported and skipped like any other
    /// syntax error. Any other read failure ends the loop with the read error
    /// status instead of retrying a dead console.
    pub fn execute_from_stdin(&mut self) -> i32 {
        loop {
            let input = match self.editor.readline(self.config.prompt()) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    if self.config.display_messages {
                        println!("exit");
                    }
                    return self.last_error_status;
                }
                Err(e) => {
                    self.report_error(&e);
                    if let ErrorKind::Syntax(_) = *e.kind() {
                        self.do_job_notification();
                        continue;
                    }
                    return self.last_error_status;
                }
            };

            self.editor.add_history_entry(&input);
            if self.execute_command_string(&input) == Flow::Exit {
                return 0;
            }

            // Check the status of background jobs, removing exited ones.
            self.do_job_notification();
        }
    }

    /// Parses and runs a single line.
    ///
    /// Errors are reported on stderr and recorded; they never stop the loop.
    pub fn execute_command_string(&mut self, input: &str) -> Flow {
        let (command, background) = match Command::parse(input) {
            Ok(ParsedLine::Blank) => return Flow::Continue,
            Ok(ParsedLine::Foreground(command)) => (command, false),
            Ok(ParsedLine::Background(command)) => (command, true),
            Err(e) => {
                self.report_error(&e);
                return Flow::Continue;
            }
        };

        match builtins::run(self, &command, &mut io::stdout()) {
            Ok(Dispatch::Exit) => Flow::Exit,
            Ok(Dispatch::Ran) => Flow::Continue,
            Ok(Dispatch::NotBuiltin) => {
                self.execute_command(&command, background);
                Flow::Continue
            }
            Err(e) => {
                self.report_error(&e);
                Flow::Continue
            }
        }
    }

    /// Launches an external command, waiting for it unless `background`.
    fn execute_command(&mut self, command: &Command, background: bool) {
        let pid = match execute_command::launch(command) {
            Ok(pid) => pid,
            Err(e) => {
                self.report_error(&e);
                return;
            }
        };

        if background {
            info!("[{}] {} running in background", pid, command.program());
            self.jobs_mut().add(pid, command.program());
            return;
        }

        match execute_command::wait_for_foreground(pid) {
            Ok(outcome) => println!(
                "{}",
                execute_command::status_report(pid, command.program(), outcome)
            ),
            Err(e) => self.report_error(&e),
        }
    }

    /// Reports every background job that changed state since the last call,
    /// without blocking, and forgets the ones that are gone.
    pub fn do_job_notification(&mut self) {
        loop {
            match execute_command::try_wait_any() {
                Ok(Some((pid, outcome))) => self.notify(pid, outcome),
                Ok(None) => break,
                Err(e) => {
                    error!("do_job_notification: {}", e.display_causes());
                    break;
                }
            }
        }
    }

    fn notify(&mut self, pid: Pid, outcome: Outcome) {
        let jobs = match self.jobs.as_mut() {
            Some(jobs) => jobs,
            None => {
                debug!("reaped {} ({}) with no background jobs", pid, outcome);
                return;
            }
        };

        match jobs.find(pid) {
            Some(job) => println!(
                "{}",
                execute_command::status_report(pid, job.name(), outcome)
            ),
            None => {
                debug!("reaped {} ({}) which is not a background job", pid, outcome);
                return;
            }
        }

        if outcome.is_terminal() {
            jobs.remove(pid);
        }
    }

    fn report_error(&mut self, e: &Error) {
        let message = e.display_causes();
        error!("{}", message);
        eprintln!("sh308: {}", message);
        self.last_error_status = e.kind().exit_status();
    }

    /// Exit the shell with `status`, releasing the job registry.
    ///
    /// Background jobs that are still running are left running.
    pub fn exit(&mut self, status: i32) -> ! {
        if let Some(mut jobs) = self.jobs.take() {
            if !jobs.is_empty() {
                warn!("exiting with {} background jobs still running", jobs.len());
            }
            jobs.clear();
        }

        info!("sh308 has shut down");
        process::exit(status);
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:?}", self.config)?;
        match self.jobs {
            Some(ref jobs) => write!(f, "{:?}", jobs)?,
            None => writeln!(f, "no jobs")?,
        }
        write!(f, "{:?}", self.editor)
    }
}

/// Policy object to control a Shell's behavior
#[derive(Clone, Debug)]
pub struct ShellConfig {
    /// Text shown before each line is read.
    prompt: String,

    /// Number of entries kept in the in-memory command history; 0 disables it.
    command_history_capacity: usize,

    /// Determines if some messages (e.g. "exit") should be displayed.
    display_messages: bool,
}

impl ShellConfig {
    /// Creates an interactive shell configuration
    ///
    /// # Complete List
    /// - Command History is enabled
    /// - Some additional messages are displayed
    pub fn interactive<S: Into<String>>(prompt: S, command_history_capacity: usize) -> Self {
        Self {
            prompt: prompt.into(),
            command_history_capacity,
            display_messages: true,
        }
    }

    /// Creates a noninteractive shell configuration, e.g. for piped input
    ///
    /// # Complete List
    /// - Command History is disabled.
    /// - Fewer messages are displayed
    pub fn noninteractive<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            command_history_capacity: 0,
            display_messages: false,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::noninteractive(DEFAULT_PROMPT)
    }
}
