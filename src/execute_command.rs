//! Process lifecycle: fork, exec, foreground wait and the background sweep.
//!
//! Every launched command goes through [`launch`]. The child announces itself
//! and replaces its image; the parent either blocks in [`wait_for_foreground`]
//! or records the child as a background job. [`try_wait_any`] is the
//! non-blocking half used to sweep background children once per loop
//! iteration.
//!
//! Wait statuses are decoded from the raw `waitpid` status word so that
//! children killed or stopped by signals without a [`nix::sys::signal::Signal`]
//! variant (the realtime range) are still reported and reaped.

use std::ffi::CString;
use std::fmt;

use log::{debug, warn};
use nix::errno::Errno;
use nix::libc::{self, c_int};
use nix::unistd::{self, ForkResult, Pid};

use crate::core::parser::Command;
use crate::errors::{ErrorKind, Result, ResultExt, COMMAND_NOT_FOUND_EXIT_STATUS};

/// State change observed for a child process. Signals are raw signal numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Exited(i32),
    Killed(i32),
    Stopped(i32),
    Continued,
}

impl Outcome {
    /// Decodes a raw `waitpid` status word; `None` for anything that is not
    /// one of the four state changes (ptrace events).
    pub fn from_raw_status(status: c_int) -> Option<Outcome> {
        if libc::WIFEXITED(status) {
            Some(Outcome::Exited(libc::WEXITSTATUS(status)))
        } else if libc::WIFSIGNALED(status) {
            Some(Outcome::Killed(libc::WTERMSIG(status)))
        } else if libc::WIFSTOPPED(status) {
            Some(Outcome::Stopped(libc::WSTOPSIG(status)))
        } else if libc::WIFCONTINUED(status) {
            Some(Outcome::Continued)
        } else {
            None
        }
    }

    /// `true` once the child is gone and its pid can no longer be waited on.
    pub fn is_terminal(self) -> bool {
        match self {
            Outcome::Exited(_) | Outcome::Killed(_) => true,
            Outcome::Stopped(_) | Outcome::Continued => false,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Outcome::Exited(code) => write!(f, "Exited {}", code),
            Outcome::Killed(signal) => write!(f, "Killed {}", signal),
            Outcome::Stopped(signal) => write!(f, "Stopped {}", signal),
            Outcome::Continued => write!(f, "Continued"),
        }
    }
}

/// Line printed when a launched process changes state.
pub fn status_report(pid: Pid, name: &str, outcome: Outcome) -> String {
    format!(">>> [{}] {} {}", pid, name, outcome)
}

/// Forks and executes `command`, returning the child's pid in the parent.
///
/// A child that cannot execute its program exits with
/// `COMMAND_NOT_FOUND_EXIT_STATUS`; the parent observes that like any other
/// exit.
pub fn launch(command: &Command) -> Result<Pid> {
    // Built before forking so the child only has to print and exec.
    let argv = command.to_exec_args()?;

    match unsafe { unistd::fork() }.chain_err(|| ErrorKind::Fork)? {
        ForkResult::Parent { child } => {
            debug!("forked {} for {:?}", child, command.argv());
            Ok(child)
        }
        ForkResult::Child => exec(command.program(), &argv),
    }
}

fn exec(program: &str, argv: &[CString]) -> ! {
    println!(">>> [{}] {}", unistd::getpid(), program);
    match unistd::execvp(&argv[0], argv) {
        Ok(never) => match never {},
        Err(e) => not_found(program, e),
    }
}

fn not_found(program: &str, errno: Errno) -> ! {
    eprintln!("sh308: {}: command not found ({})", program, errno.desc());
    // No atexit handlers or stdio teardown in the child.
    unsafe { libc::_exit(COMMAND_NOT_FOUND_EXIT_STATUS) }
}

/// `waitpid(2)` returning the raw status word; `Ok(None)` when `WNOHANG` found
/// nothing to report.
fn waitpid_raw(pid: libc::pid_t, options: c_int) -> nix::Result<Option<(Pid, c_int)>> {
    let mut status: c_int = 0;
    let res = unsafe { libc::waitpid(pid, &mut status, options) };
    match Errno::result(res)? {
        0 => Ok(None),
        child => Ok(Some((Pid::from_raw(child), status))),
    }
}

/// Blocks until the child `pid` exits, is killed, stops, or continues.
pub fn wait_for_foreground(pid: Pid) -> Result<Outcome> {
    let options = libc::WUNTRACED | libc::WCONTINUED;
    loop {
        match waitpid_raw(pid.as_raw(), options) {
            Ok(Some((_, status))) => {
                if let Some(outcome) = Outcome::from_raw_status(status) {
                    debug!("foreground {} {}", pid, outcome);
                    return Ok(outcome);
                }
                warn!("ignoring wait status {:#x} for {}", status, pid);
            }
            Ok(None) => warn!("waitpid returned no status for {}", pid),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Returns the next child with a pending state change, without blocking.
///
/// `Ok(None)` means no child changed state or there are no children at all.
pub fn try_wait_any() -> Result<Option<(Pid, Outcome)>> {
    let options = libc::WNOHANG | libc::WUNTRACED | libc::WCONTINUED;
    loop {
        match waitpid_raw(-1, options) {
            Ok(None) | Err(Errno::ECHILD) => return Ok(None),
            Ok(Some((pid, status))) => {
                if let Some(outcome) = Outcome::from_raw_status(status) {
                    return Ok(Some((pid, outcome)));
                }
                warn!("ignoring wait status {:#x} for {}", status, pid);
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use nix::sys::signal::Signal;

    use super::*;

    // Status words as laid out by Linux.
    fn exited(code: c_int) -> c_int {
        (code & 0xff) << 8
    }

    fn signaled(signal: c_int) -> c_int {
        signal & 0x7f
    }

    fn stopped(signal: c_int) -> c_int {
        (signal << 8) | 0x7f
    }

    const CONTINUED: c_int = 0xffff;

    fn pid() -> Pid {
        Pid::from_raw(4242)
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn decode_exited() {
        assert_eq!(Outcome::from_raw_status(exited(0)), Some(Outcome::Exited(0)));
        assert_eq!(Outcome::from_raw_status(exited(3)), Some(Outcome::Exited(3)));
        assert_eq!(Outcome::from_raw_status(exited(127)), Some(Outcome::Exited(127)));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn decode_signaled() {
        let kill = Signal::SIGKILL as c_int;
        assert_eq!(Outcome::from_raw_status(signaled(kill)), Some(Outcome::Killed(kill)));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn decode_realtime_signals() {
        let rt = libc::SIGRTMIN() + 2;
        assert_eq!(Outcome::from_raw_status(signaled(rt)), Some(Outcome::Killed(rt)));
        assert_eq!(Outcome::from_raw_status(stopped(rt)), Some(Outcome::Stopped(rt)));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn decode_stopped_and_continued() {
        let tstp = Signal::SIGTSTP as c_int;
        assert_eq!(Outcome::from_raw_status(stopped(tstp)), Some(Outcome::Stopped(tstp)));
        assert_eq!(Outcome::from_raw_status(CONTINUED), Some(Outcome::Continued));
    }

    #[test]
    fn terminal_outcomes() {
        assert!(Outcome::Exited(0).is_terminal());
        assert!(Outcome::Killed(libc::SIGTERM).is_terminal());
        assert!(!Outcome::Stopped(libc::SIGSTOP).is_terminal());
        assert!(!Outcome::Continued.is_terminal());
    }

    #[test]
    fn report_lines() {
        assert_eq!(
            status_report(pid(), "echo", Outcome::Exited(0)),
            ">>> [4242] echo Exited 0"
        );
        assert_eq!(
            status_report(pid(), "sleep", Outcome::Killed(libc::SIGKILL)),
            ">>> [4242] sleep Killed 9"
        );
        assert_eq!(
            status_report(pid(), "vim", Outcome::Stopped(libc::SIGTSTP)),
            format!(">>> [4242] vim Stopped {}", libc::SIGTSTP)
        );
        assert_eq!(
            status_report(pid(), "rt", Outcome::Killed(34)),
            ">>> [4242] rt Killed 34"
        );
        assert_eq!(
            status_report(pid(), "vim", Outcome::Continued),
            ">>> [4242] vim Continued"
        );
    }
}
