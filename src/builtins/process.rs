use nix::unistd;

use crate::builtins::{self, prelude::*};

pub struct Pid;

impl builtins::BuiltinCommand for Pid {
    const NAME: &'static str = builtins::PID_NAME;

    fn run(_shell: &mut Shell, _command: &Command, stdout: &mut dyn Write) -> Result<()> {
        writeln!(stdout, "Shell pid: {}", unistd::getpid())?;
        Ok(())
    }
}

pub struct Ppid;

impl builtins::BuiltinCommand for Ppid {
    const NAME: &'static str = builtins::PPID_NAME;

    fn run(_shell: &mut Shell, _command: &Command, stdout: &mut dyn Write) -> Result<()> {
        writeln!(stdout, "Shell's Parent pid: {}", unistd::getppid())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::tests::{command, shell};
    use crate::builtins::BuiltinCommand;
    use std::process;

    #[test]
    fn pid_reports_own_process() {
        let mut out = Vec::new();
        Pid::run(&mut shell(), &command("pid"), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Shell pid: {}\n", process::id())
        );
    }

    #[test]
    fn ppid_reports_parent_process() {
        let mut out = Vec::new();
        Ppid::run(&mut shell(), &command("ppid"), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Shell's Parent pid: {}\n", unistd::getppid())
        );
    }
}
