use std::env;
use std::path::PathBuf;

use log::debug;

use crate::builtins::{self, prelude::*};

pub struct Cd;

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    /// Changes to the first argument, or to the home directory when there is
    /// none. The working directory is unchanged on failure.
    fn run(_shell: &mut Shell, command: &Command, _stdout: &mut dyn Write) -> Result<()> {
        let dir = match command.args().first() {
            Some(dir) => PathBuf::from(dir),
            None => ::dirs::home_dir()
                .ok_or_else(|| Error::builtin_command(format!("{}: HOME not set", Self::NAME)))?,
        };

        debug!("changing directory to {}", dir.display());
        env::set_current_dir(&dir)
            .chain_err(|| ErrorKind::BuiltinCommand(format!("{}: {}", Self::NAME, dir.display())))?;
        Ok(())
    }
}

pub struct Pwd;

impl builtins::BuiltinCommand for Pwd {
    const NAME: &'static str = builtins::PWD_NAME;

    fn run(_shell: &mut Shell, _command: &Command, stdout: &mut dyn Write) -> Result<()> {
        let cwd = env::current_dir().chain_err(|| ErrorKind::BuiltinCommand(Self::NAME.to_string()))?;
        writeln!(stdout, "{}", cwd.display())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use lazy_static::lazy_static;
    use tempdir::TempDir;

    use super::*;
    use crate::builtins::tests::{command, shell};
    use crate::builtins::BuiltinCommand;

    lazy_static! {
        /// The working directory is process-wide; tests touching it take turns.
        static ref CWD_LOCK: Mutex<()> = Mutex::new(());
    }

    /// Holds the lock and restores the original working directory on drop.
    struct CwdGuard {
        original: PathBuf,
        _lock: MutexGuard<'static, ()>,
    }

    impl CwdGuard {
        fn new() -> Self {
            let lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            CwdGuard {
                original: env::current_dir().unwrap(),
                _lock: lock,
            }
        }
    }

    impl Drop for CwdGuard {
        fn drop(&mut self) {
            env::set_current_dir(&self.original).unwrap();
        }
    }

    fn pwd() -> String {
        let mut out = Vec::new();
        Pwd::run(&mut shell(), &command("pwd"), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cd_to_directory() {
        let _guard = CwdGuard::new();
        let temp_dir = TempDir::new("sh308-cd").unwrap();
        let target = temp_dir.path().canonicalize().unwrap();

        let line = format!("cd {}", target.display());
        Cd::run(&mut shell(), &command(&line), &mut Vec::new()).unwrap();
        assert_eq!(env::current_dir().unwrap(), target);
        assert_eq!(pwd(), format!("{}\n", target.display()));
    }

    #[test]
    fn cd_without_arguments_goes_home() {
        let _guard = CwdGuard::new();
        let home = match ::dirs::home_dir().and_then(|h| h.canonicalize().ok()) {
            Some(home) => home,
            None => return,
        };

        Cd::run(&mut shell(), &command("cd"), &mut Vec::new()).unwrap();
        assert_eq!(env::current_dir().unwrap().canonicalize().unwrap(), home);
    }

    #[test]
    fn cd_to_missing_directory_keeps_cwd() {
        let _guard = CwdGuard::new();
        let before = env::current_dir().unwrap();

        let err = Cd::run(
            &mut shell(),
            &command("cd /this/path/does/not/exist/sh308"),
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("cd: /this/path/does/not/exist/sh308"));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn pwd_matches_current_dir() {
        let _guard = CwdGuard::new();
        let expected = format!("{}\n", env::current_dir().unwrap().display());
        assert_eq!(pwd(), expected);
    }
}
