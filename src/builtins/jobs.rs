use crate::builtins::{self, prelude::*};

pub struct Jobs;

impl builtins::BuiltinCommand for Jobs {
    const NAME: &'static str = builtins::JOBS_NAME;

    /// Lists background jobs that have not been reaped, one `[pid] name` per
    /// line.
    fn run(shell: &mut Shell, _command: &Command, stdout: &mut dyn Write) -> Result<()> {
        if let Some(jobs) = shell.jobs() {
            for job in jobs.list() {
                writeln!(stdout, "{}", job)?;
            }
        }

        Ok(())
    }
}
