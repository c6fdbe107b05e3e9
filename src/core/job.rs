//! Background job bookkeeping.

use std::fmt;
use std::process;

use log::{debug, error};
use nix::unistd::Pid;

/// Slots added to the registry each time it fills up.
const GROWTH_INCREMENT: usize = 4;

/// A background child that has not been reaped yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pid: Pid,
    /// Owned copy of the program name; outlives the originating command.
    name: String,
}

impl Job {
    pub fn new<S: AsRef<str>>(pid: Pid, name: S) -> Self {
        Self {
            pid,
            name: name.as_ref().to_string(),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.pid, self.name)
    }
}

/// Unordered table of live background jobs keyed by process id.
///
/// Lookups are linear; removal moves the last job into the vacated slot, so
/// iteration order is only stable between mutations.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: Vec::with_capacity(GROWTH_INCREMENT),
        }
    }

    /// Records a background child.
    ///
    /// # Aborts
    /// Aborts the process if the table cannot grow; the shell would otherwise
    /// lose track of a running child.
    pub fn add<S: AsRef<str>>(&mut self, pid: Pid, name: S) {
        if self.jobs.len() == self.jobs.capacity() {
            if let Err(e) = self.jobs.try_reserve_exact(GROWTH_INCREMENT) {
                error!("unable to grow job registry past {}: {}", self.jobs.len(), e);
                eprintln!("sh308: out of memory while recording job {}", pid);
                process::abort();
            }
        }

        let job = Job::new(pid, name);
        debug!("adding job {}", job);
        self.jobs.push(job);
    }

    pub fn find(&self, pid: Pid) -> Option<&Job> {
        self.jobs.iter().find(|job| job.pid == pid)
    }

    /// Removes and returns the job for `pid`; does nothing if there is none.
    pub fn remove(&mut self, pid: Pid) -> Option<Job> {
        let index = self.jobs.iter().position(|job| job.pid == pid)?;
        let job = self.jobs.swap_remove(index);
        debug!("removed job {}", job);
        Some(job)
    }

    pub fn list(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Releases every job and the backing storage.
    pub fn clear(&mut self) {
        debug!("clearing {} jobs", self.jobs.len());
        self.jobs = Vec::new();
    }
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} jobs\tcapacity: {}", self.jobs.len(), self.jobs.capacity())?;
        for job in &self.jobs {
            writeln!(f, "{}", job)?;
        }

        Ok(())
    }
}
