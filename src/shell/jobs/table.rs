use chrono::{DateTime, Local};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use super::wait_for;

/// A command started with `&`.
#[derive(Debug)]
pub struct BackgroundJob {
    pub id: usize,
    pub line: String,
    pub started: DateTime<Local>,
    pids: Vec<Pid>,
}

impl BackgroundJob {
    /// Processes of this job that haven't been reaped yet.
    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }

    fn poll(&mut self) {
        self.pids.retain(|&pid| match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => true,
            Ok(status) => {
                debug!("background pid {} finished: {:?}", pid, status);
                false
            }
            Err(errno) => {
                warn!("lost track of background pid {}: {}", pid, errno.desc());
                false
            }
        });
    }

    fn is_finished(&self) -> bool {
        self.pids.is_empty()
    }
}

/// Background jobs that haven't been reaped yet.
///
/// Nothing waits on these while the shell is busy; the driver calls
/// [`JobTable::reap_finished`] before each prompt so finished jobs don't pile
/// up as zombies.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<BackgroundJob>,
}

impl JobTable {
    pub fn new() -> JobTable {
        JobTable { jobs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackgroundJob> {
        self.jobs.iter()
    }

    /// Track `pids` as one job. Ids count up from 1 and start over once the
    /// table is empty.
    pub fn register(&mut self, pids: Vec<Pid>, line: &str) -> usize {
        let id = self.jobs.iter().map(|job| job.id).max().unwrap_or(0) + 1;
        if let Some(last) = pids.last() {
            println!("[{}] {}", id, last);
        }
        info!("job {} started: {}", id, line);
        self.jobs.push(BackgroundJob {
            id: id,
            line: line.to_string(),
            started: Local::now(),
            pids: pids,
        });
        id
    }

    /// Collect the jobs whose processes have all terminated, without blocking.
    pub fn reap_finished(&mut self) -> Vec<BackgroundJob> {
        for job in self.jobs.iter_mut() {
            job.poll();
        }
        self.take_finished()
    }

    /// Block until every tracked job has terminated.
    pub fn wait_all(&mut self) -> Vec<BackgroundJob> {
        for job in self.jobs.iter_mut() {
            for pid in job.pids.drain(..) {
                if let Err(error) = wait_for(pid) {
                    warn!("lost track of background pid {}: {}", pid, error);
                }
            }
        }
        self.take_finished()
    }

    fn take_finished(&mut self) -> Vec<BackgroundJob> {
        let (finished, running): (Vec<_>, Vec<_>) = self.jobs.drain(..).partition(BackgroundJob::is_finished);
        self.jobs = running;
        for job in &finished {
            let elapsed = Local::now().signed_duration_since(job.started);
            info!("job {} done after {}ms: {}", job.id, elapsed.num_milliseconds(), job.line);
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::thread;
    use std::time::{Duration, Instant};

    fn start(program: &str, args: &[&str]) -> Pid {
        let child = Command::new(program).args(args).spawn().unwrap();
        Pid::from_raw(child.id() as i32)
    }

    #[test]
    fn ids_count_up_and_restart_when_empty() {
        let mut table = JobTable::new();
        assert_eq!(table.register(vec![start("true", &[])], "true"), 1);
        assert_eq!(table.register(vec![start("true", &[])], "true"), 2);
        assert_eq!(table.wait_all().len(), 2);
        assert!(table.is_empty());
        assert_eq!(table.register(vec![start("true", &[])], "true"), 1);
        table.wait_all();
    }

    #[test]
    fn reaps_finished_jobs_without_blocking() {
        let mut table = JobTable::new();
        let sleeper = start("sleep", &["30"]);
        table.register(vec![sleeper], "sleep 30");
        table.register(vec![start("true", &[])], "true");

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut done = Vec::new();
        while done.is_empty() && Instant::now() < deadline {
            done = table.reap_finished();
            thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].line, "true");
        assert_eq!(table.len(), 1);

        nix::sys::signal::kill(sleeper, nix::sys::signal::Signal::SIGKILL).unwrap();
        let rest = table.wait_all();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, 1);
    }
}
