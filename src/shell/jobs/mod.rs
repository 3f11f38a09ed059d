use std::convert::Infallible;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::process;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use thiserror::Error;
use super::syntax::ast::{Command, Stage};

pub mod table;
pub use self::table::JobTable;

/// Failures in the shell process itself. The command being run is abandoned,
/// the rest of the line carries on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot create pipe: {}", .0.desc())]
    Pipe(#[source] Errno),
    #[error("cannot fork: {}", .0.desc())]
    Fork(#[source] Errno),
    #[error("{0}: argument contains a NUL byte")]
    Encoding(String),
    #[error("wait failed: {}", .0.desc())]
    Wait(#[source] Errno),
}

/// Failures inside a forked child, before its program starts. They are
/// reported on the child's stderr and end only that child.
#[derive(Debug, Error)]
enum ChildError {
    #[error("{path}: {source}")]
    Redirect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot rebind standard streams: {}", .0.desc())]
    Dup(#[source] Errno),
    #[error("{program}: {}", exec_reason(.source))]
    Exec {
        program: String,
        #[source]
        source: Errno,
    },
}

fn exec_reason(errno: &Errno) -> &'static str {
    match *errno {
        Errno::ENOENT => "command not found",
        other => other.desc(),
    }
}

impl ChildError {
    fn exit_code(&self) -> i32 {
        match *self {
            ChildError::Exec { .. } => 127,
            _ => 1,
        }
    }
}

/// Program name and argument vector, encoded before forking so the child
/// has nothing left to fail on but the redirections and the exec itself.
struct Program {
    name: String,
    path: CString,
    argv: Vec<CString>,
}

impl Program {
    fn new(stage: &Stage) -> Result<Program, Error> {
        let name = stage.program().unwrap_or_default();
        let encode = |arg: &str| CString::new(arg).map_err(|_| Error::Encoding(name.to_string()));
        let argv = stage.argv.iter().map(|arg| encode(*arg)).collect::<Result<Vec<_>, _>>()?;
        Ok(Program {
            name: name.to_string(),
            path: encode(name)?,
            argv: argv,
        })
    }
}

/// Standard streams a child takes from the shell before applying its own
/// redirections, plus the inherited pipe ends it has to close. Background
/// children keep the shell's ignored SIGINT/SIGQUIT.
#[derive(Default)]
struct Wiring<'p> {
    stdin: Option<BorrowedFd<'p>>,
    stdout: Option<BorrowedFd<'p>>,
    close: Vec<BorrowedFd<'p>>,
    background: bool,
}

fn redirect(fd: RawFd, target: RawFd) -> Result<(), ChildError> {
    unistd::dup2(fd, target).map(|_| ()).map_err(ChildError::Dup)
}

fn restore_default_signals(background: bool) {
    let signals: &[Signal] = if background {
        &[Signal::SIGPIPE]
    } else {
        &[Signal::SIGINT, Signal::SIGQUIT, Signal::SIGPIPE]
    };
    for sig in signals {
        unsafe {
            let _ = signal::signal(*sig, SigHandler::SigDfl);
        }
    }
}

fn exec_child(program: &Program, stage: &Stage, wiring: &Wiring) -> Result<Infallible, ChildError> {
    if let Some(fd) = wiring.stdin {
        redirect(fd.as_raw_fd(), STDIN_FILENO)?;
    }
    if let Some(fd) = wiring.stdout {
        redirect(fd.as_raw_fd(), STDOUT_FILENO)?;
    }
    for fd in wiring.close.iter().filter(|fd| fd.as_raw_fd() > STDERR_FILENO) {
        let _ = unistd::close(fd.as_raw_fd());
    }
    if let Some(path) = stage.input {
        let file = File::open(path).map_err(|source| ChildError::Redirect { path: path.to_string(), source: source })?;
        redirect(file.as_raw_fd(), STDIN_FILENO)?;
    }
    if let Some(path) = stage.output {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o644)
            .open(path)
            .map_err(|source| ChildError::Redirect { path: path.to_string(), source: source })?;
        redirect(file.as_raw_fd(), STDOUT_FILENO)?;
    }
    restore_default_signals(wiring.background);
    unistd::execvp(&program.path, &program.argv).map_err(|source| ChildError::Exec {
        program: program.name.clone(),
        source: source,
    })
}

fn spawn(program: &Program, stage: &Stage, wiring: &Wiring) -> Result<Pid, Error> {
    // Anything left in the buffer would be written again by the child.
    let _ = io::stdout().flush();
    match unsafe { unistd::fork() }.map_err(Error::Fork)? {
        ForkResult::Parent { child } => {
            debug!("started `{}` as pid {}", program.name, child);
            Ok(child)
        }
        ForkResult::Child => {
            let error = match exec_child(program, stage, wiring) {
                Ok(never) => match never {},
                Err(error) => error,
            };
            let _ = writeln!(io::stderr(), "osh: {}", error);
            process::exit(error.exit_code());
        }
    }
}

/// Processes started for one command, and the error that stopped the rest
/// from starting, if any.
struct Spawned {
    pids: Vec<Pid>,
    failure: Option<Error>,
}

/// A pipe whose ends don't survive exec. Children get their copy through
/// `dup2`, which clears the flag on the new descriptor.
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    unistd::pipe2(OFlag::O_CLOEXEC)
}

fn spawn_pipeline(left: (&Program, &Stage), right: (&Program, &Stage), background: bool) -> Spawned {
    let (reader, writer) = match cloexec_pipe() {
        Ok(ends) => ends,
        Err(errno) => return Spawned { pids: Vec::new(), failure: Some(Error::Pipe(errno)) },
    };
    let mut spawned = Spawned { pids: Vec::with_capacity(2), failure: None };
    let left_wiring = Wiring {
        stdin: None,
        stdout: Some(writer.as_fd()),
        close: vec![reader.as_fd(), writer.as_fd()],
        background: background,
    };
    match spawn(left.0, left.1, &left_wiring) {
        Ok(pid) => spawned.pids.push(pid),
        Err(error) => {
            spawned.failure = Some(error);
            return spawned;
        }
    }
    let right_wiring = Wiring {
        stdin: Some(reader.as_fd()),
        stdout: None,
        close: vec![reader.as_fd(), writer.as_fd()],
        background: background,
    };
    match spawn(right.0, right.1, &right_wiring) {
        Ok(pid) => spawned.pids.push(pid),
        Err(error) => spawned.failure = Some(error),
    }
    // The reader only sees end-of-file once the shell's copy of the write end is gone.
    drop(reader);
    drop(writer);
    spawned
}

/// Block until `pid` terminates.
pub fn wait_for(pid: Pid) -> Result<WaitStatus, Error> {
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            result => return result.map_err(Error::Wait),
        }
    }
}

/// Run one parsed command.
///
/// Foreground commands are waited for, stage by stage, once every stage has
/// been started. Background commands are handed to `jobs` under `label`.
/// Commands with an empty stage do nothing.
pub fn execute(command: &Command, label: &str, jobs: &mut JobTable) -> Result<(), Error> {
    if !command.is_runnable() {
        debug!("skipping empty command at token {}", command.next);
        return Ok(());
    }
    debug!(
        "running {:?} (piped: {}, to {:?}), input {:?}, output {:?}, wait {}",
        command.argv(),
        command.is_piped(),
        command.pipe_partner(),
        command.input_redirect(),
        command.output_redirect(),
        command.wait_for()
    );
    let left = Program::new(&command.left)?;
    let spawned = match command.right {
        Some(ref right_stage) => {
            let right = Program::new(right_stage)?;
            spawn_pipeline((&left, &command.left), (&right, right_stage), command.background)
        }
        None => {
            let wiring = Wiring { background: command.background, ..Wiring::default() };
            match spawn(&left, &command.left, &wiring) {
                Ok(pid) => Spawned { pids: vec![pid], failure: None },
                Err(error) => Spawned { pids: Vec::new(), failure: Some(error) },
            }
        }
    };
    let mut failure = spawned.failure;
    if command.wait_for() {
        for pid in spawned.pids {
            match wait_for(pid) {
                Ok(status) => debug!("pid {} finished: {:?}", pid, status),
                Err(error) => {
                    warn!("could not wait for pid {}: {}", pid, error);
                    failure = failure.or(Some(error));
                }
            }
        }
    } else if !spawned.pids.is_empty() {
        jobs.register(spawned.pids, label);
    }
    match failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
