pub mod config;
mod history;
mod jobs;
pub mod prompt;
mod syntax;
use self::config::Config;
use self::history::History;
use self::jobs::JobTable;
use self::syntax::{lexer, parser};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

const HISTORY_REPEAT: &str = "!!";
const EXIT: &str = "exit";
const ASCII: &str = "ascii";

const ASCII_ART: &str = r#"
   /\_/\      ****************************
  ( o.o )     *      osh, at your service  *
   > ^ <      ****************************
"#;

/// Whether the shell should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Keeps Ctrl-C and Ctrl-\ away from the shell while it is interactive, so
/// they only reach the foreground command. The old dispositions come back on drop.
struct InterruptGuard {
    saved: Vec<(Signal, SigAction)>,
}

impl InterruptGuard {
    pub fn new() -> nix::Result<InterruptGuard> {
        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        let mut guard = InterruptGuard { saved: Vec::new() };
        for &sig in &[Signal::SIGINT, Signal::SIGQUIT] {
            let previous = unsafe { signal::sigaction(sig, &ignore) }?;
            guard.saved.push((sig, previous));
        }
        Ok(guard)
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        for &(sig, ref previous) in self.saved.iter().rev() {
            if let Err(errno) = unsafe { signal::sigaction(sig, previous) } {
                warn!("failed to restore {}: {}", sig, errno.desc());
            }
        }
    }
}

fn report<E: Display>(error: &E) {
    eprintln!("osh: {}", error);
}

/// Text of one command for job listings, without its terminator.
fn describe(tokens: &[String]) -> String {
    let end = match tokens.last().map(String::as_str) {
        Some(";") | Some("&") => tokens.len() - 1,
        _ => tokens.len(),
    };
    tokens[..end].join(" ")
}

pub struct Shell {
    config: Config,
    history: History,
    jobs: JobTable,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Shell {
            history: History::with_capacity(config.history_size),
            jobs: JobTable::new(),
            config: config,
        }
    }

    /// Read and run lines until `exit` or end of input.
    ///
    /// When `interactive`, a prompt is shown before each line and the shell
    /// itself ignores SIGINT/SIGQUIT.
    pub fn run<R: BufRead>(&mut self, mut input: R, interactive: bool) -> io::Result<()> {
        let _guard = if interactive {
            InterruptGuard::new()
                .map_err(|errno| warn!("cannot ignore interrupts: {}", errno.desc()))
                .ok()
        } else {
            None
        };
        loop {
            self.reap_background();
            if interactive {
                print!("{}", self.config.prompt.render());
                io::stdout().flush()?;
            }
            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    if interactive {
                        println!();
                    }
                    break;
                }
                Ok(_) => {
                    if self.process_line(&line) == Flow::Exit {
                        break;
                    }
                }
                Err(ref error) if error.kind() == io::ErrorKind::InvalidData => {
                    report(&"input is not valid UTF-8");
                }
                Err(error) => return Err(error),
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Run a single line, then shut down.
    pub fn run_command(&mut self, line: &str) {
        self.process_line(line);
        self.shutdown();
    }

    /// Handle one line of input: builtins, then every command on the line in
    /// order. The line is added to the history unless it was blank, too long,
    /// `exit`, or the repeat token.
    pub fn process_line(&mut self, raw: &str) -> Flow {
        let line = raw.trim_end_matches(&['\n', '\r'][..]);
        let length = line.chars().count();
        if length > self.config.max_line_length {
            report(&syntax::Error::LineTooLong { length: length, max: self.config.max_line_length });
            return Flow::Continue;
        }
        match line.trim() {
            "" => Flow::Continue,
            EXIT => Flow::Exit,
            HISTORY_REPEAT => self.repeat_last(),
            _ => {
                let flow = self.dispatch(line);
                if self.history.record(line) {
                    debug!("history holds {} of {} lines", self.history.len(), self.history.capacity());
                }
                flow
            }
        }
    }

    fn repeat_last(&mut self) -> Flow {
        let line = match self.history.most_recent() {
            Some(line) => line.to_string(),
            None => {
                println!("No commands in history.");
                return Flow::Continue;
            }
        };
        println!("{}", line);
        self.dispatch(&line)
    }

    fn dispatch(&mut self, line: &str) -> Flow {
        if line.trim() == ASCII {
            print!("{}", ASCII_ART);
        } else {
            self.execute_line(line);
        }
        Flow::Continue
    }

    fn execute_line(&mut self, line: &str) {
        let tokens = match lexer::tokenize(line, self.config.max_tokens) {
            Ok(tokens) => tokens,
            Err(error) => {
                report(&error);
                return;
            }
        };
        debug!("tokens: {:?}", tokens);
        let mut cursor = 0;
        while cursor < tokens.len() {
            match parser::parse(&tokens, cursor) {
                Ok(command) => {
                    debug!("command: {:?}", command);
                    let label = describe(&tokens[cursor..command.next]);
                    if let Err(error) = jobs::execute(&command, &label, &mut self.jobs) {
                        report(&error);
                    }
                    cursor = command.next;
                }
                Err(error) => {
                    report(&error);
                    cursor = error.resume_at().unwrap_or(tokens.len());
                }
            }
        }
    }

    fn reap_background(&mut self) {
        for job in self.jobs.reap_finished() {
            println!("[{}] Done    {}", job.id, job.line);
        }
    }

    fn shutdown(&mut self) {
        if self.config.wait_on_exit {
            for job in self.jobs.wait_all() {
                println!("[{}] Done    {}", job.id, job.line);
            }
        } else {
            self.reap_background();
            if !self.jobs.is_empty() {
                info!("leaving {} background job(s) running", self.jobs.len());
            }
            for job in self.jobs.iter() {
                debug!("job {} still running as {:?}: {}", job.id, job.pids(), job.line);
            }
        }
    }
}
