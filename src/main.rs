#[macro_use]
extern crate log;

mod shell;

use clap::Parser;
use shell::config::{self, Config};
use shell::prompt::PromptStyle;
use std::io;
use std::process;

/// A small job-control shell: `;`, `&`, a single `|`, `<` and `>`.
#[derive(Parser, Debug)]
#[command(name = "osh", version)]
struct Args {
    /// Run LINE and exit instead of reading commands from stdin
    #[arg(short = 'c', value_name = "LINE")]
    command: Option<String>,

    /// Number of lines kept for `!!`
    #[arg(long, default_value_t = config::DEFAULT_HISTORY_SIZE)]
    history_size: usize,

    /// Longest accepted input line, in characters
    #[arg(long, default_value_t = config::DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,

    /// Most tokens accepted on one line
    #[arg(long, default_value_t = config::DEFAULT_MAX_TOKENS)]
    max_tokens: usize,

    /// Show user and working directory in the prompt
    #[arg(long)]
    rich_prompt: bool,

    /// Wait for background jobs before exiting
    #[arg(long)]
    wait_on_exit: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Config {
        Config {
            history_size: args.history_size,
            max_line_length: args.max_line_length,
            max_tokens: args.max_tokens,
            prompt: if args.rich_prompt { PromptStyle::Rich } else { PromptStyle::Plain },
            wait_on_exit: args.wait_on_exit,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let mut args = Args::parse();
    let command = args.command.take();
    let mut s = shell::Shell::new(Config::from(args));
    match command {
        Some(line) => s.run_command(&line),
        None => {
            let stdin = io::stdin();
            let interactive = termion::is_tty(&stdin);
            if let Err(error) = s.run(stdin.lock(), interactive) {
                eprintln!("osh: input error: {}", error);
                process::exit(1);
            }
        }
    }
}
