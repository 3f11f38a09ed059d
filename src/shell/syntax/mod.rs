pub mod ast;
pub mod lexer;
pub mod parser;
pub mod tokens;

use self::tokens::Operator;
use thiserror::Error;

#[derive(PartialEq, Debug, Clone, Error)]
pub enum Error {
    #[error("too many arguments ({found}, at most {max})")]
    TooManyTokens { found: usize, max: usize },
    #[error("line too long ({length} characters, at most {max})")]
    LineTooLong { length: usize, max: usize },
    #[error("syntax error: `{operator}` needs a file name")]
    MissingRedirectTarget { operator: Operator, resume_at: usize },
    #[error("syntax error: only one `|` per command is supported")]
    ExtraPipeStage { resume_at: usize },
}

impl Error {
    /// Where the next command starts, for errors that only spoil one command.
    pub fn resume_at(&self) -> Option<usize> {
        match *self {
            Error::MissingRedirectTarget { resume_at, .. } | Error::ExtraPipeStage { resume_at } => Some(resume_at),
            _ => None,
        }
    }
}
