use super::prompt::PromptStyle;

pub const DEFAULT_HISTORY_SIZE: usize = 10;
pub const DEFAULT_MAX_LINE_LENGTH: usize = 80;
pub const DEFAULT_MAX_TOKENS: usize = DEFAULT_MAX_LINE_LENGTH / 2;

/// Limits and presentation settings for one shell instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub history_size: usize,
    pub max_line_length: usize,
    pub max_tokens: usize,
    pub prompt: PromptStyle,
    /// Block on unfinished background jobs when the shell exits.
    pub wait_on_exit: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            history_size: DEFAULT_HISTORY_SIZE,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_tokens: DEFAULT_MAX_TOKENS,
            prompt: PromptStyle::Plain,
            wait_on_exit: false,
        }
    }
}
