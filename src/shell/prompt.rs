use std::env;
use std::io;
use termion::color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// `osh> `
    Plain,
    /// `user@cwd osh> `, colored when stdout is a terminal.
    Rich,
}

impl PromptStyle {
    pub fn render(&self) -> String {
        match *self {
            PromptStyle::Plain => String::from("osh> "),
            PromptStyle::Rich => {
                let cwd = match env::current_dir() {
                    Ok(dir) => dir.display().to_string(),
                    Err(_) => String::from("(none)"),
                };
                let username = users::get_current_username()
                    .and_then(|name| name.into_string().ok())
                    .unwrap_or_else(|| String::from("(none)"));
                if termion::is_tty(&io::stdout()) {
                    format!(
                        "{}{}{}@{}{}{} osh> ",
                        color::Fg(color::Red),
                        username,
                        color::Fg(color::Reset),
                        color::Fg(color::Green),
                        cwd,
                        color::Fg(color::Reset)
                    )
                } else {
                    format!("{}@{} osh> ", username, cwd)
                }
            }
        }
    }
}
