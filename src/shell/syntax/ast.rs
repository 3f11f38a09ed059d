/// One process to run: its argument vector and its own redirections.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Stage<'a> {
    pub argv: Vec<&'a str>,
    pub input: Option<&'a str>,
    pub output: Option<&'a str>,
}

impl<'a> Stage<'a> {
    pub fn program(&self) -> Option<&'a str> {
        self.argv.first().cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }
}

/// A parsed command: a single stage, or two stages joined by a pipe.
///
/// Borrows its strings from the token slice it was parsed from and lives only
/// for one parse/execute cycle. `next` is where parsing resumes.
#[derive(PartialEq, Debug, Clone)]
pub struct Command<'a> {
    pub left: Stage<'a>,
    pub right: Option<Stage<'a>>,
    pub background: bool,
    pub next: usize,
}

impl<'a> Command<'a> {
    pub fn argv(&self) -> &[&'a str] {
        &self.left.argv
    }

    pub fn pipe_partner(&self) -> Option<&[&'a str]> {
        self.right.as_ref().map(|stage| &stage.argv[..])
    }

    pub fn is_piped(&self) -> bool {
        self.right.is_some()
    }

    /// File bound to the first stage's standard input.
    pub fn input_redirect(&self) -> Option<&'a str> {
        self.left.input
    }

    /// File bound to the last stage's standard output.
    pub fn output_redirect(&self) -> Option<&'a str> {
        match self.right {
            Some(ref right) => right.output,
            None => self.left.output,
        }
    }

    pub fn wait_for(&self) -> bool {
        !self.background
    }

    /// A command runs only if every stage names a program.
    pub fn is_runnable(&self) -> bool {
        self.stages().all(|stage| !stage.is_empty())
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage<'a>> {
        std::iter::once(&self.left).chain(self.right.iter())
    }
}
