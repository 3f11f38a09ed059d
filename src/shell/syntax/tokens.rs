use std::fmt;

/// The five control tokens understood by the parser. Anything else is a literal.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Operator {
    Pipe,
    Background,
    Sequence,
    Input,
    Redirect,
}

impl Operator {
    pub fn from_token(token: &str) -> Option<Operator> {
        match token {
            "|" => Some(Operator::Pipe),
            "&" => Some(Operator::Background),
            ";" => Some(Operator::Sequence),
            "<" => Some(Operator::Input),
            ">" => Some(Operator::Redirect),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Operator::Pipe => "|",
            Operator::Background => "&",
            Operator::Sequence => ";",
            Operator::Input => "<",
            Operator::Redirect => ">",
        }
    }

    /// True for the tokens that end a command (`;` and `&`).
    pub fn terminates(&self) -> bool {
        matches!(*self, Operator::Background | Operator::Sequence)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_control_tokens() {
        for op in &[Operator::Pipe, Operator::Background, Operator::Sequence, Operator::Input, Operator::Redirect] {
            assert_eq!(Operator::from_token(op.as_str()), Some(*op));
        }
    }

    #[test]
    fn glued_tokens_are_literals() {
        assert_eq!(Operator::from_token("ls>out.txt"), None);
        assert_eq!(Operator::from_token("&&"), None);
        assert_eq!(Operator::from_token("||"), None);
    }
}
