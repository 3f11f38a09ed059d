use super::ast::*;
use super::tokens::Operator;
use super::Error;

/// Why a stage scan stopped.
#[derive(PartialEq, Debug, Clone, Copy)]
enum Stop {
    Pipe,
    Terminator(Operator),
    End,
}

/// Index just past the next `;` or `&` at or after `from`, or the end.
fn resume_after<S: AsRef<str>>(tokens: &[S], from: usize) -> usize {
    tokens
        .iter()
        .enumerate()
        .skip(from)
        .find(|&(_, token)| Operator::from_token(token.as_ref()).map_or(false, |op| op.terminates()))
        .map_or(tokens.len(), |(index, _)| index + 1)
}

/// Collect one stage starting at `start`. Returns the stage, the index of the
/// token that stopped the scan (or `tokens.len()`), and what that token was.
fn parse_stage<'a, S: AsRef<str>>(tokens: &'a [S], start: usize) -> Result<(Stage<'a>, usize, Stop), Error> {
    let mut stage = Stage::default();
    let mut index = start;
    while let Some(token) = tokens.get(index) {
        let token = token.as_ref();
        match Operator::from_token(token) {
            None => {
                stage.argv.push(token);
                index += 1;
            }
            Some(op @ Operator::Input) | Some(op @ Operator::Redirect) => {
                let target = match tokens.get(index + 1).map(|t| t.as_ref()) {
                    Some(target) if Operator::from_token(target).is_none() => target,
                    _ => {
                        return Err(Error::MissingRedirectTarget {
                            operator: op,
                            resume_at: resume_after(tokens, index + 1),
                        })
                    }
                };
                if op == Operator::Input {
                    stage.input = Some(target);
                } else {
                    stage.output = Some(target);
                }
                index += 2;
            }
            Some(Operator::Pipe) => return Ok((stage, index, Stop::Pipe)),
            Some(op) => return Ok((stage, index, Stop::Terminator(op))),
        }
    }
    Ok((stage, index, Stop::End))
}

/// Parse the command that starts at `start`.
///
/// Exactly one terminator is consumed: `;`, `&`, or the end of the tokens. A
/// `|` captures the right-hand stage up to the next terminator, and that
/// terminator decides the wait policy for both stages. The returned command's
/// `next` is where the following command begins.
pub fn parse<'a, S: AsRef<str>>(tokens: &'a [S], start: usize) -> Result<Command<'a>, Error> {
    let (left, at, stop) = parse_stage(tokens, start)?;
    let (right, at, stop) = match stop {
        Stop::Pipe => {
            let (right, at, stop) = parse_stage(tokens, at + 1)?;
            if stop == Stop::Pipe {
                return Err(Error::ExtraPipeStage { resume_at: resume_after(tokens, at) });
            }
            (Some(right), at, stop)
        }
        _ => (None, at, stop),
    };
    let (background, next) = match stop {
        Stop::Terminator(op) => (op == Operator::Background, at + 1),
        _ => (false, at),
    };
    Ok(Command {
        left: left,
        right: right,
        background: background,
        next: next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    fn parse_all<'a>(tokens: &'a [&'a str]) -> Vec<Command<'a>> {
        let mut commands = Vec::new();
        let mut cursor = 0;
        while cursor < tokens.len() {
            let command = parse(tokens, cursor).unwrap();
            assert!(command.next > cursor, "parser must make progress");
            cursor = command.next;
            commands.push(command);
        }
        commands
    }

    #[test]
    fn plain_command_spans_everything() {
        let t = tokens("grep -n foo bar.txt");
        let command = parse(&t, 0).unwrap();
        assert_eq!(command.argv(), &["grep", "-n", "foo", "bar.txt"]);
        assert!(command.wait_for());
        assert!(!command.is_piped());
        assert_eq!(command.input_redirect(), None);
        assert_eq!(command.output_redirect(), None);
        assert_eq!(command.next, t.len());
    }

    #[test]
    fn sequence_token_is_consumed() {
        let t = tokens("echo a ; echo b");
        let command = parse(&t, 0).unwrap();
        assert_eq!(command.argv(), &["echo", "a"]);
        assert_eq!(command.next, 3);
        assert!(!command.argv().contains(&";"));
        assert!(command.wait_for());
    }

    #[test]
    fn foreground_then_background() {
        let t = tokens("ls -al ; whoami &");
        let commands = parse_all(&t);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].argv(), &["ls", "-al"]);
        assert!(commands[0].wait_for());
        assert_eq!(commands[1].argv(), &["whoami"]);
        assert!(!commands[1].wait_for());
        assert_eq!(commands[1].next, t.len());
    }

    #[test]
    fn redirects_anywhere_in_the_arguments() {
        let t = tokens("sort < in.txt -r > out.txt -u");
        let command = parse(&t, 0).unwrap();
        assert_eq!(command.argv(), &["sort", "-r", "-u"]);
        assert_eq!(command.input_redirect(), Some("in.txt"));
        assert_eq!(command.output_redirect(), Some("out.txt"));
    }

    #[test]
    fn pipe_with_redirects_on_both_sides() {
        let t = tokens("cat < in.txt | sort > out.txt");
        let command = parse(&t, 0).unwrap();
        assert_eq!(command.argv(), &["cat"]);
        assert_eq!(command.pipe_partner(), Some(&["sort"][..]));
        assert_eq!(command.input_redirect(), Some("in.txt"));
        assert_eq!(command.output_redirect(), Some("out.txt"));
        assert!(command.wait_for());
        assert_eq!(command.next, t.len());
    }

    #[test]
    fn pipe_shares_the_trailing_wait_policy() {
        let t = tokens("yes | head -n 1 & echo done");
        let command = parse(&t, 0).unwrap();
        assert_eq!(command.argv(), &["yes"]);
        assert_eq!(command.pipe_partner(), Some(&["head", "-n", "1"][..]));
        assert!(command.background);
        assert_eq!(command.next, 6);

        let rest = parse(&t, command.next).unwrap();
        assert_eq!(rest.argv(), &["echo", "done"]);
        assert!(rest.wait_for());
    }

    #[test]
    fn stray_separators_give_empty_commands() {
        let t = tokens("; ; ls");
        let commands = parse_all(&t);
        assert_eq!(commands.len(), 3);
        assert!(!commands[0].is_runnable());
        assert!(!commands[1].is_runnable());
        assert!(commands[2].is_runnable());
    }

    #[test]
    fn empty_pipe_side_is_not_runnable() {
        let t = tokens("echo hi |");
        let command = parse(&t, 0).unwrap();
        assert!(command.is_piped());
        assert!(!command.is_runnable());
    }

    #[test]
    fn missing_redirect_target() {
        let t = tokens("cat < ; ls");
        match parse(&t, 0) {
            Err(Error::MissingRedirectTarget { operator: Operator::Input, resume_at: 3 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        let t = tokens("echo hi >");
        assert_eq!(
            parse(&t, 0),
            Err(Error::MissingRedirectTarget { operator: Operator::Redirect, resume_at: 3 })
        );
    }

    #[test]
    fn second_pipe_is_rejected() {
        let t = tokens("a | b | c ; d");
        assert_eq!(parse(&t, 0), Err(Error::ExtraPipeStage { resume_at: 6 }));
        assert_eq!(parse(&t, 6).unwrap().argv(), &["d"]);
    }

    #[test]
    fn parsing_does_not_disturb_the_tokens() {
        let t = tokens("cat < a | wc ; ls &");
        let first = parse(&t, 0).unwrap();
        let again = parse(&t, 0).unwrap();
        assert_eq!(first, again);
        assert_eq!(t, tokens("cat < a | wc ; ls &"));
    }

    #[test]
    fn works_on_owned_tokens() {
        let owned: Vec<String> = vec!["ls".into(), "&".into()];
        let command = parse(&owned, 0).unwrap();
        assert_eq!(command.argv(), &["ls"]);
        assert!(command.background);
    }
}
