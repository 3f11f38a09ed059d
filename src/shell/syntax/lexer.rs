use nom::bytes::complete::take_till1;
use nom::character::complete::space0;
use nom::multi::many0;
use nom::sequence::{preceded, terminated};
use nom::IResult;
use super::Error;

fn is_separator(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(is_separator)(input)
}

fn words(input: &str) -> IResult<&str, Vec<&str>> {
    preceded(space0, many0(terminated(word, space0)))(input)
}

/// Split a line into whitespace-delimited tokens.
///
/// Only spaces and tabs separate tokens, so operators must stand alone:
/// `ls>out.txt` stays a single token. Blank input yields no tokens.
pub fn tokenize(line: &str, max_tokens: usize) -> Result<Vec<String>, Error> {
    // `word` consumes everything that isn't a separator, and `space0` every
    // separator, so `words` can't fail or leave input behind.
    let found = match words(line) {
        Ok((_, found)) => found,
        Err(_) => Vec::new(),
    };
    if found.len() > max_tokens {
        return Err(Error::TooManyTokens { found: found.len(), max: max_tokens });
    }
    Ok(found.into_iter().map(String::from).collect())
}
