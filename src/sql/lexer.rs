//! SQL Lexer
//!
//! Converts raw SQL text into a flat vector of tokens. Every byte of the input
//! ends up in exactly one token, whitespace and comments included, so the
//! original text can be reproduced from the token stream. Runs of symbols
//! the lexer has no rule for (`@>`, `#>`, `!`) lex as operators, so only
//! control characters and unterminated literals are rejected.
//!
//! # Example
//! "SELECT count(*)" becomes:
//! [Dml("SELECT"), Whitespace(" "), Name("count"), Punctuation("("),
//!  Wildcard("*"), Punctuation(")")]

use super::error::ParseError;
use super::token::{classify_word, Token, TokenKind};
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while, take_while1},
    character::complete::{char, digit0, digit1, one_of, satisfy},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::{pair, tuple},
    IResult,
};
use tracing::trace;

type Lexed<'a> = IResult<&'a str, Token>;

fn whitespace(input: &str) -> Lexed<'_> {
    map(take_while1(char::is_whitespace), |text: &str| {
        Token::new(TokenKind::Whitespace, text)
    })(input)
}

fn comment(input: &str) -> Lexed<'_> {
    let line = recognize(pair(tag("--"), take_while(|c: char| c != '\n')));
    let block = recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))));
    map(alt((line, block)), |text: &str| {
        Token::new(TokenKind::Comment, text)
    })(input)
}

/// Quoted text where a doubled quote character escapes itself
fn quoted<'a>(quote: char, escape: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    let body: &'static str = match quote {
        '\'' => "'",
        '"' => "\"",
        _ => "`",
    };
    recognize(tuple((
        char(quote),
        many0(alt((tag(escape), is_not(body)))),
        char(quote),
    )))
}

fn string(input: &str) -> Lexed<'_> {
    map(quoted('\'', "''"), |text: &str| {
        Token::new(TokenKind::String, text)
    })(input)
}

/// Opening tag of a dollar-quoted string: `$$` or `$tag$`
fn dollar_tag(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        char('$'),
        opt(pair(
            satisfy(|c| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
        char('$'),
    )))(input)
}

fn dollar_string(input: &str) -> Lexed<'_> {
    let (_, open) = dollar_tag(input)?;
    map(
        recognize(tuple((tag(open), take_until(open), tag(open)))),
        |text: &str| Token::new(TokenKind::String, text),
    )(input)
}

fn quoted_name(input: &str) -> Lexed<'_> {
    let bracketed = recognize(tuple((char('['), take_until("]"), char(']'))));
    map(
        alt((quoted('"', "\"\""), quoted('`', "``"), bracketed)),
        |text: &str| Token::new(TokenKind::Name, text),
    )(input)
}

fn number(input: &str) -> Lexed<'_> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = opt(tuple((one_of("eE"), opt(one_of("+-")), digit1)));
    map(recognize(pair(mantissa, exponent)), |text: &str| {
        Token::new(TokenKind::Number, text)
    })(input)
}

fn word(input: &str) -> Lexed<'_> {
    let head = satisfy(|c| c.is_alphabetic() || c == '_');
    let tail = take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$');
    map(recognize(pair(head, tail)), |text: &str| {
        Token::new(classify_word(text), text)
    })(input)
}

fn placeholder(input: &str) -> Lexed<'_> {
    let named = recognize(pair(
        one_of("$:@"),
        take_while1(|c: char| c.is_alphanumeric() || c == '_'),
    ));
    map(alt((recognize(char('?')), named)), |text: &str| {
        Token::new(TokenKind::Placeholder, text)
    })(input)
}

fn comparison(input: &str) -> Lexed<'_> {
    map(
        alt((
            tag("<>"),
            tag("!="),
            tag("<="),
            tag(">="),
            tag("=="),
            tag("="),
            tag("<"),
            tag(">"),
        )),
        |text: &str| Token::new(TokenKind::Comparison, text),
    )(input)
}

fn operator(input: &str) -> Lexed<'_> {
    map(
        alt((
            tag("||"),
            tag("::"),
            tag("->>"),
            tag("->"),
            recognize(one_of("+-/%&|^~")),
        )),
        |text: &str| Token::new(TokenKind::Operator, text),
    )(input)
}

fn wildcard(input: &str) -> Lexed<'_> {
    map(tag("*"), |text: &str| Token::new(TokenKind::Wildcard, text))(input)
}

fn punctuation(input: &str) -> Lexed<'_> {
    map(recognize(one_of("(),;.")), |text: &str| {
        Token::new(TokenKind::Punctuation, text)
    })(input)
}

fn symbol(input: &str) -> Lexed<'_> {
    let is_symbol = |c: char| {
        !c.is_control()
            && !c.is_whitespace()
            && !c.is_alphanumeric()
            && !"_(),;.'\"`[$".contains(c)
    };
    map(take_while1(is_symbol), |text: &str| {
        Token::new(TokenKind::Operator, text)
    })(input)
}

fn token(input: &str) -> Lexed<'_> {
    alt((
        whitespace,
        comment,
        string,
        dollar_string,
        quoted_name,
        number,
        word,
        operator,
        placeholder,
        comparison,
        wildcard,
        punctuation,
        symbol,
    ))(input)
}

/// Describes why no token could be read at the start of `rest`
fn failure_at(sql: &str, rest: &str, ch: char) -> ParseError {
    let offset = sql.len() - rest.len();
    let what = if rest.starts_with("/*") {
        Some("block comment")
    } else if dollar_tag(rest).is_ok() {
        Some("dollar-quoted string")
    } else {
        match ch {
            '\'' => Some("string literal"),
            '"' | '`' | '[' => Some("quoted identifier"),
            _ => None,
        }
    };
    match what {
        Some(what) => ParseError::Unterminated { what, offset },
        None => ParseError::UnexpectedCharacter { ch, offset },
    }
}

/// Converts a SQL string into a vector of tokens
pub fn tokenize(sql: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut rest = sql;

    while let Some(ch) = rest.chars().next() {
        match token(rest) {
            Ok((remaining, token)) => {
                trace!("token {:?} {:?}", token.kind, token.value);
                tokens.push(token);
                rest = remaining;
            }
            Err(_) => return Err(failure_at(sql, rest, ch)),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens
            .iter()
            .filter(|token| !token.is_whitespace())
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_simple_count() -> Result<()> {
        let tokens = tokenize("SELECT COUNT(*) FROM apples")?;

        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Dml,
                TokenKind::Name,
                TokenKind::Punctuation,
                TokenKind::Wildcard,
                TokenKind::Punctuation,
                TokenKind::Keyword,
                TokenKind::Name,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_tokens_reproduce_input() -> Result<()> {
        let sql = "select a.b, 'it''s' -- note\n, x::int /* c */ FROM \"T\" where y >= 1.5e3;";
        let tokens = tokenize(sql)?;
        let text: String = tokens.iter().map(|token| token.value.as_str()).collect();
        assert_eq!(text, sql);
        Ok(())
    }

    #[test]
    fn test_literals_and_placeholders() -> Result<()> {
        let tokens = tokenize("'a''b' 42 .5 ? $1 :name @v")?;
        let values: Vec<(TokenKind, &str)> = tokens
            .iter()
            .filter(|token| !token.is_whitespace())
            .map(|token| (token.kind, token.value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![
                (TokenKind::String, "'a''b'"),
                (TokenKind::Number, "42"),
                (TokenKind::Number, ".5"),
                (TokenKind::Placeholder, "?"),
                (TokenKind::Placeholder, "$1"),
                (TokenKind::Placeholder, ":name"),
                (TokenKind::Placeholder, "@v"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_comments_are_whitespace() -> Result<()> {
        let tokens = tokenize("-- leading\n/* block */SELECT")?;
        assert_eq!(kinds(&tokens), vec![TokenKind::Dml]);
        Ok(())
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize("SELECT 'abc"),
            Err(ParseError::Unterminated {
                what: "string literal",
                offset: 7
            })
        );
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(
            tokenize("SELECT \u{1}"),
            Err(ParseError::UnexpectedCharacter { ch: '\u{1}', offset: 7 })
        );
    }

    #[test]
    fn test_dialect_operators() -> Result<()> {
        let tokens = tokenize("tags @> '{a}' AND j #> '{x}' OR !flag")?;
        let operators: Vec<&str> = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::Operator)
            .map(|token| token.value.as_str())
            .collect();
        assert_eq!(operators, vec!["@>", "#>", "!"]);
        Ok(())
    }

    #[test]
    fn test_dollar_quoted_strings() -> Result<()> {
        let tokens = tokenize("$$it's$$ $fn$ a $$ b $fn$ $1")?;
        let values: Vec<(TokenKind, &str)> = tokens
            .iter()
            .filter(|token| !token.is_whitespace())
            .map(|token| (token.kind, token.value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![
                (TokenKind::String, "$$it's$$"),
                (TokenKind::String, "$fn$ a $$ b $fn$"),
                (TokenKind::Placeholder, "$1"),
            ]
        );
        assert_eq!(
            tokenize("SELECT $$open"),
            Err(ParseError::Unterminated {
                what: "dollar-quoted string",
                offset: 7
            })
        );
        Ok(())
    }
}
