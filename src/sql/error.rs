use thiserror::Error;

/// Failures raised while turning SQL text into a token tree
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("unterminated {what} starting at offset {offset}")]
    Unterminated { what: &'static str, offset: usize },

    #[error("unbalanced '{bracket}' at token {position}")]
    UnbalancedParenthesis { bracket: char, position: usize },
}
