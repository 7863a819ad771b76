//! The input to the front-end is SQL text. The output is the token tree of its first statement.
pub mod error;
pub mod grouper;
pub mod lexer;
pub mod token;
pub mod tree;
