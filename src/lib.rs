//! Static extraction of the column names a SQL SELECT statement produces
//!
//! The pipeline has two halves:
//! 1. [`sql`] turns SQL text into a hierarchical token tree
//! 2. [`columns`] scans the tree for the SELECT clause and names its columns
//!
//! # Example
//! ```
//! let columns = select_columns::extract_columns("select distinct id, count(*) as cnt from users u")?;
//! assert_eq!(columns, vec!["id", "cnt"]);
//! # Ok::<(), select_columns::ParseError>(())
//! ```

pub mod columns;
pub mod sql;

pub use sql::error::ParseError;
pub use sql::tree::{Node, Statement};

use tracing::debug;

/// Tokenizes and groups the first statement of `sql`
pub fn parse_statement(sql: &str) -> Result<Statement, ParseError> {
    let tokens = sql::lexer::tokenize(sql)?;
    sql::grouper::group(tokens)
}

/// Returns the display name of every column the statement selects, in order
///
/// Statements without a top-level SELECT yield an empty list. Tokenizer
/// failures are returned unchanged.
pub fn extract_columns(sql: &str) -> Result<Vec<String>, ParseError> {
    let statement = parse_statement(sql)?;
    let span = columns::scanner::select_span(&statement);
    let names = columns::extractor::extract(&span);
    debug!("extracted {} columns", names.len());
    Ok(names)
}
