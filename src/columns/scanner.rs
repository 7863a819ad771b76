use crate::sql::token::TokenKind;
use crate::sql::tree::{Node, Statement};
use tracing::trace;

/// Returns the top-level nodes between `SELECT` and the following `FROM`
///
/// Only direct children of the statement are inspected, so a subquery's own
/// SELECT or FROM never moves the boundaries. Whitespace is dropped from the
/// span. Without a top-level SELECT the span is empty; without a top-level
/// FROM it runs to the end of the statement.
pub fn select_span(statement: &Statement) -> Vec<&Node> {
    let mut select_seen = false;
    let mut span = Vec::new();

    for node in &statement.tokens {
        if node.is_whitespace() {
            continue;
        }
        let token = node.as_token();
        if !select_seen {
            select_seen = token.map_or(false, |token| {
                token.kind == TokenKind::Dml && token.normalized() == "SELECT"
            });
            continue;
        }
        if token.map_or(false, |token| {
            token.kind == TokenKind::Keyword && token.normalized() == "FROM"
        }) {
            break;
        }
        span.push(node);
    }

    trace!("select span has {} nodes", span.len());
    span
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_statement;
    use anyhow::Result;

    fn span_text(sql: &str) -> Result<Vec<String>> {
        let statement = parse_statement(sql)?;
        Ok(select_span(&statement)
            .into_iter()
            .map(|node| node.to_string())
            .collect())
    }

    #[test]
    fn test_span_stops_at_from() -> Result<()> {
        assert_eq!(span_text("SELECT a, b FROM t WHERE c = 1")?, vec!["a, b"]);
        Ok(())
    }

    #[test]
    fn test_span_is_case_insensitive() -> Result<()> {
        assert_eq!(span_text("select a from t")?, span_text("SELECT a FROM t")?);
        Ok(())
    }

    #[test]
    fn test_span_without_from_runs_to_end() -> Result<()> {
        assert_eq!(span_text("SELECT 1;")?, vec!["1", ";"]);
        Ok(())
    }

    #[test]
    fn test_tokens_before_select_are_skipped() -> Result<()> {
        assert_eq!(
            span_text("/* report */ INSERT INTO t2 SELECT a FROM t")?,
            vec!["a"]
        );
        Ok(())
    }

    #[test]
    fn test_nested_from_does_not_end_span() -> Result<()> {
        assert_eq!(
            span_text("SELECT (SELECT max(b) FROM u) AS m, c FROM t")?,
            vec!["(SELECT max(b) FROM u) AS m, c"]
        );
        Ok(())
    }

    #[test]
    fn test_no_select_gives_empty_span() -> Result<()> {
        assert!(span_text("UPDATE t SET x=1;")?.is_empty());
        assert!(span_text("")?.is_empty());
        assert!(span_text("   \n")?.is_empty());
        Ok(())
    }
}
