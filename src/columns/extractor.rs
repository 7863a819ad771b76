use super::resolver::display_name;
use crate::sql::token::TokenKind;
use crate::sql::tree::Node;
use tracing::trace;

/// Where a node sits relative to the column list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Directly in the select span or a member of a top-level identifier list
    Item,
    /// Anywhere inside a generic group
    Nested,
}

/// Walks the select span depth first and collects one display name per
/// column expression, in source order
pub fn extract(span: &[&Node]) -> Vec<String> {
    let mut columns = Vec::new();
    for node in span {
        visit(node, Position::Item, &mut columns);
    }
    columns
}

fn visit(node: &Node, position: Position, columns: &mut Vec<String>) {
    match node {
        Node::IdentifierList(list) => {
            for member in list.members() {
                visit(member, position, columns);
            }
        }
        Node::Identifier(_) | Node::Function(_) => {
            let name = display_name(node);
            trace!("column {:?} from {:?}", name, node.to_string());
            columns.push(name);
        }
        Node::Token(token) if token.kind == TokenKind::Wildcard => {
            columns.push(token.value.clone());
        }
        // A bare literal standing as a column is its own name
        Node::Token(token) if position == Position::Item && token.is_literal() => {
            columns.push(display_name(node));
        }
        Node::Token(_) => {}
        Node::Group(group) => {
            for child in &group.children {
                visit(child, Position::Nested, columns);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::extract_columns;
    use anyhow::Result;

    #[test]
    fn test_alias_and_plain_columns() -> Result<()> {
        let sql = "SELECT posts.id as post_id,title, content, user_id, username, password, email \
                   FROM posts LEFT JOIN users ON users.id = posts.user_id;";
        assert_eq!(
            extract_columns(sql)?,
            vec!["post_id", "title", "content", "user_id", "username", "password", "email"]
        );
        Ok(())
    }

    #[test]
    fn test_wildcards_are_verbatim() -> Result<()> {
        assert_eq!(extract_columns("SELECT * FROM users;")?, vec!["*"]);
        assert_eq!(
            extract_columns("SELECT u.*, p.title FROM users u JOIN posts p ON p.uid = u.id")?,
            vec!["u.*", "title"]
        );
        Ok(())
    }

    #[test]
    fn test_distinct_and_aliased_aggregate() -> Result<()> {
        assert_eq!(
            extract_columns("select distinct id, count(*) as cnt from users u")?,
            vec!["id", "cnt"]
        );
        Ok(())
    }

    #[test]
    fn test_case_expression_alias() -> Result<()> {
        assert_eq!(
            extract_columns("SELECT CASE WHEN x > 1 THEN y END AS result, z FROM t")?,
            vec!["result", "z"]
        );
        Ok(())
    }

    #[test]
    fn test_literal_without_from() -> Result<()> {
        assert_eq!(extract_columns("SELECT 1;")?, vec!["1"]);
        assert_eq!(extract_columns("SELECT 'a', NULL")?, vec!["'a'", "NULL"]);
        Ok(())
    }

    #[test]
    fn test_nested_literals_are_not_columns() -> Result<()> {
        assert!(extract_columns("SELECT (1, 2) FROM t")?.is_empty());
        assert_eq!(extract_columns("SELECT (a, 0) FROM t")?, vec!["a"]);
        assert_eq!(extract_columns("SELECT x IN (1, 2) FROM t")?, vec!["x"]);
        assert_eq!(extract_columns("SELECT 1, (2, b) FROM t")?, vec!["1", "b"]);
        Ok(())
    }

    #[test]
    fn test_predicate_literals_are_not_columns() -> Result<()> {
        assert_eq!(extract_columns("SELECT x IS NULL FROM t")?, vec!["x"]);
        assert_eq!(extract_columns("SELECT x IS NOT NULL AS known FROM t")?, vec!["known"]);
        assert_eq!(extract_columns("SELECT a BETWEEN 1 AND 2 FROM t")?, vec!["a"]);
        assert_eq!(extract_columns("SELECT a NOT BETWEEN 1 AND 2, c FROM t")?, vec!["a", "c"]);
        assert_eq!(extract_columns("SELECT NOT 1, b FROM t")?, vec!["b"]);
        assert_eq!(extract_columns("SELECT a NOT LIKE 'x%' FROM t")?, vec!["a"]);
        assert_eq!(
            extract_columns("SELECT a IS DISTINCT FROM 0 AS changed, b FROM t")?,
            vec!["changed", "b"]
        );
        Ok(())
    }

    #[test]
    fn test_spaced_function_call() -> Result<()> {
        assert_eq!(extract_columns("SELECT count (*) FROM t")?, vec!["count"]);
        assert_eq!(extract_columns("SELECT sum (x) AS total, y FROM t")?, vec!["total", "y"]);
        Ok(())
    }

    #[test]
    fn test_dialect_operators_after_from() -> Result<()> {
        assert_eq!(
            extract_columns("SELECT data FROM t WHERE tags @> '{a}'")?,
            vec!["data"]
        );
        assert_eq!(
            extract_columns("SELECT a FROM t WHERE j #> '{x}' = 1")?,
            vec!["a"]
        );
        assert_eq!(extract_columns("SELECT $$x$$ AS v")?, vec!["v"]);
        Ok(())
    }

    #[test]
    fn test_statement_without_select() -> Result<()> {
        assert!(extract_columns("UPDATE t SET x=1;")?.is_empty());
        assert!(extract_columns("")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_unaliased_groups_are_searched() -> Result<()> {
        assert_eq!(extract_columns("SELECT a + b * 2 FROM t")?, vec!["a", "b"]);
        assert_eq!(
            extract_columns("SELECT CASE WHEN x > 1 THEN y ELSE 0 END FROM t")?,
            vec!["x", "y"]
        );
        assert_eq!(extract_columns("SELECT (1 + 2) FROM t")?, Vec::<String>::new());
        Ok(())
    }

    #[test]
    fn test_unaliased_subquery_is_searched() -> Result<()> {
        assert_eq!(
            extract_columns("SELECT (SELECT max(b) FROM u), c FROM t")?,
            vec!["max", "u", "c"]
        );
        Ok(())
    }

    #[test]
    fn test_duplicates_and_order_are_kept() -> Result<()> {
        let sql = "SELECT b, a, b FROM t";
        assert_eq!(extract_columns(sql)?, vec!["b", "a", "b"]);
        assert_eq!(extract_columns(sql)?, extract_columns(sql)?);
        Ok(())
    }

    #[test]
    fn test_keyword_case_does_not_matter() -> Result<()> {
        assert_eq!(
            extract_columns("sElEcT a AS x, b fRoM t")?,
            extract_columns("SELECT a AS x, b FROM t")?
        );
        Ok(())
    }

    #[test]
    fn test_window_function_and_cast() -> Result<()> {
        assert_eq!(
            extract_columns(
                "SELECT rank() OVER (ORDER BY score DESC) rnk, price::numeric FROM t"
            )?,
            vec!["rnk", "price"]
        );
        Ok(())
    }

    #[test]
    fn test_only_first_select_span() -> Result<()> {
        assert_eq!(
            extract_columns("SELECT a FROM t UNION SELECT b FROM u")?,
            vec!["a"]
        );
        Ok(())
    }

    #[test]
    fn test_tokenizer_errors_propagate() {
        assert!(extract_columns("SELECT 'open FROM t").is_err());
    }
}
