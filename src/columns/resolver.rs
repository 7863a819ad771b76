use crate::sql::tree::Node;

type Rule = fn(&Node) -> Option<String>;

/// Name rules in priority order; the first non-empty answer wins
const RULES: [Rule; 4] = [alias, real_name, full_name, function_name];

fn alias(node: &Node) -> Option<String> {
    match node {
        Node::Identifier(identifier) => identifier.alias(),
        Node::Function(function) => function.alias(),
        _ => None,
    }
}

fn real_name(node: &Node) -> Option<String> {
    match node {
        Node::Identifier(identifier) => identifier.real_name(),
        _ => None,
    }
}

fn full_name(node: &Node) -> Option<String> {
    match node {
        Node::Identifier(identifier) => Some(identifier.full_name()),
        _ => None,
    }
}

fn function_name(node: &Node) -> Option<String> {
    match node {
        Node::Function(function) => function.name(),
        _ => None,
    }
}

/// Display name of one column expression
///
/// Falls back to the raw text of the node when no rule applies.
pub fn display_name(node: &Node) -> String {
    RULES
        .iter()
        .filter_map(|rule| rule(node))
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| node.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_statement;
    use anyhow::{anyhow, Result};

    /// First significant node after SELECT
    fn first_item(sql: &str) -> Result<Node> {
        let statement = parse_statement(sql)?;
        statement
            .tokens
            .into_iter()
            .filter(|node| !node.is_whitespace())
            .nth(1)
            .ok_or_else(|| anyhow!("no column expression in {}", sql))
    }

    #[test]
    fn test_alias_beats_function_name() -> Result<()> {
        assert_eq!(display_name(&first_item("SELECT count(*) AS cnt")?), "cnt");
        assert_eq!(display_name(&first_item("SELECT count(*)")?), "count");
        Ok(())
    }

    #[test]
    fn test_alias_beats_real_name() -> Result<()> {
        assert_eq!(display_name(&first_item("SELECT posts.id AS post_id")?), "post_id");
        assert_eq!(display_name(&first_item("SELECT posts.id")?), "id");
        Ok(())
    }

    #[test]
    fn test_quoted_names_are_unquoted() -> Result<()> {
        assert_eq!(display_name(&first_item("SELECT \"User Name\"")?), "User Name");
        assert_eq!(display_name(&first_item("SELECT a AS \"Total\"")?), "Total");
        Ok(())
    }

    #[test]
    fn test_expression_without_real_name_uses_full_name() -> Result<()> {
        assert_eq!(
            display_name(&first_item("SELECT '1'::int")?),
            "'1'::int"
        );
        Ok(())
    }

    #[test]
    fn test_qualified_function_name() -> Result<()> {
        assert_eq!(display_name(&first_item("SELECT pg_catalog.now()")?), "now");
        Ok(())
    }

    #[test]
    fn test_literal_falls_back_to_raw_text() -> Result<()> {
        assert_eq!(display_name(&first_item("SELECT 42")?), "42");
        Ok(())
    }
}
