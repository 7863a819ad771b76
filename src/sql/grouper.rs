//! Token Grouper
//!
//! Turns the flat token stream of the lexer into the hierarchical tree used by
//! the column extractor. Parentheses are nested first; every nesting level is
//! then rewritten by a fixed sequence of passes, innermost level first:
//!
//! 1. `CASE ... END` blocks
//! 2. dotted names (`schema.table.column`, `t.*`)
//! 3. function calls, including a trailing `OVER` window; a name may be
//!    separated from its argument list by whitespace
//! 4. remaining bare names
//! 5. `::type` casts
//! 6. arithmetic and comparison runs
//! 7. predicates (`IS [NOT] ...`, `[NOT] BETWEEN`, `[NOT] IN`, `[NOT] LIKE`, prefix `NOT`)
//! 8. aliases, explicit (`AS name`) or implicit (`expr name`)
//! 9. comma separated lists
//!
//! Only the first statement of the input is kept.

use super::error::ParseError;
use super::token::{Token, TokenKind};
use super::tree::{
    is_cast_operator, Function, Group, GroupKind, Identifier, IdentifierList, Node, Statement,
};
use std::collections::VecDeque;
use tracing::debug;

/// Keywords that also name functions when directly followed by `(`
const FUNCTION_KEYWORDS: &[&str] = &["LEFT", "RIGHT", "REPLACE"];

/// Builds the token tree of the first statement in `tokens`
pub fn group(tokens: Vec<Token>) -> Result<Statement, ParseError> {
    let nodes = nest_parentheses(tokens)?;
    let nodes = first_statement(nodes);
    Ok(Statement {
        tokens: group_level(nodes),
    })
}

fn current<'a>(root: &'a mut Vec<Node>, open: &'a mut [(usize, Vec<Node>)]) -> &'a mut Vec<Node> {
    match open.last_mut() {
        Some((_, children)) => children,
        None => root,
    }
}

fn nest_parentheses(tokens: Vec<Token>) -> Result<Vec<Node>, ParseError> {
    let mut root = Vec::new();
    let mut open: Vec<(usize, Vec<Node>)> = Vec::new();

    for (position, token) in tokens.into_iter().enumerate() {
        if token.is_punctuation("(") {
            open.push((position, vec![Node::Token(token)]));
        } else if token.is_punctuation(")") {
            let Some((_, mut children)) = open.pop() else {
                return Err(ParseError::UnbalancedParenthesis {
                    bracket: ')',
                    position,
                });
            };
            children.push(Node::Token(token));
            current(&mut root, &mut open).push(Node::Group(Group {
                kind: GroupKind::Parenthesis,
                children,
            }));
        } else {
            current(&mut root, &mut open).push(Node::Token(token));
        }
    }

    match open.first() {
        Some((position, _)) => Err(ParseError::UnbalancedParenthesis {
            bracket: '(',
            position: *position,
        }),
        None => Ok(root),
    }
}

/// Keeps the top-level nodes up to and including the first `;`
fn first_statement(mut nodes: Vec<Node>) -> Vec<Node> {
    if let Some(end) = nodes.iter().position(|node| node.is_punctuation(";")) {
        let rest = nodes.split_off(end + 1);
        let ignored = rest.iter().filter(|node| !node.is_whitespace()).count();
        if ignored > 0 {
            debug!("ignoring {} tokens after the first statement", ignored);
        }
    }
    nodes
}

fn group_level(nodes: Vec<Node>) -> Vec<Node> {
    let nodes = nodes
        .into_iter()
        .map(|node| match node {
            Node::Group(Group { kind, children }) => Node::Group(Group {
                kind,
                children: group_level(children),
            }),
            other => other,
        })
        .collect();
    apply_passes(nodes)
}

/// Runs every pass over one level whose parentheses are already grouped
fn apply_passes(nodes: Vec<Node>) -> Vec<Node> {
    let nodes = group_case(nodes);
    let nodes = group_qualified(nodes);
    let nodes = group_functions(nodes);
    let nodes = group_names(nodes);
    let nodes = group_typecasts(nodes);
    let nodes = group_operations(nodes);
    let nodes = group_predicates(nodes);
    let nodes = group_aliases(nodes);
    group_lists(nodes)
}

/// Index of the first non-whitespace node at or after `from`
fn next_significant(input: &VecDeque<Node>, from: usize) -> Option<usize> {
    (from..input.len()).find(|&at| !input[at].is_whitespace())
}

fn is_parenthesis(node: &Node) -> bool {
    matches!(
        node,
        Node::Group(Group {
            kind: GroupKind::Parenthesis,
            ..
        })
    )
}

/// Nodes that can stand on either side of an operator
fn is_operand(node: &Node) -> bool {
    match node {
        Node::Identifier(identifier) => !identifier.has_alias(),
        Node::Function(function) => !function.has_alias(),
        Node::Group(_) => true,
        Node::Token(token) => token.is_literal(),
        Node::IdentifierList(_) => false,
    }
}

fn is_operator(node: &Node) -> bool {
    match node.as_token() {
        Some(token) => {
            matches!(
                token.kind,
                TokenKind::Operator | TokenKind::Comparison | TokenKind::Wildcard
            ) || is_comparison(node)
        }
        None => false,
    }
}

fn is_comparison(node: &Node) -> bool {
    node.is_kind(TokenKind::Comparison) || node.is_keyword("LIKE") || node.is_keyword("ILIKE")
}

fn group_case(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut input = nodes.into_iter();

    while let Some(node) = input.next() {
        if !node.is_keyword("CASE") {
            out.push(node);
            continue;
        }

        let mut body = Vec::new();
        let mut depth = 0;
        let mut end = None;
        for next in input.by_ref() {
            if next.is_keyword("CASE") {
                depth += 1;
            } else if next.is_keyword("END") {
                if depth == 0 {
                    end = Some(next);
                    break;
                }
                depth -= 1;
            }
            body.push(next);
        }

        match end {
            Some(end) => {
                let mut children = vec![node];
                children.extend(apply_passes(body));
                children.push(end);
                out.push(Node::Group(Group {
                    kind: GroupKind::Case,
                    children,
                }));
            }
            // Unterminated CASE stays flat
            None => {
                out.push(node);
                out.extend(body);
            }
        }
    }
    out
}

fn group_qualified(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut input: VecDeque<Node> = nodes.into();

    while let Some(node) = input.pop_front() {
        if !node.is_kind(TokenKind::Name) {
            out.push(node);
            continue;
        }

        let mut parts = vec![node];
        while !parts.last().map_or(false, |part| part.is_kind(TokenKind::Wildcard))
            && input.front().map_or(false, |next| next.is_punctuation("."))
            && input.get(1).map_or(false, |next| {
                next.is_kind(TokenKind::Name) || next.is_kind(TokenKind::Wildcard)
            })
        {
            parts.extend(input.drain(..2));
        }

        if parts.last().map_or(false, |part| part.is_kind(TokenKind::Wildcard)) {
            let text: String = parts.iter().map(|part| part.to_string()).collect();
            out.push(Node::Token(Token::new(TokenKind::Wildcard, text)));
        } else if parts.len() > 1 {
            out.push(Node::Identifier(Identifier::new(parts)));
        } else {
            out.extend(parts);
        }
    }
    out
}

/// Length of an `OVER (...)` or `OVER name` clause at the front of `input`
fn window_len(input: &VecDeque<Node>) -> Option<usize> {
    let over = next_significant(input, 0)?;
    if !input[over].is_keyword("OVER") {
        return None;
    }
    let window = next_significant(input, over + 1)?;
    (is_parenthesis(&input[window]) || input[window].is_kind(TokenKind::Name))
        .then_some(window + 1)
}

fn group_functions(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut input: VecDeque<Node> = nodes.into();

    while let Some(node) = input.pop_front() {
        let callable = match &node {
            Node::Token(token) => {
                token.kind == TokenKind::Name
                    || FUNCTION_KEYWORDS
                        .iter()
                        .any(|keyword| token.is_keyword(keyword))
            }
            Node::Identifier(identifier) => !identifier.has_alias(),
            _ => false,
        };
        // Only names may be spaced from their arguments; `LEFT (` stays a keyword
        let args_at = match &node {
            Node::Token(token) if token.kind != TokenKind::Name => Some(0),
            _ => next_significant(&input, 0),
        }
        .filter(|&at| callable && input.get(at).map_or(false, is_parenthesis));
        let Some(args_at) = args_at else {
            out.push(node);
            continue;
        };

        let mut children = vec![node];
        children.extend(input.drain(..=args_at));
        let mut function = Function::new(children);
        if let Some(len) = window_len(&input) {
            function.extend_head(input.drain(..len).collect());
        }
        out.push(Node::Function(function));
    }
    out
}

fn group_names(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| {
            if node.is_kind(TokenKind::Name) {
                Node::Identifier(Identifier::new(vec![node]))
            } else {
                node
            }
        })
        .collect()
}

fn group_typecasts(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut input: VecDeque<Node> = nodes.into();

    while let Some(node) = input.pop_front() {
        let is_cast = is_operand(&node)
            && input.front().map_or(false, is_cast_operator)
            && matches!(input.get(1), Some(Node::Identifier(target)) if target.is_simple());
        if !is_cast {
            out.push(node);
            continue;
        }

        let cast: Vec<Node> = input.drain(..2).collect();
        let node = match node {
            Node::Identifier(mut identifier) => {
                identifier.extend_head(cast);
                Node::Identifier(identifier)
            }
            Node::Function(mut function) => {
                function.extend_head(cast);
                Node::Function(function)
            }
            other => Node::Identifier(Identifier::new(
                std::iter::once(other).chain(cast).collect(),
            )),
        };
        // Revisit for chained casts
        input.push_front(node);
    }
    out
}

fn group_operations(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut input: VecDeque<Node> = nodes.into();

    while let Some(node) = input.pop_front() {
        if !is_operand(&node) {
            out.push(node);
            continue;
        }

        let mut children = vec![node];
        let mut kind = GroupKind::Operation;
        while let Some(op) = next_significant(&input, 0) {
            if !is_operator(&input[op]) {
                break;
            }
            let Some(rhs) = next_significant(&input, op + 1) else {
                break;
            };
            if !is_operand(&input[rhs]) {
                break;
            }
            if is_comparison(&input[op]) {
                kind = GroupKind::Comparison;
            }
            children.extend(input.drain(..=rhs));
        }

        if children.len() == 1 {
            out.extend(children);
        } else {
            out.push(Node::Group(Group { kind, children }));
        }
    }
    out
}

/// Length of a predicate continuing the operand before `input`, such as
/// `IS NOT NULL`, `NOT BETWEEN 1 AND 2`, `IN (...)` or `NOT LIKE 'x'`
fn predicate_len(input: &VecDeque<Node>) -> Option<usize> {
    let mut at = next_significant(input, 0)?;
    let negated = input[at].is_keyword("NOT");
    if negated {
        at = next_significant(input, at + 1)?;
    }
    let operand_after = |from: usize| {
        next_significant(input, from).filter(|&value| is_operand(&input[value]))
    };

    if input[at].is_keyword("IS") && !negated {
        let mut value = next_significant(input, at + 1)?;
        if input[value].is_keyword("NOT") {
            value = next_significant(input, value + 1)?;
        }
        if input[value].is_keyword("DISTINCT") {
            let from = next_significant(input, value + 1)?;
            if !input[from].is_keyword("FROM") {
                return None;
            }
            value = next_significant(input, from + 1)?;
        }
        return is_operand(&input[value]).then_some(value + 1);
    }
    if input[at].is_keyword("BETWEEN") {
        let low = operand_after(at + 1)?;
        let and = next_significant(input, low + 1)?;
        if !input[and].is_keyword("AND") {
            return None;
        }
        return operand_after(and + 1).map(|high| high + 1);
    }
    if input[at].is_keyword("IN") {
        let list = next_significant(input, at + 1)?;
        return is_parenthesis(&input[list]).then_some(list + 1);
    }
    if negated && is_comparison(&input[at]) {
        return operand_after(at + 1).map(|value| value + 1);
    }
    None
}

fn group_predicates(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut input: VecDeque<Node> = nodes.into();

    while let Some(node) = input.pop_front() {
        let len = if node.is_keyword("NOT") {
            next_significant(&input, 0)
                .filter(|&at| is_operand(&input[at]))
                .map(|at| at + 1)
        } else if is_operand(&node) {
            predicate_len(&input)
        } else {
            None
        };
        let Some(len) = len else {
            out.push(node);
            continue;
        };

        let mut children = vec![node];
        children.extend(input.drain(..len));
        // Revisit so `NOT a IS NULL` and chained predicates keep growing
        input.push_front(Node::Group(Group {
            kind: GroupKind::Comparison,
            children,
        }));
    }
    out
}

fn is_aliasable(node: &Node) -> bool {
    match node {
        Node::Identifier(identifier) => !identifier.has_alias(),
        Node::Function(function) => !function.has_alias(),
        Node::Group(_) => true,
        Node::Token(token) => token.is_literal(),
        Node::IdentifierList(_) => false,
    }
}

fn is_alias_name(node: &Node, explicit: bool) -> bool {
    match node {
        Node::Identifier(identifier) => identifier.is_simple(),
        Node::Token(token) => explicit && token.kind == TokenKind::String,
        _ => false,
    }
}

/// Length of an alias tail at the front of `input`
fn alias_len(input: &VecDeque<Node>) -> Option<usize> {
    let first = next_significant(input, 0)?;
    if input[first].is_keyword("AS") {
        let name = next_significant(input, first + 1)?;
        return is_alias_name(&input[name], true).then_some(name + 1);
    }
    // Implicit aliases need separating whitespace
    (first > 0 && is_alias_name(&input[first], false)).then_some(first + 1)
}

fn group_aliases(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut input: VecDeque<Node> = nodes.into();

    while let Some(node) = input.pop_front() {
        let len = if is_aliasable(&node) {
            alias_len(&input)
        } else {
            None
        };
        let Some(len) = len else {
            out.push(node);
            continue;
        };

        let tail: Vec<Node> = input.drain(..len).collect();
        out.push(match node {
            Node::Identifier(identifier) => Node::Identifier(identifier.with_alias(tail)),
            Node::Function(function) => Node::Function(function.with_alias(tail)),
            other => Node::Identifier(Identifier::new(vec![other]).with_alias(tail)),
        });
    }
    out
}

fn is_listable(node: &Node) -> bool {
    match node {
        Node::Token(token) => token.kind == TokenKind::Wildcard || token.is_literal(),
        _ => true,
    }
}

fn group_lists(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    let mut input: VecDeque<Node> = nodes.into();

    while let Some(node) = input.pop_front() {
        if !node.is_punctuation(",") {
            out.push(node);
            continue;
        }

        let prev = out.iter().rposition(|node| !node.is_whitespace());
        let next = next_significant(&input, 0);
        let (Some(prev), Some(next)) = (prev, next) else {
            out.push(node);
            continue;
        };
        if !is_listable(&out[prev]) || !is_listable(&input[next]) {
            out.push(node);
            continue;
        }

        let mut between = out.split_off(prev + 1);
        let mut children = match out.pop() {
            Some(Node::IdentifierList(list)) => list.children,
            Some(other) => vec![other],
            None => Vec::new(),
        };
        children.append(&mut between);
        children.push(node);
        children.extend(input.drain(..=next));
        out.push(Node::IdentifierList(IdentifierList { children }));
    }
    out
}
