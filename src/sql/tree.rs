//! Hierarchical token tree for a single SQL statement
//!
//! Leaf tokens are grouped into a small closed set of node kinds:
//!
//! - [`Identifier`]: a possibly qualified and possibly aliased reference
//! - [`Function`]: a call with a parenthesized argument list
//! - [`IdentifierList`]: comma separated sibling expressions
//! - [`Group`]: any other nesting (parenthesis, CASE, arithmetic, comparison)
//!
//! Identifiers and functions keep every child token so that the raw text of
//! the statement can always be reproduced, and record where their alias part
//! begins.

use super::token::{unquote, Token, TokenKind};
use std::fmt::{Display, Write};

/// A node of the token tree
#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Token(Token),
    Identifier(Identifier),
    Function(Function),
    IdentifierList(IdentifierList),
    Group(Group),
}

/// Kind of a generic group, kept for inspection only
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum GroupKind {
    Parenthesis,
    Case,
    Operation,
    Comparison,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Group {
    pub kind: GroupKind,
    pub children: Vec<Node>,
}

/// Column or table reference, or any aliased expression
#[derive(Debug, PartialEq, Clone)]
pub struct Identifier {
    children: Vec<Node>,
    /// Number of leading children forming the referenced expression
    head_len: usize,
}

/// Function call such as `count(*)`, optionally windowed and aliased
#[derive(Debug, PartialEq, Clone)]
pub struct Function {
    children: Vec<Node>,
    head_len: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub struct IdentifierList {
    pub children: Vec<Node>,
}

/// Ordered top-level sequence of one SQL statement
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Statement {
    pub tokens: Vec<Node>,
}

impl Node {
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.as_token().map_or(false, Token::is_whitespace)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.as_token().map_or(false, |token| token.is_keyword(word))
    }

    pub fn is_punctuation(&self, text: &str) -> bool {
        self.as_token().map_or(false, |token| token.is_punctuation(text))
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.as_token().map_or(false, |token| token.kind == kind)
    }

    /// Direct children of a composite node; leaves have none
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Token(_) => &[],
            Node::Identifier(identifier) => &identifier.children,
            Node::Function(function) => &function.children,
            Node::IdentifierList(list) => &list.children,
            Node::Group(group) => &group.children,
        }
    }

    /// Short label used when dumping the tree
    pub fn label(&self) -> String {
        match self {
            Node::Token(token) => format!("{:?}", token.kind),
            Node::Identifier(_) => "Identifier".to_string(),
            Node::Function(_) => "Function".to_string(),
            Node::IdentifierList(_) => "IdentifierList".to_string(),
            Node::Group(group) => format!("{:?}", group.kind),
        }
    }

    /// Renders the tree one node per line, indented by depth
    pub fn dump(&self, depth: usize, out: &mut String) {
        let _ = writeln!(
            out,
            "{:indent$}{} {:?}",
            "",
            self.label(),
            self.to_string(),
            indent = depth * 2
        );
        for child in self.children() {
            child.dump(depth + 1, out);
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Token(token) => write!(f, "{}", token),
            other => other.children().iter().try_for_each(|child| write!(f, "{}", child)),
        }
    }
}

pub fn is_cast_operator(node: &Node) -> bool {
    node.as_token()
        .map_or(false, |token| token.kind == TokenKind::Operator && token.value == "::")
}

/// Raw text of a run of nodes with surrounding whitespace trimmed
fn text_of(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(|node| node.to_string())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Name bound in an alias tail such as `AS cnt` or ` cnt`
fn alias_in(tail: &[Node]) -> Option<String> {
    let node = tail
        .iter()
        .find(|node| !node.is_whitespace() && !node.is_keyword("AS"))?;
    let alias = match node {
        Node::Identifier(identifier) => identifier
            .real_name()
            .unwrap_or_else(|| identifier.full_name()),
        other => unquote(&other.to_string()).to_string(),
    };
    Some(alias).filter(|alias| !alias.is_empty())
}

impl Identifier {
    pub fn new(children: Vec<Node>) -> Self {
        let head_len = children.len();
        Self { children, head_len }
    }

    /// Appends an alias tail (`AS name` or ` name`) to the expression
    pub fn with_alias(mut self, tail: Vec<Node>) -> Self {
        self.children.extend(tail);
        self
    }

    /// Extends the referenced expression, e.g. with a `::type` cast
    pub fn extend_head(&mut self, nodes: Vec<Node>) {
        let tail = self.children.split_off(self.head_len);
        self.children.extend(nodes);
        self.head_len = self.children.len();
        self.children.extend(tail);
    }

    pub fn has_alias(&self) -> bool {
        self.head_len < self.children.len()
    }

    pub fn head(&self) -> &[Node] {
        &self.children[..self.head_len]
    }

    pub fn alias(&self) -> Option<String> {
        alias_in(&self.children[self.head_len..])
    }

    /// Unqualified name: the last dotted segment of a plain reference,
    /// ignoring any trailing cast
    pub fn real_name(&self) -> Option<String> {
        let head = self.head();
        let head = match head.iter().position(is_cast_operator) {
            Some(at) => &head[..at],
            None => head,
        };
        let names_only = head
            .iter()
            .all(|node| node.is_kind(TokenKind::Name) || node.is_punctuation("."));
        if !names_only {
            return None;
        }
        head.iter()
            .rev()
            .find(|node| node.is_kind(TokenKind::Name))
            .map(|node| unquote(&node.to_string()).to_string())
    }

    /// Raw text of the referenced expression, alias excluded
    pub fn full_name(&self) -> String {
        text_of(self.head())
    }

    /// A single unqualified, unaliased name
    pub fn is_simple(&self) -> bool {
        !self.has_alias() && self.head().len() == 1 && self.head()[0].is_kind(TokenKind::Name)
    }
}

impl Function {
    pub fn new(children: Vec<Node>) -> Self {
        let head_len = children.len();
        Self { children, head_len }
    }

    pub fn with_alias(mut self, tail: Vec<Node>) -> Self {
        self.children.extend(tail);
        self
    }

    /// Extends the call itself, e.g. with an OVER clause
    pub fn extend_head(&mut self, nodes: Vec<Node>) {
        let tail = self.children.split_off(self.head_len);
        self.children.extend(nodes);
        self.head_len = self.children.len();
        self.children.extend(tail);
    }

    pub fn has_alias(&self) -> bool {
        self.head_len < self.children.len()
    }

    pub fn alias(&self) -> Option<String> {
        alias_in(&self.children[self.head_len..])
    }

    /// The called name without its arguments
    pub fn name(&self) -> Option<String> {
        match self.children.first()? {
            Node::Identifier(identifier) => identifier.real_name(),
            Node::Token(token) => Some(unquote(&token.value).to_string()),
            _ => None,
        }
    }
}

impl IdentifierList {
    /// Member expressions, skipping commas and whitespace
    pub fn members(&self) -> impl Iterator<Item = &Node> {
        self.children
            .iter()
            .filter(|node| !node.is_whitespace() && !node.is_punctuation(","))
    }
}

impl Statement {
    /// Renders the whole tree for inspection
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for node in &self.tokens {
            node.dump(0, &mut out);
        }
        out
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.tokens.iter().try_for_each(|node| write!(f, "{}", node))
    }
}
