use std::fmt::Display;

/// Represents the type tag of a lexical SQL token
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    /// Data manipulation keywords (SELECT, INSERT, UPDATE, ...)
    Dml,
    /// Any other keyword (FROM, AS, DISTINCT, CASE, ...)
    Keyword,
    /// Identifiers like table names, column names and function names
    Name,
    /// The wildcard operator *, optionally table-qualified
    Wildcard,
    /// Numeric literal
    Number,
    /// Single quoted string literal
    String,
    /// Bind parameter such as `?`, `$1`, `:name` or `@var`
    Placeholder,
    /// Brackets, commas, semicolons and dots
    Punctuation,
    /// Arithmetic and other non-comparison operators
    Operator,
    /// Comparison operators
    Comparison,
    Whitespace,
    Comment,
}

const DML_KEYWORDS: &[&str] = &["SELECT", "INSERT", "UPDATE", "DELETE", "MERGE", "UPSERT"];

// Words that never name a column on their own. Function-like names such as
// COUNT, CAST or COALESCE lex as names.
const KEYWORDS: &[&str] = &[
    "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CREATE", "CROSS",
    "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FOR", "FROM",
    "FULL", "GROUP", "HAVING", "ILIKE", "IN", "INNER", "INTERSECT", "INTO", "IS", "JOIN",
    "LATERAL", "LEFT", "LIKE", "LIMIT", "NATURAL", "NOT", "NULL", "OFFSET", "ON", "OR",
    "ORDER", "OUTER", "OVER", "PARTITION", "RECURSIVE", "REPLACE", "RETURNING", "RIGHT", "SET",
    "THEN", "TOP", "TRUE", "UNION", "USING", "VALUES", "WHEN", "WHERE", "WINDOW", "WITH",
];

/// Keywords that act as value literals when they stand in a column position
const LITERAL_KEYWORDS: &[&str] = &["NULL", "TRUE", "FALSE"];

/// Classifies a bare word as a DML keyword, a generic keyword or a name
pub fn classify_word(word: &str) -> TokenKind {
    let upper = word.to_uppercase();
    if DML_KEYWORDS.contains(&upper.as_str()) {
        TokenKind::Dml
    } else if KEYWORDS.contains(&upper.as_str()) {
        TokenKind::Keyword
    } else {
        TokenKind::Name
    }
}

/// Atomic lexical unit: a type tag plus the raw source text
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Keyword text is compared in upper case; everything else verbatim
    pub fn normalized(&self) -> String {
        match self.kind {
            TokenKind::Dml | TokenKind::Keyword => self.value.to_uppercase(),
            _ => self.value.clone(),
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// True for a keyword (DML or generic) matching `word` case-insensitively
    pub fn is_keyword(&self, word: &str) -> bool {
        matches!(self.kind, TokenKind::Dml | TokenKind::Keyword)
            && self.value.eq_ignore_ascii_case(word)
    }

    pub fn is_punctuation(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.value == text
    }

    /// Plain value literals, including NULL/TRUE/FALSE
    pub fn is_literal(&self) -> bool {
        match self.kind {
            TokenKind::Number | TokenKind::String | TokenKind::Placeholder => true,
            TokenKind::Keyword => LITERAL_KEYWORDS
                .iter()
                .any(|keyword| self.value.eq_ignore_ascii_case(keyword)),
            _ => false,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Strips one layer of identifier or string quoting
pub fn unquote(text: &str) -> &str {
    let pairs = [('"', '"'), ('`', '`'), ('[', ']'), ('\'', '\'')];
    for (open, close) in pairs {
        if text.len() >= 2 && text.starts_with(open) && text.ends_with(close) {
            return &text[1..text.len() - 1];
        }
    }
    text
}
