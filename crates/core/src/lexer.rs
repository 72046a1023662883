//! Minimal SQL tokenizer shared by the normalizer and the scope scanner.
//!
//! The lexer is lossless: concatenating the text of every token reproduces
//! the input exactly. Unterminated quotes and comments never fail; an
//! unterminated quote is emitted as a single punctuation character and
//! scanning resumes after it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// Bare identifier or keyword.
    Word,
    /// `"double quoted"` identifier.
    QuotedIdent,
    /// `'single quoted'` or `$tag$dollar quoted$tag$` literal.
    StringLit,
    /// Numeric literal, including decimals and exponents.
    Number,
    /// Positional parameter such as `$1`.
    Param,
    LineComment,
    BlockComment,
    Whitespace,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl Token<'_> {
    pub(crate) fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub(crate) fn is_punct(&self, ch: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == ch
    }

    pub(crate) fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(word)
    }
}

pub(crate) fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < sql.len() {
        let rest = &sql[pos..];
        let (kind, len) = next_token(rest, bytes[pos]);
        tokens.push(Token { kind, text: &rest[..len] });
        pos += len;
    }
    tokens
}

fn next_token(rest: &str, first: u8) -> (TokenKind, usize) {
    if rest.starts_with("--") {
        let len = rest.find('\n').unwrap_or(rest.len());
        return (TokenKind::LineComment, len);
    }
    if rest.starts_with("/*") {
        let len = rest[2..].find("*/").map_or(rest.len(), |end| end + 4);
        return (TokenKind::BlockComment, len);
    }
    match first {
        b'\'' => quoted(rest, b'\'').map_or((TokenKind::Punct, 1), |len| (TokenKind::StringLit, len)),
        b'"' => quoted(rest, b'"').map_or((TokenKind::Punct, 1), |len| (TokenKind::QuotedIdent, len)),
        b'$' => dollar(rest),
        b'0'..=b'9' => (TokenKind::Number, number_len(rest)),
        b'.' if rest.as_bytes().get(1).is_some_and(u8::is_ascii_digit) => {
            (TokenKind::Number, number_len(rest))
        },
        _ => {
            let ch = rest.chars().next().unwrap_or(' ');
            if ch.is_whitespace() {
                let len = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
                (TokenKind::Whitespace, len)
            } else if ch.is_alphabetic() || ch == '_' {
                let len = rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
                    .unwrap_or(rest.len());
                (TokenKind::Word, len)
            } else {
                (TokenKind::Punct, ch.len_utf8())
            }
        },
    }
}

/// Length of a quoted run starting at `rest[0]`, honouring doubled quotes as
/// escapes. `None` when the quote is never closed.
fn quoted(rest: &str, quote: u8) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

fn dollar(rest: &str) -> (TokenKind, usize) {
    let bytes = rest.as_bytes();
    if bytes.get(1).is_some_and(u8::is_ascii_digit) {
        let len = rest[1..].find(|c: char| !c.is_ascii_digit()).map_or(rest.len(), |n| n + 1);
        return (TokenKind::Param, len);
    }
    let tag_len = rest[1..]
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .map_or(rest.len(), |n| n + 1);
    if bytes.get(tag_len) != Some(&b'$') {
        return (TokenKind::Punct, 1);
    }
    let tag = &rest[..=tag_len];
    match rest[tag.len()..].find(tag) {
        Some(body) => (TokenKind::StringLit, tag.len() + body + tag.len()),
        None => (TokenKind::Punct, 1),
    }
}

fn number_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

/// Reserved words recognised for keyword casing and clause detection.
pub(crate) const KEYWORDS: &[&str] = &[
    "ALL", "ALTER", "ANALYZE", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST",
    "CHECK", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS", "CURRENT_DATE", "CURRENT_TIMESTAMP",
    "DEFAULT", "DELETE", "DESC", "DISTINCT", "DO", "DROP", "ELSE", "END", "EXCEPT", "EXISTS",
    "EXPLAIN", "FALSE", "FETCH", "FILTER", "FIRST", "FOR", "FROM", "FULL", "GROUP", "HAVING",
    "ILIKE", "IN", "INDEX", "INNER", "INSERT", "INTERSECT", "INTERVAL", "INTO", "IS", "JOIN",
    "LAST", "LATERAL", "LEFT", "LIKE", "LIMIT", "MATERIALIZED", "NATURAL", "NEXT", "NOT",
    "NOTHING", "NULL", "NULLS", "OFFSET", "ON", "ONLY", "OR", "ORDER", "OUTER", "OVER",
    "PARTITION", "PRIMARY", "RECURSIVE", "REFERENCES", "RETURNING", "RIGHT", "ROW", "ROWS",
    "SELECT", "SET", "SOME", "TABLE", "THEN", "TRUE", "TRUNCATE", "UNION", "UNIQUE", "UPDATE", "USING",
    "VALUES", "VIEW", "WHEN", "WHERE", "WINDOW", "WITH",
];

pub(crate) fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}
