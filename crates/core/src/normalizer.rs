//! Query-template normalization.
//!
//! Turns raw query text into a template signature: comments stripped,
//! keywords cased, schema qualifiers removed, and every numeric or quoted
//! string literal replaced by [`PLACEHOLDER`]. Whitespace runs collapse to a
//! single space. The function is pure, total and idempotent.

use serde::{Deserialize, Serialize};

use crate::lexer::{Token, TokenKind, is_keyword, tokenize};

/// Token that stands in for every literal in a normalized template.
pub const PLACEHOLDER: &str = "?";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCase {
    #[default]
    Upper,
    Lower,
    Preserve,
}

/// Formatting rules applied before literal replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub keyword_case: KeywordCase,
    pub strip_comments: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self { keyword_case: KeywordCase::Upper, strip_comments: true }
    }
}

/// Normalize raw SQL into a reusable template signature.
#[must_use]
pub fn normalize(sql: &str, options: &NormalizeOptions) -> String {
    let tokens: Vec<Token<'_>> = tokenize(sql);

    let mut out = String::with_capacity(sql.len());
    let mut after_line_comment = false;
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        i += 1;

        if token.kind == TokenKind::Whitespace || (options.strip_comments && token.is_trivia()) {
            push_separator(&mut out, after_line_comment);
            continue;
        }
        after_line_comment = false;

        match token.kind {
            TokenKind::Word | TokenKind::QuotedIdent if is_qualifier(&tokens, i) => {
                // drop `qualifier.` and keep the qualified name
                i += 1;
            },
            TokenKind::Word if is_keyword(token.text) => match options.keyword_case {
                KeywordCase::Upper => out.push_str(&token.text.to_ascii_uppercase()),
                KeywordCase::Lower => out.push_str(&token.text.to_ascii_lowercase()),
                KeywordCase::Preserve => out.push_str(token.text),
            },
            TokenKind::Number | TokenKind::StringLit => out.push_str(PLACEHOLDER),
            TokenKind::LineComment => {
                out.push_str(token.text.trim_end());
                after_line_comment = true;
            },
            _ => out.push_str(token.text),
        }
    }

    out.trim().to_owned()
}

/// Whether the token before `next` is a qualifier: directly followed by `.`
/// and then a name or `*`.
fn is_qualifier(tokens: &[Token<'_>], next: usize) -> bool {
    let Some(dot) = tokens.get(next) else {
        return false;
    };
    if !dot.is_punct(".") {
        return false;
    }
    tokens.get(next + 1).is_some_and(|t| {
        matches!(t.kind, TokenKind::Word | TokenKind::QuotedIdent) || t.is_punct("*")
    })
}

fn push_separator(out: &mut String, after_line_comment: bool) {
    if after_line_comment {
        if !out.ends_with('\n') {
            out.push('\n');
        }
    } else if !out.is_empty() && !out.ends_with([' ', '\n']) {
        out.push(' ');
    }
}

/// Replace every placeholder token in a normalized template with `literal`.
///
/// Only bare placeholder punctuation is replaced; placeholders that appear
/// inside quoted identifiers or comments are left alone.
#[must_use]
pub fn substitute_placeholders(template: &str, literal: &str) -> String {
    tokenize(template)
        .into_iter()
        .map(|t| if t.is_punct(PLACEHOLDER) { literal } else { t.text })
        .collect()
}

#[cfg(test)]
#[path = "normalizer_tests.rs"]
mod tests;
