//! Relation-reference extraction for generated SQL.
//!
//! A lightweight scanner, not a parser: it finds the relations named after
//! `FROM`, `JOIN`, `UPDATE`, `INTO`, `TABLE` and `TRUNCATE`, including
//! comma-separated `FROM` and `TRUNCATE` lists. `TABLE name` is the
//! shorthand for `SELECT * FROM name`. Function calls in relation position (`generate_series(...)`),
//! `FROM` inside function arguments (`EXTRACT(YEAR FROM ts)`), and names
//! bound by `WITH name AS (...)` are not reported.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::lexer::{Token, TokenKind, is_keyword, tokenize};

/// A relation referenced by a query, with identifiers case-folded the way
/// PostgreSQL folds them (unquoted names lowercased).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RelationRef {
    pub schema: Option<String>,
    pub name: String,
}

impl fmt::Display for RelationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParenKind {
    Query,
    Other,
}

#[derive(Debug)]
struct Frame {
    kind: ParenKind,
    from_list: bool,
}

/// Relations referenced by `sql`, deduplicated, in first-seen order.
#[must_use]
pub fn referenced_relations(sql: &str) -> Vec<RelationRef> {
    let tokens: Vec<Token<'_>> = tokenize(sql).into_iter().filter(|t| !t.is_trivia()).collect();
    let ctes = cte_names(&tokens);

    let mut frames = vec![Frame { kind: ParenKind::Query, from_list: false }];
    let mut expecting = false;
    let mut into_target = false;
    let mut found: Vec<RelationRef> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];

        if token.is_punct("(") {
            let kind = if tokens.get(i + 1).is_some_and(starts_query) {
                ParenKind::Query
            } else {
                ParenKind::Other
            };
            frames.push(Frame { kind, from_list: false });
            expecting = false;
            i += 1;
            continue;
        }
        if token.is_punct(")") {
            if frames.len() > 1 {
                frames.pop();
            }
            i += 1;
            continue;
        }

        let Some(frame) = frames.last_mut() else {
            break;
        };
        if frame.kind == ParenKind::Other {
            i += 1;
            continue;
        }

        if token.is_punct(",") {
            expecting = frame.from_list;
            i += 1;
            continue;
        }

        if token.kind == TokenKind::Word && is_keyword(token.text) {
            let upper = token.text.to_ascii_uppercase();
            match upper.as_str() {
                "FROM" | "TRUNCATE" => {
                    expecting = true;
                    into_target = false;
                    frame.from_list = true;
                },
                "JOIN" | "UPDATE" | "INTO" | "TABLE" => {
                    expecting = true;
                    into_target = upper == "INTO";
                    frame.from_list = false;
                },
                "ONLY" | "LATERAL" | "AS" => {},
                _ => {
                    expecting = false;
                    frame.from_list = false;
                },
            }
            i += 1;
            continue;
        }

        if expecting && matches!(token.kind, TokenKind::Word | TokenKind::QuotedIdent) {
            let mut parts = vec![fold_ident(token)];
            let mut j = i + 1;
            while tokens.get(j).is_some_and(|t| t.is_punct("."))
                && tokens
                    .get(j + 1)
                    .is_some_and(|t| matches!(t.kind, TokenKind::Word | TokenKind::QuotedIdent))
            {
                if let Some(part) = tokens.get(j + 1) {
                    parts.push(fold_ident(*part));
                }
                j += 2;
            }
            expecting = false;
            // `INSERT INTO t (cols)` is a column list, not a call
            let is_call = !into_target && tokens.get(j).is_some_and(|t| t.is_punct("("));
            into_target = false;
            if !is_call {
                if let Some(relation) = relation_from_parts(parts) {
                    let is_cte = relation.schema.is_none() && ctes.contains(&relation.name);
                    if !is_cte && !found.contains(&relation) {
                        found.push(relation);
                    }
                }
            }
            i = j;
            continue;
        }

        i += 1;
    }

    found
}

fn starts_query(token: &Token<'_>) -> bool {
    token.is_word("SELECT")
        || token.is_word("WITH")
        || token.is_word("VALUES")
        || token.is_word("TABLE")
}

/// Names bound by `name AS (` or `name AS [NOT] MATERIALIZED (`.
fn cte_names(tokens: &[Token<'_>]) -> HashSet<String> {
    let mut names = HashSet::new();
    for (i, token) in tokens.iter().enumerate() {
        if !matches!(token.kind, TokenKind::Word | TokenKind::QuotedIdent) {
            continue;
        }
        if token.kind == TokenKind::Word && is_keyword(token.text) {
            continue;
        }
        if !tokens.get(i + 1).is_some_and(|t| t.is_word("AS")) {
            continue;
        }
        let mut j = i + 2;
        if tokens.get(j).is_some_and(|t| t.is_word("NOT")) {
            j += 1;
        }
        if tokens.get(j).is_some_and(|t| t.is_word("MATERIALIZED")) {
            j += 1;
        }
        if tokens.get(j).is_some_and(|t| t.is_punct("(")) {
            names.insert(fold_ident(*token));
        }
    }
    names
}

fn fold_ident(token: Token<'_>) -> String {
    match token.kind {
        TokenKind::QuotedIdent => {
            let inner = token.text.get(1..token.text.len().saturating_sub(1)).unwrap_or("");
            inner.replace("\"\"", "\"")
        },
        _ => token.text.to_lowercase(),
    }
}

fn relation_from_parts(mut parts: Vec<String>) -> Option<RelationRef> {
    let name = parts.pop()?;
    let schema = parts.pop();
    Some(RelationRef { schema, name })
}
