//! Best-effort structural parser for rule-language documents.
//!
//! Recovers `Name when CONDITION then RESPONSE [unless CONDITION then
//! RESPONSE]*` records from free text. This is deliberately not a validating
//! grammar: spans that fail structural recovery are skipped and reported as
//! diagnostics, never as errors. Each recovered rule keeps its verbatim
//! full text as an explicit span slice so later synthesis is lossless.

use crate::error::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Marker terminating the rule block of a document.
const RULE_END: &str = "rule_end";

/// Keywords that can never open a rule.
const KEYWORDS: &[&str] = &[
    "when",
    "then",
    "unless",
    "and",
    "or",
    "not",
    "def_start",
    "def_end",
    "rule_start",
    "rule_end",
    "relation_start",
    "relation_end",
    "mutualExclusive",
];

/// An `unless` clause of a rule. The response is absent when the clause
/// carries no `then` part; such a clause still contributes measure usages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlessClause {
    pub condition: String,
    pub response: Option<String>,
}

/// One parsed rule. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Identifier preceding `when`.
    pub name: String,

    /// Main condition span (between `when` and the first `then`).
    pub condition: String,

    /// Response name of the main `then` part.
    pub main_response: String,

    /// `unless` clauses in source order.
    pub unless_clauses: Vec<UnlessClause>,

    /// Verbatim comment-stripped text of the whole rule.
    pub full_text: String,
}

/// Parser output: recovered rules plus the verbatim-text map used by the
/// synthesizer, plus non-fatal diagnostics for skipped spans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRules {
    /// Rules in document order.
    pub rules: Vec<Rule>,

    /// `name -> full_text`, for lossless re-emission. Last occurrence wins
    /// on duplicate names.
    pub full_texts: BTreeMap<String, String>,

    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedRules {
    /// Rule with the given name, if parsed.
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }
}

/// A whitespace-delimited token with its byte span in the filtered text.
#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

/// Parse a rule-language document. Pure function of the input text.
pub fn parse_rules(document: &str) -> ParsedRules {
    let filtered = strip_comments(document);
    let tokens = tokenize(&filtered);

    let boundaries: Vec<usize> = (0..tokens.len())
        .filter(|&i| is_rule_boundary(&tokens, i))
        .collect();

    let mut parsed = ParsedRules::default();

    for (b, &start) in boundaries.iter().enumerate() {
        let span_end_token = boundaries
            .get(b + 1)
            .copied()
            .unwrap_or(tokens.len())
            .min(next_rule_end(&tokens, start));
        let span_end = tokens
            .get(span_end_token.wrapping_sub(1))
            .map_or(filtered.len(), |t| t.end);

        let name = tokens[start].text;
        let full_text = filtered[tokens[start].start..span_end].trim().to_string();

        match parse_rule_body(&filtered, &tokens[start..span_end_token]) {
            Some((condition, main_response, unless_clauses)) => {
                debug!(rule = name, "Parsed rule");
                parsed.full_texts.insert(name.to_string(), full_text.clone());
                parsed.rules.push(Rule {
                    name: name.to_string(),
                    condition,
                    main_response,
                    unless_clauses,
                    full_text,
                });
            }
            None => {
                parsed.diagnostics.push(Diagnostic::at_line(
                    format!("skipped malformed rule span starting at '{name}'"),
                    line_of(&filtered, tokens[start].start),
                ));
            }
        }
    }

    parsed
}

/// Drop comment lines and blank lines, preserving the rest verbatim.
/// All spans are relative to this filtered text.
fn strip_comments(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .collect();
    lines.join("\n")
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    text: &text[s..i],
                    start: s,
                    end: i,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &text[s..],
            start: s,
            end: text.len(),
        });
    }
    tokens
}

/// A rule opens at any non-keyword token directly followed by `when`.
fn is_rule_boundary(tokens: &[Token<'_>], i: usize) -> bool {
    tokens.get(i + 1).is_some_and(|next| next.text == "when")
        && !KEYWORDS.contains(&tokens[i].text)
}

/// Index of the next `rule_end` token at or after `start`.
fn next_rule_end(tokens: &[Token<'_>], start: usize) -> usize {
    (start..tokens.len())
        .find(|&i| tokens[i].text == RULE_END)
        .unwrap_or(tokens.len())
}

/// Recover the structure of one rule span. `tokens[0]` is the name,
/// `tokens[1]` is `when`. Returns `None` when the span has no `then` or no
/// recoverable response.
fn parse_rule_body(
    text: &str,
    tokens: &[Token<'_>],
) -> Option<(String, String, Vec<UnlessClause>)> {
    let then_idx = position(tokens, 2, "then")?;
    let condition = slice_between(text, tokens, 2, then_idx);

    let first_unless = position(tokens, then_idx + 1, "unless").unwrap_or(tokens.len());
    let main_response = response_name(&tokens[then_idx + 1..first_unless])?;

    let mut unless_clauses = Vec::new();
    let mut at = first_unless;
    while at < tokens.len() {
        let clause_end = position(tokens, at + 1, "unless").unwrap_or(tokens.len());
        let clause = &tokens[at + 1..clause_end];
        let clause_then = clause.iter().position(|t| t.text == "then");
        let (condition, response) = match clause_then {
            Some(t) => (
                slice_between(text, tokens, at + 1, at + 1 + t),
                response_name(&clause[t + 1..]),
            ),
            None => (slice_between(text, tokens, at + 1, clause_end), None),
        };
        unless_clauses.push(UnlessClause { condition, response });
        at = clause_end;
    }

    Some((condition, main_response, unless_clauses))
}

/// First token index at or after `from` with the given text.
fn position(tokens: &[Token<'_>], from: usize, needle: &str) -> Option<usize> {
    (from.min(tokens.len())..tokens.len()).find(|&i| tokens[i].text == needle)
}

/// Verbatim text covered by tokens `[from, to)`.
fn slice_between(text: &str, tokens: &[Token<'_>], from: usize, to: usize) -> String {
    if from >= to || from >= tokens.len() {
        return String::new();
    }
    let end = tokens[(to - 1).min(tokens.len() - 1)].end;
    text[tokens[from].start..end].trim().to_string()
}

/// Response name: the leading word of the response span, keeping an
/// optional `not` prefix. Connectives are not response names.
fn response_name(tokens: &[Token<'_>]) -> Option<String> {
    let mut iter = tokens.iter();
    let first = word_of(iter.next()?.text)?;
    let name = if first == "not" {
        format!("not {}", word_of(iter.next()?.text)?)
    } else {
        first.to_string()
    };
    match name.as_str() {
        "and" | "or" | "unless" => None,
        _ => Some(name),
    }
}

/// Leading identifier-character run of a token.
fn word_of(token: &str) -> Option<&str> {
    let end = token
        .char_indices()
        .find(|(_, c)| !c.is_alphanumeric() && *c != '_')
        .map_or(token.len(), |(i, _)| i);
    (end > 0).then(|| &token[..end])
}

/// 1-based line of a byte offset in the filtered text.
fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}
