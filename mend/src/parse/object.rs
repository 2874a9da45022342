//! Permissive grammar for the structured check's JSON-like replies.
//!
//! Models asked for JSON return something close to it: code fences around
//! the payload, single-quoted strings, bare words where strings belong,
//! trailing commas, or an array cut off mid-object. Rather than reject the
//! whole reply, the array is split into top-level `{...}` pieces and each
//! piece is parsed on its own with a grammar that accepts all of the above.
//! A piece that still does not parse is dropped.

use crate::suggestion::{Category, Suggestion};
use chumsky::prelude::*;
use tracing::{debug, trace};

/// Confidence of a structured record without a usable `confidence` field.
pub const OBJECT_CONFIDENCE: f32 = 1.0;

/// A loosely typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
    /// An unquoted token that is not a number, boolean, or null.
    Word(String),
    Array(Vec<Value>),
    Object(Record),
}

/// Key/value pairs of one object, in source order.
pub type Record = Vec<(String, Value)>;

impl Value {
    /// Textual content of strings, words and numbers.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::String(s) | Value::Word(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Numeric content, accepting numeric strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) | Value::Word(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean content, accepting `"true"`/`"false"` strings.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) | Value::Word(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

fn quoted(open: char, close: char) -> impl Parser<char, String, Error = Simple<char>> + Clone {
    let escape = just('\\').ignore_then(any().map(|c| match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        c => c,
    }));

    just(open)
        .ignore_then(
            filter(move |c: &char| *c != close && *c != '\\')
                .or(escape)
                .repeated(),
        )
        .then_ignore(just(close))
        .collect::<String>()
}

fn string_literal() -> impl Parser<char, String, Error = Simple<char>> + Clone {
    quoted('"', '"')
        .or(quoted('\'', '\''))
        .or(quoted('\u{201c}', '\u{201d}'))
}

fn bare_key() -> impl Parser<char, String, Error = Simple<char>> + Clone {
    filter(|c: &char| c.is_alphanumeric() || *c == '_' || *c == '-')
        .repeated()
        .at_least(1)
        .collect::<String>()
}

/// Everything up to the next structural character, classified afterwards.
fn bare_token() -> impl Parser<char, Value, Error = Simple<char>> + Clone {
    filter(|c: &char| !matches!(c, ',' | '{' | '}' | '[' | ']' | '"' | '\n'))
        .repeated()
        .at_least(1)
        .collect::<String>()
        .try_map(|token, span| {
            let token = token.trim();
            if token.is_empty() {
                return Err(Simple::custom(span, "empty token"));
            }
            Ok(match token {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                _ => token
                    .parse::<f64>()
                    .map(Value::Number)
                    .unwrap_or_else(|_| Value::Word(token.to_string())),
            })
        })
}

fn value() -> impl Parser<char, Value, Error = Simple<char>> + Clone {
    recursive(|value| {
        let array = value
            .clone()
            .padded()
            .separated_by(just(','))
            .allow_trailing()
            .padded()
            .delimited_by(just('['), just(']'))
            .map(Value::Array);

        let object = members(value).map(Value::Object);

        string_literal()
            .map(Value::String)
            .or(array)
            .or(object)
            .or(bare_token())
    })
}

/// `{ key: value, ... }` where a missing value reads as null.
fn members(
    value: impl Parser<char, Value, Error = Simple<char>> + Clone,
) -> impl Parser<char, Record, Error = Simple<char>> + Clone {
    let key = string_literal().or(bare_key());

    key.padded()
        .then_ignore(just(':').padded())
        .then(value.padded().or_not().map(|v| v.unwrap_or(Value::Null)))
        .separated_by(just(','))
        .allow_trailing()
        .padded()
        .delimited_by(just('{'), just('}'))
}

fn record() -> impl Parser<char, Record, Error = Simple<char>> {
    members(value()).padded().then_ignore(end())
}

/// Parse one `{...}` piece.
pub fn parse_record(piece: &str) -> Option<Record> {
    match record().parse(piece) {
        Ok(record) => Some(record),
        Err(errors) => {
            trace!("Dropping unparseable object {piece:?}: {errors:?}");
            None
        },
    }
}

/// Remove a surrounding code fence, with or without a language tag.
fn strip_fence(raw: &str) -> &str {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.split_once('\n').map_or("", |(_, after)| after);
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Interior of the bracketed payload. A missing closing bracket is
/// tolerated so truncated replies still yield their complete objects.
fn array_body(raw: &str) -> Option<&str> {
    let body = strip_fence(raw).strip_prefix('[')?;
    Some(body.strip_suffix(']').unwrap_or(body))
}

/// Split the array interior into top-level object pieces, re-closing a
/// truncated final piece.
fn split_objects(body: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut previous = None;

    for (index, c) in body.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == closing_quote(open) {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\u{201c}' if depth > 0 => quote = Some(c),
            // An apostrophe inside a bare word is not a quote.
            '\'' if depth > 0 && matches!(previous, Some(':' | ',' | '[' | '{')) => {
                quote = Some(c)
            },
            '{' => {
                if depth == 0 {
                    start = Some(index);
                }
                depth += 1;
            },
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(from) = start.take() {
                        pieces.push(body[from..=index].to_string());
                    }
                }
            },
            _ => {},
        }

        if !c.is_whitespace() {
            previous = Some(c);
        }
    }

    if let Some(from) = start {
        let mut tail = body[from..].to_string();
        if let Some(open) = quote {
            tail.push(closing_quote(open));
        }
        tail.extend(std::iter::repeat('}').take(depth));
        pieces.push(tail);
    }

    pieces
}

fn closing_quote(open: char) -> char {
    match open {
        '\u{201c}' => '\u{201d}',
        c => c,
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn field<'a>(record: &'a Record, names: &[&str]) -> Option<&'a Value> {
    record
        .iter()
        .find(|(key, _)| {
            let key = normalize_key(key);
            names.iter().any(|name| key == *name)
        })
        .map(|(_, value)| value)
}

fn text_field(record: &Record, names: &[&str]) -> Option<String> {
    field(record, names)
        .and_then(Value::as_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Turn one record into suggestions: the main replacement plus one per
/// entry of `alternatives`.
fn suggestions_from_record(record: &Record, default_category: Category) -> Vec<Suggestion> {
    if field(record, &["needschange"]).and_then(Value::as_bool) == Some(false) {
        return Vec::new();
    }

    let Some(original) = text_field(record, &["original"]) else {
        trace!("Dropping record without an original span");
        return Vec::new();
    };

    let category = Category::classify(
        &text_field(record, &["category", "type"]).unwrap_or_default(),
        default_category,
    );
    let explanation = text_field(record, &["explanation", "reason"]).unwrap_or_default();
    let confidence = field(record, &["confidence"])
        .and_then(Value::as_number)
        .map_or(OBJECT_CONFIDENCE, |c| c as f32);

    let mut replacements: Vec<String> = text_field(record, &["suggestion", "replacement", "corrected"])
        .into_iter()
        .collect();
    if let Some(Value::Array(alternatives)) = field(record, &["alternatives"]) {
        replacements.extend(
            alternatives
                .iter()
                .filter_map(Value::as_text)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
        );
    }

    replacements
        .into_iter()
        .map(|replacement| {
            Suggestion::new(original.clone(), replacement, category)
                .with_explanation(explanation.clone())
                .with_confidence(confidence)
        })
        .collect()
}

pub(super) fn parse_objects(raw: &str, default_category: Category) -> Vec<Suggestion> {
    let Some(body) = array_body(raw) else {
        debug!("Structured response is not a bracketed array");
        return Vec::new();
    };

    split_objects(body)
        .iter()
        .filter_map(|piece| parse_record(piece))
        .flat_map(|record| suggestions_from_record(&record, default_category))
        .collect()
}
