//! Parsing of model responses into [`Suggestion`]s.
//!
//! The model replies in one of two shapes:
//!
//! - **delimited lines**: `"original"|"suggestion"|Category|reason`, one
//!   suggestion per line, or the literal `NONE` ([`ResponseFormat::Lines`]
//!   and, with a trailing confidence field, [`ResponseFormat::ScoredLines`])
//! - **JSON-like arrays** of objects, used by the structured check
//!   ([`ResponseFormat::Objects`])
//!
//! Parsing never fails. Anything that cannot be understood is skipped and
//! the rest of the response is still used, since a model reply that is half
//! right is still worth showing.

mod lines;
mod object;
mod stream;

pub use self::{
    lines::{LINE_CONFIDENCE, SCORED_DEFAULT_CONFIDENCE},
    object::{Record, Value, OBJECT_CONFIDENCE},
    stream::LineAccumulator,
};
use crate::suggestion::{Category, Suggestion};

/// The response shape expected from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Four pipe-delimited fields per line; fixed confidence.
    Lines,
    /// Delimited lines with an optional fifth confidence field.
    ScoredLines,
    /// A bracketed array of loosely structured objects.
    Objects,
}

/// Parse a delimited-line response.
pub fn parse(raw: &str, default_category: Category) -> Vec<Suggestion> {
    parse_with(raw, ResponseFormat::Lines, default_category)
}

/// Parse a response of the given shape. Blank or missing categories take
/// `default_category`.
pub fn parse_with(raw: &str, format: ResponseFormat, default_category: Category) -> Vec<Suggestion> {
    match format {
        ResponseFormat::Lines => lines::parse_lines(raw, false, default_category),
        ResponseFormat::ScoredLines => lines::parse_lines(raw, true, default_category),
        ResponseFormat::Objects => object::parse_objects(raw, default_category),
    }
}

/// Parse a single delimited line, as produced while a response streams in.
pub fn parse_line(line: &str, default_category: Category) -> Option<Suggestion> {
    lines::parse_line(line, false, default_category)
}
