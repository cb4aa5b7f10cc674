//! Sieve side of the converter: tokenizer, grammar registry, parser, the
//! typed command tree, and both conversion directions.

pub mod ast;
pub mod converter;
pub mod emitter;
pub mod grammar;
pub mod lexer;
pub mod parser;

pub use converter::zimbrify;
pub use emitter::{display_rule, display_rules};
pub use grammar::Grammar;
pub use parser::Parser;

/// A fatal syntax or schema error, positioned at the offending token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Parse `text` with the Zimbra grammar and convert it into rules.
pub fn text_to_rules(
    text: &str,
) -> Result<crate::error::Converted<Vec<crate::model::rule::Rule>>, crate::error::ConvertError> {
    let script = Parser::new(Grammar::zimbra()).parse(text)?;
    zimbrify(&script)
}
