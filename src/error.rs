//! Conversion errors and the warning side channel.
//!
//! Fatal problems are [`ConvertError`]s and abort a conversion with no
//! partial result. Recoverable ones are [`Warning`]s: they are logged through
//! `tracing` as they happen and returned next to the best-effort output.
use std::fmt;

use crate::sieve::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("unsupported {what} '{value}'")]
    UnsupportedValue { what: &'static str, value: String },
    #[error("unsupported nesting: {0}")]
    UnsupportedNesting(String),
    #[error("duplicate index {index} in {scope}")]
    DuplicateIndex { scope: &'static str, index: u32 },
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl ConvertError {
    pub fn unsupported(what: &'static str, value: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            what,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A record category or tree node with no known mapping.
    UnknownCategory { category: String },
    /// A top-level command that is not `require`, `set` or `if`.
    UnknownCommand { name: String, line: usize },
    /// Input that was understood but cannot be represented, and was dropped.
    IgnoredArgument { context: String, detail: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory { category } => write!(f, "unknown category '{category}'"),
            Self::UnknownCommand { name, line } => {
                write!(f, "unknown command '{name}' at line {line}, skipped")
            }
            Self::IgnoredArgument { context, detail } => write!(f, "{context}: ignoring {detail}"),
        }
    }
}

/// The output of a conversion together with the warnings it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

/// Collects warnings for one conversion call.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn unknown_category(&mut self, category: impl Into<String>) {
        self.warn(Warning::UnknownCategory {
            category: category.into(),
        });
    }

    pub fn ignored(&mut self, context: impl Into<String>, detail: impl Into<String>) {
        self.warn(Warning::IgnoredArgument {
            context: context.into(),
            detail: detail.into(),
        });
    }

    pub fn finish<T>(self, value: T) -> Converted<T> {
        Converted {
            value,
            warnings: self.warnings,
        }
    }
}
