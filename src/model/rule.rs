use std::collections::BTreeMap;

use crate::error::ConvertError;
use crate::model::enums::{
    AddressPart, Combinator, DateComparison, Flag, SizeComparison, StringComparison,
};
use crate::normalize::SizeLimit;

/// Entries keyed by their cross-category `index`.
///
/// Records group tests and actions by category and rely on the index for
/// the real order; Sieve text only has the order. Keeping the index as the
/// map key means iteration is always the linear order, whichever side built
/// the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Indexed<T> {
    entries: BTreeMap<u32, T>,
}

impl<T> Default for Indexed<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> Indexed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at an explicit index; indices must be unique within a group.
    pub fn insert(&mut self, scope: &'static str, index: u32, entry: T) -> Result<(), ConvertError> {
        if self.entries.contains_key(&index) {
            return Err(ConvertError::DuplicateIndex { scope, index });
        }
        self.entries.insert(index, entry);
        Ok(())
    }

    /// Append after the current last index.
    pub fn push(&mut self, entry: T) {
        let next = self.entries.keys().next_back().map_or(0, |i| i + 1);
        self.entries.insert(next, entry);
    }

    /// Entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entries.iter().map(|(i, e)| (*i, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> FromIterator<T> for Indexed<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut indexed = Self::new();
        for entry in iter {
            indexed.push(entry);
        }
        indexed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Header {
        comparison: StringComparison,
        /// Header names; the record joins them with commas.
        headers: Vec<String>,
        value: String,
        case_sensitive: bool,
    },
    Address {
        comparison: StringComparison,
        part: AddressPart,
        headers: Vec<String>,
        value: String,
        case_sensitive: bool,
    },
    Size {
        comparison: SizeComparison,
        limit: SizeLimit,
    },
    Date {
        comparison: DateComparison,
        /// Seconds since the epoch, midnight UTC when built from Sieve.
        epoch: i64,
    },
    Body {
        value: String,
        case_sensitive: bool,
    },
    Exists {
        headers: Vec<String>,
    },
    /// A record category this crate does not model.
    Unknown {
        category: String,
    },
}

impl Condition {
    /// Category key used by the records, e.g. `headerTest`.
    pub fn category(&self) -> &str {
        match self {
            Self::Header { .. } => "headerTest",
            Self::Address { .. } => "addressTest",
            Self::Size { .. } => "sizeTest",
            Self::Date { .. } => "dateTest",
            Self::Body { .. } => "bodyTest",
            Self::Exists { .. } => "headerExistsTest",
            Self::Unknown { category } => category,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    /// Negation wraps exactly one leaf test.
    pub negated: bool,
    pub condition: Condition,
}

impl Test {
    pub fn new(condition: Condition) -> Self {
        Self {
            negated: false,
            condition,
        }
    }

    pub fn negated(condition: Condition) -> Self {
        Self {
            negated: true,
            condition,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestGroup {
    pub combinator: Combinator,
    pub tests: Indexed<Test>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Keep,
    Discard,
    Stop,
    FileInto(String),
    Redirect(String),
    Flag(Flag),
    Tag(String),
    Unknown { category: String },
}

impl Action {
    pub fn category(&self) -> &str {
        match self {
            Self::Keep => "actionKeep",
            Self::Discard => "actionDiscard",
            Self::Stop => "actionStop",
            Self::FileInto(_) => "actionFileInto",
            Self::Redirect(_) => "actionRedirect",
            Self::Flag(_) => "actionFlag",
            Self::Tag(_) => "actionTag",
            Self::Unknown { category } => category,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub active: bool,
    pub tests: TestGroup,
    pub actions: Indexed<Action>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_iterates_by_index() {
        let mut list = Indexed::new();
        list.insert("tests", 2, "c").unwrap();
        list.insert("tests", 0, "a").unwrap();
        list.insert("tests", 1, "b").unwrap();
        let order: Vec<_> = list.iter().map(|(_, e)| *e).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn test_indexed_rejects_duplicates() {
        let mut list = Indexed::new();
        list.insert("actions", 4, Action::Keep).unwrap();
        let err = list.insert("actions", 4, Action::Stop).unwrap_err();
        assert_eq!(err.to_string(), "duplicate index 4 in actions");
    }

    #[test]
    fn test_indexed_push_appends() {
        let mut list: Indexed<Action> = [Action::Keep, Action::Stop].into_iter().collect();
        list.insert("actions", 7, Action::Discard).unwrap();
        list.push(Action::Tag("x".to_string()));
        let indices: Vec<u32> = list.iter().map(|(i, _)| i).collect();
        assert_eq!(indices, [0, 1, 7, 8]);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let mut a = Indexed::new();
        a.insert("tests", 1, 'y').unwrap();
        a.insert("tests", 0, 'x').unwrap();
        let b: Indexed<char> = ['x', 'y'].into_iter().collect();
        assert_eq!(a, b);
    }
}
