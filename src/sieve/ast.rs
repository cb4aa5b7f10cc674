//! Typed command tree produced by the parser.
//!
//! The parser validates every command against its [`Grammar`] schema and then
//! lowers it into these enums, so consumers dispatch with a single `match`
//! instead of inspecting command names.
//!
//! [`Grammar`]: crate::sieve::grammar::Grammar

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub commands: Vec<Command>,
}

/// A top-level command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `require ["ext1", "ext2"];`
    Require(Vec<String>),
    /// `set "name" "value";`
    Set { name: String, value: String },
    /// `if <test> { <actions> }`
    If { test: Test, actions: Vec<Action> },
    /// A command the grammar accepts but that has no top-level meaning here,
    /// e.g. a bare `keep;` or an `elsif` branch.
    Other { name: String, line: usize },
}

/// Operands shared by `header` and `address`.
#[derive(Debug, Clone, PartialEq)]
pub struct StringTest {
    pub comparator: Option<String>,
    /// `:is`, `:contains` or `:matches`; `None` means the RFC default `:is`.
    pub match_type: Option<String>,
    pub header_names: Vec<String>,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    /// `allof (test1, test2, ...)`
    AllOf(Vec<Test>),
    /// `anyof (test1, test2, ...)`
    AnyOf(Vec<Test>),
    /// `not <test>`
    Not(Box<Test>),
    /// `header [:comparator c] [:match_type] <names> <keys>`
    Header(StringTest),
    /// `address [:comparator c] [:address_part] [:match_type] <names> <keys>`
    Address {
        address_part: Option<String>,
        test: StringTest,
    },
    /// `size :over|:under <limit>`, limit in bytes
    Size { comparison: String, limit: u64 },
    /// `date [:zone z] :value "op" <date-part> <keys>`
    Date {
        comparator: Option<String>,
        zone: Option<String>,
        operator: String,
        date_part: String,
        keys: Vec<String>,
    },
    /// `body [:comparator c] [:match_type] <keys>`
    Body {
        comparator: Option<String>,
        match_type: Option<String>,
        keys: Vec<String>,
    },
    /// `exists <names>`
    Exists(Vec<String>),
    True,
    False,
    /// A test registered in the grammar without a typed counterpart.
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Keep,
    Discard,
    Stop,
    FileInto(String),
    Redirect(String),
    /// `addflag "<imap flag>"`
    AddFlag(String),
    /// `tag "<name>"`
    Tag(String),
    Set { name: String, value: String },
    /// Nested control commands or actions without a typed counterpart.
    Other { name: String, line: usize },
}

impl Test {
    /// The command name this test was written with.
    pub fn name(&self) -> &str {
        match self {
            Self::AllOf(_) => "allof",
            Self::AnyOf(_) => "anyof",
            Self::Not(_) => "not",
            Self::Header(_) => "header",
            Self::Address { .. } => "address",
            Self::Size { .. } => "size",
            Self::Date { .. } => "date",
            Self::Body { .. } => "body",
            Self::Exists(_) => "exists",
            Self::True => "true",
            Self::False => "false",
            Self::Other(name) => name,
        }
    }
}
