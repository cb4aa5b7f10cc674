use std::fmt;

use crate::error::ConvertError;

// Each enum has two spellings: the Sieve one (`as_sieve`/`from_sieve`) and
// the one used by the Zimbra filter records (`as_record`/`from_record`).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    AllOf,
    AnyOf,
}

impl Combinator {
    pub fn as_sieve(&self) -> &'static str {
        match self {
            Self::AllOf => "allof",
            Self::AnyOf => "anyof",
        }
    }

    pub fn as_record(&self) -> &'static str {
        self.as_sieve()
    }

    pub fn from_record(s: &str) -> Result<Self, ConvertError> {
        match s.to_ascii_lowercase().as_str() {
            "allof" => Ok(Self::AllOf),
            "anyof" => Ok(Self::AnyOf),
            _ => Err(ConvertError::unsupported("condition", s)),
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sieve())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringComparison {
    Is,
    Contains,
    Matches,
}

impl StringComparison {
    pub fn as_sieve(&self) -> &'static str {
        match self {
            Self::Is => ":is",
            Self::Contains => ":contains",
            Self::Matches => ":matches",
        }
    }

    /// A missing match type means `:is` (RFC 5228 section 2.7.1).
    pub fn from_sieve(s: Option<&str>) -> Result<Self, ConvertError> {
        match s {
            None | Some(":is") => Ok(Self::Is),
            Some(":contains") => Ok(Self::Contains),
            Some(":matches") => Ok(Self::Matches),
            Some(other) => Err(ConvertError::unsupported("match type", other)),
        }
    }

    pub fn as_record(&self) -> &'static str {
        &self.as_sieve()[1..]
    }

    pub fn from_record(s: &str) -> Result<Self, ConvertError> {
        match s {
            "is" => Ok(Self::Is),
            "contains" => Ok(Self::Contains),
            "matches" => Ok(Self::Matches),
            _ => Err(ConvertError::unsupported("stringComparison", s)),
        }
    }
}

impl fmt::Display for StringComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sieve())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPart {
    All,
    Localpart,
    Domain,
}

impl AddressPart {
    pub fn as_sieve(&self) -> &'static str {
        match self {
            Self::All => ":all",
            Self::Localpart => ":localpart",
            Self::Domain => ":domain",
        }
    }

    /// A missing address part means `:all`.
    pub fn from_sieve(s: Option<&str>) -> Result<Self, ConvertError> {
        match s {
            None | Some(":all") => Ok(Self::All),
            Some(":localpart") => Ok(Self::Localpart),
            Some(":domain") => Ok(Self::Domain),
            Some(other) => Err(ConvertError::unsupported("address part", other)),
        }
    }

    pub fn as_record(&self) -> &'static str {
        &self.as_sieve()[1..]
    }

    pub fn from_record(s: &str) -> Result<Self, ConvertError> {
        match s {
            "all" => Ok(Self::All),
            "localpart" => Ok(Self::Localpart),
            "domain" => Ok(Self::Domain),
            _ => Err(ConvertError::unsupported("address part", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeComparison {
    Over,
    Under,
}

impl SizeComparison {
    pub fn as_sieve(&self) -> &'static str {
        match self {
            Self::Over => ":over",
            Self::Under => ":under",
        }
    }

    pub fn from_sieve(s: &str) -> Result<Self, ConvertError> {
        match s {
            ":over" => Ok(Self::Over),
            ":under" => Ok(Self::Under),
            _ => Err(ConvertError::unsupported("size comparison", s)),
        }
    }

    pub fn as_record(&self) -> &'static str {
        &self.as_sieve()[1..]
    }

    pub fn from_record(s: &str) -> Result<Self, ConvertError> {
        match s {
            "over" => Ok(Self::Over),
            "under" => Ok(Self::Under),
            _ => Err(ConvertError::unsupported("numberComparison", s)),
        }
    }
}

/// `before` is written `:value "le"` in Sieve, `after` is `:value "ge"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateComparison {
    Before,
    After,
}

impl DateComparison {
    pub fn as_sieve(&self) -> &'static str {
        match self {
            Self::Before => "le",
            Self::After => "ge",
        }
    }

    pub fn from_sieve(s: &str) -> Result<Self, ConvertError> {
        match s {
            "le" => Ok(Self::Before),
            "ge" => Ok(Self::After),
            _ => Err(ConvertError::unsupported("date comparison", s)),
        }
    }

    pub fn as_record(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }

    pub fn from_record(s: &str) -> Result<Self, ConvertError> {
        match s {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            _ => Err(ConvertError::unsupported("dateComparison", s)),
        }
    }
}

/// Comparator spelling of a case-sensitivity flag.
pub const CASE_SENSITIVE_COMPARATOR: &str = "i;octet";
pub const CASE_INSENSITIVE_COMPARATOR: &str = "i;ascii-casemap";

/// Map an optional `:comparator` to the record's `caseSensitive` flag.
pub fn case_sensitive_from_comparator(comparator: Option<&str>) -> Result<bool, ConvertError> {
    match comparator {
        None | Some(CASE_INSENSITIVE_COMPARATOR) => Ok(false),
        Some(CASE_SENSITIVE_COMPARATOR) => Ok(true),
        Some(other) => Err(ConvertError::unsupported("comparator", other)),
    }
}

/// IMAP flags settable through `addflag`. Only two are known to the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Read,
    Flagged,
}

impl Flag {
    pub fn as_imap(&self) -> &'static str {
        match self {
            Self::Read => "\\Seen",
            Self::Flagged => "\\Flagged",
        }
    }

    pub fn from_imap(s: &str) -> Result<Self, ConvertError> {
        match s {
            "\\Seen" => Ok(Self::Read),
            "\\Flagged" => Ok(Self::Flagged),
            _ => Err(ConvertError::unsupported("flag", s)),
        }
    }

    pub fn as_record(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Flagged => "flagged",
        }
    }

    pub fn from_record(s: &str) -> Result<Self, ConvertError> {
        match s {
            "read" => Ok(Self::Read),
            "flagged" => Ok(Self::Flagged),
            _ => Err(ConvertError::unsupported("flagName", s)),
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_record())
    }
}
