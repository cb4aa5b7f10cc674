//! Conversions between the encodings of the Sieve text and of the records.
//!
//! Sizes are bytes in Sieve and `{n}{unit}` in records. Dates are calendar
//! days in Sieve and epoch seconds in records. Flag names live with
//! [`Flag`](crate::model::enums::Flag).
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime};

use crate::error::ConvertError;

pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeUnit {
    Bytes,
    Kilo,
    Mega,
    Giga,
}

impl SizeUnit {
    const LADDER: [SizeUnit; 4] = [Self::Bytes, Self::Kilo, Self::Mega, Self::Giga];

    pub fn letter(&self) -> char {
        match self {
            Self::Bytes => 'B',
            Self::Kilo => 'K',
            Self::Mega => 'M',
            Self::Giga => 'G',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'B' => Some(Self::Bytes),
            'K' => Some(Self::Kilo),
            'M' => Some(Self::Mega),
            'G' => Some(Self::Giga),
            _ => None,
        }
    }

    /// Power of 1024 this unit stands for.
    pub fn exponent(&self) -> u32 {
        *self as u32
    }
}

/// A size threshold as stored in a record, e.g. `10M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimit {
    pub value: u64,
    pub unit: SizeUnit,
}

impl SizeLimit {
    /// Encode a byte count with the largest unit that divides it exactly,
    /// climbing at most up to gigabytes.
    pub fn from_bytes(bytes: u64) -> Self {
        if bytes == 0 {
            return Self { value: 0, unit: SizeUnit::Bytes };
        }
        let mut value = bytes;
        let mut unit = SizeUnit::Bytes;
        for next in &SizeUnit::LADDER[1..] {
            if value % 1024 != 0 {
                break;
            }
            value /= 1024;
            unit = *next;
        }
        Self { value, unit }
    }

    /// Byte count, or `None` if it does not fit in a `u64`.
    pub fn bytes(&self) -> Option<u64> {
        1024u64
            .checked_pow(self.unit.exponent())
            .and_then(|factor| self.value.checked_mul(factor))
    }
}

impl fmt::Display for SizeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.letter())
    }
}

impl FromStr for SizeLimit {
    type Err = ConvertError;

    /// Accepts `10M`, `512`, `1k`; the result is re-normalized so `10240K`
    /// reads back as `10M`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (digits, unit) = match s.chars().last() {
            Some(c) if c.is_ascii_alphabetic() => {
                let unit = SizeUnit::from_letter(c)
                    .ok_or_else(|| ConvertError::unsupported("size unit", c.to_string()))?;
                (&s[..s.len() - 1], unit)
            }
            _ => (s, SizeUnit::Bytes),
        };
        let value = digits
            .parse::<u64>()
            .map_err(|_| ConvertError::unsupported("size", s))?;
        let limit = Self { value, unit };
        let bytes = limit
            .bytes()
            .ok_or_else(|| ConvertError::unsupported("size", s))?;
        Ok(Self::from_bytes(bytes))
    }
}

/// Epoch seconds of midnight UTC on `date`.
pub fn date_to_epoch(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// The UTC calendar day containing `epoch`; the time of day is discarded.
pub fn epoch_to_date(epoch: i64) -> Result<NaiveDate, ConvertError> {
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| ConvertError::unsupported("date", epoch.to_string()))
}

/// Parse the `YYYY-MM-DD` key of a `date` test.
pub fn parse_sieve_date(text: &str) -> Result<NaiveDate, ConvertError> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| ConvertError::unsupported("date", text))
}

pub fn format_sieve_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
