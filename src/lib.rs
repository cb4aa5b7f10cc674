//! Convert Zimbra mail filter rules to and from Sieve scripts.
//!
//! The core is synchronous and free of I/O: [`sieve`] parses script text and
//! renders it back, [`record`] maps the Zimbra JSON records, and both meet in
//! the [`model::rule::Rule`] value. [`net`] and [`store`] are the thin shell
//! used by the `zbt` binary.

pub mod config;
pub mod error;
pub mod model;
pub mod net;
pub mod normalize;
pub mod record;
pub mod sieve;
pub mod store;

pub use error::{ConvertError, Converted, Warning};
pub use model::rule::Rule;
pub use record::{parse_records, rule_from_record, rule_to_record, rules_from_records, rules_to_records};
pub use sieve::{display_rule, display_rules, text_to_rules, ParseError};
