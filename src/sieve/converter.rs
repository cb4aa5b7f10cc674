//! Typed Sieve tree -> Zimbra rules.
//!
//! One rule per top-level `if`, in source order. `set "name"` and
//! `set "active"` feed the next `if`; other top-level commands are reported
//! and skipped.
use crate::error::{ConvertError, Converted, Diagnostics, Warning};
use crate::model::enums::{
    case_sensitive_from_comparator, AddressPart, Combinator, DateComparison, Flag,
    SizeComparison, StringComparison,
};
use crate::model::rule::{self, Condition, Indexed, Rule, TestGroup};
use crate::normalize::{date_to_epoch, parse_sieve_date, SizeLimit};
use crate::sieve::ast::{Action, Command, Script, StringTest, Test};

pub const DEFAULT_NAME: &str = "undefined";
pub const DEFAULT_ACTIVE: &str = "1";

/// Convert a parsed script into rules.
pub fn zimbrify(script: &Script) -> Result<Converted<Vec<Rule>>, ConvertError> {
    let mut diag = Diagnostics::default();
    let mut name = DEFAULT_NAME.to_string();
    let mut active = DEFAULT_ACTIVE.to_string();
    let mut rules = Vec::new();

    for cmd in &script.commands {
        match cmd {
            Command::Require(_) => {}
            Command::Set { name: var, value } => match var.as_str() {
                "name" => name = value.clone(),
                "active" => active = value.clone(),
                _ => diag.ignored("set", format!("variable \"{var}\"")),
            },
            Command::If { test, actions } => {
                let rule = Rule {
                    name: name.clone(),
                    active: parse_active(&active)?,
                    tests: convert_tests(test, &mut diag)?,
                    actions: convert_actions(actions, &mut diag)?,
                };
                rules.push(rule);
            }
            Command::Other { name, line } => diag.warn(Warning::UnknownCommand {
                name: name.clone(),
                line: *line,
            }),
        }
    }

    Ok(diag.finish(rules))
}

fn parse_active(value: &str) -> Result<bool, ConvertError> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(ConvertError::unsupported("active value", value)),
    }
}

fn convert_tests(test: &Test, diag: &mut Diagnostics) -> Result<TestGroup, ConvertError> {
    let (combinator, children) = match test {
        Test::AllOf(children) => (Combinator::AllOf, children.as_slice()),
        Test::AnyOf(children) => (Combinator::AnyOf, children.as_slice()),
        single => (Combinator::AllOf, std::slice::from_ref(single)),
    };

    let mut tests = Indexed::new();
    for child in children {
        let (negated, leaf) = match child {
            Test::Not(inner) => (true, inner.as_ref()),
            leaf => (false, leaf),
        };
        if let Some(condition) = convert_leaf(leaf, diag)? {
            tests.push(rule::Test { negated, condition });
        }
    }

    Ok(TestGroup { combinator, tests })
}

fn convert_leaf(test: &Test, diag: &mut Diagnostics) -> Result<Option<Condition>, ConvertError> {
    let condition = match test {
        Test::AllOf(_) | Test::AnyOf(_) | Test::Not(_) => {
            return Err(ConvertError::UnsupportedNesting(format!(
                "'{}' below the top-level test",
                test.name()
            )));
        }
        Test::Header(t) => {
            let (comparison, value, case_sensitive) = string_operands("header", t, diag)?;
            Condition::Header {
                comparison,
                headers: t.header_names.clone(),
                value,
                case_sensitive,
            }
        }
        Test::Address { address_part, test: t } => {
            let (comparison, value, case_sensitive) = string_operands("address", t, diag)?;
            Condition::Address {
                comparison,
                part: AddressPart::from_sieve(address_part.as_deref())?,
                headers: t.header_names.clone(),
                value,
                case_sensitive,
            }
        }
        Test::Size { comparison, limit } => Condition::Size {
            comparison: SizeComparison::from_sieve(comparison)?,
            limit: SizeLimit::from_bytes(*limit),
        },
        Test::Date {
            comparator,
            zone,
            operator,
            date_part,
            keys,
        } => {
            if comparator.is_some() {
                diag.ignored("date test", "comparator");
            }
            if let Some(zone) = zone {
                diag.ignored("date test", format!("zone {zone}, dates are UTC"));
            }
            if date_part != "date" {
                return Err(ConvertError::unsupported("date part", date_part.as_str()));
            }
            Condition::Date {
                comparison: DateComparison::from_sieve(operator)?,
                epoch: date_to_epoch(parse_sieve_date(&first_key("date", keys, diag))?),
            }
        }
        Test::Body {
            comparator,
            match_type,
            keys,
        } => {
            if StringComparison::from_sieve(match_type.as_deref())? != StringComparison::Contains {
                return Err(ConvertError::unsupported(
                    "body match type",
                    match_type.as_deref().unwrap_or(":is"),
                ));
            }
            Condition::Body {
                value: first_key("body", keys, diag),
                case_sensitive: case_sensitive_from_comparator(comparator.as_deref())?,
            }
        }
        Test::Exists(headers) => Condition::Exists {
            headers: headers.clone(),
        },
        Test::True | Test::False | Test::Other(_) => {
            diag.unknown_category(test.name());
            return Ok(None);
        }
    };
    Ok(Some(condition))
}

fn string_operands(
    context: &str,
    t: &StringTest,
    diag: &mut Diagnostics,
) -> Result<(StringComparison, String, bool), ConvertError> {
    Ok((
        StringComparison::from_sieve(t.match_type.as_deref())?,
        first_key(context, &t.keys, diag),
        case_sensitive_from_comparator(t.comparator.as_deref())?,
    ))
}

/// Records hold a single value; any further keys are reported and dropped.
fn first_key(context: &str, keys: &[String], diag: &mut Diagnostics) -> String {
    for extra in keys.iter().skip(1) {
        diag.ignored(format!("{context} test"), format!("extra key \"{extra}\""));
    }
    keys.first().cloned().unwrap_or_default()
}

fn convert_actions(
    actions: &[Action],
    diag: &mut Diagnostics,
) -> Result<Indexed<rule::Action>, ConvertError> {
    let mut out = Indexed::new();
    for action in actions {
        let converted = match action {
            Action::Keep => rule::Action::Keep,
            Action::Discard => rule::Action::Discard,
            Action::Stop => rule::Action::Stop,
            Action::FileInto(folder) => rule::Action::FileInto(folder.clone()),
            Action::Redirect(address) => rule::Action::Redirect(address.clone()),
            Action::AddFlag(flag) => rule::Action::Flag(Flag::from_imap(flag)?),
            Action::Tag(tag) => rule::Action::Tag(tag.clone()),
            Action::Set { name, .. } => {
                diag.ignored("set", format!("variable \"{name}\" inside a rule"));
                continue;
            }
            Action::Other { name, line } => {
                diag.warn(Warning::UnknownCommand {
                    name: name.clone(),
                    line: *line,
                });
                continue;
            }
        };
        out.push(converted);
    }
    Ok(out)
}
