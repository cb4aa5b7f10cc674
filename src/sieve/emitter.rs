//! Emit canonical Sieve text from Zimbra rules.
use std::fmt::Write;

use crate::error::{ConvertError, Converted, Diagnostics};
use crate::model::enums::CASE_SENSITIVE_COMPARATOR;
use crate::model::rule::{Action, Condition, Rule, Test};
use crate::normalize::{epoch_to_date, format_sieve_date};

/// Extensions used by the emitted scripts, in the order they are required.
pub const REQUIRES: &[&str] = &["date", "relational", "fileinto", "imap4flags", "body", "variables"];

const INDENT: &str = "   ";

/// Render a full script: the `require` line, then every rule followed by a
/// blank line.
pub fn display_rules(rules: &[Rule]) -> Result<Converted<String>, ConvertError> {
    let mut diag = Diagnostics::default();
    let mut out = String::new();

    out.push_str("require [");
    out.push_str(&REQUIRES.iter().map(|r| quote(r)).collect::<Vec<_>>().join(", "));
    out.push_str("];\n\n");

    for rule in rules {
        emit_rule(&mut out, rule, &mut diag)?;
        out.push('\n');
    }

    Ok(diag.finish(out))
}

/// Render one rule: its `set` lines and its `if` block.
pub fn display_rule(rule: &Rule) -> Result<Converted<String>, ConvertError> {
    let mut diag = Diagnostics::default();
    let mut out = String::new();
    emit_rule(&mut out, rule, &mut diag)?;
    Ok(diag.finish(out))
}

fn emit_rule(out: &mut String, rule: &Rule, diag: &mut Diagnostics) -> Result<(), ConvertError> {
    let active = if rule.active { "1" } else { "0" };
    let _ = writeln!(out, "set \"name\" {};", quote(&rule.name));
    let _ = writeln!(out, "set \"active\" \"{active}\";");

    let mut lines = Vec::with_capacity(rule.tests.tests.len());
    for (_, test) in rule.tests.tests.iter() {
        lines.push(format!("{INDENT}{}", render_test(test, diag)?));
    }
    // A test list may not be empty.
    if lines.is_empty() {
        lines.push(format!("{INDENT}true"));
    }
    let _ = writeln!(out, "if {} (", rule.tests.combinator.as_sieve());
    out.push_str(&lines.join(",\n"));
    out.push_str("\n) {\n");

    for (_, action) in rule.actions.iter() {
        let _ = writeln!(out, "{INDENT}{}", render_action(action, diag));
    }
    out.push_str("}\n");
    Ok(())
}

fn render_test(test: &Test, diag: &mut Diagnostics) -> Result<String, ConvertError> {
    let mut line = String::new();
    if test.negated {
        line.push_str("not ");
    }

    match &test.condition {
        Condition::Header {
            comparison,
            headers,
            value,
            case_sensitive,
        } => {
            let _ = write!(line, "header {comparison}");
            push_comparator(&mut line, *case_sensitive);
            let _ = write!(line, " {} [{}]", string_list(headers), quote(value));
        }
        Condition::Address {
            comparison,
            part,
            headers,
            value,
            case_sensitive,
        } => {
            let _ = write!(line, "address {comparison} {}", part.as_sieve());
            push_comparator(&mut line, *case_sensitive);
            let _ = write!(line, " {} [{}]", string_list(headers), quote(value));
        }
        Condition::Size { comparison, limit } => {
            let bytes = limit
                .bytes()
                .ok_or_else(|| ConvertError::unsupported("size", limit.to_string()))?;
            let _ = write!(line, "size {} {bytes}", comparison.as_sieve());
        }
        Condition::Date { comparison, epoch } => {
            let date = format_sieve_date(epoch_to_date(*epoch)?);
            let _ = write!(line, "date :value \"{}\" \"date\" \"{date}\"", comparison.as_sieve());
        }
        Condition::Body {
            value,
            case_sensitive,
        } => {
            line.push_str("body :contains");
            push_comparator(&mut line, *case_sensitive);
            let _ = write!(line, " {}", quote(value));
        }
        Condition::Exists { headers } => {
            let _ = write!(line, "exists {}", string_list(headers));
        }
        Condition::Unknown { category } => {
            // A placeholder is `true` whatever its polarity.
            diag.unknown_category(category.as_str());
            return Ok("true".to_string());
        }
    }
    Ok(line)
}

fn render_action(action: &Action, diag: &mut Diagnostics) -> String {
    match action {
        Action::Keep => "keep;".to_string(),
        Action::Discard => "discard;".to_string(),
        Action::Stop => "stop;".to_string(),
        Action::FileInto(folder) => format!("fileinto {};", quote(folder)),
        Action::Redirect(address) => format!("redirect {};", quote(address)),
        Action::Flag(flag) => format!("addflag {};", quote(flag.as_imap())),
        Action::Tag(tag) => format!("tag {};", quote(tag)),
        Action::Unknown { category } => {
            diag.unknown_category(category.as_str());
            "keep;".to_string()
        }
    }
}

fn push_comparator(line: &mut String, case_sensitive: bool) {
    if case_sensitive {
        let _ = write!(line, " :comparator {}", quote(CASE_SENSITIVE_COMPARATOR));
    }
}

fn string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| quote(i)).collect();
    format!("[{}]", quoted.join(", "))
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
