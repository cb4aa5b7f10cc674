//! Zimbra filter records <-> [`Rule`].
//!
//! This is the only place that knows about the category grouping and the
//! single-object-or-list encoding; everything past it works on [`Indexed`]
//! lists.
pub mod schema;

use serde::Deserialize;

use crate::error::{ConvertError, Converted, Diagnostics};
use crate::model::enums::{AddressPart, Combinator, DateComparison, Flag, SizeComparison, StringComparison};
use crate::model::rule::{Action, Condition, Indexed, Rule, Test, TestGroup};
use crate::normalize::SizeLimit;
use schema::{
    AddressTest, BodyTest, DateTest, FileIntoAction, FilterActions, FilterRule, FilterRules,
    FilterTests, FlagAction, HeaderExistsTest, HeaderTest, IndexOnly, OneOrMany, RedirectAction,
    SizeTest, TagAction,
};

fn parse_index(category: &str, index: &str) -> Result<u32, ConvertError> {
    index
        .trim()
        .parse()
        .map_err(|_| ConvertError::InvalidRecord(format!("index '{index}' in {category}")))
}

fn parse_flag(field: &'static str, value: Option<&str>) -> Result<bool, ConvertError> {
    match value {
        None | Some("0") => Ok(false),
        Some("1") => Ok(true),
        Some(other) => Err(ConvertError::unsupported(field, other)),
    }
}

fn encode_flag(value: bool) -> Option<String> {
    value.then(|| "1".to_string())
}

fn split_headers(header: &str) -> Vec<String> {
    header.split(',').map(|h| h.trim().to_string()).collect()
}

fn items<T>(category: Option<OneOrMany<T>>) -> Vec<T> {
    category.map(OneOrMany::into_vec).unwrap_or_default()
}

/// Convert one record into a rule.
pub fn rule_from_record(record: FilterRule) -> Result<Converted<Rule>, ConvertError> {
    let mut diag = Diagnostics::default();
    let active = parse_flag("active", Some(record.active.as_str()))?;
    let tests = tests_from_record(record.filter_tests, &mut diag)?;
    let actions = actions_from_record(record.filter_actions, &mut diag)?;
    Ok(diag.finish(Rule {
        name: record.name,
        active,
        tests,
        actions,
    }))
}

pub fn rules_from_records(records: Vec<FilterRule>) -> Result<Converted<Vec<Rule>>, ConvertError> {
    let mut rules = Vec::with_capacity(records.len());
    let mut warnings = Vec::new();
    for record in records {
        let converted = rule_from_record(record)?;
        warnings.extend(converted.warnings);
        rules.push(converted.value);
    }
    Ok(Converted { value: rules, warnings })
}

fn tests_from_record(tests: FilterTests, diag: &mut Diagnostics) -> Result<TestGroup, ConvertError> {
    const SCOPE: &str = "filterTests";
    let mut out = Indexed::new();
    let mut add = |category: &str,
                   index: &str,
                   negative: Option<&str>,
                   condition: Condition|
     -> Result<(), ConvertError> {
        let index = parse_index(category, index)?;
        let negated = parse_flag("negative", negative)?;
        out.insert(SCOPE, index, Test { negated, condition })
    };

    for t in items(tests.header_test) {
        let condition = Condition::Header {
            comparison: StringComparison::from_record(&t.string_comparison)?,
            headers: split_headers(&t.header),
            value: t.value,
            case_sensitive: parse_flag("caseSensitive", t.case_sensitive.as_deref())?,
        };
        add("headerTest", &t.index, t.negative.as_deref(), condition)?;
    }
    for t in items(tests.address_test) {
        let condition = Condition::Address {
            comparison: StringComparison::from_record(&t.string_comparison)?,
            part: AddressPart::from_record(&t.part)?,
            headers: split_headers(&t.header),
            value: t.value,
            case_sensitive: parse_flag("caseSensitive", t.case_sensitive.as_deref())?,
        };
        add("addressTest", &t.index, t.negative.as_deref(), condition)?;
    }
    for t in items(tests.size_test) {
        let condition = Condition::Size {
            comparison: SizeComparison::from_record(&t.number_comparison)?,
            limit: t.s.parse::<SizeLimit>()?,
        };
        add("sizeTest", &t.index, t.negative.as_deref(), condition)?;
    }
    for t in items(tests.date_test) {
        let epoch = t
            .d
            .trim()
            .parse()
            .map_err(|_| ConvertError::InvalidRecord(format!("date '{}' in dateTest", t.d)))?;
        let condition = Condition::Date {
            comparison: DateComparison::from_record(&t.date_comparison)?,
            epoch,
        };
        add("dateTest", &t.index, t.negative.as_deref(), condition)?;
    }
    for t in items(tests.body_test) {
        let condition = Condition::Body {
            value: t.value,
            case_sensitive: parse_flag("caseSensitive", t.case_sensitive.as_deref())?,
        };
        add("bodyTest", &t.index, t.negative.as_deref(), condition)?;
    }
    for t in items(tests.header_exists_test) {
        let condition = Condition::Exists {
            headers: split_headers(&t.header),
        };
        add("headerExistsTest", &t.index, t.negative.as_deref(), condition)?;
    }
    for (category, value) in &tests.other {
        for entry in unknown_entries(category, value, diag) {
            let condition = Condition::Unknown {
                category: category.clone(),
            };
            add(category.as_str(), &entry.index, entry.negative.as_deref(), condition)?;
        }
    }

    Ok(TestGroup {
        combinator: Combinator::from_record(&tests.condition)?,
        tests: out,
    })
}

fn actions_from_record(
    actions: FilterActions,
    diag: &mut Diagnostics,
) -> Result<Indexed<Action>, ConvertError> {
    const SCOPE: &str = "filterActions";
    let mut out = Indexed::new();
    let mut add = |category: &str, index: &str, action: Action| -> Result<(), ConvertError> {
        out.insert(SCOPE, parse_index(category, index)?, action)
    };

    for a in items(actions.action_keep) {
        add("actionKeep", &a.index, Action::Keep)?;
    }
    for a in items(actions.action_discard) {
        add("actionDiscard", &a.index, Action::Discard)?;
    }
    for a in items(actions.action_stop) {
        add("actionStop", &a.index, Action::Stop)?;
    }
    for a in items(actions.action_file_into) {
        add("actionFileInto", &a.index, Action::FileInto(a.folder_path))?;
    }
    for a in items(actions.action_redirect) {
        add("actionRedirect", &a.index, Action::Redirect(a.a))?;
    }
    for a in items(actions.action_flag) {
        add("actionFlag", &a.index, Action::Flag(Flag::from_record(&a.flag_name)?))?;
    }
    for a in items(actions.action_tag) {
        add("actionTag", &a.index, Action::Tag(a.tag_name))?;
    }
    for (category, value) in &actions.other {
        for entry in unknown_entries(category, value, diag) {
            let action = Action::Unknown {
                category: category.clone(),
            };
            add(category.as_str(), &entry.index, action)?;
        }
    }

    Ok(out)
}

/// The placement fields of an entry in a category we do not model.
#[derive(Deserialize)]
struct UnknownEntry {
    #[serde(default, deserialize_with = "schema::opt_scalar")]
    index: Option<String>,
    #[serde(default, deserialize_with = "schema::opt_scalar")]
    negative: Option<String>,
}

struct Placed {
    index: String,
    negative: Option<String>,
}

/// Entries of an unknown category that carry an index. Entries that are not
/// objects or have no index cannot be placed and are dropped with a warning.
fn unknown_entries(category: &str, value: &serde_json::Value, diag: &mut Diagnostics) -> Vec<Placed> {
    let values: Vec<&serde_json::Value> = match value {
        serde_json::Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut placed = Vec::new();
    for value in values {
        let entry = match UnknownEntry::deserialize(value) {
            Ok(entry) => entry,
            Err(e) => {
                diag.ignored(category, format!("malformed entry ({e})"));
                continue;
            }
        };
        let Some(index) = entry.index else {
            diag.ignored(category, "entry without an index");
            continue;
        };
        placed.push(Placed {
            index,
            negative: entry.negative,
        });
    }
    placed
}

/// Convert a rule back into its record. Unknown categories cannot be
/// reconstructed and are dropped with a warning.
pub fn rule_to_record(rule: &Rule) -> Converted<FilterRule> {
    let mut diag = Diagnostics::default();

    let mut header = Vec::new();
    let mut address = Vec::new();
    let mut size = Vec::new();
    let mut date = Vec::new();
    let mut body = Vec::new();
    let mut exists = Vec::new();

    for (i, test) in rule.tests.tests.iter() {
        let index = i.to_string();
        let negative = encode_flag(test.negated);
        match &test.condition {
            Condition::Header {
                comparison,
                headers,
                value,
                case_sensitive,
            } => header.push(HeaderTest {
                index,
                negative,
                case_sensitive: encode_flag(*case_sensitive),
                string_comparison: comparison.as_record().to_string(),
                header: headers.join(","),
                value: value.clone(),
            }),
            Condition::Address {
                comparison,
                part,
                headers,
                value,
                case_sensitive,
            } => address.push(AddressTest {
                index,
                negative,
                case_sensitive: encode_flag(*case_sensitive),
                string_comparison: comparison.as_record().to_string(),
                part: part.as_record().to_string(),
                header: headers.join(","),
                value: value.clone(),
            }),
            Condition::Size { comparison, limit } => size.push(SizeTest {
                index,
                negative,
                number_comparison: comparison.as_record().to_string(),
                s: limit.to_string(),
            }),
            Condition::Date { comparison, epoch } => date.push(DateTest {
                index,
                negative,
                date_comparison: comparison.as_record().to_string(),
                d: epoch.to_string(),
            }),
            Condition::Body {
                value,
                case_sensitive,
            } => body.push(BodyTest {
                index,
                negative,
                case_sensitive: encode_flag(*case_sensitive),
                value: value.clone(),
            }),
            Condition::Exists { headers } => exists.push(HeaderExistsTest {
                index,
                negative,
                header: headers.join(","),
            }),
            Condition::Unknown { category } => diag.unknown_category(category.as_str()),
        }
    }

    let mut keep = Vec::new();
    let mut discard = Vec::new();
    let mut stop = Vec::new();
    let mut file_into = Vec::new();
    let mut redirect = Vec::new();
    let mut flag = Vec::new();
    let mut tag = Vec::new();

    for (i, action) in rule.actions.iter() {
        let index = i.to_string();
        match action {
            Action::Keep => keep.push(IndexOnly { index }),
            Action::Discard => discard.push(IndexOnly { index }),
            Action::Stop => stop.push(IndexOnly { index }),
            Action::FileInto(folder) => file_into.push(FileIntoAction {
                index,
                folder_path: folder.clone(),
            }),
            Action::Redirect(a) => redirect.push(RedirectAction { index, a: a.clone() }),
            Action::Flag(f) => flag.push(FlagAction {
                index,
                flag_name: f.as_record().to_string(),
            }),
            Action::Tag(t) => tag.push(TagAction {
                index,
                tag_name: t.clone(),
            }),
            Action::Unknown { category } => diag.unknown_category(category.as_str()),
        }
    }

    diag.finish(FilterRule {
        name: rule.name.clone(),
        active: if rule.active { "1" } else { "0" }.to_string(),
        filter_tests: FilterTests {
            condition: rule.tests.combinator.as_record().to_string(),
            header_test: OneOrMany::from_vec(header),
            address_test: OneOrMany::from_vec(address),
            size_test: OneOrMany::from_vec(size),
            date_test: OneOrMany::from_vec(date),
            body_test: OneOrMany::from_vec(body),
            header_exists_test: OneOrMany::from_vec(exists),
            other: Default::default(),
        },
        filter_actions: FilterActions {
            action_keep: OneOrMany::from_vec(keep),
            action_discard: OneOrMany::from_vec(discard),
            action_stop: OneOrMany::from_vec(stop),
            action_file_into: OneOrMany::from_vec(file_into),
            action_redirect: OneOrMany::from_vec(redirect),
            action_flag: OneOrMany::from_vec(flag),
            action_tag: OneOrMany::from_vec(tag),
            other: Default::default(),
        },
    })
}

pub fn rules_to_records(rules: &[Rule]) -> Converted<Vec<FilterRule>> {
    let mut records = Vec::with_capacity(rules.len());
    let mut warnings = Vec::new();
    for rule in rules {
        let converted = rule_to_record(rule);
        warnings.extend(converted.warnings);
        records.push(converted.value);
    }
    Converted { value: records, warnings }
}

/// The shapes a saved record file may take: a bare rule, a list of rules,
/// or a `filterRules` wrapper as found in a `GetFilterRulesResponse`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Wrapped {
        #[serde(rename = "filterRules")]
        filter_rules: OneOrMany<FilterRules>,
    },
    Rules(OneOrMany<FilterRule>),
}

/// Read filter records from JSON text.
pub fn parse_records(json: &str) -> Result<Vec<FilterRule>, ConvertError> {
    let file: RecordFile =
        serde_json::from_str(json).map_err(|e| ConvertError::InvalidRecord(e.to_string()))?;
    Ok(match file {
        RecordFile::Wrapped { filter_rules } => filter_rules
            .into_vec()
            .into_iter()
            .flat_map(|r| r.filter_rule.map(OneOrMany::into_vec).unwrap_or_default())
            .collect(),
        RecordFile::Rules(rules) => rules.into_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> FilterRule {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_index_orders_across_categories() {
        let rule = rule_from_record(record(json!({
            "name": "x",
            "active": "1",
            "filterTests": {
                "condition": "anyof",
                "headerExistsTest": [{"index": "2", "header": "C"}, {"index": "0", "header": "A"}],
                "bodyTest": {"index": "1", "value": "b", "caseSensitive": "1"}
            },
            "filterActions": {"actionStop": {"index": "1"}, "actionKeep": {"index": "0"}}
        })))
        .unwrap()
        .value;

        let order: Vec<_> = rule.tests.tests.iter().map(|(i, t)| (i, t.condition.category().to_string())).collect();
        assert_eq!(
            order,
            [
                (0, "headerExistsTest".to_string()),
                (1, "bodyTest".to_string()),
                (2, "headerExistsTest".to_string()),
            ]
        );
        let actions: Vec<_> = rule.actions.iter().map(|(_, a)| a.clone()).collect();
        assert_eq!(actions, [Action::Keep, Action::Stop]);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let err = rule_from_record(record(json!({
            "name": "x",
            "active": "1",
            "filterTests": {
                "condition": "allof",
                "bodyTest": {"index": "0", "value": "a"},
                "headerExistsTest": {"index": "0", "header": "A"}
            }
        })))
        .unwrap_err();
        assert_eq!(err.to_string(), "duplicate index 0 in filterTests");
    }

    #[test]
    fn test_unknown_categories_become_placeholders() {
        let out = rule_from_record(record(json!({
            "name": "x",
            "active": "0",
            "filterTests": {
                "condition": "allof",
                "mimeHeaderTest": {"index": "0", "negative": "1", "header": "a"}
            },
            "filterActions": {
                "actionReply": {"index": "0", "content": "away"},
                "actionNotify": {"content": "no index"}
            }
        })))
        .unwrap();

        let (_, test) = out.value.tests.tests.iter().next().unwrap();
        assert!(test.negated);
        assert_eq!(test.condition, Condition::Unknown { category: "mimeHeaderTest".to_string() });
        assert_eq!(out.value.actions.len(), 1);
        assert_eq!(out.warnings.len(), 1);

        let back = rule_to_record(&out.value);
        assert_eq!(back.warnings.len(), 2);
        assert!(back.value.filter_tests.other.is_empty());
    }

    #[test]
    fn test_unknown_entries_accept_numbers_and_bools() {
        let out = rule_from_record(record(json!({
            "name": "x",
            "active": "1",
            "filterTests": {
                "condition": "anyof",
                "mimeHeaderTest": {"index": 0, "negative": true}
            },
            "filterActions": {
                "actionNotify": {"index": 1, "negative": 0}
            }
        })))
        .unwrap();

        assert_eq!(out.value.tests.tests.len(), 1);
        let (i, test) = out.value.tests.tests.iter().next().unwrap();
        assert_eq!(i, 0);
        assert!(test.negated);
        assert_eq!(out.value.actions.len(), 1);
        assert_eq!(out.value.actions.iter().next().map(|(i, _)| i), Some(1));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_malformed_unknown_entry_is_reported() {
        let out = rule_from_record(record(json!({
            "name": "x",
            "active": "1",
            "filterTests": {"condition": "anyof"},
            "filterActions": {
                "actionNotify": ["oops", {"index": {"n": 1}}, {"index": "2"}]
            }
        })))
        .unwrap();

        assert_eq!(out.value.actions.len(), 1);
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings.iter().all(|w| w.to_string().starts_with("actionNotify: ignoring malformed entry")));
    }

    #[test]
    fn test_negated_unknown_renders_plain_true() {
        let out = rule_from_record(record(json!({
            "name": "x",
            "active": "1",
            "filterTests": {
                "condition": "anyof",
                "headerTest": {"index": "0", "stringComparison": "is", "header": "subject", "value": "a"},
                "mimeHeaderTest": {"index": "1", "negative": "1"}
            }
        })))
        .unwrap();

        let text = crate::display_rule(&out.value).unwrap().value;
        assert!(text.contains("   true\n) {"));
        assert!(!text.contains("not true"));
    }

    #[test]
    fn test_unsupported_flag_name() {
        let err = rule_from_record(record(json!({
            "name": "x",
            "active": "1",
            "filterTests": {"condition": "allof"},
            "filterActions": {"actionFlag": {"index": "0", "flagName": "priority"}}
        })))
        .unwrap_err();
        assert_eq!(err.to_string(), "unsupported flagName 'priority'");
    }

    #[test]
    fn test_bad_index() {
        let err = rule_from_record(record(json!({
            "name": "x",
            "active": "1",
            "filterTests": {"condition": "allof", "bodyTest": {"index": "first", "value": "a"}}
        })))
        .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidRecord(_)));
    }

    #[test]
    fn test_record_round_trip_with_lists() {
        let original = record(json!({
            "name": "lists",
            "active": "1",
            "filterTests": {
                "condition": "anyof",
                "addressTest": [
                    {"index": "0", "stringComparison": "is", "part": "domain", "header": "from", "value": "a.org"},
                    {"index": "1", "negative": "1", "caseSensitive": "1", "stringComparison": "contains",
                     "part": "localpart", "header": "to,cc", "value": "bob"}
                ]
            },
            "filterActions": {"actionFileInto": {"index": "0", "folderPath": "Lists"}}
        }));
        let rule = rule_from_record(original.clone()).unwrap().value;
        assert_eq!(rule_to_record(&rule).value, original);
    }

    #[test]
    fn test_parse_record_file_shapes() {
        let rule = json!({"name": "a", "active": "1", "filterTests": {"condition": "allof"}});
        assert_eq!(parse_records(&rule.to_string()).unwrap().len(), 1);
        assert_eq!(parse_records(&json!([rule, rule]).to_string()).unwrap().len(), 2);
        let wrapped = json!({"filterRules": [{"filterRule": [rule, rule, rule]}]});
        assert_eq!(parse_records(&wrapped.to_string()).unwrap().len(), 3);
        assert!(parse_records("{\"nope\": 1}").is_err());
    }
}
