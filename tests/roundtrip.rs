use serde_json::json;
use zimbratosthenes::record::schema::FilterRule;
use zimbratosthenes::{display_rules, rule_from_record, rule_to_record, text_to_rules};

const DUMMY_TEXT: &str = r#"require ["date", "relational", "fileinto", "imap4flags", "body", "variables"];

set "name" "dummy";
set "active" "0";
if allof (
   header :contains ["subject"] ["fizz"],
   not header :contains ["from"] ["buzz"],
   header :is ["to", "cc"] ["foo"],
   not header :matches ["X-bar"] ["*none?"],
   size :over 10485760,
   not date :value "ge" "date" "2014-01-01",
   body :contains "baz",
   not exists ["X-dummy"]
) {
   keep;
   tag "Old";
   addflag "\\Seen";
   fileinto ".pipe";
   redirect "example@example.com";
   discard;
   stop;
}

"#;

fn dummy_record() -> FilterRule {
    serde_json::from_value(json!({
        "active": "0",
        "name": "dummy",
        "filterTests": {
            "condition": "allof",
            "bodyTest": {"index": "6", "value": "baz"},
            "dateTest": {"index": "5", "negative": "1", "dateComparison": "after", "d": "1388534400"},
            "headerTest": [
                {"stringComparison": "contains", "index": "0", "value": "fizz", "header": "subject"},
                {"stringComparison": "contains", "index": "1", "negative": "1", "value": "buzz", "header": "from"},
                {"stringComparison": "is", "index": "2", "value": "foo", "header": "to,cc"},
                {"stringComparison": "matches", "index": "3", "negative": "1", "value": "*none?", "header": "X-bar"}
            ],
            "sizeTest": {"numberComparison": "over", "index": "4", "s": "10M"},
            "headerExistsTest": {"index": "7", "negative": "1", "header": "X-dummy"}
        },
        "filterActions": {
            "actionRedirect": {"a": "example@example.com", "index": "4"},
            "actionTag": {"index": "1", "tagName": "Old"},
            "actionFileInto": {"index": "3", "folderPath": ".pipe"},
            "actionFlag": {"index": "2", "flagName": "read"},
            "actionDiscard": {"index": "5"},
            "actionKeep": {"index": "0"},
            "actionStop": {"index": "6"}
        }
    }))
    .unwrap()
}

#[test]
fn dummy_record_renders_canonical_text() {
    let rule = rule_from_record(dummy_record()).unwrap();
    assert!(rule.warnings.is_empty());
    let text = display_rules(&[rule.value]).unwrap();
    assert!(text.warnings.is_empty());
    assert_eq!(text.value, DUMMY_TEXT);
}

#[test]
fn dummy_text_parses_to_record() {
    let rules = text_to_rules(DUMMY_TEXT).unwrap();
    assert!(rules.warnings.is_empty());
    assert_eq!(rules.value.len(), 1);

    let record = rule_to_record(&rules.value[0]);
    assert!(record.warnings.is_empty());
    assert_eq!(record.value, dummy_record());
}

#[test]
fn text_record_text_is_stable() {
    let rules = text_to_rules(DUMMY_TEXT).unwrap().value;
    let records: Vec<FilterRule> = rules.iter().map(|r| rule_to_record(r).value).collect();
    let back: Vec<_> = records
        .into_iter()
        .map(|r| rule_from_record(r).unwrap().value)
        .collect();
    assert_eq!(back, rules);
    assert_eq!(display_rules(&back).unwrap().value, DUMMY_TEXT);
}

#[test]
fn record_json_matches_wire_shape() {
    let rules = text_to_rules(DUMMY_TEXT).unwrap().value;
    let value = serde_json::to_value(rule_to_record(&rules[0]).value).unwrap();
    assert_eq!(value["filterTests"]["sizeTest"], json!({"index": "4", "numberComparison": "over", "s": "10M"}));
    assert_eq!(value["filterTests"]["headerTest"].as_array().unwrap().len(), 4);
    assert_eq!(value["filterActions"]["actionFlag"]["flagName"], "read");
    assert!(value["filterTests"]["bodyTest"].get("negative").is_none());
}

#[test]
fn several_rules_keep_their_order() {
    let text = r#"require ["fileinto", "variables"];
set "name" "first";
if anyof (header :contains "subject" "a") { fileinto "A"; }
set "name" "second";
set "active" "0";
if anyof (size :under 1K) { discard; }
"#;
    let rules = text_to_rules(text).unwrap().value;
    let names: Vec<_> = rules.iter().map(|r| (r.name.as_str(), r.active)).collect();
    assert_eq!(names, [("first", true), ("second", false)]);
}

#[test]
fn parse_errors_abort_without_output() {
    let err = text_to_rules("if allof (header :contains \"a\" \"b\" {\n keep;\n}\n").unwrap_err();
    assert!(err.to_string().contains("line 1"), "{err}");
}
