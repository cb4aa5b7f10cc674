use proptest::prelude::*;

use zimbratosthenes::model::enums::{AddressPart, Combinator, DateComparison, Flag, SizeComparison, StringComparison};
use zimbratosthenes::model::rule::{Action, Condition, Indexed, Rule, Test, TestGroup};
use zimbratosthenes::normalize::{date_to_epoch, epoch_to_date, SizeLimit, SECONDS_PER_DAY};
use zimbratosthenes::{display_rules, rule_from_record, rule_to_record, text_to_rules};

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .*?@_-]{0,10}"
}

fn arb_headers() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z][A-Za-z0-9-]{0,8}", 1..4)
}

fn arb_comparison() -> impl Strategy<Value = StringComparison> {
    prop_oneof![
        Just(StringComparison::Is),
        Just(StringComparison::Contains),
        Just(StringComparison::Matches),
    ]
}

fn arb_condition() -> impl Strategy<Value = Condition> {
    prop_oneof![
        (arb_comparison(), arb_headers(), arb_text(), any::<bool>()).prop_map(
            |(comparison, headers, value, case_sensitive)| Condition::Header {
                comparison,
                headers,
                value,
                case_sensitive,
            }
        ),
        (
            arb_comparison(),
            prop_oneof![Just(AddressPart::All), Just(AddressPart::Localpart), Just(AddressPart::Domain)],
            arb_headers(),
            arb_text(),
            any::<bool>(),
        )
            .prop_map(|(comparison, part, headers, value, case_sensitive)| Condition::Address {
                comparison,
                part,
                headers,
                value,
                case_sensitive,
            }),
        (prop_oneof![Just(SizeComparison::Over), Just(SizeComparison::Under)], 0u64..(1 << 40)).prop_map(
            |(comparison, bytes)| Condition::Size {
                comparison,
                limit: SizeLimit::from_bytes(bytes),
            }
        ),
        (prop_oneof![Just(DateComparison::Before), Just(DateComparison::After)], 0i64..40_000).prop_map(
            |(comparison, day)| Condition::Date {
                comparison,
                epoch: day * SECONDS_PER_DAY,
            }
        ),
        (arb_text(), any::<bool>()).prop_map(|(value, case_sensitive)| Condition::Body { value, case_sensitive }),
        arb_headers().prop_map(|headers| Condition::Exists { headers }),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Keep),
        Just(Action::Discard),
        Just(Action::Stop),
        "[A-Za-z/.]{1,10}".prop_map(Action::FileInto),
        "[a-z]{1,6}@[a-z]{1,6}\\.org".prop_map(Action::Redirect),
        prop_oneof![Just(Flag::Read), Just(Flag::Flagged)].prop_map(Action::Flag),
        "[A-Za-z]{1,8}".prop_map(Action::Tag),
    ]
}

fn arb_rule() -> impl Strategy<Value = Rule> {
    (
        "[a-z][a-z0-9 ]{0,10}",
        any::<bool>(),
        prop_oneof![Just(Combinator::AllOf), Just(Combinator::AnyOf)],
        prop::collection::vec((any::<bool>(), arb_condition()), 1..6),
        prop::collection::vec(arb_action(), 0..5),
    )
        .prop_map(|(name, active, combinator, tests, actions)| Rule {
            name,
            active,
            tests: TestGroup {
                combinator,
                tests: tests
                    .into_iter()
                    .map(|(negated, condition)| Test { negated, condition })
                    .collect::<Indexed<_>>(),
            },
            actions: actions.into_iter().collect(),
        })
}

proptest! {
    /// Rendering then parsing gives back the same rules.
    #[test]
    fn text_round_trip(rules in prop::collection::vec(arb_rule(), 1..4)) {
        let text = display_rules(&rules).unwrap();
        prop_assert!(text.warnings.is_empty());
        let parsed = text_to_rules(&text.value).unwrap();
        prop_assert!(parsed.warnings.is_empty());
        prop_assert_eq!(&parsed.value, &rules);
        prop_assert_eq!(display_rules(&parsed.value).unwrap().value, text.value);
    }

    /// Rules survive the trip through their records.
    #[test]
    fn record_round_trip(rule in arb_rule()) {
        let record = rule_to_record(&rule);
        prop_assert!(record.warnings.is_empty());
        let back = rule_from_record(record.value).unwrap().value;
        prop_assert_eq!(back, rule);
    }

    /// Re-encoding a size never changes it, and the unit is the largest that
    /// divides the byte count.
    #[test]
    fn size_ladder_is_minimal(bytes in 1u64..(1 << 50)) {
        let limit = SizeLimit::from_bytes(bytes);
        prop_assert_eq!(limit.bytes(), Some(bytes));
        let reparsed: SizeLimit = limit.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, limit);
        if limit.unit.exponent() < 3 {
            prop_assert!(limit.value % 1024 != 0);
        }
    }

    #[test]
    fn date_round_trip_floors_to_midnight(epoch in -10_000_000_000i64..10_000_000_000) {
        let day = date_to_epoch(epoch_to_date(epoch).unwrap());
        prop_assert_eq!(day, epoch.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY);
        prop_assert_eq!(date_to_epoch(epoch_to_date(day).unwrap()), day);
    }
}
