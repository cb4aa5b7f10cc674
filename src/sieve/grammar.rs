//! Command schemas for the Sieve parser.
//!
//! A [`Grammar`] is a plain value: every parser owns one, so registering the
//! Zimbra extensions for one parse never affects another.
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `require`, `if`, `elsif`, `else`
    Control,
    Action,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    /// A string list; a single string is accepted as a one-element list.
    StringList,
    Number,
}

impl ValueKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::StringList => "a string list",
            Self::Number => "a number",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagSpec {
    pub name: &'static str,
    /// Argument consumed right after the tag, e.g. `:comparator "i;octet"`.
    pub value: Option<ValueKind>,
}

/// Mutually exclusive tags filling one role, e.g. the match type.
#[derive(Debug, Clone, PartialEq)]
pub struct TagGroup {
    pub role: &'static str,
    pub tags: Vec<TagSpec>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Positional {
    pub role: &'static str,
    pub kind: ValueKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestArity {
    None,
    One,
    List,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandSchema {
    pub name: &'static str,
    pub kind: CommandKind,
    pub tag_groups: Vec<TagGroup>,
    pub positionals: Vec<Positional>,
    pub tests: TestArity,
    pub block: bool,
}

pub const COMPARATOR: &str = "comparator";
pub const MATCH_TYPE: &str = "match-type";
pub const ADDRESS_PART: &str = "address-part";
pub const SIZE_COMPARISON: &str = "size-comparison";
pub const ZONE: &str = "zone";

impl CommandSchema {
    fn new(name: &'static str, kind: CommandKind) -> Self {
        Self {
            name,
            kind,
            tag_groups: Vec::new(),
            positionals: Vec::new(),
            tests: TestArity::None,
            block: false,
        }
    }

    pub fn control(name: &'static str) -> Self {
        Self::new(name, CommandKind::Control)
    }

    pub fn action(name: &'static str) -> Self {
        Self::new(name, CommandKind::Action)
    }

    pub fn test(name: &'static str) -> Self {
        Self::new(name, CommandKind::Test)
    }

    pub fn arg(mut self, role: &'static str, kind: ValueKind) -> Self {
        self.positionals.push(Positional { role, kind, required: true });
        self
    }

    pub fn optional_arg(mut self, role: &'static str, kind: ValueKind) -> Self {
        self.positionals.push(Positional { role, kind, required: false });
        self
    }

    /// Add a group of value-less tags.
    pub fn tags(self, role: &'static str, names: &[&'static str], required: bool) -> Self {
        let specs = names.iter().map(|&name| TagSpec { name, value: None }).collect();
        self.tag_group(role, specs, required)
    }

    pub fn tag_group(mut self, role: &'static str, tags: Vec<TagSpec>, required: bool) -> Self {
        self.tag_groups.push(TagGroup { role, tags, required });
        self
    }

    pub fn with_comparator(self) -> Self {
        self.tag_group(
            COMPARATOR,
            vec![TagSpec { name: ":comparator", value: Some(ValueKind::String) }],
            false,
        )
    }

    pub fn with_tests(mut self, arity: TestArity) -> Self {
        self.tests = arity;
        self
    }

    pub fn with_block(mut self) -> Self {
        self.block = true;
        self
    }

    /// Find the group and spec for `tag`, if this command accepts it.
    pub fn tag(&self, tag: &str) -> Option<(&TagGroup, &TagSpec)> {
        self.tag_groups
            .iter()
            .find_map(|g| g.tags.iter().find(|t| t.name == tag).map(|t| (g, t)))
    }
}

const MATCH_TYPES: &[&str] = &[":is", ":contains", ":matches"];

#[derive(Debug, Clone, Default)]
pub struct Grammar {
    commands: HashMap<String, CommandSchema>,
}

impl Grammar {
    /// An empty grammar; nothing parses until commands are registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Base commands and tests of RFC 5228, plus `fileinto`.
    pub fn rfc5228() -> Self {
        use ValueKind::*;

        let mut g = Self::empty();
        g.register(CommandSchema::control("require").arg("capabilities", StringList))
            .register(CommandSchema::control("if").with_tests(TestArity::One).with_block())
            .register(CommandSchema::control("elsif").with_tests(TestArity::One).with_block())
            .register(CommandSchema::control("else").with_block())
            .register(CommandSchema::action("keep"))
            .register(CommandSchema::action("discard"))
            .register(CommandSchema::action("stop"))
            .register(CommandSchema::action("fileinto").arg("folder", String))
            .register(CommandSchema::action("redirect").arg("address", String))
            .register(
                CommandSchema::test("header")
                    .with_comparator()
                    .tags(MATCH_TYPE, MATCH_TYPES, false)
                    .arg("header-names", StringList)
                    .arg("keys", StringList),
            )
            .register(
                CommandSchema::test("address")
                    .with_comparator()
                    .tags(ADDRESS_PART, &[":all", ":localpart", ":domain"], false)
                    .tags(MATCH_TYPE, MATCH_TYPES, false)
                    .arg("header-names", StringList)
                    .arg("keys", StringList),
            )
            .register(CommandSchema::test("exists").arg("header-names", StringList))
            .register(
                CommandSchema::test("size")
                    .tags(SIZE_COMPARISON, &[":over", ":under"], true)
                    .arg("limit", Number),
            )
            .register(CommandSchema::test("allof").with_tests(TestArity::List))
            .register(CommandSchema::test("anyof").with_tests(TestArity::List))
            .register(CommandSchema::test("not").with_tests(TestArity::One))
            .register(CommandSchema::test("true"))
            .register(CommandSchema::test("false"));
        g
    }

    /// The base grammar with the Zimbra vocabulary registered on top.
    pub fn zimbra() -> Self {
        let mut g = Self::rfc5228();
        g.register_zimbra_extensions();
        g
    }

    pub fn register_zimbra_extensions(&mut self) -> &mut Self {
        use ValueKind::*;

        self.register(CommandSchema::action("addflag").arg("flag", String))
            .register(CommandSchema::action("tag").arg("tag", String))
            .register(CommandSchema::action("set").arg("name", String).arg("value", String))
            .register(
                CommandSchema::test("date")
                    .with_comparator()
                    .tag_group(
                        ZONE,
                        vec![
                            TagSpec { name: ":zone", value: Some(String) },
                            TagSpec { name: ":originalzone", value: None },
                        ],
                        false,
                    )
                    .tag_group(
                        MATCH_TYPE,
                        vec![TagSpec { name: ":value", value: Some(String) }],
                        true,
                    )
                    .arg("date-part", String)
                    .arg("keys", StringList),
            )
            .register(
                CommandSchema::test("body")
                    .with_comparator()
                    .tags(MATCH_TYPE, MATCH_TYPES, false)
                    .arg("keys", StringList),
            )
    }

    /// Add or replace a command schema. Names are case-insensitive.
    pub fn register(&mut self, schema: CommandSchema) -> &mut Self {
        self.commands.insert(schema.name.to_ascii_lowercase(), schema);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CommandSchema> {
        self.commands.get(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_grammar_lacks_extensions() {
        let g = Grammar::rfc5228();
        assert!(g.contains("header"));
        assert!(!g.contains("addflag"));
        assert!(!g.contains("date"));
    }

    #[test]
    fn test_extensions_are_scoped_per_grammar() {
        let base = Grammar::rfc5228();
        let zimbra = Grammar::zimbra();
        assert!(zimbra.contains("tag"));
        assert!(zimbra.contains("SET"));
        assert!(!base.contains("tag"));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut g = Grammar::zimbra();
        let before = g.get("date").cloned();
        g.register_zimbra_extensions();
        assert_eq!(g.get("date").cloned(), before);
    }

    #[test]
    fn test_tag_lookup() {
        let g = Grammar::zimbra();
        let date = g.get("date").unwrap();
        let (group, spec) = date.tag(":value").unwrap();
        assert_eq!(group.role, MATCH_TYPE);
        assert!(group.required);
        assert_eq!(spec.value, Some(ValueKind::String));
        assert!(date.tag(":contains").is_none());
    }
}
