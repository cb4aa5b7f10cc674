//! Recursive descent Sieve parser.
//!
//! Parsing runs in three steps: the generic RFC 5228 syntax is read into
//! untyped nodes, each node is checked against its schema in the parser's
//! [`Grammar`], and the checked nodes are lowered into the typed tree.
use std::collections::HashMap;

use crate::sieve::ast::{Action, Command, Script, StringTest, Test};
use crate::sieve::grammar::{
    CommandKind, CommandSchema, Grammar, TestArity, ValueKind, ADDRESS_PART, COMPARATOR,
    MATCH_TYPE, SIZE_COMPARISON, ZONE,
};
use crate::sieve::lexer::{tokenize, Span, Token};
use crate::sieve::ParseError;

pub struct Parser {
    grammar: Grammar,
}

impl Parser {
    pub fn new(grammar: Grammar) -> Self {
        Self { grammar }
    }

    pub fn parse(&self, input: &str) -> Result<Script, ParseError> {
        let spans = tokenize(input)?;
        let mut tokens = Tokens::new(&spans, input);

        let mut commands = Vec::new();
        while tokens.peek().is_some() {
            let node = tokens.command()?;
            let checked = self.check(node, Position::Command)?;
            commands.push(lower_command(checked));
        }
        Ok(Script { commands })
    }

    fn check(&self, node: Node, position: Position) -> Result<Checked, ParseError> {
        let schema = self.grammar.get(&node.name).ok_or_else(|| {
            node.error(format!("unknown {} '{}'", position.describe(), node.name))
        })?;

        match (position, schema.kind) {
            (Position::Test, CommandKind::Test) => {}
            (Position::Command, CommandKind::Control | CommandKind::Action) => {}
            (Position::Test, _) => {
                return Err(node.error(format!("'{}' is not a test", node.name)));
            }
            (Position::Command, CommandKind::Test) => {
                return Err(node.error(format!("'{}' is a test, not a command", node.name)));
            }
        }

        let (tags, args) = check_arguments(schema, &node)?;

        let tests = match (schema.tests, node.tests) {
            (TestArity::None, TestsForm::None) => Vec::new(),
            (TestArity::One, TestsForm::Single(test)) => vec![self.check(*test, Position::Test)?],
            (TestArity::List, TestsForm::List(list)) if !list.is_empty() => list
                .into_iter()
                .map(|t| self.check(t, Position::Test))
                .collect::<Result<_, _>>()?,
            (TestArity::None, _) => {
                return Err(ParseError::new(node.line, node.column, format!("'{}' takes no test", node.name)));
            }
            (TestArity::One, _) => {
                return Err(ParseError::new(node.line, node.column, format!("'{}' expects a single test", node.name)));
            }
            (TestArity::List, _) => {
                return Err(ParseError::new(
                    node.line,
                    node.column,
                    format!("'{}' expects a non-empty test list", node.name),
                ));
            }
        };

        let block = match (schema.block, node.block) {
            (true, Some(block)) => block
                .into_iter()
                .map(|c| self.check(c, Position::Command))
                .collect::<Result<_, _>>()?,
            (false, None) => Vec::new(),
            (true, None) => {
                return Err(ParseError::new(node.line, node.column, format!("'{}' expects a block", node.name)));
            }
            (false, Some(_)) => {
                return Err(ParseError::new(node.line, node.column, format!("'{}' takes no block", node.name)));
            }
        };

        Ok(Checked {
            name: schema.name,
            line: node.line,
            tags,
            args,
            tests,
            block,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Position {
    Command,
    Test,
}

impl Position {
    fn describe(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Test => "test",
        }
    }
}

// --- Generic syntax ---

#[derive(Debug, Clone)]
enum Value {
    Tag(String),
    Str(String),
    List(Vec<String>),
    Number(u64),
}

#[derive(Debug, Clone)]
struct Arg {
    value: Value,
    line: usize,
    column: usize,
}

#[derive(Debug)]
enum TestsForm {
    None,
    Single(Box<Node>),
    List(Vec<Node>),
}

#[derive(Debug)]
struct Node {
    name: String,
    line: usize,
    column: usize,
    args: Vec<Arg>,
    tests: TestsForm,
    block: Option<Vec<Node>>,
}

impl Node {
    fn error(&self, message: String) -> ParseError {
        ParseError::new(self.line, self.column, message)
    }
}

struct Tokens<'a> {
    spans: &'a [Span],
    pos: usize,
    eof: (usize, usize),
}

impl<'a> Tokens<'a> {
    fn new(spans: &'a [Span], input: &str) -> Self {
        let line = input.matches('\n').count() + 1;
        let column = input.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        Self { spans, pos: 0, eof: (line, column) }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.spans.get(self.pos).map(|s| &s.token)
    }

    fn here(&self) -> (usize, usize) {
        self.spans.get(self.pos).map_or(self.eof, |s| (s.line, s.column))
    }

    fn error(&self, expected: &str) -> ParseError {
        let (line, column) = self.here();
        let found = self.peek().map_or("end of input".to_string(), Token::describe);
        ParseError::new(line, column, format!("expected {expected}, found {found}"))
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self, expected: &str) -> Result<(String, usize, usize), ParseError> {
        let (line, column) = self.here();
        match self.peek() {
            Some(Token::Identifier(name)) => {
                self.bump();
                Ok((name.to_ascii_lowercase(), line, column))
            }
            _ => Err(self.error(expected)),
        }
    }

    /// `command = identifier arguments (";" / block)`
    fn command(&mut self) -> Result<Node, ParseError> {
        let mut node = self.test_like("command")?;
        match self.peek() {
            Some(Token::Semicolon) => self.bump(),
            Some(Token::LBrace) => {
                self.bump();
                let mut block = Vec::new();
                while !self.eat(&Token::RBrace) {
                    if self.peek().is_none() {
                        return Err(self.error("'}'"));
                    }
                    block.push(self.command()?);
                }
                node.block = Some(block);
            }
            _ => return Err(self.error("';' or '{'")),
        }
        Ok(node)
    }

    /// `identifier *argument [test / test-list]`
    fn test_like(&mut self, expected: &str) -> Result<Node, ParseError> {
        let (name, line, column) = self.identifier(expected)?;
        let args = self.arguments()?;
        let tests = match self.peek() {
            Some(Token::LParen) => {
                self.bump();
                let mut list = vec![self.test_like("test")?];
                while self.eat(&Token::Comma) {
                    list.push(self.test_like("test")?);
                }
                if !self.eat(&Token::RParen) {
                    return Err(self.error("',' or ')'"));
                }
                TestsForm::List(list)
            }
            Some(Token::Identifier(_)) => TestsForm::Single(Box::new(self.test_like("test")?)),
            _ => TestsForm::None,
        };
        Ok(Node { name, line, column, args, tests, block: None })
    }

    fn arguments(&mut self) -> Result<Vec<Arg>, ParseError> {
        let mut args = Vec::new();
        loop {
            let (line, column) = self.here();
            let value = match self.peek() {
                Some(Token::Tag(t)) => Value::Tag(t.clone()),
                Some(Token::QuotedString(s) | Token::MultiLineString(s)) => Value::Str(s.clone()),
                Some(Token::Number(n)) => Value::Number(*n),
                Some(Token::LBracket) => {
                    self.bump();
                    args.push(Arg { value: Value::List(self.string_list()?), line, column });
                    continue;
                }
                _ => return Ok(args),
            };
            self.bump();
            args.push(Arg { value, line, column });
        }
    }

    /// The remainder of `"[" string *("," string) "]"` after the bracket.
    fn string_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(Token::QuotedString(s) | Token::MultiLineString(s)) => {
                    items.push(s.clone());
                    self.bump();
                }
                _ => return Err(self.error("a string")),
            }
            if self.eat(&Token::RBracket) {
                return Ok(items);
            }
            if !self.eat(&Token::Comma) {
                return Err(self.error("',' or ']'"));
            }
        }
    }
}

// --- Schema check ---

#[derive(Debug, Clone)]
struct TagValue {
    tag: &'static str,
    value: Option<Value>,
}

#[derive(Debug)]
struct Checked {
    name: &'static str,
    line: usize,
    tags: HashMap<&'static str, TagValue>,
    args: Vec<Value>,
    tests: Vec<Checked>,
    block: Vec<Checked>,
}

fn value_matches(value: &Value, kind: ValueKind) -> bool {
    matches!(
        (value, kind),
        (Value::Str(_), ValueKind::String | ValueKind::StringList)
            | (Value::List(_), ValueKind::StringList)
            | (Value::Number(_), ValueKind::Number)
    )
}

type CheckedArgs = (HashMap<&'static str, TagValue>, Vec<Value>);

fn check_arguments(schema: &CommandSchema, node: &Node) -> Result<CheckedArgs, ParseError> {
    let mut tags = HashMap::new();
    let mut args = Vec::new();
    let mut iter = node.args.iter();

    while let Some(arg) = iter.next() {
        let at = |message: String| ParseError::new(arg.line, arg.column, message);
        match &arg.value {
            Value::Tag(tag) => {
                if !args.is_empty() {
                    return Err(at(format!("tag '{tag}' after positional arguments")));
                }
                let (group, spec) = schema
                    .tag(tag)
                    .ok_or_else(|| at(format!("unexpected tag '{tag}' for '{}'", schema.name)))?;
                if tags.contains_key(group.role) {
                    return Err(at(format!("duplicate {} for '{}'", group.role, schema.name)));
                }
                let value = match spec.value {
                    Some(kind) => match iter.next() {
                        Some(next) if value_matches(&next.value, kind) => Some(next.value.clone()),
                        _ => return Err(at(format!("'{tag}' expects {}", kind.describe()))),
                    },
                    None => None,
                };
                tags.insert(group.role, TagValue { tag: spec.name, value });
            }
            value => {
                let Some(expected) = schema.positionals.get(args.len()) else {
                    return Err(at(format!("too many arguments for '{}'", schema.name)));
                };
                if !value_matches(value, expected.kind) {
                    return Err(at(format!(
                        "'{}' expects {} as {}",
                        schema.name,
                        expected.kind.describe(),
                        expected.role
                    )));
                }
                args.push(value.clone());
            }
        }
    }

    if let Some(missing) = schema.positionals.get(args.len()).filter(|p| p.required) {
        return Err(node.error(format!("'{}' is missing its {}", schema.name, missing.role)));
    }
    if let Some(group) = schema.tag_groups.iter().find(|g| g.required && !tags.contains_key(g.role)) {
        return Err(node.error(format!("'{}' is missing its {}", schema.name, group.role)));
    }

    Ok((tags, args))
}

// --- Lowering into the typed tree ---

impl Checked {
    fn string(&self, i: usize) -> String {
        match self.args.get(i) {
            Some(Value::Str(s)) => s.clone(),
            Some(Value::List(items)) => items.first().cloned().unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn list(&self, i: usize) -> Vec<String> {
        match self.args.get(i) {
            Some(Value::Str(s)) => vec![s.clone()],
            Some(Value::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn number(&self, i: usize) -> u64 {
        match self.args.get(i) {
            Some(Value::Number(n)) => *n,
            _ => 0,
        }
    }

    fn tag(&self, role: &str) -> Option<String> {
        self.tags.get(role).map(|t| t.tag.to_string())
    }

    fn tag_value(&self, role: &str) -> Option<String> {
        match self.tags.get(role).and_then(|t| t.value.as_ref()) {
            Some(Value::Str(s)) => Some(s.clone()),
            Some(Value::List(items)) => items.first().cloned(),
            _ => None,
        }
    }

    fn string_test(&self) -> StringTest {
        StringTest {
            comparator: self.tag_value(COMPARATOR),
            match_type: self.tag(MATCH_TYPE),
            header_names: self.list(0),
            keys: self.list(1),
        }
    }
}

fn lower_command(c: Checked) -> Command {
    match c.name {
        "require" => Command::Require(c.list(0)),
        "set" => Command::Set { name: c.string(0), value: c.string(1) },
        "if" => {
            let actions = c.block.into_iter().map(lower_action).collect();
            let test = c.tests.into_iter().next().map_or(Test::True, lower_test);
            Command::If { test, actions }
        }
        name => Command::Other { name: name.to_string(), line: c.line },
    }
}

fn lower_action(c: Checked) -> Action {
    match c.name {
        "keep" => Action::Keep,
        "discard" => Action::Discard,
        "stop" => Action::Stop,
        "fileinto" => Action::FileInto(c.string(0)),
        "redirect" => Action::Redirect(c.string(0)),
        "addflag" => Action::AddFlag(c.string(0)),
        "tag" => Action::Tag(c.string(0)),
        "set" => Action::Set { name: c.string(0), value: c.string(1) },
        name => Action::Other { name: name.to_string(), line: c.line },
    }
}

fn lower_test(c: Checked) -> Test {
    match c.name {
        "allof" => Test::AllOf(c.tests.into_iter().map(lower_test).collect()),
        "anyof" => Test::AnyOf(c.tests.into_iter().map(lower_test).collect()),
        "not" => Test::Not(Box::new(c.tests.into_iter().next().map_or(Test::False, lower_test))),
        "header" => Test::Header(c.string_test()),
        "address" => Test::Address {
            address_part: c.tag(ADDRESS_PART),
            test: c.string_test(),
        },
        "size" => Test::Size {
            comparison: c.tag(SIZE_COMPARISON).unwrap_or_default(),
            limit: c.number(0),
        },
        "date" => Test::Date {
            comparator: c.tag_value(COMPARATOR),
            zone: c.tag_value(ZONE).or_else(|| c.tag(ZONE)),
            operator: c.tag_value(MATCH_TYPE).unwrap_or_default(),
            date_part: c.string(0),
            keys: c.list(1),
        },
        "body" => Test::Body {
            comparator: c.tag_value(COMPARATOR),
            match_type: c.tag(MATCH_TYPE),
            keys: c.list(0),
        },
        "exists" => Test::Exists(c.list(0)),
        "true" => Test::True,
        "false" => Test::False,
        name => Test::Other(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Script, ParseError> {
        Parser::new(Grammar::zimbra()).parse(input)
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").unwrap().commands.is_empty());
        assert!(parse("# only a comment\n").unwrap().commands.is_empty());
    }

    #[test]
    fn test_parse_require_list() {
        let script = parse("require [\"fileinto\", \"body\"];").unwrap();
        assert_eq!(
            script.commands[0],
            Command::Require(vec!["fileinto".to_string(), "body".to_string()])
        );
    }

    #[test]
    fn test_parse_set_and_if() {
        let input = r#"
set "name" "spam";
if header :contains "Subject" "SPAM" {
    fileinto "Junk";
    stop;
}
"#;
        let script = parse(input).unwrap();
        assert_eq!(script.commands.len(), 2);
        assert_eq!(
            script.commands[0],
            Command::Set { name: "name".to_string(), value: "spam".to_string() }
        );
        let Command::If { test, actions } = &script.commands[1] else {
            panic!("expected if");
        };
        assert_eq!(
            *test,
            Test::Header(StringTest {
                comparator: None,
                match_type: Some(":contains".to_string()),
                header_names: vec!["Subject".to_string()],
                keys: vec!["SPAM".to_string()],
            })
        );
        assert_eq!(actions, &[Action::FileInto("Junk".to_string()), Action::Stop]);
    }

    #[test]
    fn test_parse_allof_with_not() {
        let script = parse(
            "if allof (not exists [\"X-a\"], size :under 1K) { keep; }",
        )
        .unwrap();
        let Command::If { test: Test::AllOf(tests), .. } = &script.commands[0] else {
            panic!("expected allof");
        };
        assert_eq!(tests[0], Test::Not(Box::new(Test::Exists(vec!["X-a".to_string()]))));
        assert_eq!(tests[1], Test::Size { comparison: ":under".to_string(), limit: 1024 });
    }

    #[test]
    fn test_parse_address_tags_any_order() {
        let script = parse(
            "if address :domain :comparator \"i;octet\" :is \"From\" \"example.com\" { keep; }",
        )
        .unwrap();
        let Command::If { test: Test::Address { address_part, test }, .. } = &script.commands[0] else {
            panic!("expected address test");
        };
        assert_eq!(address_part.as_deref(), Some(":domain"));
        assert_eq!(test.comparator.as_deref(), Some("i;octet"));
        assert_eq!(test.match_type.as_deref(), Some(":is"));
    }

    #[test]
    fn test_parse_date_extension() {
        let script = parse(
            "if date :zone \"+0100\" :value \"ge\" \"date\" \"2014-01-01\" { discard; }",
        )
        .unwrap();
        let Command::If { test, .. } = &script.commands[0] else {
            panic!("expected if");
        };
        assert_eq!(
            *test,
            Test::Date {
                comparator: None,
                zone: Some("+0100".to_string()),
                operator: "ge".to_string(),
                date_part: "date".to_string(),
                keys: vec!["2014-01-01".to_string()],
            }
        );
    }

    #[test]
    fn test_extension_needs_registration() {
        let err = Parser::new(Grammar::rfc5228())
            .parse("if true { addflag \"\\\\Seen\"; }")
            .unwrap_err();
        assert_eq!((err.line, err.column), (1, 11));
        assert!(err.message.contains("unknown command 'addflag'"));
    }

    #[test]
    fn test_missing_required_tag() {
        let err = parse("if date \"date\" \"2014-01-01\" { keep; }").unwrap_err();
        assert!(err.message.contains("missing its match-type"), "{err}");
    }

    #[test]
    fn test_wrong_argument_kind() {
        let err = parse("if size :over \"big\" { keep; }").unwrap_err();
        assert!(err.message.contains("expects a number"), "{err}");
    }

    #[test]
    fn test_duplicate_tag_group() {
        let err = parse("if header :is :contains \"a\" \"b\" { keep; }").unwrap_err();
        assert!(err.message.contains("duplicate match-type"), "{err}");
    }

    #[test]
    fn test_test_in_command_position() {
        let err = parse("header \"a\" \"b\";").unwrap_err();
        assert!(err.message.contains("is a test"), "{err}");
    }

    #[test]
    fn test_unterminated_block_reports_eof() {
        let err = parse("if true {\n keep;").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("end of input"), "{err}");
    }

    #[test]
    fn test_empty_test_list_rejected() {
        let err = parse("if allof () { keep; }").unwrap_err();
        assert!(err.message.contains("expected test"), "{err}");
    }
}
