//! Sieve tokenizer (RFC 5228 section 8.1).
//!
//! Comments are dropped here; every other token carries the line and column
//! where it starts so the parser can report positions.
use crate::sieve::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A `:tag` like `:is`, `:contains`, `:over`, `:domain`, etc. Stored lowercase.
    Tag(String),
    /// An unquoted identifier like `if`, `header`, `allof`, `fileinto`, etc.
    Identifier(String),
    /// A double-quoted string, escapes already resolved.
    QuotedString(String),
    /// A multi-line string `text:\r\n...\r\n.\r\n`, dot-stuffing resolved.
    MultiLineString(String),
    /// A number with its K/M/G quantifier already applied.
    Number(u64),
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Self::Tag(t) => format!("tag '{t}'"),
            Self::Identifier(i) => format!("identifier '{i}'"),
            Self::QuotedString(s) | Self::MultiLineString(s) => format!("string \"{s}\""),
            Self::Number(n) => format!("number {n}"),
            Self::Semicolon => "';'".to_string(),
            Self::Comma => "','".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::LBrace => "'{'".to_string(),
            Self::RBrace => "'}'".to_string(),
            Self::LBracket => "'['".to_string(),
            Self::RBracket => "']'".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Span {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn starts_with_ignore_case(&self, word: &str) -> bool {
        word.chars()
            .enumerate()
            .all(|(i, w)| matches!(self.peek_at(i), Some(c) if c.eq_ignore_ascii_case(&w)))
    }

    /// Consume the rest of the current line including its `\n`.
    fn take_line(&mut self) -> String {
        let mut line = String::new();
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
            line.push(c);
        }
        if line.ends_with('\r') {
            line.pop();
        }
        line
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, self.column, message)
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Span>, ParseError> {
    let mut cur = Cursor::new(input);
    let mut tokens = Vec::new();

    while let Some(c) = cur.peek() {
        if c.is_whitespace() {
            cur.bump();
            continue;
        }

        let (line, column) = (cur.line, cur.column);
        let punct = match c {
            ';' => Some(Token::Semicolon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            _ => None,
        };
        if let Some(token) = punct {
            cur.bump();
            tokens.push(Span { token, line, column });
            continue;
        }

        let token = match c {
            '#' => {
                cur.take_line();
                continue;
            }
            '/' if cur.peek_at(1) == Some('*') => {
                skip_block_comment(&mut cur)?;
                continue;
            }
            '"' => Token::QuotedString(quoted_string(&mut cur)?),
            't' | 'T' if cur.starts_with_ignore_case("text:") => {
                Token::MultiLineString(multi_line_string(&mut cur)?)
            }
            ':' => {
                cur.bump();
                let name = identifier_chars(&mut cur);
                if name.is_empty() {
                    return Err(ParseError::new(line, column, "empty tag"));
                }
                Token::Tag(format!(":{}", name.to_lowercase()))
            }
            '0'..='9' => Token::Number(number(&mut cur)?),
            _ if c.is_ascii_alphabetic() || c == '_' => Token::Identifier(identifier_chars(&mut cur)),
            _ => return Err(cur.error(format!("unexpected character '{c}'"))),
        };
        tokens.push(Span { token, line, column });
    }

    Ok(tokens)
}

fn identifier_chars(cur: &mut Cursor) -> String {
    let mut ident = String::new();
    while let Some(c) = cur.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            ident.push(c);
            cur.bump();
        } else {
            break;
        }
    }
    ident
}

fn skip_block_comment(cur: &mut Cursor) -> Result<(), ParseError> {
    let start = cur.error("unterminated block comment");
    cur.bump();
    cur.bump();
    loop {
        match cur.bump() {
            Some('*') if cur.peek() == Some('/') => {
                cur.bump();
                return Ok(());
            }
            Some(_) => {}
            None => return Err(start),
        }
    }
}

fn quoted_string(cur: &mut Cursor) -> Result<String, ParseError> {
    let start = cur.error("unterminated string");
    cur.bump();
    let mut s = String::new();
    loop {
        match cur.bump() {
            Some('\\') => match cur.bump() {
                Some(escaped) => s.push(escaped),
                None => return Err(start),
            },
            Some('"') => return Ok(s),
            Some(c) => s.push(c),
            None => return Err(start),
        }
    }
}

fn multi_line_string(cur: &mut Cursor) -> Result<String, ParseError> {
    let start = cur.error("unterminated multi-line string");
    for _ in 0.."text:".len() {
        cur.bump();
    }
    // Anything after `text:` on the same line may only be whitespace or a comment.
    cur.take_line();

    let mut body = String::new();
    loop {
        if cur.peek().is_none() {
            return Err(start);
        }
        let line = cur.take_line();
        if line == "." {
            return Ok(body);
        }
        let line = line.strip_prefix('.').filter(|l| l.starts_with('.')).unwrap_or(&line);
        body.push_str(line);
        body.push('\n');
    }
}

fn number(cur: &mut Cursor) -> Result<u64, ParseError> {
    let start = cur.error("number out of range");
    let mut value: u64 = 0;
    while let Some(d) = cur.peek().and_then(|c| c.to_digit(10)) {
        cur.bump();
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(d)))
            .ok_or_else(|| start.clone())?;
    }
    let shift = match cur.peek() {
        Some('K' | 'k') => 10,
        Some('M' | 'm') => 20,
        Some('G' | 'g') => 30,
        _ => 0,
    };
    if shift > 0 {
        cur.bump();
        value = value.checked_mul(1 << shift).ok_or(start)?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_simple_tokens() {
        assert_eq!(
            tokens("require \"fileinto\";"),
            vec![
                Token::Identifier("require".to_string()),
                Token::QuotedString("fileinto".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_tags_are_lowercased() {
        let toks = tokens("header :Contains \"Subject\" \"SPAM\"");
        assert_eq!(toks[1], Token::Tag(":contains".to_string()));
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(tokens("# hash\n/* block\n comment */keep;").len(), 2);
    }

    #[test]
    fn test_escapes_and_utf8() {
        let toks = tokens(r#"addflag "\\Seen"; fileinto "Boîte \"x\"";"#);
        assert_eq!(toks[1], Token::QuotedString("\\Seen".to_string()));
        assert_eq!(toks[4], Token::QuotedString("Boîte \"x\"".to_string()));
    }

    #[test]
    fn test_number_with_quantifier() {
        assert_eq!(tokens("100K 10M 1g 42"), vec![
            Token::Number(102_400),
            Token::Number(10_485_760),
            Token::Number(1 << 30),
            Token::Number(42),
        ]);
    }

    #[test]
    fn test_multi_line_string() {
        let toks = tokens("text:\r\nline one\r\n..dotted\r\n.\r\n;");
        assert_eq!(toks[0], Token::MultiLineString("line one\n.dotted\n".to_string()));
        assert_eq!(toks[1], Token::Semicolon);
    }

    #[test]
    fn test_positions() {
        let spans = tokenize("keep;\n  stop;").unwrap();
        assert_eq!((spans[2].line, spans[2].column), (2, 3));
    }

    #[test]
    fn test_unterminated_string_reports_start() {
        let err = tokenize("keep;\nfileinto \"abc").unwrap_err();
        assert_eq!((err.line, err.column), (2, 10));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("keep; @").unwrap_err();
        assert!(err.message.contains("'@'"));
    }
}
