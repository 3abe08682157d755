//! CUE data adapter
//!
//! Handles the data subset of CUE that application descriptions use:
//! an optional `package` clause, `//` comments, struct fields separated by
//! newlines or commas, `a: b: c` shorthand, lists, strings, numbers,
//! booleans and `null`. Repeated struct fields unify; repeated scalar fields
//! must agree. Definitions, references, expressions and imports are rejected
//! with a positioned error.

use serde_json::{Map, Number, Value};

use crate::errors::ParseError;

const KEYWORDS: &[&str] = &[
    "package", "import", "true", "false", "null", "for", "in", "if", "let", "div", "mod", "quo",
    "rem",
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Question,
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

fn error(line: usize, column: usize, message: impl Into<String>) -> ParseError {
    ParseError::Cue {
        line,
        column,
        message: message.into(),
    }
}

fn tokenize(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut line = 1;
    let mut column = 1;

    while i < chars.len() {
        let c = chars[i];
        let (start_line, start_column) = (line, column);
        let mut push = |token: Token| {
            tokens.push(Spanned {
                token,
                line: start_line,
                column: start_column,
            });
        };

        match c {
            ' ' | '\t' | '\r' => {
                i += 1;
                column += 1;
            }
            '\n' => {
                push(Token::Newline);
                i += 1;
                line += 1;
                column = 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                    column += 1;
                }
            }
            '{' | '}' | '[' | ']' | ':' | ',' | '?' => {
                push(match c {
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    ':' => Token::Colon,
                    ',' => Token::Comma,
                    _ => Token::Question,
                });
                i += 1;
                column += 1;
            }
            '"' => {
                if chars.get(i + 1) == Some(&'"') && chars.get(i + 2) == Some(&'"') {
                    return Err(error(line, column, "multi-line strings are not supported"));
                }
                let (value, consumed) = lex_string(&chars[i..], line, column)?;
                push(Token::Str(value));
                i += consumed;
                column += consumed;
            }
            '-' | '0'..='9' => {
                let start = i;
                i += 1;
                while i < chars.len()
                    && (chars[i].is_ascii_digit()
                        || matches!(chars[i], '.' | 'e' | 'E')
                        || (matches!(chars[i], '+' | '-') && matches!(chars[i - 1], 'e' | 'E')))
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                column += i - start;
                push(Token::Number(text));
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                column += i - start;
                push(Token::Ident(text));
            }
            '#' => return Err(error(line, column, "definitions are not supported")),
            other => return Err(error(line, column, format!("unexpected character '{}'", other))),
        }
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
        column,
    });
    Ok(tokens)
}

/// Lex a double-quoted string starting at `chars[0]`; returns the value and
/// the number of characters consumed.
fn lex_string(chars: &[char], line: usize, column: usize) -> Result<(String, usize), ParseError> {
    let mut value = String::new();
    let mut i = 1;
    loop {
        match chars.get(i) {
            None | Some('\n') => return Err(error(line, column, "unterminated string")),
            Some('"') => return Ok((value, i + 1)),
            Some('\\') => {
                let escaped = match chars.get(i + 1) {
                    Some('"') => '"',
                    Some('\\') => '\\',
                    Some('/') => '/',
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('b') => '\u{8}',
                    Some('f') => '\u{c}',
                    Some('u') => {
                        let hex: String = chars.iter().skip(i + 2).take(4).collect();
                        let decoded = u32::from_str_radix(&hex, 16)
                            .ok()
                            .filter(|_| hex.len() == 4)
                            .and_then(char::from_u32)
                            .ok_or_else(|| error(line, column + i, "invalid unicode escape"))?;
                        value.push(decoded);
                        i += 6;
                        continue;
                    }
                    _ => return Err(error(line, column + i, "invalid escape sequence")),
                };
                value.push(escaped);
                i += 2;
            }
            Some(c) => {
                value.push(*c);
                i += 1;
            }
        }
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].token
    }

    fn advance(&mut self) -> Spanned {
        let spanned = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        spanned
    }

    fn fail(&self, message: impl Into<String>) -> ParseError {
        let at = self.peek();
        error(at.line, at.column, message)
    }

    fn skip_newlines(&mut self) {
        while self.peek().token == Token::Newline {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek().token, Token::Newline | Token::Comma) {
            self.advance();
        }
    }

    fn parse_file(&mut self) -> Result<Value, ParseError> {
        self.skip_newlines();
        if self.peek().token == Token::Ident("package".to_string())
            && matches!(self.peek_at(1), Token::Ident(_))
        {
            self.advance();
            match self.advance().token {
                Token::Ident(_) => {}
                _ => return Err(self.fail("expected package name")),
            }
            if !matches!(self.peek().token, Token::Newline | Token::Eof) {
                return Err(self.fail("expected newline after package clause"));
            }
        }
        self.skip_newlines();
        let is_import = self.peek().token == Token::Ident("import".to_string())
            && !matches!(self.peek_at(1), Token::Colon | Token::Question);
        if is_import {
            return Err(self.fail("imports are not supported"));
        }
        let fields = self.parse_fields(false)?;
        Ok(Value::Object(fields))
    }

    /// Fields up to `}` (when `braced`) or end of input
    fn parse_fields(&mut self, braced: bool) -> Result<Map<String, Value>, ParseError> {
        let mut map = Map::new();
        loop {
            self.skip_separators();
            match self.peek().token {
                Token::RBrace if braced => break,
                Token::Eof if braced => return Err(self.fail("unclosed '{'")),
                Token::Eof => break,
                _ => {}
            }
            self.parse_field(&mut map)?;
            match self.peek().token {
                Token::Newline | Token::Comma | Token::Eof => {}
                Token::RBrace if braced => {}
                _ => return Err(self.fail("expected newline or ',' after field")),
            }
        }
        Ok(map)
    }

    fn parse_field(&mut self, map: &mut Map<String, Value>) -> Result<(), ParseError> {
        let label_at = self.advance();
        let label = match label_at.token {
            Token::Ident(name) | Token::Str(name) => name,
            _ => return Err(error(label_at.line, label_at.column, "expected field label")),
        };
        if self.peek().token == Token::Question {
            self.advance();
        }
        if self.advance().token != Token::Colon {
            return Err(error(
                label_at.line,
                label_at.column,
                format!("expected ':' after '{}'", label),
            ));
        }

        let next_is_label = matches!(self.peek().token, Token::Ident(_) | Token::Str(_))
            && matches!(self.peek_at(1), Token::Colon | Token::Question);
        let value = if next_is_label {
            let mut nested = Map::new();
            self.parse_field(&mut nested)?;
            Value::Object(nested)
        } else {
            self.parse_value()?
        };

        unify(map, label, value).map_err(|message| error(label_at.line, label_at.column, message))
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let at = self.advance();
        match at.token {
            Token::Str(s) => Ok(Value::String(s)),
            Token::Number(text) => serde_json::from_str::<Number>(&text)
                .map(Value::Number)
                .map_err(|_| error(at.line, at.column, format!("invalid number '{}'", text))),
            Token::Ident(word) => match word.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                "null" => Ok(Value::Null),
                _ => Err(error(
                    at.line,
                    at.column,
                    format!("references are not supported ('{}')", word),
                )),
            },
            Token::LBrace => {
                let fields = self.parse_fields(true)?;
                self.advance();
                Ok(Value::Object(fields))
            }
            Token::LBracket => self.parse_list(),
            _ => Err(error(at.line, at.column, "expected a value")),
        }
    }

    fn parse_list(&mut self) -> Result<Value, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek().token == Token::RBracket {
                self.advance();
                break;
            }
            items.push(self.parse_value()?);
            self.skip_newlines();
            match self.advance().token {
                Token::Comma => {}
                Token::RBracket => break,
                _ => return Err(self.fail("expected ',' or ']' in list")),
            }
        }
        Ok(Value::Array(items))
    }
}

/// Insert a field, unifying with an existing one of the same name
fn unify(map: &mut Map<String, Value>, label: String, value: Value) -> Result<(), String> {
    match map.get_mut(&label) {
        None => {
            map.insert(label, value);
            Ok(())
        }
        Some(Value::Object(existing)) => match value {
            Value::Object(incoming) => {
                for (key, nested) in incoming {
                    unify(existing, key, nested)?;
                }
                Ok(())
            }
            _ => Err(format!("conflicting values for field '{}'", label)),
        },
        Some(existing) if *existing == value => Ok(()),
        Some(_) => Err(format!("conflicting values for field '{}'", label)),
    }
}

pub fn parse(content: &str) -> Result<Value, ParseError> {
    let tokens = tokenize(content)?;
    Parser { tokens, pos: 0 }.parse_file()
}

/// Render a JSON object as a CUE file in package `ftl`
pub fn render(value: &Value) -> String {
    let mut out = String::from("package ftl\n\n");
    if let Value::Object(map) = value {
        for (key, nested) in map {
            out.push_str(&label(key));
            out.push_str(": ");
            write_value(nested, 0, &mut out);
            out.push('\n');
        }
    }
    out
}

fn label(key: &str) -> String {
    let mut chars = key.chars();
    let plain = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&key);
    if plain {
        key.to_string()
    } else {
        quote(key)
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push('\t');
    }
}

fn write_value(value: &Value, level: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&quote(s)),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for item in items {
                indent(level + 1, out);
                write_value(item, level + 1, out);
                out.push_str(",\n");
            }
            indent(level, out);
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (key, nested) in map {
                indent(level + 1, out);
                out.push_str(&label(key));
                out.push_str(": ");
                write_value(nested, level + 1, out);
                out.push('\n');
            }
            indent(level, out);
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_description() {
        let src = r#"
package app

// Weather tools
name: "weather"
version: "1.0.0"
access: "private"
components: [
	{
		id: "forecast"
		source: "./forecast.wasm"
		build: command: "cargo build --release"
	},
	{id: "alerts", source: {registry: "ghcr.io", package: "acme:alerts", version: "2.0.0"}},
]
required_claims: {
	roles: ["admin"]
	"https://example.com/tier": 3
	verified: true
}
"#;
        let parsed = parse(src);
        assert!(parsed.is_ok_and(|v| v
            == json!({
                "name": "weather",
                "version": "1.0.0",
                "access": "private",
                "components": [
                    {"id": "forecast", "source": "./forecast.wasm", "build": {"command": "cargo build --release"}},
                    {"id": "alerts", "source": {"registry": "ghcr.io", "package": "acme:alerts", "version": "2.0.0"}}
                ],
                "required_claims": {"roles": ["admin"], "https://example.com/tier": 3, "verified": true}
            })));
    }

    #[test]
    fn test_repeated_structs_unify() {
        let parsed =
            parse("auth: jwt_issuer: \"https://id.example.com\"\nauth: jwt_audience: \"api\"\n");
        assert!(parsed.is_ok_and(|v| v
            == json!({"auth": {"jwt_issuer": "https://id.example.com", "jwt_audience": "api"}})));
    }

    #[test]
    fn test_keywords_as_labels() {
        let parsed = parse(
            "package app\nsource: {registry: \"ghcr.io\", package: \"acme:alerts\"}\nif: true: null\n",
        );
        assert!(parsed.is_ok_and(|v| v
            == json!({
                "source": {"registry": "ghcr.io", "package": "acme:alerts"},
                "if": {"true": null}
            })));

        assert!(matches!(
            parse("package app\n\nimport \"strings\"\n"),
            Err(ParseError::Cue { line: 3, .. })
        ));

        let top_level = parse("package: \"acme:alerts\"\nversion: \"1.0.0\"\n");
        assert!(top_level
            .is_ok_and(|v| v == json!({"package": "acme:alerts", "version": "1.0.0"})));
    }

    #[test]
    fn test_conflicting_scalars() {
        let parsed = parse("name: \"a\"\nname: \"b\"\n");
        assert!(matches!(parsed, Err(ParseError::Cue { line: 2, .. })));
    }

    #[test]
    fn test_errors_carry_position() {
        assert!(matches!(
            parse("name: \"demo\"\nversion: other\n"),
            Err(ParseError::Cue { line: 2, column: 10, .. })
        ));
        assert!(matches!(
            parse("#Schema: {}\n"),
            Err(ParseError::Cue { line: 1, column: 1, .. })
        ));
        assert!(matches!(
            parse("name: \"unterminated\n"),
            Err(ParseError::Cue { .. })
        ));
        assert!(matches!(parse("a: {\n b: 1\n"), Err(ParseError::Cue { .. })));
    }

    #[test]
    fn test_numbers_and_escapes() {
        let parsed = parse("a: -1.5e2\nb: \"tab\\there \\u0041\"\nc: null\n");
        assert!(parsed.is_ok_and(|v| v == json!({"a": -150.0, "b": "tab\there A", "c": null})));
    }

    #[test]
    fn test_render_parses_back() {
        let value = json!({
            "name": "demo",
            "components": [{"id": "echo", "source": "./echo.wasm"}],
            "required_claims": {"if": "keyword", "org-id": "x", "nested": {"list": [1, 2.5, true]}},
            "variables": {},
            "_hidden": "quoted"
        });
        let rendered = render(&value);
        assert!(rendered.starts_with("package ftl\n"));
        assert!(rendered.contains("\"org-id\": \"x\""));
        assert!(rendered.contains("\"if\": \"keyword\""));
        assert!(parse(&rendered).is_ok_and(|v| v == value));
    }
}
