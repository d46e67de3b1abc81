//! Template lexer.
//!
//! Splits template text into literal text and action items. Actions are
//! tokenized eagerly; comments are dropped and trim markers (`{{- ` and
//! ` -}}`) strip the whitespace of the neighbouring text.

use crate::error::{ParseError, Pos};

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

// ============================================================================
// Tokens
// ============================================================================

/// A single token inside an action.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// `.Field.Chain`, stored without the leading dots
    Field(Vec<String>),
    /// A bare `.`
    Dot,
    /// `$`, `$x` or `$x.Field`, first segment keeps its `$`
    Variable(Vec<String>),
    Ident(String),
    Str(String),
    Number(String),
    Bool(bool),
    Nil,
    Pipe,
    Declare,
    Assign,
    LeftParen,
    RightParen,
    Comma,
    If,
    Else,
    End,
    Range,
    With,
    Template,
    Define,
    Block,
}

/// Lexed item: literal text or a tokenized action.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Text(String),
    Action { tokens: Vec<Token>, pos: Pos },
}

// ============================================================================
// Lexer
// ============================================================================

/// Lex template text into items.
pub(crate) fn lex(name: &str, text: &str) -> Result<Vec<Item>, ParseError> {
    let mut items = Vec::new();
    let mut rest = 0;
    let mut trim_next = false;

    while rest < text.len() {
        let Some(found) = text[rest..].find(LEFT_DELIM) else {
            push_text(&mut items, &text[rest..], trim_next, false);
            break;
        };
        let open = rest + found;
        let mut inner_start = open + LEFT_DELIM.len();

        let trim_left = has_left_trim(&text[inner_start..]);
        if trim_left {
            inner_start += 1;
        }
        push_text(&mut items, &text[rest..open], trim_next, trim_left);

        let pos = position(text, open);
        let inner_rest = &text[inner_start..];
        let trimmed = inner_rest.trim_start();

        // Comments run until `*/` and must be closed right after
        if trimmed.starts_with(LEFT_COMMENT) {
            let comment_start = inner_start + (inner_rest.len() - trimmed.len());
            let Some(end) = text[comment_start..].find(RIGHT_COMMENT) else {
                return Err(ParseError::new(name, pos, "unclosed comment"));
            };
            let after = comment_start + end + RIGHT_COMMENT.len();
            let (close, trim_right) = find_close(text, after)
                .ok_or_else(|| ParseError::new(name, pos, "comment ends before closing delimiter"))?;
            if !text[after..close].trim().is_empty() {
                return Err(ParseError::new(name, pos, "comment ends before closing delimiter"));
            }
            trim_next = trim_right;
            rest = close_end(close, trim_right);
            continue;
        }

        let (close, trim_right) = find_action_close(text, inner_start)
            .ok_or_else(|| ParseError::new(name, pos, "unclosed action"))?;
        let body = &text[inner_start..close];
        let tokens = tokenize(name, body, pos)?;
        if tokens.is_empty() {
            return Err(ParseError::new(name, pos, "missing value for command"));
        }
        items.push(Item::Action { tokens, pos });

        trim_next = trim_right;
        rest = close_end(close, trim_right);
    }

    Ok(items)
}

/// `{{-` only trims when the dash is followed by whitespace.
fn has_left_trim(after_delim: &str) -> bool {
    let mut chars = after_delim.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

/// Byte index where the closing `}}` (or ` -}}`) begins, skipping quoted text.
fn find_action_close(text: &str, from: usize) -> Option<(usize, bool)> {
    let bytes = text.as_bytes();
    let mut i = from;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' && q == b'"' {
                    i += 2;
                    continue;
                }
                if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'`' {
                    quote = Some(b);
                } else if text[i..].starts_with(RIGHT_DELIM) {
                    return Some((i, false));
                } else if text[i..].starts_with("-}}")
                    && i > from
                    && bytes[i - 1].is_ascii_whitespace()
                {
                    return Some((i, true));
                }
            }
        }
        i += 1;
    }
    None
}

fn find_close(text: &str, from: usize) -> Option<(usize, bool)> {
    let idx = text[from..].find(RIGHT_DELIM)? + from;
    if idx > from && text.as_bytes()[idx - 1] == b'-' {
        Some((idx - 1, true))
    } else {
        Some((idx, false))
    }
}

const fn close_end(close: usize, trim_right: bool) -> usize {
    if trim_right {
        close + 1 + RIGHT_DELIM.len()
    } else {
        close + RIGHT_DELIM.len()
    }
}

fn push_text(items: &mut Vec<Item>, text: &str, trim_start: bool, trim_end: bool) {
    let mut text = text;
    if trim_start {
        text = text.trim_start();
    }
    if trim_end {
        text = text.trim_end();
    }
    if !text.is_empty() {
        items.push(Item::Text(text.to_owned()));
    }
}

/// Compute the 1-based line/column of a byte offset.
pub(crate) fn position(text: &str, offset: usize) -> Pos {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    Pos {
        offset,
        line,
        column: before[line_start..].chars().count() + 1,
    }
}

// ============================================================================
// Action tokenizer
// ============================================================================

fn tokenize(name: &str, body: &str, pos: Pos) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LeftParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RightParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Declare);
                i += 2;
            }
            '=' => {
                tokens.push(Token::Assign);
                i += 1;
            }
            '"' => {
                let (s, next) = lex_quoted(&chars, i + 1)
                    .ok_or_else(|| ParseError::new(name, pos, "unterminated quoted string"))?;
                tokens.push(Token::Str(s));
                i = next;
            }
            '`' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&c| c == '`')
                    .ok_or_else(|| ParseError::new(name, pos, "unterminated raw quoted string"))?;
                tokens.push(Token::Str(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            '.' => {
                if chars.get(i + 1).is_some_and(|c| is_ident_start(*c)) {
                    let (segments, next) = lex_field_chain(&chars, i);
                    tokens.push(Token::Field(segments));
                    i = next;
                } else {
                    tokens.push(Token::Dot);
                    i += 1;
                }
            }
            '$' => {
                let mut end = i + 1;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let mut segments = vec![chars[i..end].iter().collect::<String>()];
                if chars.get(end) == Some(&'.') && chars.get(end + 1).is_some_and(|c| is_ident_start(*c))
                {
                    let (fields, next) = lex_field_chain(&chars, end);
                    segments.extend(fields);
                    end = next;
                }
                tokens.push(Token::Variable(segments));
                i = end;
            }
            c if c.is_ascii_digit()
                || ((c == '-' || c == '+') && chars.get(i + 1).is_some_and(char::is_ascii_digit)) =>
            {
                let mut end = i + 1;
                while end < chars.len()
                    && (chars[end].is_ascii_alphanumeric() || matches!(chars[end], '.' | '_'))
                {
                    end += 1;
                }
                tokens.push(Token::Number(chars[i..end].iter().collect()));
                i = end;
            }
            c if is_ident_start(c) => {
                let mut end = i + 1;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let word: String = chars[i..end].iter().collect();
                tokens.push(keyword(word));
                i = end;
            }
            other => {
                return Err(ParseError::new(
                    name,
                    pos,
                    format!("unexpected {other:?} in command"),
                ));
            }
        }
    }

    Ok(tokens)
}

fn keyword(word: String) -> Token {
    match word.as_str() {
        "if" => Token::If,
        "else" => Token::Else,
        "end" => Token::End,
        "range" => Token::Range,
        "with" => Token::With,
        "template" => Token::Template,
        "define" => Token::Define,
        "block" => Token::Block,
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        "nil" => Token::Nil,
        _ => Token::Ident(word),
    }
}

/// Lex `.A.B.C` starting at a dot; returns the segments and the next index.
fn lex_field_chain(chars: &[char], mut i: usize) -> (Vec<String>, usize) {
    let mut segments = Vec::new();
    while chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|c| is_ident_start(*c)) {
        let start = i + 1;
        let mut end = start;
        while end < chars.len() && is_ident_char(chars[end]) {
            end += 1;
        }
        segments.push(chars[start..end].iter().collect());
        i = end;
    }
    (segments, i)
}

fn lex_quoted(chars: &[char], mut i: usize) -> Option<(String, usize)> {
    let mut out = String::new();
    while i < chars.len() {
        match chars[i] {
            '"' => return Some((out, i + 1)),
            '\\' => {
                let escaped = *chars.get(i + 1)?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    None
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn action_tokens(text: &str) -> Vec<Token> {
        match lex("t", text).unwrap().remove(0) {
            Item::Action { tokens, .. } => tokens,
            Item::Text(t) => panic!("expected action, got text {t:?}"),
        }
    }

    #[test]
    fn test_lex_text_only() {
        let items = lex("t", "hello world").unwrap();
        assert_eq!(items, vec![Item::Text("hello world".into())]);
    }

    #[test]
    fn test_lex_field_chain() {
        assert_eq!(
            action_tokens("{{ .Site.Params.Foo }}"),
            vec![Token::Field(vec!["Site".into(), "Params".into(), "Foo".into()])]
        );
    }

    #[test]
    fn test_lex_variable_with_fields() {
        assert_eq!(
            action_tokens("{{ $p.MyKey }}"),
            vec![Token::Variable(vec!["$p".into(), "MyKey".into()])]
        );
        assert_eq!(
            action_tokens("{{ $.Title }}"),
            vec![Token::Variable(vec!["$".into(), "Title".into()])]
        );
    }

    #[test]
    fn test_lex_declaration() {
        assert_eq!(
            action_tokens("{{ $p := .Params }}"),
            vec![
                Token::Variable(vec!["$p".into()]),
                Token::Declare,
                Token::Field(vec!["Params".into()]),
            ]
        );
    }

    #[test]
    fn test_lex_keywords_and_literals() {
        assert_eq!(
            action_tokens(r#"{{ if eq .N 3 "a\"b" true nil }}"#),
            vec![
                Token::If,
                Token::Ident("eq".into()),
                Token::Field(vec!["N".into()]),
                Token::Number("3".into()),
                Token::Str("a\"b".into()),
                Token::Bool(true),
                Token::Nil,
            ]
        );
    }

    #[test]
    fn test_lex_trim_markers() {
        let items = lex("t", "a  {{- .X -}}  b").unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Item::Text("a".into()));
        assert_eq!(items[2], Item::Text("b".into()));
    }

    #[test]
    fn test_lex_negative_number_is_not_trim() {
        assert_eq!(action_tokens("{{-1}}"), vec![Token::Number("-1".into())]);
    }

    #[test]
    fn test_lex_comment_dropped() {
        let items = lex("t", "a{{/* note */}}b").unwrap();
        assert_eq!(items, vec![Item::Text("a".into()), Item::Text("b".into())]);
    }

    #[test]
    fn test_lex_delimiter_inside_string() {
        assert_eq!(
            action_tokens(r#"{{ print "}}" }}"#),
            vec![Token::Ident("print".into()), Token::Str("}}".into())]
        );
    }

    #[test]
    fn test_lex_unclosed_action() {
        let err = lex("t", "line1\n{{ .Title").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 1);
        assert!(err.message.contains("unclosed"));
    }

    #[test]
    fn test_position() {
        let pos = position("ab\ncd", 4);
        assert_eq!((pos.line, pos.column), (2, 2));
    }
}
