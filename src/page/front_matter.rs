//! Front matter decoding.
//!
//! Three formats are recognised at the very start of a content file:
//!
//! - TOML between `+++` fence lines
//! - YAML between `---` fence lines
//! - a JSON object
//!
//! Anything else means the file has no front matter. Keys are lower-cased;
//! every key, recognised or not, is also kept in [`FrontMatter::params`].

use crate::diagnostic::FileError;
use crate::utils::{date::parse_date, value::toml_table_to_json};
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

const TOML_FENCE: &str = "+++";
const YAML_FENCE: &str = "---";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    pub draft: bool,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub layout: Option<String>,
    pub content_type: Option<String>,
    pub weight: Option<i64>,
    pub headless: bool,
    pub params: Map<String, Value>,
}

/// Split `text` into front matter and body.
pub fn parse(filename: &str, text: &str) -> Result<(FrontMatter, String), FileError> {
    let trimmed = text.trim_start_matches('\u{feff}');
    let lead = text.len() - trimmed.len();

    let (params, body) = if trimmed.starts_with(TOML_FENCE) {
        let (params, body_start) = parse_toml(filename, text, lead)?;
        (params, &text[body_start..])
    } else if trimmed.starts_with(YAML_FENCE) {
        let (params, body_start) = parse_yaml(filename, text, lead)?;
        (params, &text[body_start..])
    } else if trimmed.starts_with('{') {
        let (params, body_start) = parse_json(filename, text, lead)?;
        (params, &text[body_start..])
    } else {
        (Map::new(), text)
    };

    let front_matter = decode(filename, params)?;
    Ok((front_matter, body.trim_start_matches(['\r', '\n']).to_owned()))
}

/// Byte ranges of a fenced block: `(block_start, block_end, body_start)`.
fn fenced_block(
    filename: &str,
    text: &str,
    lead: usize,
    fence: &str,
    file_type: &str,
) -> Result<(usize, usize, usize), FileError> {
    let after_open = lead + fence.len();
    let block_start = match text[after_open..].find('\n') {
        Some(i) => after_open + i + 1,
        None => return Err(FileError::new(filename, "unclosed front matter fence").with_file_type(file_type)),
    };

    let mut offset = block_start;
    let block_end = loop {
        let Some(line_len) = text[offset..].find('\n').map(|i| i + 1).or_else(|| {
            // last line without newline
            (offset < text.len()).then(|| text.len() - offset)
        }) else {
            return Err(FileError::new(filename, "unclosed front matter fence")
                .with_file_type(file_type)
                .at_offset(text, lead));
        };
        if text[offset..offset + line_len].trim_end() == fence {
            break offset;
        }
        offset += line_len;
    };
    let body_start = text[block_end..]
        .find('\n')
        .map_or(text.len(), |i| block_end + i + 1);
    Ok((block_start, block_end, body_start))
}

/// Returns the lower-cased table and the byte offset where the body starts.
fn parse_toml(filename: &str, text: &str, lead: usize) -> Result<(Map<String, Value>, usize), FileError> {
    let (block_start, block_end, body_start) = fenced_block(filename, text, lead, TOML_FENCE, "toml")?;

    let table: toml::Table = toml::from_str(&text[block_start..block_end]).map_err(|err| {
        let error = FileError::new(filename, err.message()).with_file_type("toml");
        match err.span() {
            Some(span) => error.at_offset(text, block_start + span.start),
            None => error,
        }
    })?;

    Ok((toml_table_to_json(&table, true), body_start))
}

fn parse_yaml(filename: &str, text: &str, lead: usize) -> Result<(Map<String, Value>, usize), FileError> {
    let (block_start, block_end, body_start) = fenced_block(filename, text, lead, YAML_FENCE, "yaml")?;
    let block = &text[block_start..block_end];

    let value: Value = if block.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(block).map_err(|err| {
            let error = FileError::new(filename, err.to_string()).with_file_type("yaml");
            match err.location() {
                Some(location) => error.at_offset(text, block_start + location.index()),
                None => error,
            }
        })?
    };

    match crate::utils::value::lower_keys(value) {
        Value::Object(map) => Ok((map, body_start)),
        Value::Null => Ok((Map::new(), body_start)),
        _ => Err(FileError::new(filename, "front matter must be a mapping").with_file_type("yaml")),
    }
}

fn parse_json(filename: &str, text: &str, lead: usize) -> Result<(Map<String, Value>, usize), FileError> {
    let mut stream = serde_json::Deserializer::from_str(&text[lead..]).into_iter::<Value>();
    let value = match stream.next() {
        Some(Ok(value)) => value,
        Some(Err(err)) => {
            return Err(FileError::new(filename, err.to_string())
                .with_file_type("json")
                .at_line(text, err.line(), err.column()));
        }
        None => Value::Null,
    };
    let body_start = lead + stream.byte_offset();

    match crate::utils::value::lower_keys(value) {
        Value::Object(map) => Ok((map, body_start)),
        _ => Err(FileError::new(filename, "front matter must be an object").with_file_type("json")),
    }
}

fn decode(filename: &str, params: Map<String, Value>) -> Result<FrontMatter, FileError> {
    let string = |key: &str| -> Result<Option<String>, FileError> {
        match params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(FileError::new(filename, format!("`{key}` must be a string"))),
        }
    };
    let flag = |key: &str| -> Result<bool, FileError> {
        match params.get(key) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(FileError::new(filename, format!("`{key}` must be a boolean"))),
        }
    };

    let date = match string("date")? {
        Some(text) => Some(
            parse_date(&text).ok_or_else(|| FileError::new(filename, format!("invalid date `{text}`")))?,
        ),
        None => None,
    };

    let weight = match params.get("weight") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_i64(),
        Some(_) => return Err(FileError::new(filename, "`weight` must be an integer")),
    };

    Ok(FrontMatter {
        title: string("title")?,
        date,
        draft: flag("draft")?,
        slug: string("slug")?,
        url: string("url")?,
        layout: string("layout")?,
        content_type: string("type")?,
        weight,
        headless: flag("headless")?,
        params,
    })
}

// ============================================================================
// Tests
// ============================================================================
