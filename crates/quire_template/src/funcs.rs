//! Template function registry.
//!
//! A [`FuncMap`] is an explicit value built once per site build and handed to
//! the [`TemplateSet`](crate::TemplateSet); there is no process-wide registry.

use crate::{error::FuncError, exec::is_true, exec::print_value};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::{cmp::Ordering, fmt, sync::Arc};

/// A template function: evaluated arguments in, a value out.
pub type Func = Arc<dyn Fn(&[Value]) -> Result<Value, FuncError> + Send + Sync>;

/// Named template functions.
#[derive(Clone, Default)]
pub struct FuncMap {
    funcs: FxHashMap<String, Func>,
}

impl fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.funcs.keys().collect();
        names.sort();
        f.debug_struct("FuncMap").field("funcs", &names).finish()
    }
}

impl FuncMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in functions.
    pub fn builtins() -> Self {
        let mut map = Self::new();
        map.insert("and", |args| Ok(args.iter().find(|v| !is_true(v)).or(args.last()).cloned().unwrap_or(Value::Null)));
        map.insert("or", |args| Ok(args.iter().find(|v| is_true(v)).or(args.last()).cloned().unwrap_or(Value::Null)));
        map.insert("not", |args| Ok(Value::Bool(!is_true(arg(args, 0)?))));
        map.insert("eq", |args| {
            let first = arg(args, 0)?;
            Ok(Value::Bool(args[1..].iter().any(|other| values_equal(first, other))))
        });
        map.insert("ne", |args| Ok(Value::Bool(!values_equal(arg(args, 0)?, arg(args, 1)?))));
        map.insert("lt", |args| compare(args, Ordering::is_lt));
        map.insert("le", |args| compare(args, Ordering::is_le));
        map.insert("gt", |args| compare(args, Ordering::is_gt));
        map.insert("ge", |args| compare(args, Ordering::is_ge));
        map.insert("len", |args| {
            let len = match arg(args, 0)? {
                Value::String(s) => s.chars().count(),
                Value::Array(a) => a.len(),
                Value::Object(o) => o.len(),
                Value::Null => 0,
                other => return Err(format!("len of type {}", type_name(other)).into()),
            };
            Ok(Value::from(len))
        });
        map.insert("index", |args| {
            let mut current = arg(args, 0)?.clone();
            for key in &args[1..] {
                current = match (&current, key) {
                    (Value::Array(items), Value::Number(n)) => {
                        let i = n.as_u64().ok_or("index out of range")? as usize;
                        items.get(i).cloned().ok_or("index out of range")?
                    }
                    (Value::Object(map), Value::String(k)) => map.get(k).cloned().unwrap_or(Value::Null),
                    (Value::Null, _) => Value::Null,
                    (other, _) => return Err(format!("can't index item of type {}", type_name(other)).into()),
                };
            }
            Ok(current)
        });
        map.insert("print", |args| Ok(Value::String(go_print(args))));
        map.insert("println", |args| {
            let parts: Vec<String> = args.iter().map(print_value).collect();
            Ok(Value::String(parts.join(" ") + "\n"))
        });
        map.insert("printf", |args| {
            let Value::String(format) = arg(args, 0)? else {
                return Err("printf: format must be a string".into());
            };
            Ok(Value::String(sprintf(format, &args[1..])))
        });
        map.insert("html", |args| Ok(Value::String(html_escape(&go_print(args)))));
        map.insert("safeHTML", |args| Ok(Value::String(print_value(arg(args, 0)?))));
        map.insert("lower", |args| Ok(Value::String(print_value(arg(args, 0)?).to_lowercase())));
        map.insert("upper", |args| Ok(Value::String(print_value(arg(args, 0)?).to_uppercase())));
        map.insert("urlize", |args| Ok(Value::String(urlize(&print_value(arg(args, 0)?)))));
        map.insert("isset", |args| {
            let present = match (arg(args, 0)?, arg(args, 1)?) {
                (Value::Object(map), Value::String(key)) => map.contains_key(&key.to_lowercase()) || map.contains_key(key),
                (Value::Array(items), Value::Number(n)) => n.as_u64().is_some_and(|i| (i as usize) < items.len()),
                _ => false,
            };
            Ok(Value::Bool(present))
        });
        map.insert("echoParam", |args| {
            let value = match (arg(args, 0)?, arg(args, 1)?) {
                (Value::Object(map), Value::String(key)) => map.get(&key.to_lowercase()).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            };
            Ok(value)
        });
        map.insert("default", |args| {
            let fallback = arg(args, 0)?;
            let given = args.get(1).unwrap_or(&Value::Null);
            Ok(if is_true(given) { given.clone() } else { fallback.clone() })
        });
        map.insert("first", |args| {
            let limit = arg(args, 0)?.as_u64().ok_or("first: limit must be a non-negative integer")? as usize;
            match arg(args, 1)? {
                Value::Array(items) => Ok(Value::Array(items.iter().take(limit).cloned().collect())),
                Value::Null => Ok(Value::Array(Vec::new())),
                other => Err(format!("first: can't iterate over {}", type_name(other)).into()),
            }
        });
        map
    }

    /// Register (or replace) a function.
    pub fn insert<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, FuncError> + Send + Sync + 'static,
    {
        self.funcs.insert(name.to_owned(), Arc::new(func));
    }

    pub fn get(&self, name: &str) -> Option<&Func> {
        self.funcs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn arg(args: &[Value], i: usize) -> Result<&Value, FuncError> {
    args.get(i)
        .ok_or_else(|| FuncError(format!("wrong number of args: want at least {}, got {}", i + 1, args.len())))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "slice",
        Value::Object(_) => "map",
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(args: &[Value], test: fn(Ordering) -> bool) -> Result<Value, FuncError> {
    let (a, b) = (arg(args, 0)?, arg(args, 1)?);
    let ordering = match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y))
            .ok_or("incomparable numbers")?,
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => {
            return Err(format!("incompatible types for comparison: {} and {}", type_name(a), type_name(b)).into());
        }
    };
    Ok(Value::Bool(test(ordering)))
}

/// `fmt.Sprint` semantics: spaces only between operands when neither is a string.
fn go_print(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, value) in args.iter().enumerate() {
        if i > 0 && !value.is_string() && !args[i - 1].is_string() {
            out.push(' ');
        }
        out.push_str(&print_value(value));
    }
    out
}

/// Minimal `Sprintf`: `%s %v %d %q %%`; other verbs print the operand.
fn sprintf(format: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('q') => match args.next() {
                Some(value) => out.push_str(&format!("{:?}", print_value(value))),
                None => out.push_str("%!q(MISSING)"),
            },
            Some(verb) => match args.next() {
                Some(value) => out.push_str(&print_value(value)),
                None => out.push_str(&format!("%!{verb}(MISSING)")),
            },
            None => out.push_str("%!(NOVERB)"),
        }
    }
    out
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&#34;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Lower-case, transliterate and hyphenate text for use in URLs.
pub fn urlize(text: &str) -> String {
    let ascii = deunicode::deunicode(text.trim());
    let mut out = String::with_capacity(ascii.len());
    let mut last_dash = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_') {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
