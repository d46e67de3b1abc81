//! Go-style text templates for quire.
//!
//! Supports actions, pipelines, variables, `if`/`with`/`range` with `else`,
//! `define`/`block`/`template`, and a pluggable function map. Data is any
//! `serde_json::Value`.
//!
//! ```
//! use quire_template::TemplateSet;
//! use serde_json::json;
//!
//! let mut set = TemplateSet::new();
//! set.parse("single.html", "<h1>{{ .Title }}</h1>").unwrap();
//! let html = set.execute("single.html", &json!({"Title": "Hello"})).unwrap();
//! assert_eq!(html, "<h1>Hello</h1>");
//! ```

pub mod ast;
mod error;
mod exec;
mod funcs;
mod lex;
pub mod normalize;
mod parse;

pub use error::{ExecError, FuncError, ParseError};
pub use exec::{MAX_DEPTH, is_true, print_value};
pub use funcs::{Func, FuncMap, html_escape, urlize};
pub use normalize::{Decl, Normalizer};
pub use parse::parse;

use ast::Tree;
use rustc_hash::FxHashMap;
use serde_json::Value;

/// A named collection of parsed templates sharing one function map.
#[derive(Debug, Default)]
pub struct TemplateSet {
    trees: FxHashMap<String, Tree>,
    funcs: FuncMap,
}

impl TemplateSet {
    /// Empty set with the builtin functions.
    pub fn new() -> Self {
        Self::with_funcs(FuncMap::builtins())
    }

    pub fn with_funcs(funcs: FuncMap) -> Self {
        Self {
            trees: FxHashMap::default(),
            funcs,
        }
    }

    pub fn funcs(&self) -> &FuncMap {
        &self.funcs
    }

    pub fn funcs_mut(&mut self) -> &mut FuncMap {
        &mut self.funcs
    }

    /// Parse `text` under `name`. Nested `define`/`block` bodies are
    /// registered under their own names and replace earlier definitions.
    pub fn parse(&mut self, name: &str, text: &str) -> Result<(), ParseError> {
        let (tree, defines) = parse(name, text)?;
        self.trees.insert(name.to_owned(), tree);
        for define in defines {
            self.trees.insert(define.name.clone(), define);
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Tree> {
        self.trees.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.trees.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.trees.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Lower-case parameter lookups in every registered template.
    ///
    /// Each tree is taken out of the set while it is walked, so the
    /// sub-templates it enters are the remaining ones.
    pub fn normalize(&mut self) {
        let mut names: Vec<String> = self.trees.keys().cloned().collect();
        names.sort_unstable();
        for name in names {
            if let Some(mut tree) = self.trees.remove(&name) {
                Normalizer::new(&mut self.trees).run(&mut tree);
                self.trees.insert(name, tree);
            }
        }
    }

    /// Execute template `name` with `data` as dot.
    pub fn execute(&self, name: &str, data: &Value) -> Result<String, ExecError> {
        let tree = self
            .lookup(name)
            .ok_or_else(|| ExecError::NoSuchTemplate(name.to_owned()))?;
        let mut state = exec::State::new(self, name, data);
        state.walk_list(data, &tree.root)?;
        Ok(state.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_registers_defines() {
        let mut set = TemplateSet::new();
        set.parse("baseof.html", r#"{{ block "main" . }}default{{ end }}"#).unwrap();
        assert_eq!(set.names(), vec!["baseof.html", "main"]);
    }

    #[test]
    fn test_execute_missing_template() {
        let set = TemplateSet::new();
        assert!(matches!(
            set.execute("nope.html", &json!({})),
            Err(ExecError::NoSuchTemplate(name)) if name == "nope.html"
        ));
    }

    #[test]
    fn test_normalize_then_execute() {
        let mut set = TemplateSet::new();
        set.parse("single.html", r#"{{ $p := .Params }}{{ $p.MyKey }}|{{ template "partials/x.html" . }}"#)
            .unwrap();
        set.parse("partials/x.html", "{{ .Site.Params.Author }}").unwrap();
        set.normalize();

        let data = json!({
            "Params": {"mykey": "v"},
            "Site": {"Params": {"author": "me"}},
        });
        assert_eq!(set.execute("single.html", &data).unwrap(), "v|me");
    }

    #[test]
    fn test_custom_function() {
        let mut set = TemplateSet::new();
        set.funcs_mut()
            .insert("shout", |args: &[Value]| Ok(Value::String(print_value(&args[0]).to_uppercase())));
        set.parse("t", "{{ .X | shout }}").unwrap();
        assert_eq!(set.execute("t", &json!({"X": "hi"})).unwrap(), "HI");
    }
}
