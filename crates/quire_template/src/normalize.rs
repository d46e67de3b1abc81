//! Case-insensitive parameter lookups.
//!
//! Parameter keys are stored lower-cased, while template authors write
//! `.Params.MyKey` or `.Site.Params.MyKey`. This pass walks a parsed tree once
//! and lower-cases every identifier segment that, after resolving variable
//! aliases, lands under one of the parameter roots:
//!
//! ```text
//! {{ $p := .Params }}{{ $p.MyKey }}    →    {{ $p := .Params }}{{ $p.mykey }}
//! ```
//!
//! The alias table maps a declared variable to the text of the command it was
//! bound to (`$site` → `.Site`). It lives for a single walk and is shared with
//! every sub-template the walk enters through `{{ template }}`.

use crate::ast::{Arg, CommandNode, ListNode, Node, PipeNode, Tree};
use rustc_hash::FxHashMap;

/// Parameter roots, checked in order against the resolved identifier path.
const PARAMS_PATHS: &[&[&str]] = &[
    &["Params"],
    &["Site", "Params"],
    // Site and Page referenced from shortcodes
    &["Page", "Site", "Params"],
    &["Page", "Params"],
    &["Site", "Language", "Params"],
];

/// Upper bound on alias expansions for one identifier; self-referencing
/// assignments (`{{ $a = $a.X }}`) would otherwise expand forever.
const MAX_EXPANSIONS: usize = 64;

/// Variable name → textual form of the command it aliases.
#[derive(Debug, Default)]
pub struct Decl(FxHashMap<String, String>);

impl Decl {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    fn insert(&mut self, name: String, command: String) {
        self.0.insert(name, command);
    }

    /// Index of the first identifier to lower-case, or `None` if the
    /// identifier does not resolve to a parameter lookup.
    pub fn index_of_replacement_start(&self, idents: &[String]) -> Option<usize> {
        let first = idents.first()?;

        // `$blue` may expand to `.Params.Colors.Blue`, `$site` to `.Site` ...
        let mut replacements: Vec<String> = first.split('.').map(str::to_owned).collect();
        let mut replaced: Vec<String> = Vec::new();
        let mut i = 0;

        while i < replacements.len() {
            if i >= MAX_EXPANSIONS {
                return None;
            }
            let potential_var = replacements[i].clone();
            i += 1;

            if potential_var == "$" {
                continue;
            }
            if !potential_var.starts_with('$') {
                replaced.push(potential_var);
                continue;
            }

            // Temporary range variables are not tracked.
            let replacement = self.get(&potential_var)?;
            let replacement = replacement.strip_prefix('.').unwrap_or(replacement);
            if replacement.is_empty() {
                continue;
            }

            let parts = replacement.split('.').map(str::to_owned);
            if replacement.starts_with('$') {
                replacements.extend(parts);
            } else {
                replaced.extend(parts);
            }
        }

        let resolved: Vec<&str> = replaced
            .iter()
            .map(String::as_str)
            .chain(idents[1..].iter().map(String::as_str))
            .collect();

        PARAMS_PATHS
            .iter()
            .find_map(|words| index_of_first_real_ident_after_words(&resolved, idents, words))
    }
}

/// First identifier that is neither a variable nor one of `words`, provided
/// `resolved` starts with `words`.
fn index_of_first_real_ident_after_words(
    resolved: &[&str],
    idents: &[String],
    words: &[&str],
) -> Option<usize> {
    if !resolved.starts_with(words) {
        return None;
    }
    idents
        .iter()
        .position(|ident| !ident.is_empty() && !ident.starts_with('$') && !words.contains(&ident.as_str()))
}

// ============================================================================
// Tree walk
// ============================================================================

/// Walks one tree, entering sub-templates looked up in `templates`.
pub struct Normalizer<'a> {
    decl: Decl,
    templates: &'a mut FxHashMap<String, Tree>,
}

impl<'a> Normalizer<'a> {
    pub fn new(templates: &'a mut FxHashMap<String, Tree>) -> Self {
        Self {
            decl: Decl::default(),
            templates,
        }
    }

    /// Normalize `tree`; sub-templates it invokes are rewritten in place.
    pub fn run(mut self, tree: &mut Tree) -> Decl {
        self.walk_list(&mut tree.root);
        self.decl
    }

    fn walk_list(&mut self, list: &mut ListNode) {
        for node in &mut list.nodes {
            self.walk_node(node);
        }
    }

    fn walk_node(&mut self, node: &mut Node) {
        match node {
            Node::Text(_) => {}
            Node::Action(pipe) => self.walk_pipe(pipe),
            Node::If(branch) | Node::With(branch) | Node::Range(branch) => {
                self.walk_pipe(&mut branch.pipe);
                self.walk_list(&mut branch.list);
                if let Some(else_list) = &mut branch.else_list {
                    self.walk_list(else_list);
                }
            }
            Node::Template(invocation) => {
                // A template currently being walked is absent from the map,
                // so a self-inclusion is simply not entered again.
                if let Some(mut sub) = self.templates.remove(&invocation.name) {
                    self.walk_list(&mut sub.root);
                    self.templates.insert(invocation.name.clone(), sub);
                }
            }
        }
    }

    fn walk_pipe(&mut self, pipe: &mut PipeNode) {
        for (i, var) in pipe.decl.iter().enumerate() {
            if let Some(cmd) = pipe.cmds.get(i) {
                // maps $site => .Site etc.
                self.decl.insert(var.name().to_owned(), cmd.to_string());
            }
        }
        for cmd in &mut pipe.cmds {
            self.walk_command(cmd);
        }
    }

    fn walk_command(&mut self, cmd: &mut CommandNode) {
        for arg in &mut cmd.args {
            match arg {
                Arg::Field(field) => self.update_idents_if_needed(&mut field.ident),
                Arg::Variable(var) => self.update_idents_if_needed(&mut var.ident),
                _ => {}
            }
        }
    }

    fn update_idents_if_needed(&self, idents: &mut [String]) {
        if let Some(start) = self.decl.index_of_replacement_start(idents) {
            for ident in &mut idents[start..] {
                *ident = ident.to_lowercase();
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn idents(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    fn normalized(text: &str) -> String {
        let (mut tree, _) = parse("t", text).unwrap();
        let mut others = FxHashMap::default();
        Normalizer::new(&mut others).run(&mut tree);
        tree.root.to_string()
    }

    #[test]
    fn test_page_params() {
        assert_eq!(normalized("{{ .Params.MyKey }}"), "{{.Params.mykey}}");
    }

    #[test]
    fn test_site_params() {
        assert_eq!(
            normalized("{{ .Site.Params.Colors.Blue }}"),
            "{{.Site.Params.colors.blue}}"
        );
    }

    #[test]
    fn test_shortcode_params_paths() {
        assert_eq!(
            normalized("{{ .Page.Site.Params.Foo }}{{ .Page.Params.Bar }}"),
            "{{.Page.Site.Params.foo}}{{.Page.Params.bar}}"
        );
        assert_eq!(
            normalized("{{ .Site.Language.Params.Foo }}"),
            "{{.Site.Language.Params.foo}}"
        );
    }

    #[test]
    fn test_non_params_untouched() {
        assert_eq!(normalized("{{ .Site.Title }}"), "{{.Site.Title}}");
        assert_eq!(normalized("{{ .Title }}"), "{{.Title}}");
    }

    #[test]
    fn test_variable_alias() {
        assert_eq!(
            normalized("{{ $p := .Params }}{{ $p.MyKey }}"),
            "{{$p := .Params}}{{$p.mykey}}"
        );
    }

    #[test]
    fn test_alias_chain() {
        assert_eq!(
            normalized("{{ $site := .Site }}{{ $sp := $site.Params }}{{ $sp.Foo.Bar }}"),
            "{{$site := .Site}}{{$sp := $site.Params}}{{$sp.foo.bar}}"
        );
    }

    #[test]
    fn test_root_variable() {
        assert_eq!(normalized("{{ $.Params.Foo }}"), "{{$.Params.foo}}");
    }

    #[test]
    fn test_range_variable_untouched() {
        assert_eq!(
            normalized("{{ range $e := .Pages }}{{ $e.Params.Foo }}{{ end }}"),
            "{{range $e := .Pages}}{{$e.Params.Foo}}{{end}}"
        );
        assert_eq!(
            normalized("{{ range $i, $e := .Pages }}{{ $e.Params.Foo }}{{ end }}"),
            "{{range $i, $e := .Pages}}{{$e.Params.Foo}}{{end}}"
        );
    }

    #[test]
    fn test_inside_branches_and_function_args() {
        assert_eq!(
            normalized(r#"{{ if .Params.Show }}{{ printf "%s" .Site.Params.Name }}{{ else }}{{ .Params.Other }}{{ end }}"#),
            r#"{{if .Params.show}}{{printf "%s" .Site.Params.name}}{{else}}{{.Params.other}}{{end}}"#
        );
    }

    #[test]
    fn test_self_assignment_terminates() {
        let decl = {
            let mut d = Decl::default();
            d.insert("$a".into(), "$a.X".into());
            d
        };
        assert_eq!(decl.index_of_replacement_start(&idents(&["$a", "Y"])), None);
    }

    #[test]
    fn test_repeated_prefix_word_is_skipped() {
        let decl = Decl::default();
        assert_eq!(
            decl.index_of_replacement_start(&idents(&["Site", "Params", "Params", "X"])),
            Some(3)
        );
    }

    #[test]
    fn test_empty_idents() {
        assert_eq!(Decl::default().index_of_replacement_start(&[]), None);
    }

    #[test]
    fn test_sub_template_is_rewritten() {
        let (mut main, _) = parse("main", r#"{{ template "partial" . }}"#).unwrap();
        let (partial, _) = parse("partial", "{{ .Params.Foo }}").unwrap();
        let mut others = FxHashMap::default();
        others.insert("partial".to_owned(), partial);

        Normalizer::new(&mut others).run(&mut main);
        assert_eq!(others["partial"].root.to_string(), "{{.Params.foo}}");
    }

    #[test]
    fn test_alias_visible_in_sub_template() {
        let (mut main, _) =
            parse("main", r#"{{ $sp := .Site.Params }}{{ template "partial" . }}"#).unwrap();
        let (partial, _) = parse("partial", "{{ $sp.Foo }}").unwrap();
        let mut others = FxHashMap::default();
        others.insert("partial".to_owned(), partial);

        Normalizer::new(&mut others).run(&mut main);
        assert_eq!(others["partial"].root.to_string(), "{{$sp.foo}}");
    }
}
