//! Shortcode expansion in raw page content.
//!
//! ```text
//! {{< figure src="/a.png" >}}           output kept out of markdown
//! {{% note %}}*inner*{{% /note %}}      output goes through markdown
//! {{< ref "post.md" >}}                 built-in, resolves a page link
//! ```
//!
//! A shortcode is paired when a matching closing tag follows it. Templates
//! are looked up as `shortcodes/<name>.html` and receive `.Name`, `.Params`
//! (array of positional or map of named arguments), `.Inner`, `.Page` and
//! `.Site`.

use crate::template::Templates;
use crate::utils::markdown;
use regex::Regex;
use serde_json::{Map, Value, json};
use std::{collections::BTreeSet, sync::LazyLock};

/// `{{< .. >}}` in groups 1-3, `{{% .. %}}` in groups 4-6. Delimiters must
/// pair and arguments never span a `}}`.
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\{\{(?:",
        r"<\s*(/?)\s*([\w./-]+)((?:[^}]|\}[^}])*?)\s*>",
        r"|",
        r"%\s*(/?)\s*([\w./-]+)((?:[^}]|\}[^}])*?)\s*%",
        r")\}\}",
    ))
    .unwrap()
});

static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:([\w-]+)=)?(?:"((?:[^"\\]|\\.)*)"|`([^`]*)`|(\S+))"#).unwrap()
});

/// Names of the shortcodes used in `text`.
pub fn shortcode_names(text: &str) -> BTreeSet<String> {
    scan(text)
        .into_iter()
        .filter(|tag| !tag.closing)
        .map(|tag| tag.name)
        .collect()
}

#[derive(Debug, Clone)]
struct Tag {
    start: usize,
    end: usize,
    markdown: bool,
    closing: bool,
    name: String,
    params: String,
}

fn scan(text: &str) -> Vec<Tag> {
    RE_TAG
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let markdown = caps.get(2).is_none();
            let group = |i: usize| {
                let i = if markdown { i + 3 } else { i };
                caps.get(i).map_or("", |m| m.as_str())
            };
            Some(Tag {
                start: whole.start(),
                end: whole.end(),
                markdown,
                closing: !group(1).is_empty(),
                name: group(2).to_owned(),
                params: group(3).trim().to_owned(),
            })
        })
        .collect()
}

/// Parse shortcode arguments: all positional (`"a" b`) or all named
/// (`k="v" n=1`). Named keys are lower-cased.
pub fn parse_params(text: &str) -> Result<Value, String> {
    let mut positional = Vec::new();
    let mut named = Map::new();

    for caps in RE_PARAM.captures_iter(text) {
        let value = caps
            .get(2)
            .map(|m| m.as_str().replace("\\\"", "\""))
            .or_else(|| caps.get(3).map(|m| m.as_str().to_owned()))
            .or_else(|| caps.get(4).map(|m| m.as_str().to_owned()))
            .unwrap_or_default();
        match caps.get(1) {
            Some(key) => {
                named.insert(key.as_str().to_lowercase(), Value::String(value));
            }
            None => positional.push(Value::String(value)),
        }
    }

    match (positional.is_empty(), named.is_empty()) {
        (_, true) => Ok(Value::Array(positional)),
        (true, false) => Ok(Value::Object(named)),
        (false, false) => Err("shortcode parameters must be all named or all positional".into()),
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// Expands the shortcodes of one page.
pub struct Expander<'a> {
    templates: &'a Templates,
    page: &'a Value,
    site: &'a Value,
    /// Outputs hidden from markdown, by placeholder index.
    hidden: Vec<String>,
}

impl<'a> Expander<'a> {
    pub fn new(templates: &'a Templates, page: &'a Value, site: &'a Value) -> Self {
        Self {
            templates,
            page,
            site,
            hidden: Vec::new(),
        }
    }

    /// Expand shortcodes, convert markdown and restore hidden outputs.
    pub fn render(mut self, raw: &str) -> Result<String, String> {
        let expanded = self.expand(raw)?;
        let html = markdown::to_html(&expanded);
        Ok(self.restore(html))
    }

    fn placeholder(index: usize) -> String {
        format!("QUIRESHORTCODE{index}END")
    }

    fn expand(&mut self, text: &str) -> Result<String, String> {
        let tags = scan(text);
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;

        for (i, tag) in tags.iter().enumerate() {
            if tag.start < cursor {
                continue;
            }
            if tag.closing {
                return Err(format!("closing shortcode {:?} has no opening tag", tag.name));
            }
            out.push_str(&text[cursor..tag.start]);

            let (inner, end) = match find_closing(&tags[i + 1..], &tag.name) {
                Some(close) => {
                    let inner = self.expand(&text[tag.end..close.start])?;
                    let inner = if tag.markdown {
                        self.restore(markdown::to_html(&inner))
                    } else {
                        self.restore(inner)
                    };
                    (Some(inner), close.end)
                }
                None => (None, tag.end),
            };

            let output = self.call(tag, inner)?;
            if tag.markdown {
                out.push_str(&output);
            } else {
                out.push_str(&Self::placeholder(self.hidden.len()));
                self.hidden.push(output);
            }
            cursor = end;
        }

        out.push_str(&text[cursor..]);
        Ok(out)
    }

    fn call(&self, tag: &Tag, inner: Option<String>) -> Result<String, String> {
        let candidates = self.templates.shortcode_layouts(&tag.name);
        let name = self
            .templates
            .first_existing(&candidates)
            .ok_or_else(|| format!("unable to locate template for shortcode {:?}", tag.name))?;

        let data = json!({
            "Name": tag.name,
            "Params": parse_params(&tag.params)?,
            "Inner": inner.unwrap_or_default(),
            "Page": self.page,
            "Site": self.site,
        });
        self.templates
            .execute(name, &data)
            .map_err(|err| format!("shortcode {:?}: {err}", tag.name))
    }

    /// Replace placeholders with the outputs they stand for, unwrapping the
    /// paragraph markdown puts around a placeholder on its own line.
    fn restore(&self, mut html: String) -> String {
        for (index, output) in self.hidden.iter().enumerate().rev() {
            let token = Self::placeholder(index);
            if !html.contains(&token) {
                continue;
            }
            html = html
                .replace(&format!("<p>{token}</p>"), output)
                .replace(&token, output);
        }
        html
    }
}

/// First closing tag for `name` at nesting depth zero.
fn find_closing<'t>(tags: &'t [Tag], name: &str) -> Option<&'t Tag> {
    let mut depth = 0usize;
    for tag in tags.iter().filter(|t| t.name == name) {
        if !tag.closing {
            depth += 1;
        } else if depth == 0 {
            return Some(tag);
        } else {
            depth -= 1;
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutHandler;
    use crate::template::TemplateFile;
    use quire_template::FuncMap;

    fn templates(files: &[(&str, &str)]) -> Templates {
        let source: Vec<TemplateFile> = files.iter().map(|(n, t)| TemplateFile::new(n, t)).collect();
        let mut templates = Templates::new(LayoutHandler::new(false), FuncMap::builtins());
        templates.load(&source).unwrap();
        templates
    }

    fn render(templates: &Templates, raw: &str) -> Result<String, String> {
        let page = json!({"Title": "P"});
        let site = json!({"Title": "S"});
        Expander::new(templates, &page, &site).render(raw)
    }

    #[test]
    fn test_shortcode_names() {
        let names = shortcode_names("a {{< figure src=\"x\" >}} b {{% note %}}x{{% /note %}} {{<figure>}}");
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["figure", "note"]);
    }

    #[test]
    fn test_mismatched_delimiters_are_not_tags() {
        assert!(shortcode_names("{{< figure %}} {{% note >}}").is_empty());

        let t = templates(&[]);
        let html = render(&t, "{{< figure %}} and {{< x >}").unwrap();
        assert!(html.contains("figure %}} and"));
    }

    #[test]
    fn test_parse_params() {
        assert_eq!(parse_params(r#""a b" c `d`"#).unwrap(), json!(["a b", "c", "d"]));
        assert_eq!(parse_params(r#"Src="/x.png" width=3"#).unwrap(), json!({"src": "/x.png", "width": "3"}));
        assert_eq!(parse_params("").unwrap(), json!([]));
        assert!(parse_params(r#"a k="v""#).is_err());
    }

    #[test]
    fn test_angle_output_bypasses_markdown() {
        let t = templates(&[("shortcodes/em.html", "*{{ index .Params 0 }}*")]);
        let html = render(&t, "before\n\n{{< em \"x\" >}}\n\nafter").unwrap();
        assert_eq!(html, "<p>before</p>\n*x*\n<p>after</p>\n");
    }

    #[test]
    fn test_percent_output_goes_through_markdown() {
        let t = templates(&[("shortcodes/em.html", "*{{ index .Params 0 }}*")]);
        let html = render(&t, "{{% em \"x\" %}}").unwrap();
        assert_eq!(html, "<p><em>x</em></p>\n");
    }

    #[test]
    fn test_paired_inner() {
        let t = templates(&[("shortcodes/box.html", "<div>{{ .Inner }}</div>")]);
        let html = render(&t, "{{< box >}}raw *inner*{{< /box >}}").unwrap();
        assert_eq!(html, "<div>raw *inner*</div>\n");

        let html = render(&t, "{{% box %}}*inner*{{% /box %}}").unwrap();
        assert!(html.contains("<div><p><em>inner</em></p>\n</div>"));
    }

    #[test]
    fn test_nested_shortcodes() {
        let t = templates(&[
            ("shortcodes/box.html", "<div>{{ .Inner }}</div>"),
            ("shortcodes/name.html", "{{ .Page.Title }}"),
        ]);
        let html = render(&t, "{{< box >}}[{{< name >}}]{{< /box >}}").unwrap();
        assert_eq!(html, "<div>[P]</div>\n");
    }

    #[test]
    fn test_missing_template_is_error() {
        let t = templates(&[]);
        let err = render(&t, "{{< nope >}}").unwrap_err();
        assert!(err.contains("unable to locate template for shortcode \"nope\""));
    }

    #[test]
    fn test_stray_closing_tag() {
        let t = templates(&[]);
        assert!(render(&t, "{{< /box >}}").is_err());
    }
}
