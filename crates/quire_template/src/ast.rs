//! Template syntax tree.
//!
//! Node kinds form a closed sum type; every node renders back to its textual
//! form through `Display`, which is what variable declarations record.

use std::fmt;

/// A parsed template: its registered name plus the root list.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub name: String,
    pub root: ListNode,
}

/// Sequence of nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListNode {
    pub nodes: Vec<Node>,
}

/// A node in a template list.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, emitted verbatim
    Text(String),
    /// `{{ pipeline }}`
    Action(PipeNode),
    /// `{{ if pipeline }} list {{ else }} list {{ end }}`
    If(BranchNode),
    /// `{{ with pipeline }} list {{ else }} list {{ end }}`
    With(BranchNode),
    /// `{{ range pipeline }} list {{ else }} list {{ end }}`
    Range(BranchNode),
    /// `{{ template "name" pipeline }}`
    Template(TemplateNode),
}

/// Shared shape of `if`, `with` and `range`.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    pub pipe: PipeNode,
    pub list: ListNode,
    pub else_list: Option<ListNode>,
}

/// Invocation of a named sub-template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateNode {
    pub name: String,
    pub pipe: Option<PipeNode>,
}

/// A pipeline with optional variable declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipeNode {
    /// `true` for `$x = ...`, `false` for `$x := ...`
    pub is_assign: bool,
    pub decl: Vec<VariableNode>,
    pub cmds: Vec<CommandNode>,
}

/// One command of a pipeline: an operand or a function call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandNode {
    pub args: Vec<Arg>,
}

/// Operand of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Field(FieldNode),
    Variable(VariableNode),
    /// Function name
    Identifier(String),
    Dot,
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Nil,
    /// Parenthesised pipeline
    Pipe(PipeNode),
}

/// `.A.B`: identifiers without the leading dots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    pub ident: Vec<String>,
}

/// `$x.A.B`: first identifier keeps its `$`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableNode {
    pub ident: Vec<String>,
}

impl VariableNode {
    /// The variable name, e.g. `$x` or `$`.
    pub fn name(&self) -> &str {
        self.ident.first().map_or("$", String::as_str)
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for ListNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.nodes.iter().try_for_each(|node| write!(f, "{node}"))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Action(pipe) => write!(f, "{{{{{pipe}}}}}"),
            Self::If(branch) => fmt_branch(f, "if", branch),
            Self::With(branch) => fmt_branch(f, "with", branch),
            Self::Range(branch) => fmt_branch(f, "range", branch),
            Self::Template(node) => match &node.pipe {
                Some(pipe) => write!(f, "{{{{template {:?} {pipe}}}}}", node.name),
                None => write!(f, "{{{{template {:?}}}}}", node.name),
            },
        }
    }
}

fn fmt_branch(f: &mut fmt::Formatter<'_>, keyword: &str, branch: &BranchNode) -> fmt::Result {
    write!(f, "{{{{{keyword} {}}}}}{}", branch.pipe, branch.list)?;
    if let Some(else_list) = &branch.else_list {
        write!(f, "{{{{else}}}}{else_list}")?;
    }
    f.write_str("{{end}}")
}

impl fmt::Display for PipeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.decl.is_empty() {
            let names: Vec<String> = self.decl.iter().map(ToString::to_string).collect();
            let op = if self.is_assign { "=" } else { ":=" };
            write!(f, "{} {op} ", names.join(", "))?;
        }
        let cmds: Vec<String> = self.cmds.iter().map(ToString::to_string).collect();
        f.write_str(&cmds.join(" | "))
    }
}

impl fmt::Display for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match arg {
                Arg::Pipe(pipe) => write!(f, "({pipe})")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => write!(f, "{field}"),
            Self::Variable(var) => write!(f, "{var}"),
            Self::Identifier(name) => f.write_str(name),
            Self::Dot => f.write_str("."),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Nil => f.write_str("nil"),
            Self::Pipe(pipe) => write!(f, "({pipe})"),
        }
    }
}

impl fmt::Display for FieldNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ident.iter().try_for_each(|ident| write!(f, ".{ident}"))
    }
}

impl fmt::Display for VariableNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ident.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_display() {
        let field = FieldNode {
            ident: vec!["Site".into(), "Params".into()],
        };
        assert_eq!(field.to_string(), ".Site.Params");
    }

    #[test]
    fn test_variable_display() {
        let var = VariableNode {
            ident: vec!["$p".into(), "MyKey".into()],
        };
        assert_eq!(var.to_string(), "$p.MyKey");
        assert_eq!(var.name(), "$p");
    }

    #[test]
    fn test_pipe_display_with_decl() {
        let pipe = PipeNode {
            is_assign: false,
            decl: vec![VariableNode {
                ident: vec!["$x".into()],
            }],
            cmds: vec![
                CommandNode {
                    args: vec![Arg::Field(FieldNode {
                        ident: vec!["Title".into()],
                    })],
                },
                CommandNode {
                    args: vec![Arg::Identifier("urlize".into())],
                },
            ],
        };
        assert_eq!(pipe.to_string(), "$x := .Title | urlize");
    }
}
