//! Recursive-descent parser from lexed items to [`Tree`]s.
//!
//! `define` and `block` produce additional named trees, returned alongside
//! the main tree so the caller can register all of them.

use crate::{
    ast::{
        Arg, BranchNode, CommandNode, FieldNode, ListNode, Node, PipeNode, TemplateNode, Tree,
        VariableNode,
    },
    error::{ParseError, Pos},
    lex::{Item, Token, lex},
};

/// Parse template text into its main tree plus every `define`d tree.
pub fn parse(name: &str, text: &str) -> Result<(Tree, Vec<Tree>), ParseError> {
    let items = lex(name, text)?;
    let mut parser = Parser {
        name,
        items,
        pos: 0,
        defined: Vec::new(),
    };

    let (root, end) = parser.parse_list()?;
    match end {
        ListEnd::Eof => {}
        ListEnd::End(pos) => return Err(ParseError::new(name, pos, "unexpected {{end}}")),
        ListEnd::Else(_, pos) => return Err(ParseError::new(name, pos, "unexpected {{else}}")),
    }

    let tree = Tree {
        name: name.to_owned(),
        root,
    };
    Ok((tree, parser.defined))
}

/// What terminated a list.
enum ListEnd {
    Eof,
    End(Pos),
    /// `{{ else ... }}` with the tokens following `else`
    Else(Vec<Token>, Pos),
}

#[derive(Clone, Copy)]
enum BranchKind {
    If,
    With,
    Range,
}

struct Parser<'a> {
    name: &'a str,
    items: Vec<Item>,
    pos: usize,
    defined: Vec<Tree>,
}

impl Parser<'_> {
    fn error(&self, pos: Pos, message: impl Into<String>) -> ParseError {
        ParseError::new(self.name, pos, message)
    }

    fn next_item(&mut self) -> Option<Item> {
        let item = self.items.get(self.pos).cloned();
        self.pos += 1;
        item
    }

    fn parse_list(&mut self) -> Result<(ListNode, ListEnd), ParseError> {
        let mut list = ListNode::default();
        while let Some(item) = self.next_item() {
            match item {
                Item::Text(text) => list.nodes.push(Node::Text(text)),
                Item::Action { tokens, pos } => {
                    if let Some(end) = self.parse_action(tokens, pos, &mut list)? {
                        return Ok((list, end));
                    }
                }
            }
        }
        Ok((list, ListEnd::Eof))
    }

    /// Parse one action into `list`; returns `Some` when the action ends the list.
    fn parse_action(
        &mut self,
        mut tokens: Vec<Token>,
        pos: Pos,
        list: &mut ListNode,
    ) -> Result<Option<ListEnd>, ParseError> {
        let first = tokens.remove(0);
        match first {
            Token::End => {
                if !tokens.is_empty() {
                    return Err(self.error(pos, "unexpected tokens after end"));
                }
                Ok(Some(ListEnd::End(pos)))
            }
            Token::Else => Ok(Some(ListEnd::Else(tokens, pos))),
            Token::If => {
                list.nodes.push(self.parse_branch(BranchKind::If, tokens, pos)?);
                Ok(None)
            }
            Token::With => {
                list.nodes.push(self.parse_branch(BranchKind::With, tokens, pos)?);
                Ok(None)
            }
            Token::Range => {
                list.nodes.push(self.parse_branch(BranchKind::Range, tokens, pos)?);
                Ok(None)
            }
            Token::Template => {
                let (name, pipe) = self.parse_template_args(tokens, pos)?;
                list.nodes.push(Node::Template(TemplateNode { name, pipe }));
                Ok(None)
            }
            Token::Define => {
                let (name, pipe) = self.parse_template_args(tokens, pos)?;
                if pipe.is_some() {
                    return Err(self.error(pos, "unexpected pipeline in define"));
                }
                self.parse_definition(name, pos)?;
                Ok(None)
            }
            Token::Block => {
                let (name, pipe) = self.parse_template_args(tokens, pos)?;
                self.parse_definition(name.clone(), pos)?;
                list.nodes.push(Node::Template(TemplateNode { name, pipe }));
                Ok(None)
            }
            other => {
                tokens.insert(0, other);
                list.nodes.push(Node::Action(self.parse_pipe(&tokens, pos, false)?));
                Ok(None)
            }
        }
    }

    fn parse_definition(&mut self, name: String, pos: Pos) -> Result<(), ParseError> {
        let (root, end) = self.parse_list()?;
        match end {
            ListEnd::End(_) => {
                self.defined.push(Tree { name, root });
                Ok(())
            }
            _ => Err(self.error(pos, format!("unexpected EOF in definition of {name:?}"))),
        }
    }

    fn parse_template_args(
        &self,
        mut tokens: Vec<Token>,
        pos: Pos,
    ) -> Result<(String, Option<PipeNode>), ParseError> {
        if tokens.is_empty() {
            return Err(self.error(pos, "missing template name"));
        }
        let Token::Str(name) = tokens.remove(0) else {
            return Err(self.error(pos, "template name must be a quoted string"));
        };
        let pipe = if tokens.is_empty() {
            None
        } else {
            Some(self.parse_pipe(&tokens, pos, false)?)
        };
        Ok((name, pipe))
    }

    fn parse_branch(
        &mut self,
        kind: BranchKind,
        tokens: Vec<Token>,
        pos: Pos,
    ) -> Result<Node, ParseError> {
        let allow_two = matches!(kind, BranchKind::Range);
        let pipe = self.parse_pipe(&tokens, pos, allow_two)?;
        let (list, end) = self.parse_list()?;

        let else_list = match end {
            ListEnd::End(_) => None,
            ListEnd::Eof => return Err(self.error(pos, "unexpected EOF")),
            ListEnd::Else(rest, else_pos) => {
                match rest.first() {
                    // `else if` / `else with` share the enclosing `end`
                    Some(Token::If) if matches!(kind, BranchKind::If) => {
                        let nested = self.parse_branch(BranchKind::If, rest[1..].to_vec(), else_pos)?;
                        Some(ListNode {
                            nodes: vec![nested],
                        })
                    }
                    Some(Token::With) if matches!(kind, BranchKind::With) => {
                        let nested =
                            self.parse_branch(BranchKind::With, rest[1..].to_vec(), else_pos)?;
                        Some(ListNode {
                            nodes: vec![nested],
                        })
                    }
                    Some(_) => return Err(self.error(else_pos, "unexpected tokens after else")),
                    None => {
                        let (else_list, end) = self.parse_list()?;
                        if !matches!(end, ListEnd::End(_)) {
                            return Err(self.error(else_pos, "expected end after else"));
                        }
                        Some(else_list)
                    }
                }
            }
        };

        let branch = BranchNode {
            pipe,
            list,
            else_list,
        };
        Ok(match kind {
            BranchKind::If => Node::If(branch),
            BranchKind::With => Node::With(branch),
            BranchKind::Range => Node::Range(branch),
        })
    }

    /// Parse a pipeline, including a leading `$x :=` / `$x, $y :=` declaration.
    fn parse_pipe(&self, tokens: &[Token], pos: Pos, allow_two: bool) -> Result<PipeNode, ParseError> {
        let mut pipe = PipeNode::default();
        let mut rest = tokens;

        match tokens {
            [Token::Variable(v), op @ (Token::Declare | Token::Assign), tail @ ..] if v.len() == 1 => {
                pipe.decl.push(VariableNode { ident: v.clone() });
                pipe.is_assign = matches!(op, Token::Assign);
                rest = tail;
            }
            [
                Token::Variable(a),
                Token::Comma,
                Token::Variable(b),
                op @ (Token::Declare | Token::Assign),
                tail @ ..,
            ] if a.len() == 1 && b.len() == 1 => {
                if !allow_two {
                    return Err(self.error(pos, "too many declarations in command"));
                }
                pipe.decl.push(VariableNode { ident: a.clone() });
                pipe.decl.push(VariableNode { ident: b.clone() });
                pipe.is_assign = matches!(op, Token::Assign);
                rest = tail;
            }
            _ => {}
        }

        let mut cmd = CommandNode::default();
        let mut i = 0;
        while i < rest.len() {
            match &rest[i] {
                Token::Pipe => {
                    if cmd.args.is_empty() {
                        return Err(self.error(pos, "missing command"));
                    }
                    pipe.cmds.push(std::mem::take(&mut cmd));
                    i += 1;
                }
                Token::LeftParen => {
                    let close = matching_paren(rest, i)
                        .ok_or_else(|| self.error(pos, "unclosed left paren"))?;
                    let inner = self.parse_pipe(&rest[i + 1..close], pos, false)?;
                    cmd.args.push(Arg::Pipe(inner));
                    i = close + 1;
                }
                token => {
                    cmd.args.push(self.operand(token, pos)?);
                    i += 1;
                }
            }
        }

        if cmd.args.is_empty() {
            return Err(self.error(pos, "missing value for command"));
        }
        pipe.cmds.push(cmd);
        Ok(pipe)
    }

    fn operand(&self, token: &Token, pos: Pos) -> Result<Arg, ParseError> {
        Ok(match token {
            Token::Field(ident) => Arg::Field(FieldNode {
                ident: ident.clone(),
            }),
            Token::Variable(ident) => Arg::Variable(VariableNode {
                ident: ident.clone(),
            }),
            Token::Ident(name) => Arg::Identifier(name.clone()),
            Token::Dot => Arg::Dot,
            Token::Str(s) => Arg::String(s.clone()),
            Token::Number(text) => Arg::Number(
                parse_number(text).ok_or_else(|| self.error(pos, format!("bad number syntax: {text:?}")))?,
            ),
            Token::Bool(b) => Arg::Bool(*b),
            Token::Nil => Arg::Nil,
            other => return Err(self.error(pos, format!("unexpected {other:?} in operand"))),
        })
    }
}

fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_number(text: &str) -> Option<serde_json::Number> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(i.into());
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(Into::into);
    }
    text.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn root(text: &str) -> ListNode {
        parse("t", text).unwrap().0.root
    }

    #[test]
    fn test_parse_text_and_action() {
        let list = root("Hello {{ .Title }}!");
        assert_eq!(list.nodes.len(), 3);
        assert!(matches!(&list.nodes[1], Node::Action(_)));
        assert_eq!(list.to_string(), "Hello {{.Title}}!");
    }

    #[test]
    fn test_parse_declaration() {
        let list = root("{{ $p := .Params }}");
        let Node::Action(pipe) = &list.nodes[0] else {
            panic!("expected action");
        };
        assert_eq!(pipe.decl[0].name(), "$p");
        assert!(!pipe.is_assign);
        assert_eq!(pipe.cmds[0].to_string(), ".Params");
    }

    #[test]
    fn test_parse_range_two_decls() {
        let list = root("{{ range $i, $e := .Pages }}{{ $e.Title }}{{ end }}");
        let Node::Range(branch) = &list.nodes[0] else {
            panic!("expected range");
        };
        assert_eq!(branch.pipe.decl.len(), 2);
        assert_eq!(branch.list.nodes.len(), 1);
    }

    #[test]
    fn test_parse_two_decls_outside_range() {
        assert!(parse("t", "{{ $a, $b := .X }}").is_err());
    }

    #[test]
    fn test_parse_if_else_if() {
        let list = root("{{ if .A }}a{{ else if .B }}b{{ else }}c{{ end }}");
        let Node::If(branch) = &list.nodes[0] else {
            panic!("expected if");
        };
        let else_list = branch.else_list.as_ref().unwrap();
        let Node::If(nested) = &else_list.nodes[0] else {
            panic!("expected nested if");
        };
        assert!(nested.else_list.is_some());
    }

    #[test]
    fn test_parse_pipeline_and_parens() {
        let list = root(r#"{{ printf "%s" (index .Params "tags") | upper }}"#);
        let Node::Action(pipe) = &list.nodes[0] else {
            panic!("expected action");
        };
        assert_eq!(pipe.cmds.len(), 2);
        assert!(matches!(pipe.cmds[0].args[2], Arg::Pipe(_)));
        assert_eq!(pipe.to_string(), r#"printf "%s" (index .Params "tags") | upper"#);
    }

    #[test]
    fn test_parse_define_and_block() {
        let (tree, defined) =
            parse("t", r#"{{ define "a" }}A{{ end }}{{ block "b" . }}B{{ end }}"#).unwrap();
        assert_eq!(defined.len(), 2);
        assert_eq!(defined[0].name, "a");
        assert_eq!(defined[1].name, "b");
        assert!(matches!(&tree.root.nodes[0], Node::Template(t) if t.name == "b"));
    }

    #[test]
    fn test_parse_unexpected_end() {
        let err = parse("t", "a\n{{ end }}").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unexpected {{end}}"));
    }

    #[test]
    fn test_parse_unclosed_if() {
        assert!(parse("t", "{{ if .A }}a").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Some(42.into()));
        assert_eq!(parse_number("0x10"), Some(16.into()));
        assert!(parse_number("1.5").is_some());
        assert_eq!(parse_number("abc"), None);
    }
}
