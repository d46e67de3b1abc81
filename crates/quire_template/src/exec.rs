//! Template execution over `serde_json::Value` data.

use crate::{
    TemplateSet,
    ast::{Arg, BranchNode, CommandNode, ListNode, Node, PipeNode, TemplateNode},
    error::ExecError,
};
use serde_json::Value;

/// Maximum nesting of `{{ template }}` invocations.
pub const MAX_DEPTH: usize = 100;

/// Go truthiness: false, 0, "", nil and empty collections are false.
pub fn is_true(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text form of a value as printed by an action.
pub fn print_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(print_value).collect();
            format!("[{}]", parts.join(" "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k}:{}", print_value(v)))
                .collect();
            format!("map[{}]", parts.join(" "))
        }
    }
}

/// Execution state for one top-level `execute` call.
pub(crate) struct State<'a> {
    set: &'a TemplateSet,
    name: String,
    vars: Vec<(String, Value)>,
    depth: usize,
    out: String,
}

impl<'a> State<'a> {
    pub(crate) fn new(set: &'a TemplateSet, name: &str, data: &Value) -> Self {
        Self {
            set,
            name: name.to_owned(),
            vars: vec![("$".to_owned(), data.clone())],
            depth: 0,
            out: String::new(),
        }
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }

    fn error(&self, message: impl Into<String>) -> ExecError {
        ExecError::Eval {
            name: self.name.clone(),
            message: message.into(),
        }
    }

    pub(crate) fn walk_list(&mut self, dot: &Value, list: &ListNode) -> Result<(), ExecError> {
        list.nodes.iter().try_for_each(|node| self.walk(dot, node))
    }

    fn walk(&mut self, dot: &Value, node: &Node) -> Result<(), ExecError> {
        match node {
            Node::Text(text) => {
                self.out.push_str(text);
                Ok(())
            }
            Node::Action(pipe) => {
                let value = self.eval_pipe(dot, pipe)?;
                if pipe.decl.is_empty() {
                    self.out.push_str(&print_value(&value));
                }
                Ok(())
            }
            Node::If(branch) => self.walk_if_or_with(dot, branch, false),
            Node::With(branch) => self.walk_if_or_with(dot, branch, true),
            Node::Range(branch) => self.walk_range(dot, branch),
            Node::Template(node) => self.walk_template(dot, node),
        }
    }

    fn walk_if_or_with(&mut self, dot: &Value, branch: &BranchNode, is_with: bool) -> Result<(), ExecError> {
        let mark = self.vars.len();
        let value = self.eval_pipe(dot, &branch.pipe)?;
        let result = if is_true(&value) {
            let new_dot = if is_with { &value } else { dot };
            self.walk_list(new_dot, &branch.list)
        } else if let Some(else_list) = &branch.else_list {
            self.walk_list(dot, else_list)
        } else {
            Ok(())
        };
        self.vars.truncate(mark);
        result
    }

    fn walk_range(&mut self, dot: &Value, branch: &BranchNode) -> Result<(), ExecError> {
        let mark = self.vars.len();
        // Evaluate without binding: the declared variables name the elements.
        let value = self.eval_pipe_raw(dot, &branch.pipe)?;

        let entries: Vec<(Value, Value)> = match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Value::from(i), item))
                .collect(),
            Value::Object(map) => map.into_iter().map(|(k, v)| (Value::String(k), v)).collect(),
            Value::Null => Vec::new(),
            other => return Err(self.error(format!("range can't iterate over {}", print_value(&other)))),
        };

        if entries.is_empty() {
            if let Some(else_list) = &branch.else_list {
                self.walk_list(dot, else_list)?;
            }
            return Ok(());
        }

        for (key, elem) in entries {
            match branch.pipe.decl.as_slice() {
                [] => {}
                [elem_var] => self.vars.push((elem_var.name().to_owned(), elem.clone())),
                [key_var, elem_var, ..] => {
                    self.vars.push((key_var.name().to_owned(), key));
                    self.vars.push((elem_var.name().to_owned(), elem.clone()));
                }
            }
            let result = self.walk_list(&elem, &branch.list);
            self.vars.truncate(mark);
            result?;
        }
        Ok(())
    }

    fn walk_template(&mut self, dot: &Value, node: &TemplateNode) -> Result<(), ExecError> {
        let tree = self
            .set
            .lookup(&node.name)
            .ok_or_else(|| ExecError::NoSuchTemplate(node.name.clone()))?;
        if self.depth >= MAX_DEPTH {
            return Err(ExecError::TooDeep {
                name: node.name.clone(),
                depth: MAX_DEPTH,
            });
        }

        let new_dot = match &node.pipe {
            Some(pipe) => self.eval_pipe(dot, pipe)?,
            None => Value::Null,
        };

        // Sub-templates see only `$`, bound to their own dot.
        let saved_vars = std::mem::replace(&mut self.vars, vec![("$".to_owned(), new_dot.clone())]);
        let saved_name = std::mem::replace(&mut self.name, node.name.clone());
        self.depth += 1;
        let result = self.walk_list(&new_dot, &tree.root);
        self.depth -= 1;
        self.vars = saved_vars;
        self.name = saved_name;
        result
    }

    // ------------------------------------------------------------------------
    // Pipelines
    // ------------------------------------------------------------------------

    /// Evaluate a pipeline and bind its declarations.
    fn eval_pipe(&mut self, dot: &Value, pipe: &PipeNode) -> Result<Value, ExecError> {
        let value = self.eval_pipe_raw(dot, pipe)?;
        for var in &pipe.decl {
            if pipe.is_assign {
                self.assign(var.name(), value.clone())?;
            } else {
                self.vars.push((var.name().to_owned(), value.clone()));
            }
        }
        Ok(value)
    }

    fn eval_pipe_raw(&mut self, dot: &Value, pipe: &PipeNode) -> Result<Value, ExecError> {
        let mut value: Option<Value> = None;
        for cmd in &pipe.cmds {
            value = Some(self.eval_command(dot, cmd, value)?);
        }
        Ok(value.unwrap_or(Value::Null))
    }

    fn eval_command(&mut self, dot: &Value, cmd: &CommandNode, last: Option<Value>) -> Result<Value, ExecError> {
        let Some(first) = cmd.args.first() else {
            return Err(self.error("empty command"));
        };

        if let Arg::Identifier(name) = first {
            let mut args = Vec::with_capacity(cmd.args.len());
            for arg in &cmd.args[1..] {
                args.push(self.eval_arg(dot, arg)?);
            }
            args.extend(last);
            return self.call(name, &args);
        }

        if cmd.args.len() > 1 || last.is_some() {
            return Err(self.error(format!("can't give argument to non-function {first}")));
        }
        self.eval_arg(dot, first)
    }

    fn eval_arg(&mut self, dot: &Value, arg: &Arg) -> Result<Value, ExecError> {
        match arg {
            Arg::Field(field) => self.eval_fields(dot.clone(), &field.ident),
            Arg::Variable(var) => {
                let base = self.lookup_var(var.name())?;
                self.eval_fields(base, &var.ident[1..])
            }
            Arg::Identifier(name) => self.call(name, &[]),
            Arg::Dot => Ok(dot.clone()),
            Arg::String(s) => Ok(Value::String(s.clone())),
            Arg::Number(n) => Ok(Value::Number(n.clone())),
            Arg::Bool(b) => Ok(Value::Bool(*b)),
            Arg::Nil => Ok(Value::Null),
            Arg::Pipe(pipe) => {
                let mark = self.vars.len();
                let value = self.eval_pipe(dot, pipe);
                self.vars.truncate(mark);
                value
            }
        }
    }

    fn eval_fields(&self, mut current: Value, idents: &[String]) -> Result<Value, ExecError> {
        for ident in idents {
            current = match current {
                Value::Object(mut map) => map.remove(ident).unwrap_or(Value::Null),
                Value::Null => Value::Null,
                other => {
                    return Err(self.error(format!(
                        "can't evaluate field {ident} in {}",
                        print_value(&other)
                    )));
                }
            };
        }
        Ok(current)
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value, ExecError> {
        let func = self
            .set
            .funcs()
            .get(name)
            .ok_or_else(|| self.error(format!("function {name:?} not defined")))?;
        func(args).map_err(|err| self.error(format!("error calling {name}: {err}")))
    }

    fn lookup_var(&self, name: &str) -> Result<Value, ExecError> {
        self.vars
            .iter()
            .rev()
            .find(|(var, _)| var == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| self.error(format!("undefined variable: {name}")))
    }

    fn assign(&mut self, name: &str, value: Value) -> Result<(), ExecError> {
        match self.vars.iter_mut().rev().find(|(var, _)| var == name) {
            Some(slot) => {
                slot.1 = value;
                Ok(())
            }
            None => Err(self.error(format!("undefined variable: {name}"))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
