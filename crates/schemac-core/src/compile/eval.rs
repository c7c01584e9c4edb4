//! Interpreter for compiled [`Node`] programs.

use serde_json::{json, Value};

use crate::compile::ir::{Check, ErrorSite, Node, PropertyAction, SchemaValue, Step};
use crate::report::{escape_token, ErrorObject, Reporter};
use crate::types::types_text;

/// How a data location was reached from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepRef<'v> {
    Key(&'v str),
    Index(usize),
}

/// A data location: the value plus the chain of parents leading to it.
///
/// Cursors live on the evaluator's call stack; children borrow their parent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a, 'v> {
    value: &'v Value,
    step: Option<StepRef<'v>>,
    parent: Option<&'a Cursor<'a, 'v>>,
}

impl<'a, 'v> Cursor<'a, 'v> {
    pub(crate) fn root(value: &'v Value) -> Self {
        Self {
            value,
            step: None,
            parent: None,
        }
    }

    pub(crate) fn child<'b>(&'b self, step: StepRef<'v>, value: &'v Value) -> Cursor<'b, 'v> {
        Cursor {
            value,
            step: Some(step),
            parent: Some(self),
        }
    }

    /// Same location, different value (property names are validated in place of their object).
    pub(crate) fn replaced<'w>(&self, value: &'w Value) -> Cursor<'a, 'w>
    where
        'v: 'w,
    {
        Cursor {
            value,
            step: self.step,
            parent: self.parent,
        }
    }

    pub(crate) fn value(&self) -> &'v Value {
        self.value
    }

    pub(crate) fn step(&self) -> Option<StepRef<'v>> {
        self.step
    }

    pub(crate) fn ancestor(&self, up: usize) -> Option<&Cursor<'a, 'v>> {
        let mut current = self;
        for _ in 0..up {
            current = current.parent?;
        }
        Some(current)
    }

    pub(crate) fn root_value(&self) -> &'v Value {
        let mut current = self;
        while let Some(parent) = current.parent {
            current = parent;
        }
        current.value
    }

    /// JSON pointer of this location (`""` for the root).
    pub(crate) fn data_path(&self) -> String {
        let mut steps = Vec::new();
        let mut current = Some(self);
        while let Some(cursor) = current {
            if let Some(step) = cursor.step {
                steps.push(step);
            }
            current = cursor.parent;
        }
        steps
            .iter()
            .rev()
            .map(|step| match step {
                StepRef::Key(name) => format!("/{}", escape_token(name)),
                StepRef::Index(index) => format!("/{index}"),
            })
            .collect()
    }
}

pub(crate) struct Evaluator<'p> {
    procs: &'p [Node],
    reporter: Reporter,
}

impl<'p> Evaluator<'p> {
    pub(crate) fn new(procs: &'p [Node], all_errors: bool) -> Self {
        Self {
            procs,
            reporter: Reporter::new(all_errors),
        }
    }

    pub(crate) fn finish(self) -> Vec<ErrorObject> {
        self.reporter.finish()
    }

    pub(crate) fn run(&mut self, node: &Node, at: &Cursor<'_, '_>) -> bool {
        match node {
            Node::Pass => true,
            Node::All(nodes) => {
                let mut valid = true;
                for node in nodes {
                    if !self.run(node, at) {
                        valid = false;
                        if self.reporter.fail_fast() {
                            break;
                        }
                    }
                }
                valid
            }
            Node::Reject(site) => {
                self.report(site, &site.schema, at.value(), at);
                false
            }
            Node::Guard { data_type, body } => !data_type.matches(at.value()) || self.run(body, at),
            Node::Type { types, site } => {
                if types.iter().any(|t| t.matches(at.value())) {
                    return true;
                }
                self.report(site, &site.schema, at.value(), at);
                false
            }
            Node::Check(check) => self.check(check, at),
            // Every slot is filled before a program is handed out.
            Node::Call(id) => match self.procs.get(*id) {
                Some(target) => self.run(target, at),
                None => true,
            },
            Node::Descend { step, body } => {
                let child = match (step, at.value()) {
                    (Step::Key(name), Value::Object(map)) => map
                        .get_key_value(name)
                        .map(|(key, value)| (StepRef::Key(key.as_str()), value)),
                    (Step::Index(index), Value::Array(items)) => {
                        items.get(*index).map(|value| (StepRef::Index(*index), value))
                    }
                    _ => None,
                };
                match child {
                    Some((step, value)) => self.run(body, &at.child(step, value)),
                    None => true,
                }
            }
            Node::Items { from, body } => {
                let Value::Array(items) = at.value() else {
                    return true;
                };
                let mut valid = true;
                for (index, item) in items.iter().enumerate().skip(*from) {
                    if !self.run(body, &at.child(StepRef::Index(index), item)) {
                        valid = false;
                        if self.reporter.fail_fast() {
                            break;
                        }
                    }
                }
                valid
            }
            Node::Properties { filter, action } => {
                let Value::Object(map) = at.value() else {
                    return true;
                };
                let mut valid = true;
                for (name, value) in map.iter().filter(|(name, _)| filter.selects(name)) {
                    let passed = match action {
                        PropertyAction::Validate(body) => {
                            self.run(body, &at.child(StepRef::Key(name), value))
                        }
                        PropertyAction::Deny(site) => {
                            self.report(site, &site.schema, &Value::String(name.clone()), at);
                            false
                        }
                    };
                    if !passed {
                        valid = false;
                        if self.reporter.fail_fast() {
                            break;
                        }
                    }
                }
                valid
            }
            Node::PropertyNames { body, site } => {
                let Value::Object(map) = at.value() else {
                    return true;
                };
                let mut valid = true;
                for name in map.keys() {
                    let name = Value::String(name.clone());
                    if !self.run(body, &at.replaced(&name)) {
                        self.report(site, &site.schema, &name, at);
                        valid = false;
                        if self.reporter.fail_fast() {
                            break;
                        }
                    }
                }
                valid
            }
            Node::IfPresent { name, body } => match at.value() {
                Value::Object(map) if map.contains_key(name) => self.run(body, at),
                _ => true,
            },
            Node::Contains { body, site } => {
                let Value::Array(items) = at.value() else {
                    return true;
                };
                let mark = self.reporter.count();
                let found = items
                    .iter()
                    .enumerate()
                    .any(|(index, item)| self.run(body, &at.child(StepRef::Index(index), item)));
                self.reporter.reset(mark);
                if !found {
                    self.report(site, &site.schema, at.value(), at);
                }
                found
            }
            Node::AnyOf { branches, site } => {
                let mark = self.reporter.count();
                for branch in branches {
                    if self.run(branch, at) {
                        self.reporter.reset(mark);
                        return true;
                    }
                }
                self.report(site, &site.schema, at.value(), at);
                false
            }
            Node::OneOf { branches, site } => {
                let mark = self.reporter.count();
                let mut passing = Vec::new();
                for (index, branch) in branches.iter().enumerate() {
                    if self.run(branch, at) {
                        passing.push(index);
                        if passing.len() > 1 {
                            break;
                        }
                    }
                }
                if passing.len() == 1 {
                    self.reporter.reset(mark);
                    return true;
                }
                let passing = if passing.is_empty() {
                    Value::Null
                } else {
                    json!(passing)
                };
                self.record(
                    site,
                    at,
                    json!({ "passingSchemas": passing }),
                    (site.message)(&site.schema, at.value()),
                );
                false
            }
            Node::Not { body, site } => {
                let mark = self.reporter.count();
                let matched = self.run(body, at);
                self.reporter.reset(mark);
                if matched {
                    self.report(site, &site.schema, at.value(), at);
                }
                !matched
            }
            Node::IfThenElse {
                condition,
                then,
                otherwise,
                site,
            } => {
                let mark = self.reporter.count();
                let matched = self.run(condition, at);
                self.reporter.reset(mark);
                let (branch, keyword) = if matched {
                    (then, "then")
                } else {
                    (otherwise, "else")
                };
                let Some(branch) = branch else {
                    return true;
                };
                if self.run(branch, at) {
                    return true;
                }
                self.record(
                    site,
                    at,
                    json!({ "failingKeyword": keyword }),
                    format!("should match \"{keyword}\" schema"),
                );
                false
            }
        }
    }

    fn check(&mut self, check: &Check, at: &Cursor<'_, '_>) -> bool {
        let resolved;
        let schema = match &check.value {
            SchemaValue::Literal(value) => value,
            SchemaValue::Data(reference) => {
                // An unresolved reference leaves the keyword unchecked.
                let Some(value) = reference.resolve(at) else {
                    return true;
                };
                resolved = value;
                if !check.expects.is_empty() && !check.expects.iter().any(|t| t.matches(&resolved))
                {
                    self.record(
                        &check.site,
                        at,
                        json!({ "$data": reference.pointer() }),
                        format!(
                            "{} value from $data should be {}",
                            check.site.keyword,
                            types_text(&check.expects)
                        ),
                    );
                    return false;
                }
                &*resolved
            }
        };

        if (check.failing)(at.value(), schema) {
            self.report(&check.site, schema, at.value(), at);
            return false;
        }
        true
    }

    fn report(&mut self, site: &ErrorSite, schema: &Value, data: &Value, at: &Cursor<'_, '_>) {
        let params = (site.params)(schema, data);
        let message = (site.message)(schema, data);
        self.record(site, at, params, message);
    }

    fn record(&mut self, site: &ErrorSite, at: &Cursor<'_, '_>, params: Value, message: String) {
        self.reporter.report(ErrorObject {
            keyword: site.keyword.to_string(),
            data_path: at.data_path(),
            schema_path: site.schema_path.to_string(),
            params,
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn data_path_escapes_keys_and_lists_indices() {
        let data = json!({"a/b": [1, {"c": 2}]});
        let root = Cursor::root(&data);
        let list = root.child(StepRef::Key("a/b"), &data["a/b"]);
        let item = list.child(StepRef::Index(1), &data["a/b"][1]);
        let leaf = item.child(StepRef::Key("c"), &data["a/b"][1]["c"]);

        assert_eq!(root.data_path(), "");
        assert_eq!(leaf.data_path(), "/a~1b/1/c");
        assert_eq!(leaf.root_value(), &data);
        assert_eq!(leaf.ancestor(2).map(|c| c.value()), Some(&data["a/b"]));
        assert!(leaf.ancestor(4).is_none());
    }
}
