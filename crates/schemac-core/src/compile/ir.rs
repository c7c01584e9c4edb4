//! Typed intermediate representation produced by keyword implementations.
//!
//! Compilation lowers every schema node into a [`Node`] tree; the evaluator in
//! [`super::eval`] interprets it against input data. Nodes own everything they
//! need, so a compiled program never borrows from the schema it came from.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::compile::data::DataRef;
use crate::definition::{MessageFn, ParamsFn};
use crate::types::DataType;

/// Index of a compiled procedure (a `$ref` target) in the program table.
pub(crate) type ProcId = usize;

/// Failure predicate over `(data, schema value)`; `true` means the keyword fails.
pub(crate) type Condition = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Where and how a failure is reported.
#[derive(Clone)]
pub(crate) struct ErrorSite {
    pub(crate) keyword: Arc<str>,
    pub(crate) schema_path: Arc<str>,
    /// Literal schema value handed to the message and params generators.
    pub(crate) schema: Value,
    pub(crate) message: MessageFn,
    pub(crate) params: ParamsFn,
}

/// The schema value a check compares against.
#[derive(Debug, Clone)]
pub(crate) enum SchemaValue {
    Literal(Value),
    /// Resolved from the validated data at run time.
    Data(DataRef),
}

/// A guarded condition contributed through `fail`/`ok`.
#[derive(Clone)]
pub(crate) struct Check {
    pub(crate) value: SchemaValue,
    /// Accepted types of a `$data`-resolved value; empty accepts any.
    pub(crate) expects: Vec<DataType>,
    pub(crate) failing: Condition,
    pub(crate) site: ErrorSite,
}

/// Path step from a data location to one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Key(String),
    Index(usize),
}

/// Which properties of an object a property applicator visits.
#[derive(Debug, Clone)]
pub(crate) enum PropertyFilter {
    /// Names matching the pattern.
    Pattern(Regex),
    /// Names that are neither listed in `properties` nor matched by `patternProperties`.
    Additional {
        known: Vec<String>,
        patterns: Vec<Regex>,
    },
}

impl PropertyFilter {
    pub(crate) fn selects(&self, name: &str) -> bool {
        match self {
            PropertyFilter::Pattern(pattern) => pattern.is_match(name),
            PropertyFilter::Additional { known, patterns } => {
                !known.iter().any(|k| k == name) && !patterns.iter().any(|p| p.is_match(name))
            }
        }
    }
}

/// What happens to a property picked by a [`PropertyFilter`].
#[derive(Clone)]
pub(crate) enum PropertyAction {
    Validate(Box<Node>),
    /// The property is not allowed; the site receives the property name as data.
    Deny(ErrorSite),
}

#[derive(Clone, Default)]
pub(crate) enum Node {
    /// Always valid.
    #[default]
    Pass,
    /// Conjunction. Fail-fast evaluation stops at the first failing child.
    All(Vec<Node>),
    /// Boolean `false` schema.
    Reject(ErrorSite),
    /// Runs `body` only when the data is an instance of `data_type`.
    Guard {
        data_type: DataType,
        body: Box<Node>,
    },
    /// The `type` keyword.
    Type {
        types: Vec<DataType>,
        site: ErrorSite,
    },
    Check(Check),
    /// Runs a compiled procedure against the same data.
    Call(ProcId),
    /// Validates the child at `step` when it exists.
    Descend {
        step: Step,
        body: Box<Node>,
    },
    /// Validates every array element with index `>= from`.
    Items {
        from: usize,
        body: Box<Node>,
    },
    Properties {
        filter: PropertyFilter,
        action: PropertyAction,
    },
    /// Validates each property name as a string instance.
    PropertyNames {
        body: Box<Node>,
        site: ErrorSite,
    },
    /// Runs `body` against the same data when property `name` is present.
    IfPresent {
        name: String,
        body: Box<Node>,
    },
    /// Passes when at least one element is valid against `body`.
    Contains {
        body: Box<Node>,
        site: ErrorSite,
    },
    AnyOf {
        branches: Vec<Node>,
        site: ErrorSite,
    },
    OneOf {
        branches: Vec<Node>,
        site: ErrorSite,
    },
    Not {
        body: Box<Node>,
        site: ErrorSite,
    },
    IfThenElse {
        condition: Box<Node>,
        then: Option<Box<Node>>,
        otherwise: Option<Box<Node>>,
        site: ErrorSite,
    },
}

impl Node {
    /// Combine contributed nodes into one, flattening the trivial cases.
    pub(crate) fn all(mut nodes: Vec<Node>) -> Node {
        nodes.retain(|node| !matches!(node, Node::Pass));
        match nodes.len() {
            0 => Node::Pass,
            1 => nodes.remove(0),
            _ => Node::All(nodes),
        }
    }
}

impl fmt::Debug for ErrorSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorSite")
            .field("keyword", &self.keyword)
            .field("schema_path", &self.schema_path)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("value", &self.value)
            .field("expects", &self.expects)
            .field("site", &self.site)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for PropertyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyAction::Validate(node) => f.debug_tuple("Validate").field(node).finish(),
            PropertyAction::Deny(site) => f.debug_tuple("Deny").field(site).finish(),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Pass => f.write_str("Pass"),
            Node::All(nodes) => f.debug_tuple("All").field(nodes).finish(),
            Node::Reject(site) => f.debug_tuple("Reject").field(site).finish(),
            Node::Guard { data_type, body } => f
                .debug_struct("Guard")
                .field("data_type", data_type)
                .field("body", body)
                .finish(),
            Node::Type { types, .. } => f.debug_struct("Type").field("types", types).finish(),
            Node::Check(check) => check.fmt(f),
            Node::Call(id) => f.debug_tuple("Call").field(id).finish(),
            Node::Descend { step, body } => f
                .debug_struct("Descend")
                .field("step", step)
                .field("body", body)
                .finish(),
            Node::Items { from, body } => f
                .debug_struct("Items")
                .field("from", from)
                .field("body", body)
                .finish(),
            Node::Properties { filter, action } => f
                .debug_struct("Properties")
                .field("filter", filter)
                .field("action", action)
                .finish(),
            Node::PropertyNames { body, .. } => {
                f.debug_struct("PropertyNames").field("body", body).finish()
            }
            Node::IfPresent { name, body } => f
                .debug_struct("IfPresent")
                .field("name", name)
                .field("body", body)
                .finish(),
            Node::Contains { body, .. } => f.debug_struct("Contains").field("body", body).finish(),
            Node::AnyOf { branches, .. } => {
                f.debug_struct("AnyOf").field("branches", branches).finish()
            }
            Node::OneOf { branches, .. } => {
                f.debug_struct("OneOf").field("branches", branches).finish()
            }
            Node::Not { body, .. } => f.debug_struct("Not").field("body", body).finish(),
            Node::IfThenElse {
                condition,
                then,
                otherwise,
                ..
            } => f
                .debug_struct("IfThenElse")
                .field("condition", condition)
                .field("then", then)
                .field("otherwise", otherwise)
                .finish(),
        }
    }
}
