//! Compilation contexts handed through the schema walk and to keyword implementations.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::compile::data::DataRef;
use crate::compile::ir::{Check, ErrorSite, Node, ProcId, SchemaValue};
use crate::compile::{self, Session};
use crate::config::Options;
use crate::definition::KeywordErrorDefinition;
use crate::error::{Result, SchemaError};
use crate::types::DataType;
use crate::vocab::format::Formats;

static ABSENT: Value = Value::Null;

/// Where a schema node sits: its schema path, symbolic data path, depth and base URI.
#[derive(Debug, Clone)]
pub(crate) struct Position {
    pub(crate) schema_path: String,
    pub(crate) data_path: String,
    pub(crate) data_level: usize,
    pub(crate) base: Url,
}

impl Position {
    pub(crate) fn root(schema_path: impl Into<String>, base: Url) -> Self {
        Self {
            schema_path: schema_path.into(),
            data_path: String::new(),
            data_level: 0,
            base,
        }
    }
}

/// Per-node state of the schema walk.
#[derive(Debug)]
pub(crate) struct SchemaCx<'s> {
    pub(crate) schema: &'s Map<String, Value>,
    pub(crate) position: Position,
}

/// Capability given to a keyword implementation for the duration of one call.
///
/// Checks are contributed with [`fail`](Self::fail) and [`ok`](Self::ok). Each
/// failing check reports an error built from the keyword's message and params
/// generators.
pub struct KeywordCx<'a, 'c> {
    session: &'a mut Session<'c>,
    it: &'a SchemaCx<'a>,
    keyword: &'a str,
    schema: &'a Value,
    data: Option<DataRef>,
    expects: &'a [DataType],
    error: KeywordErrorDefinition,
    params: Option<Value>,
    nodes: Vec<Node>,
}

impl<'a, 'c> KeywordCx<'a, 'c> {
    pub(crate) fn new(
        session: &'a mut Session<'c>,
        it: &'a SchemaCx<'a>,
        keyword: &'a str,
        data: Option<DataRef>,
        expects: &'a [DataType],
    ) -> Self {
        Self {
            session,
            it,
            keyword,
            schema: it.schema.get(keyword).unwrap_or(&ABSENT),
            data,
            expects,
            error: KeywordErrorDefinition::default_for(keyword),
            params: None,
            nodes: Vec::new(),
        }
    }

    pub fn keyword(&self) -> &str {
        self.keyword
    }

    /// The keyword's schema value (`null` when only an implied keyword is present).
    ///
    /// For a `$data` reference this is the `{"$data": ...}` object itself.
    pub fn schema(&self) -> &'a Value {
        self.schema
    }

    /// The schema object containing the keyword.
    pub fn parent_schema(&self) -> &'a Map<String, Value> {
        self.it.schema
    }

    pub fn schema_path(&self) -> String {
        format!("{}/{}", self.it.position.schema_path, self.keyword)
    }

    /// Symbolic path of the data this keyword applies to, e.g. `/items/{index}`.
    pub fn data_path(&self) -> &str {
        &self.it.position.data_path
    }

    pub fn data_level(&self) -> usize {
        self.it.position.data_level
    }

    pub fn options(&self) -> Options {
        self.session.options()
    }

    /// Whether the schema value is a `$data` reference resolved at validation time.
    pub fn is_data(&self) -> bool {
        self.data.is_some()
    }

    /// Use fixed params for failures contributed after this call.
    pub fn set_error_params(&mut self, params: Value) {
        self.params = Some(params);
    }

    /// Fail when `condition(data, schema value)` holds.
    pub fn fail(&mut self, condition: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static) {
        let site = self.site();
        let check = self.check(Arc::new(condition), site);
        self.nodes.push(check);
    }

    /// Fail unless `condition(data, schema value)` holds.
    pub fn ok(&mut self, condition: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static) {
        self.fail(move |data, schema| !condition(data, schema));
    }

    pub(crate) fn set_error(
        &mut self,
        message: impl Fn(&Value, &Value) -> String + Send + Sync + 'static,
        params: impl Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    ) {
        self.error = KeywordErrorDefinition::new(message, params);
    }

    pub(crate) fn set_error_definition(&mut self, error: KeywordErrorDefinition) {
        self.error = error;
    }

    /// Error site of this keyword using its current error generators.
    pub(crate) fn site(&self) -> ErrorSite {
        let params = match &self.params {
            Some(fixed) => {
                let fixed = fixed.clone();
                Arc::new(move |_: &Value, _: &Value| fixed.clone()) as crate::definition::ParamsFn
            }
            None => self.error.params.clone(),
        };
        ErrorSite {
            keyword: Arc::from(self.keyword),
            schema_path: Arc::from(self.schema_path()),
            schema: self.schema.clone(),
            message: self.error.message.clone(),
            params,
        }
    }

    /// Error site for another keyword of the same schema object (e.g. `additionalItems`).
    pub(crate) fn site_for(
        &self,
        keyword: &str,
        schema: Value,
        message: impl Fn(&Value, &Value) -> String + Send + Sync + 'static,
        params: impl Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    ) -> ErrorSite {
        ErrorSite {
            keyword: Arc::from(keyword),
            schema_path: Arc::from(format!("{}/{}", self.it.position.schema_path, keyword)),
            schema,
            message: Arc::new(message),
            params: Arc::new(params),
        }
    }

    /// A check against this keyword's schema value, literal or `$data`.
    pub(crate) fn check(&self, failing: crate::compile::ir::Condition, site: ErrorSite) -> Node {
        let value = match &self.data {
            Some(reference) => SchemaValue::Data(reference.clone()),
            None => SchemaValue::Literal(self.schema.clone()),
        };
        Node::Check(Check {
            value,
            expects: self.expects.to_vec(),
            failing,
            site,
        })
    }

    /// A check against a fixed value, reported at `site`.
    pub(crate) fn literal_check(
        &self,
        value: Value,
        failing: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static,
        site: ErrorSite,
    ) -> Node {
        Node::Check(Check {
            value: SchemaValue::Literal(value),
            expects: Vec::new(),
            failing: Arc::new(failing),
            site,
        })
    }

    /// Compile a subschema found at `relative` (a path below the enclosing schema object).
    ///
    /// `descend` names the data step (`"/0"`, `"/{index}"`) when the subschema applies
    /// to a child of the current data.
    pub(crate) fn subschema(
        &mut self,
        schema: &Value,
        relative: &str,
        descend: Option<&str>,
    ) -> Result<Node> {
        let position = &self.it.position;
        let child = Position {
            schema_path: if relative.is_empty() {
                self.schema_path()
            } else {
                format!("{}/{}", position.schema_path, relative)
            },
            data_path: match descend {
                Some(step) => format!("{}{}", position.data_path, step),
                None => position.data_path.clone(),
            },
            data_level: position.data_level + usize::from(descend.is_some()),
            base: position.base.clone(),
        };
        if descend.is_none() {
            return compile::compile_value(self.session, schema, child);
        }
        self.session.enter_data();
        let node = compile::compile_value(self.session, schema, child);
        self.session.leave_data();
        node
    }

    /// Compile a subschema applied to the property names of the current data.
    pub(crate) fn key_subschema(&mut self, schema: &Value, relative: &str) -> Result<Node> {
        self.session.enter_data();
        let node = self.subschema(schema, relative, None);
        self.session.leave_data();
        node
    }

    /// Resolve a `$ref` from this schema's base URI into a procedure.
    pub(crate) fn reference(&mut self, reference: &str) -> Result<ProcId> {
        let base = self.it.position.base.clone();
        debug!(reference, base = %base, "resolving reference");
        let schema_path = self.schema_path();
        self.session.call(&base, reference, &schema_path)
    }

    pub(crate) fn formats(&self) -> &Formats {
        self.session.formats()
    }

    pub(crate) fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Replace everything contributed so far.
    pub(crate) fn replace(&mut self, node: Node) {
        self.nodes = vec![node];
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::compilation(self.keyword, &self.schema_path(), message)
    }

    /// Compilation error attributed to a sibling keyword of the parent schema.
    pub(crate) fn sibling_error(&self, keyword: &str, message: impl Into<String>) -> SchemaError {
        let schema_path = format!("{}/{}", self.it.position.schema_path, keyword);
        SchemaError::compilation(keyword, &schema_path, message)
    }

    pub(crate) fn into_node(self) -> Node {
        Node::all(self.nodes)
    }
}
