//! The compilation engine: lowers schema documents into [`Node`] programs.

pub(crate) mod data;
pub(crate) mod eval;
pub(crate) mod ir;
pub(crate) mod refs;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::Options;
use crate::context::{KeywordCx, Position, SchemaCx};
use crate::definition::KeywordDefinition;
use crate::error::{Result, SchemaError};
use crate::report::errors_text;
use crate::rules::{Implementation, Rule, ValidationRules};
use crate::types::{parse_types, types_text, DataType};
use crate::validator::ValidateFunction;
use crate::vocab::format::Formats;

use self::data::{data_pointer, DataRef};
use self::ir::{ErrorSite, Node, ProcId};
use self::refs::Resolver;

/// What a compilation reads: the registry, options, formats and cached documents.
#[derive(Clone, Copy)]
pub(crate) struct Env<'c> {
    pub(crate) rules: &'c ValidationRules,
    pub(crate) options: Options,
    pub(crate) formats: &'c Formats,
    pub(crate) schemas: &'c HashMap<String, Value>,
}

/// State of one compilation: the environment plus the procedure table for `$ref` targets.
pub(crate) struct Session<'c> {
    env: Env<'c>,
    resolver: Resolver<'c>,
    procs: Vec<Option<Node>>,
    proc_index: HashMap<String, ProcId>,
    /// Data descents on the current compile stack.
    depth: usize,
    /// `depth` at which each procedure started compiling.
    proc_depth: Vec<usize>,
}

impl<'c> Session<'c> {
    pub(crate) fn options(&self) -> Options {
        self.env.options
    }

    pub(crate) fn formats(&self) -> &'c Formats {
        self.env.formats
    }

    pub(crate) fn enter_data(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn leave_data(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Procedure for the schema `reference` points at, compiling it on first use.
    ///
    /// A reference back to a procedure still being compiled must move into the
    /// data first; otherwise validation would recurse without consuming input.
    pub(crate) fn call(
        &mut self,
        base: &Url,
        reference: &str,
        schema_path: &str,
    ) -> Result<ProcId> {
        let target = self.resolver.resolve(base, reference)?;
        if let Some(id) = self.proc_index.get(&target.key).copied() {
            if self.procs[id].is_none() && self.proc_depth[id] == self.depth {
                warn!(reference, schema_path, "reference cycle does not consume data");
                return Err(SchemaError::compilation(
                    "$ref",
                    schema_path,
                    format!("reference {reference} loops back without moving into the data"),
                ));
            }
            return Ok(id);
        }

        let id = self.procs.len();
        self.procs.push(None);
        self.proc_depth.push(self.depth);
        self.proc_index.insert(target.key.clone(), id);
        debug!(target = %target.key, id, "compiling reference target");

        let position = Position::root(format!("#{}", target.fragment), target.base);
        let node = compile_value(self, target.schema, position)?;
        self.procs[id] = Some(node);
        Ok(id)
    }
}

/// Compile `schema` into a validator.
pub(crate) fn compile_root(env: Env<'_>, schema: &Value) -> Result<ValidateFunction> {
    let base = refs::schema_base(schema, &refs::default_base()?)?;
    let mut session = Session {
        env,
        resolver: Resolver::new(schema, &base, env.schemas)?,
        procs: Vec::new(),
        proc_index: HashMap::new(),
        depth: 0,
        proc_depth: Vec::new(),
    };
    let root = compile_value(&mut session, schema, Position::root("#", base))?;
    let procs = session
        .procs
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    Ok(ValidateFunction::new(root, procs, env.options.all_errors))
}

/// Compile one schema node (object or boolean) at `position`.
pub(crate) fn compile_value(
    session: &mut Session<'_>,
    schema: &Value,
    position: Position,
) -> Result<Node> {
    match schema {
        Value::Bool(true) => Ok(Node::Pass),
        Value::Bool(false) => Ok(Node::Reject(ErrorSite {
            keyword: Arc::from("false schema"),
            schema_path: Arc::from(position.schema_path.as_str()),
            schema: Value::Bool(false),
            message: Arc::new(|_, _| "boolean schema is false".to_string()),
            params: Arc::new(|_, _| json!({})),
        })),
        Value::Object(map) => {
            let base = refs::schema_base(schema, &position.base)?;
            let it = SchemaCx {
                schema: map,
                position: Position { base, ..position },
            };
            compile_object(session, &it)
        }
        _ => Err(SchemaError::InvalidSchemaType {
            schema_path: position.schema_path,
        }),
    }
}

fn compile_object(session: &mut Session<'_>, it: &SchemaCx<'_>) -> Result<Node> {
    let rules = session.env.rules;
    let map = it.schema;
    let path = &it.position.schema_path;

    let only_ref = map.contains_key("$ref") && rules.has_rule("$ref");
    if only_ref && map.len() > 1 {
        debug!(schema_path = %path, "ignoring keywords next to $ref");
    }

    let mut nodes = Vec::new();
    let mut declared: Option<Vec<DataType>> = None;

    if !only_ref {
        check_unknown_keywords(session, it)?;
        if let Some(value) = map.get("type") {
            let types = parse_types(value).ok_or_else(|| {
                SchemaError::compilation(
                    "type",
                    &format!("{path}/type"),
                    "should be a type name or a non-empty list of type names",
                )
            })?;
            nodes.push(type_node(&types, value, path));
            declared = Some(types);
        }
    }

    for group in rules.groups() {
        if let (Some(group_type), Some(declared)) = (group.applies_to(), &declared) {
            if !declared.iter().any(|t| t.admits(group_type)) {
                continue;
            }
        }

        let mut contributed = Vec::new();
        for rule in group.rules() {
            if only_ref && rule.keyword() != "$ref" {
                continue;
            }
            if !rule_present(rule, map) {
                continue;
            }
            contributed.push(apply_rule(session, it, rule)?);
        }

        let body = Node::all(contributed);
        match (group.applies_to(), body) {
            (_, Node::Pass) => {}
            (Some(data_type), body) => nodes.push(Node::Guard {
                data_type,
                body: Box::new(body),
            }),
            (None, body) => nodes.push(body),
        }
    }

    Ok(Node::all(nodes))
}

fn rule_present(rule: &Rule, map: &Map<String, Value>) -> bool {
    map.contains_key(rule.keyword()) || rule.implements().iter().any(|k| map.contains_key(k))
}

fn check_unknown_keywords(session: &Session<'_>, it: &SchemaCx<'_>) -> Result<()> {
    let rules = session.env.rules;
    for keyword in it.schema.keys() {
        if rules.is_known(keyword) {
            continue;
        }
        if session.env.options.strict_keywords {
            return Err(SchemaError::UnknownKeyword {
                keyword: keyword.clone(),
                schema_path: it.position.schema_path.clone(),
            });
        }
        warn!(keyword = %keyword, schema_path = %it.position.schema_path, "unknown keyword ignored");
    }
    Ok(())
}

fn type_node(types: &[DataType], value: &Value, path: &str) -> Node {
    let expected = types_text(types);
    Node::Type {
        types: types.to_vec(),
        site: ErrorSite {
            keyword: Arc::from("type"),
            schema_path: Arc::from(format!("{path}/type")),
            schema: value.clone(),
            message: {
                let expected = expected.clone();
                Arc::new(move |_, _| format!("should be {expected}"))
            },
            params: Arc::new(move |_, _| json!({ "type": expected })),
        },
    }
}

fn apply_rule(session: &mut Session<'_>, it: &SchemaCx<'_>, rule: &Rule) -> Result<Node> {
    let keyword = rule.keyword();
    let schema_path = format!("{}/{}", it.position.schema_path, keyword);

    let data = match it.schema.get(keyword) {
        Some(value) if rule.allows_data() && session.env.options.data => match data_pointer(value) {
            Some(pointer) => Some(DataRef::parse(pointer).ok_or_else(|| {
                SchemaError::InvalidDataRef {
                    pointer: pointer.to_string(),
                    schema_path: schema_path.clone(),
                }
            })?),
            None => None,
        },
        _ => None,
    };

    if let (None, Some(value)) = (&data, it.schema.get(keyword)) {
        let expected = rule.schema_type();
        if !expected.is_empty() && !expected.iter().any(|t| t.matches(value)) {
            return Err(SchemaError::compilation(
                keyword,
                &schema_path,
                format!("value should be {}", types_text(expected)),
            ));
        }
        if let Some(meta) = rule.meta_validator() {
            if let Err(errors) = meta.validate(value) {
                return Err(SchemaError::compilation(
                    keyword,
                    &schema_path,
                    format!("keyword value is invalid: {}", errors_text(errors.errors())),
                ));
            }
        }
    }

    let mut cx = KeywordCx::new(session, it, keyword, data, rule.schema_type());
    match rule.implementation() {
        Implementation::Builtin(builtin) => (builtin.code)(&mut cx)?,
        Implementation::Custom(definition) => lower_custom(&mut cx, definition)?,
    }
    Ok(cx.into_node())
}

/// Turn a custom keyword definition into checks.
fn lower_custom(cx: &mut KeywordCx<'_, '_>, definition: &KeywordDefinition) -> Result<()> {
    cx.set_error_definition(definition.error_definition(cx.keyword()));

    if let Some(code) = &definition.code {
        code(cx)?;
    } else if let Some(validate) = &definition.validate {
        let validate = validate.clone();
        if definition.schema == Some(false) {
            cx.ok(move |data, _| validate(&Value::Null, data));
        } else {
            cx.ok(move |data, schema| validate(schema, data));
        }
    } else if let Some(compile) = &definition.compile {
        let check = compile(cx.schema(), cx.parent_schema()).map_err(|message| cx.error(message))?;
        cx.ok(move |data, _| check(data));
    } else if let Some(expand) = &definition.macro_fn {
        let expanded = expand(cx.schema(), cx.parent_schema());
        let node = cx.subschema(&expanded, "", None)?;
        cx.push(node);
    }

    match definition.valid {
        Some(true) => cx.replace(Node::Pass),
        Some(false) => {
            let site = cx.site();
            cx.replace(Node::Reject(site));
        }
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(schema: &Value, options: Options) -> Result<ValidateFunction> {
        let rules = ValidationRules::with_builtins();
        let formats = Formats::builtin();
        let schemas = HashMap::new();
        compile_root(
            Env {
                rules: &rules,
                options,
                formats: &formats,
                schemas: &schemas,
            },
            schema,
        )
    }

    #[test]
    fn boolean_schemas() {
        let accept = compile(&json!(true), Options::default()).unwrap();
        assert!(accept.is_valid(&json!({"anything": [1, 2]})));

        let reject = compile(&json!(false), Options::default()).unwrap();
        let errors = reject.validate(&json!(1)).unwrap_err().into_errors();
        assert_eq!(errors[0].keyword, "false schema");
        assert_eq!(errors[0].schema_path, "#");
    }

    #[test]
    fn non_schema_values_are_rejected() {
        let err = compile(&json!({"items": 5}), Options::default()).unwrap_err();
        assert!(matches!(err, SchemaError::Compilation { ref keyword, .. } if keyword == "items"));

        let err = compile(&json!({"not": "x"}), Options::default()).unwrap_err();
        assert!(matches!(err, SchemaError::Compilation { .. } | SchemaError::InvalidSchemaType { .. }));
    }

    #[test]
    fn declared_type_skips_other_groups() {
        let validator = compile(&json!({"type": "string", "minimum": 5}), Options::default()).unwrap();
        assert!(validator.is_valid(&json!("abc")));
        assert!(!validator.is_valid(&json!(10)));
    }

    #[test]
    fn typed_groups_are_guarded_by_data_type() {
        let validator = compile(&json!({"minimum": 5, "minLength": 2}), Options::default()).unwrap();
        assert!(validator.is_valid(&json!("ab")));
        assert!(validator.is_valid(&json!(7)));
        assert!(validator.is_valid(&json!(null)));
        assert!(!validator.is_valid(&json!(4)));
        assert!(!validator.is_valid(&json!("a")));
    }

    #[test]
    fn ref_ignores_siblings() {
        let schema = json!({
            "definitions": {"int": {"type": "integer"}},
            "$ref": "#/definitions/int",
            "minimum": 100
        });
        let validator = compile(&schema, Options::default()).unwrap();
        assert!(validator.is_valid(&json!(3)));
        assert!(!validator.is_valid(&json!("3")));
    }

    #[test]
    fn strict_keywords_reject_unknown() {
        let schema = json!({"evenn": true});
        assert!(compile(&schema, Options::default()).is_ok());

        let strict = Options {
            strict_keywords: true,
            ..Options::default()
        };
        let err = compile(&schema, strict).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownKeyword { ref keyword, .. } if keyword == "evenn"));
    }

    #[test]
    fn invalid_data_pointer_is_a_compile_error() {
        let options = Options {
            data: true,
            ..Options::default()
        };
        let err = compile(&json!({"minimum": {"$data": "x/y"}}), options).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDataRef { .. }));
    }
}
