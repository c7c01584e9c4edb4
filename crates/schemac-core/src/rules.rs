//! The rule registry: keyword implementations grouped by the data type they apply to.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::definition::KeywordDefinition;
use crate::types::DataType;
use crate::validator::ValidateFunction;
use crate::vocab::{self, BuiltinKeyword};

/// Keywords the engine handles itself, outside any group.
pub(crate) const ENGINE_KEYWORDS: &[&str] = &["type", "$comment"];

/// Recognized keywords that never validate anything on their own.
pub(crate) const NON_VALIDATING_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "id",
    "$data",
    "$async",
    "title",
    "description",
    "default",
    "definitions",
    "examples",
    "readOnly",
    "writeOnly",
    "contentMediaType",
    "contentEncoding",
];

#[derive(Clone)]
pub enum Implementation {
    Builtin(&'static BuiltinKeyword),
    Custom(Arc<KeywordDefinition>),
}

/// A keyword and the implementation used to validate it.
pub struct Rule {
    keyword: String,
    implementation: Implementation,
    implements: Vec<String>,
    meta_validator: Option<ValidateFunction>,
}

impl Rule {
    pub(crate) fn builtin(keyword: &'static BuiltinKeyword) -> Self {
        Self {
            keyword: keyword.keyword.to_string(),
            implementation: Implementation::Builtin(keyword),
            implements: keyword.implements.iter().map(|k| k.to_string()).collect(),
            meta_validator: None,
        }
    }

    pub(crate) fn custom(
        keyword: &str,
        definition: Arc<KeywordDefinition>,
        meta_validator: Option<ValidateFunction>,
    ) -> Self {
        Self {
            keyword: keyword.to_string(),
            implements: definition.implements.clone(),
            implementation: Implementation::Custom(definition),
            meta_validator,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Keywords handled by this rule without rules of their own.
    pub fn implements(&self) -> &[String] {
        &self.implements
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.implementation, Implementation::Custom(_))
    }

    pub fn definition(&self) -> Option<&KeywordDefinition> {
        match &self.implementation {
            Implementation::Custom(definition) => Some(definition),
            Implementation::Builtin(_) => None,
        }
    }

    pub(crate) fn schema_type(&self) -> &[DataType] {
        match &self.implementation {
            Implementation::Builtin(builtin) => builtin.schema_type,
            Implementation::Custom(definition) => &definition.schema_type,
        }
    }

    pub(crate) fn allows_data(&self) -> bool {
        match &self.implementation {
            Implementation::Builtin(builtin) => builtin.data,
            Implementation::Custom(definition) => definition.data,
        }
    }

    pub(crate) fn meta_validator(&self) -> Option<&ValidateFunction> {
        self.meta_validator.as_ref()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("keyword", &self.keyword)
            .field("implements", &self.implements)
            .field("is_custom", &self.is_custom())
            .finish()
    }
}

/// Rules applying to one data type, or to every type when `applies_to` is `None`.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    applies_to: Option<DataType>,
    /// Keyed by registration order.
    rules: BTreeMap<u64, Arc<Rule>>,
    builtin: bool,
}

impl RuleGroup {
    pub fn applies_to(&self) -> Option<DataType> {
        self.applies_to
    }

    pub fn rules(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.values()
    }

    pub fn keywords(&self) -> Vec<&str> {
        self.rules.values().map(|rule| rule.keyword()).collect()
    }
}

/// Registry of recognized keywords and the rules that implement them.
///
/// Each [`SchemaCompiler`](crate::SchemaCompiler) owns one instance.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    groups: Vec<RuleGroup>,
    by_type: HashMap<Option<DataType>, usize>,
    /// keyword -> (group type, order key) for every group holding the keyword.
    membership: HashMap<String, Vec<(Option<DataType>, u64)>>,
    /// implied keyword -> keywords implementing it.
    implied: HashMap<String, BTreeSet<String>>,
    /// Built-in implied keywords; recognized until removed by name.
    fixed_implied: BTreeSet<String>,
    non_validating: BTreeSet<String>,
    custom: HashMap<String, Arc<Rule>>,
    next_order: u64,
}

impl ValidationRules {
    /// Registry populated with the built-in draft-07 keyword set.
    pub fn with_builtins() -> Self {
        let mut rules = Self {
            groups: Vec::new(),
            by_type: HashMap::new(),
            membership: HashMap::new(),
            implied: HashMap::new(),
            fixed_implied: BTreeSet::new(),
            non_validating: NON_VALIDATING_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            custom: HashMap::new(),
            next_order: 0,
        };
        for (applies_to, keywords) in vocab::builtin_groups() {
            rules.push_group(applies_to, true);
            for keyword in keywords {
                rules.insert(applies_to, Arc::new(Rule::builtin(keyword)));
            }
        }
        rules.fixed_implied = rules.implied.keys().cloned().collect();
        rules
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    pub fn group(&self, applies_to: Option<DataType>) -> Option<&RuleGroup> {
        self.by_type.get(&applies_to).map(|index| &self.groups[*index])
    }

    /// Whether compiling a schema that uses `keyword` will not report it as unknown.
    pub fn is_known(&self, keyword: &str) -> bool {
        self.membership.contains_key(keyword)
            || self.implied.contains_key(keyword)
            || self.non_validating.contains(keyword)
            || ENGINE_KEYWORDS.contains(&keyword)
    }

    /// Whether `keyword` has a rule of its own.
    pub fn has_rule(&self, keyword: &str) -> bool {
        self.membership.contains_key(keyword)
    }

    pub fn custom(&self, keyword: &str) -> Option<&Arc<Rule>> {
        self.custom.get(keyword)
    }

    /// Every recognized keyword name.
    pub fn keywords(&self) -> BTreeSet<String> {
        self.membership
            .keys()
            .chain(self.implied.keys())
            .chain(self.non_validating.iter())
            .cloned()
            .chain(ENGINE_KEYWORDS.iter().map(|k| k.to_string()))
            .collect()
    }

    /// Group types with their keywords in evaluation order.
    pub fn group_keywords(&self) -> Vec<(Option<DataType>, Vec<String>)> {
        self.groups
            .iter()
            .map(|group| {
                let keywords = group.rules().map(|r| r.keyword().to_string()).collect();
                (group.applies_to, keywords)
            })
            .collect()
    }

    /// Add a custom rule to the group of each type (or the untyped group).
    pub(crate) fn add_custom(&mut self, rule: Rule, types: &[DataType]) {
        let rule = Arc::new(rule);
        if types.is_empty() {
            self.insert(None, rule.clone());
        } else {
            for data_type in types {
                self.insert(Some(*data_type), rule.clone());
            }
        }
        self.custom.insert(rule.keyword.clone(), rule);
    }

    /// Remove `keyword` from every group, the recognized set and the custom map.
    ///
    /// Returns whether anything was removed.
    pub(crate) fn remove(&mut self, keyword: &str) -> bool {
        let mut removed = self.non_validating.remove(keyword);
        removed |= self.custom.remove(keyword).is_some();

        for (applies_to, order) in self.membership.remove(keyword).unwrap_or_default() {
            removed = true;
            if let Some(index) = self.by_type.get(&applies_to).copied() {
                self.groups[index].rules.remove(&order);
            }
        }

        removed |= self.implied.remove(keyword).is_some();
        removed |= self.fixed_implied.remove(keyword);
        let fixed = &self.fixed_implied;
        self.implied.retain(|implied, implementers| {
            implementers.remove(keyword);
            !implementers.is_empty() || fixed.contains(implied)
        });

        let before = self.groups.len();
        self.groups
            .retain(|group| group.builtin || !group.rules.is_empty());
        if self.groups.len() != before {
            self.reindex();
        }
        removed
    }

    fn insert(&mut self, applies_to: Option<DataType>, rule: Arc<Rule>) {
        let index = match self.by_type.get(&applies_to) {
            Some(index) => *index,
            None => self.push_group(applies_to, false),
        };
        let order = self.next_order;
        self.next_order += 1;

        for implied in &rule.implements {
            self.implied
                .entry(implied.clone())
                .or_default()
                .insert(rule.keyword.clone());
        }
        self.membership
            .entry(rule.keyword.clone())
            .or_default()
            .push((applies_to, order));
        self.groups[index].rules.insert(order, rule);
    }

    fn push_group(&mut self, applies_to: Option<DataType>, builtin: bool) -> usize {
        self.groups.push(RuleGroup {
            applies_to,
            rules: BTreeMap::new(),
            builtin,
        });
        let index = self.groups.len() - 1;
        self.by_type.insert(applies_to, index);
        index
    }

    fn reindex(&mut self) {
        self.by_type = self
            .groups
            .iter()
            .enumerate()
            .map(|(index, group)| (group.applies_to, index))
            .collect();
    }
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::with_builtins()
    }
}
