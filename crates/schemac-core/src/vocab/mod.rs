//! Built-in draft-07 keywords.

mod applicator;
mod array;
pub mod format;
mod number;
mod object;
mod string;
mod validation;

use std::fmt;

use crate::context::KeywordCx;
use crate::error::Result;
use crate::types::DataType;

pub(crate) type BuiltinCode = fn(&mut KeywordCx<'_, '_>) -> Result<()>;

/// A keyword implemented by the engine.
pub struct BuiltinKeyword {
    pub(crate) keyword: &'static str,
    pub(crate) schema_type: &'static [DataType],
    pub(crate) data: bool,
    pub(crate) implements: &'static [&'static str],
    pub(crate) code: BuiltinCode,
}

impl BuiltinKeyword {
    const fn new(keyword: &'static str, schema_type: &'static [DataType], code: BuiltinCode) -> Self {
        Self {
            keyword,
            schema_type,
            data: false,
            implements: &[],
            code,
        }
    }

    const fn with_data(mut self) -> Self {
        self.data = true;
        self
    }

    const fn implementing(mut self, implements: &'static [&'static str]) -> Self {
        self.implements = implements;
        self
    }

    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    pub fn allows_data(&self) -> bool {
        self.data
    }
}

impl fmt::Debug for BuiltinKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinKeyword")
            .field("keyword", &self.keyword)
            .field("schema_type", &self.schema_type)
            .field("data", &self.data)
            .field("implements", &self.implements)
            .finish()
    }
}

const NUMBER: &[DataType] = &[DataType::Number];
const INTEGER: &[DataType] = &[DataType::Integer];
const STRING: &[DataType] = &[DataType::String];
const BOOLEAN: &[DataType] = &[DataType::Boolean];
const ARRAY: &[DataType] = &[DataType::Array];
const OBJECT: &[DataType] = &[DataType::Object];
const SCHEMA: &[DataType] = &[DataType::Object, DataType::Boolean];
const SCHEMA_OR_TUPLE: &[DataType] = &[DataType::Object, DataType::Boolean, DataType::Array];
const ANY: &[DataType] = &[];

static NUMBER_GROUP: [BuiltinKeyword; 6] = [
    BuiltinKeyword::new("maximum", NUMBER, number::maximum).with_data(),
    BuiltinKeyword::new("minimum", NUMBER, number::minimum).with_data(),
    BuiltinKeyword::new("exclusiveMaximum", NUMBER, number::exclusive_maximum).with_data(),
    BuiltinKeyword::new("exclusiveMinimum", NUMBER, number::exclusive_minimum).with_data(),
    BuiltinKeyword::new("multipleOf", NUMBER, number::multiple_of).with_data(),
    BuiltinKeyword::new("format", STRING, format::format),
];

static STRING_GROUP: [BuiltinKeyword; 4] = [
    BuiltinKeyword::new("maxLength", INTEGER, string::max_length).with_data(),
    BuiltinKeyword::new("minLength", INTEGER, string::min_length).with_data(),
    BuiltinKeyword::new("pattern", STRING, string::pattern).with_data(),
    BuiltinKeyword::new("format", STRING, format::format),
];

static ARRAY_GROUP: [BuiltinKeyword; 5] = [
    BuiltinKeyword::new("maxItems", INTEGER, array::max_items).with_data(),
    BuiltinKeyword::new("minItems", INTEGER, array::min_items).with_data(),
    BuiltinKeyword::new("items", SCHEMA_OR_TUPLE, array::items).implementing(&["additionalItems"]),
    BuiltinKeyword::new("contains", SCHEMA, array::contains),
    BuiltinKeyword::new("uniqueItems", BOOLEAN, array::unique_items).with_data(),
];

static OBJECT_GROUP: [BuiltinKeyword; 6] = [
    BuiltinKeyword::new("maxProperties", INTEGER, object::max_properties).with_data(),
    BuiltinKeyword::new("minProperties", INTEGER, object::min_properties).with_data(),
    BuiltinKeyword::new("required", ARRAY, object::required),
    BuiltinKeyword::new("dependencies", OBJECT, object::dependencies),
    BuiltinKeyword::new("propertyNames", SCHEMA, object::property_names),
    BuiltinKeyword::new("properties", OBJECT, object::properties)
        .implementing(&["additionalProperties", "patternProperties"]),
];

static UNTYPED_GROUP: [BuiltinKeyword; 8] = [
    BuiltinKeyword::new("$ref", STRING, applicator::reference),
    BuiltinKeyword::new("const", ANY, validation::constant).with_data(),
    BuiltinKeyword::new("enum", ARRAY, validation::enumeration).with_data(),
    BuiltinKeyword::new("not", SCHEMA, applicator::not),
    BuiltinKeyword::new("anyOf", ARRAY, applicator::any_of),
    BuiltinKeyword::new("oneOf", ARRAY, applicator::one_of),
    BuiltinKeyword::new("allOf", ARRAY, applicator::all_of),
    BuiltinKeyword::new("if", SCHEMA, applicator::if_then_else).implementing(&["then", "else"]),
];

/// Built-in groups in evaluation order.
pub(crate) fn builtin_groups() -> [(Option<DataType>, &'static [BuiltinKeyword]); 5] {
    [
        (Some(DataType::Number), &NUMBER_GROUP),
        (Some(DataType::String), &STRING_GROUP),
        (Some(DataType::Array), &ARRAY_GROUP),
        (Some(DataType::Object), &OBJECT_GROUP),
        (None, &UNTYPED_GROUP),
    ]
}
