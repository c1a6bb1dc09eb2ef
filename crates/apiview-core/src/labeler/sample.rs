use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::parse::ref_resolve::RefResolver;
use crate::parse::schema::Schema;

use super::prepare_schema;

/// Ref hops a sample follows along one path before leaving the value out.
const MAX_SAMPLE_DEPTH: usize = 8;

/// Synthesize an example payload for a schema.
///
/// A declared `example` is used verbatim. Objects keep required properties
/// and any optional property whose sample is non-empty; an object left with
/// nothing is absent unless it is itself required. Arrays hold one sample
/// item. Required scalars fall back to a zero value and optional ones are
/// absent. Bare `$ref` markers cannot be followed here and sample as absent;
/// use [`SampleBuilder`] to follow them.
pub fn gather_sample_json_data(schema: &Schema, is_required: bool) -> Option<Value> {
    SampleBuilder::default().sample(schema, is_required)
}

/// Sample synthesis that follows `$ref` markers through a resolver as it
/// reaches them. Each referenced schema is sampled once per requiredness and
/// the result reused, so shared targets cost nothing extra. A ref already
/// open on the current path samples as absent.
#[derive(Debug, Default)]
pub struct SampleBuilder<'a> {
    resolver: Option<RefResolver<'a>>,
    open: Vec<String>,
    memo: HashMap<(String, bool), Option<Value>>,
}

impl<'a> SampleBuilder<'a> {
    pub fn new(resolver: RefResolver<'a>) -> Self {
        Self {
            resolver: Some(resolver),
            ..Self::default()
        }
    }

    pub fn sample(&mut self, schema: &Schema, is_required: bool) -> Option<Value> {
        let Some(ref_path) = &schema.ref_path else {
            return self.sample_inline(schema, is_required);
        };
        if schema.is_ref_marker() {
            return self.sample_ref(ref_path, is_required);
        }
        if !self.can_open(ref_path) {
            return None;
        }
        self.open.push(ref_path.clone());
        let sample = self.sample_inline(schema, is_required);
        self.open.pop();
        sample
    }

    fn sample_ref(&mut self, ref_path: &str, is_required: bool) -> Option<Value> {
        let key = (ref_path.to_string(), is_required);
        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }
        if !self.can_open(ref_path) {
            return None;
        }
        let target = self.resolve(ref_path)?;
        self.open.push(key.0.clone());
        let sample = self.sample_inline(&target, is_required);
        self.open.pop();
        self.memo.insert(key, sample.clone());
        sample
    }

    fn can_open(&self, ref_path: &str) -> bool {
        self.open.len() < MAX_SAMPLE_DEPTH && !self.open.iter().any(|r| r == ref_path)
    }

    /// The target of a ref with its own nested refs left as markers.
    fn resolve(&self, ref_path: &str) -> Option<Schema> {
        let resolver = self.resolver?;
        let target = resolver.resolve(resolver.lookup(ref_path)?).node()?;
        Schema::from_value(&target.materialize(0))
    }

    fn sample_inline(&mut self, schema: &Schema, is_required: bool) -> Option<Value> {
        if let Some(example) = &schema.example {
            return Some(example.clone());
        }

        let schema = prepare_schema(&self.expand_all_of(schema));

        let is_object = schema.has_type("object")
            || (!schema.properties.is_empty() && schema.schema_type.is_none());
        if is_object {
            let mut object = Map::new();
            for (name, property) in &schema.properties {
                let required = schema.is_required(name);
                let Some(sample) = self.sample(property, required) else {
                    continue;
                };
                if required || !is_empty_sample(&sample) {
                    object.insert(name.clone(), sample);
                }
            }
            if object.is_empty() && !is_required {
                return None;
            }
            return Some(Value::Object(object));
        }

        if schema.has_type("array") {
            let item = schema
                .items
                .as_deref()
                .and_then(|items| self.sample(items, is_required));
            return Some(Value::Array(item.into_iter().collect()));
        }

        if !is_required {
            return None;
        }

        match schema.single_type()? {
            "string" => Some(Value::String(String::new())),
            "integer" | "number" => Some(Value::from(0)),
            "boolean" => Some(Value::Bool(false)),
            _ => None,
        }
    }

    /// `allOf` branches that are bare refs, replaced by their targets so
    /// flattening sees their properties.
    fn expand_all_of(&self, schema: &Schema) -> Schema {
        let mut expanded = schema.clone();
        for branch in &mut expanded.all_of {
            if branch.is_ref_marker()
                && let Some(ref_path) = branch.ref_path.clone()
                && let Some(target) = self.resolve(&ref_path)
            {
                *branch = target;
            }
        }
        expanded
    }
}

/// Empty string, array, or object.
pub fn is_empty_sample(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
