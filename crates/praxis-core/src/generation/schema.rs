//! Target-shape descriptors derived from Rust types via `schemars`.

use schemars::JsonSchema;
use serde_json::Value;

/// Name plus JSON Schema of the value a generation call must produce.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub name: String,
    pub schema: Value,
}

impl SchemaDescriptor {
    /// Describe `T` using its derived JSON Schema.
    pub fn of<T: JsonSchema>() -> Self {
        let schema = schemars::schema_for!(T).to_value();
        Self {
            name: T::schema_name().into_owned(),
            schema,
        }
    }

    /// Schema variant accepted by strict structured-output modes: every
    /// object closes `additionalProperties`, and the keywords those modes
    /// reject (`$schema`, `format`) are dropped.
    pub fn strict_schema(&self) -> Value {
        let mut schema = self.schema.clone();
        if let Value::Object(map) = &mut schema {
            map.remove("$schema");
        }
        close_objects(&mut schema);
        schema
    }

    /// System-prompt instruction for backends without a native schema mode.
    pub fn instruction(&self) -> String {
        let pretty = serde_json::to_string_pretty(&self.strict_schema())
            .unwrap_or_else(|_| self.schema.to_string());
        format!(
            "Respond with a single JSON object and nothing else. \
             The object must conform to this JSON Schema (named `{}`):\n{}",
            self.name, pretty
        )
    }
}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("format");
            if map.contains_key("properties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for child in map.values_mut() {
                close_objects(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                close_objects(item);
            }
        }
        _ => {}
    }
}
