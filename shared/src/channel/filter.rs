use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque, application-defined filter attached to a channel subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Value);

impl Filter {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Filter {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Projects a filter onto a canonical comparable string.
///
/// Filters may be produced by different code paths (decoded from the wire,
/// built by the application) so they are only ever compared through this
/// projection.
pub trait FilterComparator {
    fn filter_to_string(&self, filter: Option<&Filter>) -> String;

    fn filters_match(&self, a: Option<&Filter>, b: Option<&Filter>) -> bool {
        self.filter_to_string(a) == self.filter_to_string(b)
    }
}

impl<F: Fn(Option<&Filter>) -> String> FilterComparator for F {
    fn filter_to_string(&self, filter: Option<&Filter>) -> String {
        self(filter)
    }
}

/// Canonical JSON: object keys sorted, no insignificant whitespace. An absent
/// filter projects to the empty string, which no JSON value produces.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalJsonComparator;

impl FilterComparator for CanonicalJsonComparator {
    fn filter_to_string(&self, filter: Option<&Filter>) -> String {
        let mut output = String::new();
        if let Some(filter) = filter {
            write_canonical(filter.value(), &mut output);
        }
        output
    }
}

fn write_canonical(value: &Value, output: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            output.push('{');
            for (index, key) in keys.iter().enumerate() {
                if index > 0 {
                    output.push(',');
                }
                output.push_str(&Value::String((*key).clone()).to_string());
                output.push(':');
                write_canonical(&map[key.as_str()], output);
            }
            output.push('}');
        }
        Value::Array(items) => {
            output.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    output.push(',');
                }
                write_canonical(item, output);
            }
            output.push(']');
        }
        scalar => output.push_str(&scalar.to_string()),
    }
}
