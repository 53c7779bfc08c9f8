use std::{fmt, path::Path};

use serde::{
    Deserialize,
    Deserializer,
    de::{self, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor},
};
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

/// One decoded YAML file, keyed by the path it was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Source path as discovered by the walker. Unique within the index.
    pub id: String,
    /// Top-level mapping of the file, converted to JSON values.
    pub content: Map<String, Value>,
}

impl Document {
    /// Decode YAML text into a document.
    ///
    /// Only the first document of a multi-document stream is used. An empty
    /// or null document yields an empty mapping; any other non-mapping top
    /// level is rejected.
    pub fn from_yaml(path: &Path, text: &str) -> Result<Self> {
        let first = serde_yaml::Deserializer::from_str(text).next();
        let value = match first {
            Some(de) => YamlValue::deserialize(de)?.0,
            None => Value::Null,
        };

        let content = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(Error::NotAMapping(path.to_path_buf())),
        };

        Ok(Self {
            id: path.to_string_lossy().into_owned(),
            content,
        })
    }

    /// Render every scalar leaf as a `dotted.key: value` line.
    ///
    /// Sequence items share their parent's key. This is the free-text body
    /// that unqualified queries and highlighting run against.
    pub fn body_text(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.content {
            flatten_into(key, value, &mut out);
        }
        out
    }
}

fn flatten_into(prefix: &str, value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(&format!("{prefix}.{key}"), child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_into(prefix, item, out);
            }
        }
        Value::Null => {}
        Value::String(s) => {
            out.push_str(prefix);
            out.push_str(": ");
            out.push_str(s);
            out.push('\n');
        }
        other => {
            out.push_str(prefix);
            out.push_str(": ");
            out.push_str(&other.to_string());
            out.push('\n');
        }
    }
}

/// A JSON value decoded directly from a YAML stream.
///
/// Mapping keys that are not strings are stringified and tags are dropped.
/// Integers wider than 64 bits become floats, and non-finite floats become
/// their YAML spelling since JSON cannot represent them.
struct YamlValue(Value);

impl<'de> Deserialize<'de> for YamlValue {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(YamlVisitor).map(YamlValue)
    }
}

struct YamlVisitor;

type Decoded<E> = std::result::Result<Value, E>;

impl<'de> Visitor<'de> for YamlVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Decoded<E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Decoded<E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Decoded<E> {
        Ok(Value::from(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Decoded<E> {
        Ok(float_value(v as f64))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Decoded<E> {
        Ok(float_value(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Decoded<E> {
        Ok(float_value(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Decoded<E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Decoded<E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Decoded<E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Decoded<E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Decoded<D::Error> {
        YamlValue::deserialize(d).map(|v| v.0)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Decoded<A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(YamlValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut entries: A) -> Decoded<A::Error> {
        let mut map = Map::new();
        while let Some(YamlValue(key)) = entries.next_key()? {
            let key = key_to_string(key);
            let YamlValue(value) = entries.next_value()?;
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!(
                    "duplicate mapping key: {key}"
                )));
            }
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Decoded<A::Error> {
        let (_tag, contents) = data.variant::<de::IgnoredAny>()?;
        contents.newtype_variant::<YamlValue>().map(|v| v.0)
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or_else(|| {
        let spelled = if f.is_nan() {
            ".nan"
        } else if f.is_sign_negative() {
            "-.inf"
        } else {
            ".inf"
        };
        Value::String(spelled.to_owned())
    })
}

fn key_to_string(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
