//! Field extraction from arbitrary serializable records.

use crate::expression::{ExpressionError, ExpressionResult, Value};
use crate::record::ParameterMapping;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Name reported when the record itself has the wrong shape
const ROOT: &str = "<record>";

/// Capability of record-shaped types to expose their fields by name
pub trait Record {
    fn to_parameters(&self) -> ExpressionResult<ParameterMapping>;
}

impl Record for ParameterMapping {
    fn to_parameters(&self) -> ExpressionResult<ParameterMapping> {
        Ok(self.clone())
    }
}

impl Record for JsonValue {
    fn to_parameters(&self) -> ExpressionResult<ParameterMapping> {
        from_json(self)
    }
}

impl Record for Map<String, JsonValue> {
    fn to_parameters(&self) -> ExpressionResult<ParameterMapping> {
        object_to_parameters(self, "")
    }
}

/// Extract every field of a serializable record into a parameter mapping.
///
/// Sequence fields become lists of nested mappings so sub-expressions can
/// address element fields by name.
pub fn extract<T: Serialize + ?Sized>(record: &T) -> ExpressionResult<ParameterMapping> {
    let json = serde_json::to_value(record).map_err(|e| unsupported(ROOT, e.to_string()))?;
    from_json(&json)
}

/// Convert a JSON object into a parameter mapping
pub fn from_json(value: &JsonValue) -> ExpressionResult<ParameterMapping> {
    match value {
        JsonValue::Object(map) => object_to_parameters(map, ""),
        other => Err(unsupported(
            ROOT,
            format!("expected a record with named fields, found {}", json_kind(other)),
        )),
    }
}

fn object_to_parameters(map: &Map<String, JsonValue>, prefix: &str) -> ExpressionResult<ParameterMapping> {
    let mut params = ParameterMapping::new();

    for (name, value) in map {
        let path = format!("{}{}", prefix, name);
        params.insert(name.clone(), convert_field(&path, value)?);
    }

    Ok(params)
}

fn convert_field(path: &str, value: &JsonValue) -> ExpressionResult<Value> {
    match value {
        JsonValue::Null => Ok(Value::Missing),
        JsonValue::Bool(b) => Ok(Value::Boolean(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else if n.is_u64() {
                Err(unsupported(path, format!("integer {} exceeds the signed 64-bit range", n)))
            } else {
                n.as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| unsupported(path, format!("unrepresentable number {}", n)))
            }
        }
        JsonValue::String(s) => Ok(Value::String(s.clone())),
        JsonValue::Array(items) => {
            let mut elements = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let element_path = format!("{}[{}]", path, index);
                match item {
                    JsonValue::Object(map) => {
                        let prefix = format!("{}.", element_path);
                        elements.push(Value::Record(object_to_parameters(map, &prefix)?));
                    }
                    other => {
                        return Err(unsupported(
                            &element_path,
                            format!("sequence elements must be records, found {}", json_kind(other)),
                        ))
                    }
                }
            }
            Ok(Value::List(elements))
        }
        JsonValue::Object(_) => Err(unsupported(
            path,
            "nested records are only supported as sequence elements".to_string(),
        )),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "record",
    }
}

fn unsupported(field: &str, reason: String) -> ExpressionError {
    ExpressionError::UnsupportedRecordShape {
        field: field.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Tag {
        #[serde(rename = "ID")]
        id: i64,
        #[serde(rename = "Value")]
        value: String,
    }

    #[derive(Serialize)]
    struct Flag {
        #[serde(rename = "ID")]
        id: i64,
        #[serde(rename = "Key")]
        key: String,
        #[serde(rename = "Tags")]
        tags: Vec<Tag>,
        #[serde(rename = "Enabled")]
        enabled: bool,
        #[serde(rename = "Owner")]
        owner: Option<String>,
    }

    #[test]
    fn test_extract_struct_with_nested_sequence() {
        let flag = Flag {
            id: 2,
            key: "checkout".to_string(),
            tags: vec![
                Tag {
                    id: 3,
                    value: "FOO:BAR".to_string(),
                },
                Tag {
                    id: 6,
                    value: "JIRA:EPLT".to_string(),
                },
            ],
            enabled: true,
            owner: None,
        };

        let params = extract(&flag).unwrap();

        assert_eq!(params.lookup("ID"), &Value::Integer(2));
        assert_eq!(params.lookup("Key"), &Value::from("checkout"));
        assert_eq!(params.lookup("Enabled"), &Value::Boolean(true));
        assert_eq!(params.lookup("Owner"), &Value::Missing);

        let tags = params.lookup("Tags").as_list().unwrap();
        assert_eq!(tags.len(), 2);
        let second = tags[1].as_record().unwrap();
        assert_eq!(second.lookup("ID"), &Value::Integer(6));
        assert_eq!(second.lookup("Value"), &Value::from("JIRA:EPLT"));
    }

    #[test]
    fn test_numbers_are_not_converted() {
        let params = from_json(&json!({"count": 5, "ratio": 0.25, "big": i64::MAX})).unwrap();

        assert_eq!(params.lookup("count"), &Value::Integer(5));
        assert_eq!(params.lookup("ratio"), &Value::Float(0.25));
        assert_eq!(params.lookup("big"), &Value::Integer(i64::MAX));
    }

    #[test]
    fn test_empty_sequence() {
        let params = from_json(&json!({"Tags": []})).unwrap();
        assert_eq!(params.lookup("Tags"), &Value::List(vec![]));
    }

    #[test]
    fn test_unsupported_shapes() {
        let err = from_json(&json!({"Tags": ["a", "b"]})).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::UnsupportedRecordShape {
                field: "Tags[0]".to_string(),
                reason: "sequence elements must be records, found string".to_string(),
            }
        );

        let err = from_json(&json!({"Owner": {"Name": "x"}})).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::UnsupportedRecordShape { ref field, .. } if field == "Owner"
        ));

        let err = from_json(&json!({"Segments": [{"Meta": {"a": 1}}]})).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::UnsupportedRecordShape { ref field, .. } if field == "Segments[0].Meta"
        ));

        let err = from_json(&json!({"n": u64::MAX})).unwrap_err();
        assert!(matches!(err, ExpressionError::UnsupportedRecordShape { .. }));

        let err = extract(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::UnsupportedRecordShape { ref field, .. } if field == ROOT
        ));
    }

    #[test]
    fn test_map_records() {
        let mut record = BTreeMap::new();
        record.insert("tag", "JIRA:EPLT");

        let params = extract(&record).unwrap();
        assert_eq!(params.lookup("tag"), &Value::from("JIRA:EPLT"));
    }

    #[test]
    fn test_record_trait_impls() {
        let json = json!({"ID": 1});
        assert_eq!(
            json.to_parameters().unwrap(),
            ParameterMapping::new().with("ID", 1)
        );

        let params = ParameterMapping::new().with("ID", 1);
        assert_eq!(params.to_parameters().unwrap(), params);

        let map = json.as_object().unwrap();
        assert_eq!(map.to_parameters().unwrap(), params);
    }
}
