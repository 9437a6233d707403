use serde_json::Value;

use crate::error::{MigrationError, Result};

/// Read access to a source document which reports missing or unusable fields with the name of
/// the record and the dotted path from the record root, e.g. `viewport.subModules.0.mapConfig`.
#[derive(Debug, Clone)]
pub(crate) struct RecordReader<'r> {
    record: &'r str,
    prefix: String,
}

impl<'r> RecordReader<'r> {
    pub(crate) fn new(record: &'r str) -> Self {
        Self {
            record,
            prefix: String::new(),
        }
    }

    pub(crate) fn record(&self) -> &str {
        self.record
    }

    /// A reader for a nested node whose errors are reported relative to the same record root.
    pub(crate) fn at(&self, path: &str) -> RecordReader<'r> {
        RecordReader {
            record: self.record,
            prefix: self.path(path),
        }
    }

    pub(crate) fn path(&self, path: &str) -> String {
        match (self.prefix.is_empty(), path.is_empty()) {
            (true, _) => path.to_string(),
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}.{path}", self.prefix),
        }
    }

    pub(crate) fn malformed(&self, path: &str) -> MigrationError {
        MigrationError::malformed(self.record, self.path(path))
    }

    /// Returns the value at `path` unless it is missing or `null`.
    pub(crate) fn get<'v>(&self, node: &'v Value, path: &str) -> Option<&'v Value> {
        lookup(node, path).filter(|v| !v.is_null())
    }

    pub(crate) fn require<'v>(&self, node: &'v Value, path: &str) -> Result<&'v Value> {
        self.get(node, path).ok_or_else(|| self.malformed(path))
    }

    pub(crate) fn require_str<'v>(&self, node: &'v Value, path: &str) -> Result<&'v str> {
        self.require(node, path)?
            .as_str()
            .ok_or_else(|| self.malformed(path))
    }

    pub(crate) fn require_f64(&self, node: &Value, path: &str) -> Result<f64> {
        as_f64(self.require(node, path)?).ok_or_else(|| self.malformed(path))
    }

    pub(crate) fn require_i64(&self, node: &Value, path: &str) -> Result<i64> {
        as_i64(self.require(node, path)?).ok_or_else(|| self.malformed(path))
    }

    pub(crate) fn require_array<'v>(&self, node: &'v Value, path: &str) -> Result<&'v Vec<Value>> {
        self.require(node, path)?
            .as_array()
            .ok_or_else(|| self.malformed(path))
    }

    /// Coerces every element of the array at `path` to a float.
    pub(crate) fn require_f64_list(&self, node: &Value, path: &str) -> Result<Vec<f64>> {
        self.require_array(node, path)?
            .iter()
            .enumerate()
            .map(|(i, v)| as_f64(v).ok_or_else(|| self.malformed(&format!("{path}.{i}"))))
            .collect()
    }

    pub(crate) fn optional_str<'v>(&self, node: &'v Value, path: &str) -> Option<&'v str> {
        self.get(node, path).and_then(Value::as_str)
    }
}

/// Follows a dotted path through objects and, for numeric segments, arrays.
pub(crate) fn lookup<'v>(node: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(node);
    }
    path.split('.')
        .try_fold(node, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Numbers as they are, numeric strings parsed.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A label for log lines: the record name, followed by its id when it has one.
pub fn describe_record(node: &Value) -> String {
    let name = node
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>");
    match node.get("id").and_then(as_i64) {
        Some(id) => format!("{name} (id {id})"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::error::{MigrationError, Result};

    use super::{as_i64, describe_record, lookup, RecordReader};

    #[test]
    fn lookup_descends_into_arrays() {
        let doc = json!({"a": {"b": [{"c": 1}, {"c": 2}]}});
        assert_eq!(lookup(&doc, "a.b.1.c"), Some(&json!(2)));
        assert_eq!(lookup(&doc, "a.b.2.c"), None);
        assert_eq!(lookup(&doc, "a.x"), None);
    }

    #[test]
    fn missing_field_reports_full_path() {
        let doc = json!({"mapConfig": {"center": {"x": 1.0}}});
        let reader = RecordReader::new("My App").at("viewport.subModules.0");
        let err = reader
            .require_f64(&doc, "mapConfig.center.y")
            .expect_err("y is missing");
        match err {
            MigrationError::MalformedRecord { record, path } => {
                assert_eq!(record, "My App");
                assert_eq!(path, "viewport.subModules.0.mapConfig.center.y");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn null_counts_as_missing() {
        let doc = json!({"zoom": null});
        assert!(RecordReader::new("r").get(&doc, "zoom").is_none());
    }

    #[test]
    fn numeric_strings_coerce() -> Result<()> {
        let doc = json!({"resolutions": ["1.5", 2, 3.25]});
        assert_eq!(
            RecordReader::new("r").require_f64_list(&doc, "resolutions")?,
            vec![1.5, 2.0, 3.25]
        );
        Ok(())
    }

    #[test]
    fn fractional_ids_are_not_integers() {
        assert_eq!(as_i64(&json!(5.0)), Some(5));
        assert_eq!(as_i64(&json!("7")), Some(7));
        assert_eq!(as_i64(&json!(5.7)), None);
        let err = RecordReader::new("r")
            .require_i64(&json!({"layer": {"id": 5.7}}), "layer.id")
            .expect_err("5.7 is not a layer id");
        assert!(matches!(err, MigrationError::MalformedRecord { path, .. } if path == "layer.id"));
    }

    #[test]
    fn record_description() {
        assert_eq!(describe_record(&json!({"name": "roads", "id": 4})), "roads (id 4)");
        assert_eq!(describe_record(&json!({"id": 4})), "<unnamed> (id 4)");
    }
}
