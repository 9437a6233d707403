use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MigrationError, Result};

use super::PostProcessor;

fn split_path(path: &str) -> Result<(Vec<&str>, &str)> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments.pop().filter(|s| !s.is_empty()).ok_or_else(|| {
        MigrationError::Config(format!("Invalid field path '{path}' in post-processor"))
    })?;
    Ok((segments, last))
}

/// Walks to the object holding the last path segment, creating missing objects on the way when
/// `create` is set.
fn parent_object<'v>(
    document: &'v mut Value,
    segments: &[&str],
    create: bool,
) -> Option<&'v mut Map<String, Value>> {
    let mut current = document;
    for segment in segments {
        let object = current.as_object_mut()?;
        if create && !object.get(*segment).map(Value::is_object).unwrap_or(false) {
            object.insert(segment.to_string(), Value::Object(Map::new()));
        }
        current = object.get_mut(*segment)?;
    }
    current.as_object_mut()
}

/// Sets a field, replacing any existing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetField {
    pub path: String,
    pub value: Value,
}

impl PostProcessor for SetField {
    fn name(&self) -> &str {
        "SetField"
    }

    fn postprocess(&self, document: &mut Value) -> Result<()> {
        let (segments, last) = split_path(&self.path)?;
        let parent = parent_object(document, &segments, true).ok_or_else(|| {
            MigrationError::Internal(format!("Unable to set {}: not an object", self.path))
        })?;
        parent.insert(last.to_string(), self.value.clone());
        Ok(())
    }
}

/// Removes a field if it exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveField {
    pub path: String,
}

impl PostProcessor for RemoveField {
    fn name(&self) -> &str {
        "RemoveField"
    }

    fn postprocess(&self, document: &mut Value) -> Result<()> {
        let (segments, last) = split_path(&self.path)?;
        if let Some(parent) = parent_object(document, &segments, false) {
            parent.remove(last);
        }
        Ok(())
    }
}

/// Renames a field within its parent object, keeping the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameField {
    pub path: String,
    pub to: String,
}

impl PostProcessor for RenameField {
    fn name(&self) -> &str {
        "RenameField"
    }

    fn postprocess(&self, document: &mut Value) -> Result<()> {
        let (segments, last) = split_path(&self.path)?;
        if let Some(parent) = parent_object(document, &segments, false) {
            if let Some(value) = parent.remove(last) {
                parent.insert(self.to.clone(), value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::error::Result;
    use crate::postprocess::PostProcessor;

    use super::{RemoveField, RenameField, SetField};

    #[test]
    fn set_creates_intermediate_objects() -> Result<()> {
        let mut doc = json!({"name": "roads"});
        SetField {
            path: "clientConfig.opacity".to_string(),
            value: json!(0.8),
        }
        .postprocess(&mut doc)?;
        assert_eq!(doc, json!({"name": "roads", "clientConfig": {"opacity": 0.8}}));
        Ok(())
    }

    #[test]
    fn remove_missing_field_is_a_no_op() -> Result<()> {
        let mut doc = json!({"sourceConfig": {"url": "http://a"}});
        RemoveField {
            path: "clientConfig.searchable".to_string(),
        }
        .postprocess(&mut doc)?;
        RemoveField {
            path: "sourceConfig.url".to_string(),
        }
        .postprocess(&mut doc)?;
        assert_eq!(doc, json!({"sourceConfig": {}}));
        Ok(())
    }

    #[test]
    fn rename_keeps_value() -> Result<()> {
        let mut doc = json!({"clientConfig": {"mapView": {"mapExtent": [0, 0, 1, 1]}}});
        RenameField {
            path: "clientConfig.mapView.mapExtent".to_string(),
            to: "extent".to_string(),
        }
        .postprocess(&mut doc)?;
        assert_eq!(doc, json!({"clientConfig": {"mapView": {"extent": [0, 0, 1, 1]}}}));
        Ok(())
    }

    #[test]
    fn empty_path_is_rejected() {
        let mut doc = json!({});
        let err = SetField {
            path: "".to_string(),
            value: json!(1),
        }
        .postprocess(&mut doc)
        .expect_err("empty path");
        assert!(err.is_fatal());
    }
}
