use serde::{Deserialize, Serialize};

/// A folder or leaf of a target application's layer tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerTreeNode {
    pub checked: Option<bool>,
    pub title: Option<String>,
    /// Absent for folders. `Some(None)` marks a leaf whose layer was not migrated and is written
    /// out as an explicit `null`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "explicit_null"
    )]
    pub layer_id: Option<Option<i64>>,
    /// Absent when the source node had no children list, which is different from an empty one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<LayerTreeNode>>,
}

/// Keeps `"layerId": null` distinguishable from a missing `layerId` when reading documents back.
mod explicit_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S: Serializer>(
        value: &Option<Option<i64>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<i64>>, D::Error> {
        Option::<i64>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::error::Result;

    use super::LayerTreeNode;

    #[test]
    fn unresolved_layer_is_explicit_null() -> Result<()> {
        let node = LayerTreeNode {
            checked: Some(true),
            title: Some("roads".to_string()),
            layer_id: Some(None),
            children: None,
        };
        assert_eq!(
            serde_json::to_value(&node)?,
            json!({"checked": true, "title": "roads", "layerId": null})
        );
        let back: LayerTreeNode = serde_json::from_value(serde_json::to_value(&node)?)?;
        assert_eq!(back, node);
        Ok(())
    }

    #[test]
    fn folder_has_no_layer_id() -> Result<()> {
        let node: LayerTreeNode =
            serde_json::from_value(json!({"checked": false, "title": "root", "children": []}))?;
        assert_eq!(node.layer_id, None);
        assert_eq!(node.children, Some(vec![]));
        Ok(())
    }
}
