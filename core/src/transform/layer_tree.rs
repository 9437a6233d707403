use serde_json::Value;
use tracing::warn;

use crate::error::{MigrationError, Result};
use crate::model::{IdentifierMap, LayerTreeNode};

use super::fields::{as_i64, RecordReader};

/// Nesting limit for layer trees and module trees. Real documents stay far below it, anything
/// deeper is treated as malformed input.
pub const MAX_TREE_DEPTH: usize = 64;

const CHILDREN: &str = "children";

/// Converts a legacy layer tree, replacing every layer reference with the id the layer received
/// in the target system.
pub fn walk(node: &Value, id_map: &IdentifierMap) -> Result<LayerTreeNode> {
    walk_tree(node, id_map, &RecordReader::new("layerTree"))
}

pub(crate) fn walk_tree(
    node: &Value,
    id_map: &IdentifierMap,
    reader: &RecordReader,
) -> Result<LayerTreeNode> {
    walk_node(node, id_map, reader, 0)
}

fn walk_node(
    node: &Value,
    id_map: &IdentifierMap,
    reader: &RecordReader,
    depth: usize,
) -> Result<LayerTreeNode> {
    if depth > MAX_TREE_DEPTH {
        return Err(too_deep(reader));
    }
    if !node.is_object() {
        return Err(reader.malformed(""));
    }
    let title = reader.optional_str(node, "text").map(str::to_string);

    let layer_id = match node.get("layer") {
        Some(layer) => {
            let source_id = layer_reference(layer, reader)?;
            Some(source_id.and_then(|id| resolve(id, id_map, title.as_deref(), reader)))
        }
        None => None,
    };

    let children = match node.get(CHILDREN) {
        Some(Value::Array(children)) => Some(
            children
                .iter()
                .enumerate()
                .map(|(i, child)| {
                    walk_node(child, id_map, &reader.at(&format!("{CHILDREN}.{i}")), depth + 1)
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Some(Value::Null) | None => None,
        Some(_) => return Err(reader.malformed(CHILDREN)),
    };

    Ok(LayerTreeNode {
        checked: node.get("checked").and_then(Value::as_bool),
        title,
        layer_id,
        children,
    })
}

/// The legacy format references layers either by bare id or by an embedded layer object.
fn layer_reference(layer: &Value, reader: &RecordReader) -> Result<Option<i64>> {
    match layer {
        Value::Null => Ok(None),
        Value::Object(_) => reader.at("layer").require_i64(layer, "id").map(Some),
        other => as_i64(other).map(Some).ok_or_else(|| reader.malformed("layer")),
    }
}

fn resolve(
    source_id: i64,
    id_map: &IdentifierMap,
    title: Option<&str>,
    reader: &RecordReader,
) -> Option<i64> {
    let resolved = id_map.resolve(source_id);
    if resolved.is_none() {
        warn!(
            "Application {}: layer {source_id} referenced by tree node {} was not migrated, writing a null reference",
            reader.record(),
            title.unwrap_or("<untitled>")
        );
    }
    resolved
}

/// Rewrites the `layerId` entries of a tree that is already in the target format.
pub fn remap_layer_ids(node: &mut Value, id_map: &IdentifierMap) -> Result<()> {
    remap_node(node, id_map, &RecordReader::new("layerTree"), 0)
}

pub(crate) fn remap_tree(
    node: &mut Value,
    id_map: &IdentifierMap,
    reader: &RecordReader,
) -> Result<()> {
    remap_node(node, id_map, reader, 0)
}

fn remap_node(
    node: &mut Value,
    id_map: &IdentifierMap,
    reader: &RecordReader,
    depth: usize,
) -> Result<()> {
    if depth > MAX_TREE_DEPTH {
        return Err(too_deep(reader));
    }
    let Some(object) = node.as_object_mut() else {
        return Err(reader.malformed(""));
    };
    let title = object
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Some(layer_id) = object.get_mut("layerId") {
        let resolved =
            as_i64(layer_id).and_then(|id| resolve(id, id_map, title.as_deref(), reader));
        *layer_id = resolved.map(Value::from).unwrap_or(Value::Null);
    }
    if let Some(Value::Array(children)) = object.get_mut(CHILDREN) {
        for (i, child) in children.iter_mut().enumerate() {
            remap_node(child, id_map, &reader.at(&format!("{CHILDREN}.{i}")), depth + 1)?;
        }
    }
    Ok(())
}

fn too_deep(reader: &RecordReader) -> MigrationError {
    MigrationError::malformed(
        reader.record(),
        format!(
            "{} (nested deeper than {MAX_TREE_DEPTH} levels)",
            reader.path("")
        ),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::error::{MigrationError, Result};
    use crate::model::IdentifierMap;

    use super::{remap_layer_ids, walk, MAX_TREE_DEPTH};

    fn id_map() -> IdentifierMap {
        vec![(5, 105), (7, 107)].into_iter().collect()
    }

    #[test]
    fn identifiers_are_substituted() -> Result<()> {
        let tree = json!({
            "checked": true,
            "text": "Roads",
            "layer": {"id": 7, "name": "roads"},
            "children": [
                {"checked": false, "text": "Bridges", "layer": 5}
            ]
        });
        let walked = walk(&tree, &id_map())?;
        assert_eq!(walked.layer_id, Some(Some(107)));
        let children = walked.children.expect("children expected");
        assert_eq!(children[0].layer_id, Some(Some(105)));
        assert_eq!(children[0].title.as_deref(), Some("Bridges"));
        Ok(())
    }

    #[test]
    fn leaf_without_children_has_no_children_field() -> Result<()> {
        let tree = json!({"checked": true, "text": "root", "children": [
            {"checked": true, "text": "leaf", "layer": 5},
            {"checked": true, "text": "empty folder", "children": []}
        ]});
        let json = serde_json::to_value(walk(&tree, &id_map())?)?;
        assert!(json["children"][0].get("children").is_none());
        assert_eq!(json["children"][1]["children"], json!([]));
        assert!(json.get("layerId").is_none());
        Ok(())
    }

    #[test]
    fn children_keep_their_order() -> Result<()> {
        let tree = json!({"text": "root", "children": [
            {"text": "c"}, {"text": "a"}, {"text": "b"}
        ]});
        let walked = walk(&tree, &IdentifierMap::new())?;
        let titles: Vec<_> = walked
            .children
            .expect("children expected")
            .into_iter()
            .map(|c| c.title.unwrap_or_default())
            .collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
        Ok(())
    }

    #[test]
    fn unmigrated_layer_becomes_null() -> Result<()> {
        let tree = json!({"checked": true, "text": "orphan", "layer": {"id": 99}});
        let json = serde_json::to_value(walk(&tree, &id_map())?)?;
        assert_eq!(json, json!({"checked": true, "title": "orphan", "layerId": null}));
        Ok(())
    }

    #[test]
    fn layer_object_without_id_is_malformed() {
        let tree = json!({"text": "root", "children": [{"text": "bad", "layer": {"name": "x"}}]});
        let err = walk(&tree, &id_map()).expect_err("layer id is required");
        assert!(matches!(
            err,
            MigrationError::MalformedRecord { path, .. } if path == "children.0.layer.id"
        ));
    }

    #[test]
    fn excessive_nesting_is_rejected() {
        let mut tree = json!({"text": "leaf"});
        for _ in 0..=MAX_TREE_DEPTH {
            tree = json!({"text": "folder", "children": [tree]});
        }
        let err = walk(&tree, &id_map()).expect_err("tree is too deep");
        assert!(matches!(err, MigrationError::MalformedRecord { .. }));
    }

    #[test]
    fn target_format_tree_is_remapped_in_place() -> Result<()> {
        let mut tree = json!({
            "title": "root",
            "checked": true,
            "children": [
                {"title": "a", "checked": true, "layerId": 7},
                {"title": "b", "checked": false, "layerId": 42}
            ]
        });
        remap_layer_ids(&mut tree, &id_map())?;
        assert_eq!(tree["children"][0]["layerId"], json!(107));
        assert_eq!(tree["children"][1]["layerId"], Value::Null);
        assert!(tree.get("layerId").is_none());
        Ok(())
    }
}
