use serde_json::Value;
use tracing::{info, warn};

use crate::conf::MapViewMode;
use crate::error::{MigrationError, Result};
use crate::model::{
    ApplicationClientConfig, IdentifierMap, Legal, MapView, Point, TargetApplication, Theme,
};

use super::fields::{as_i64, RecordReader};
use super::layer_tree::{walk_tree, MAX_TREE_DEPTH};
use super::reproject::{normalize_projection, Reprojector, GEOGRAPHIC_CRS};

/// Module type tag of the map component in the legacy viewport tree.
pub const MAP_MODULE_XTYPE: &str = "shogun-component-map";

const SUB_MODULES: &str = "subModules";

/// Settings shared by every application of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationOptions {
    pub map_view_mode: MapViewMode,
    pub legal: Option<Legal>,
    pub theme: Option<Theme>,
}

/// Converts one legacy application document.
pub fn transform_application(
    source: &Value,
    id_map: &IdentifierMap,
    options: &ApplicationOptions,
) -> Result<TargetApplication> {
    let name = source
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| MigrationError::malformed("<unnamed application>", "name"))?;
    let reader = RecordReader::new(name);
    info!("Migrating application {name}");

    let map_view = match source.get("viewport") {
        Some(viewport) => match find_map_module(viewport, "viewport", 0) {
            Some((path, module)) => Some(build_map_view(
                module,
                &reader.at(&path),
                options.map_view_mode,
            )?),
            None => {
                info!("Application {name} has no map module, migrating without a map view");
                None
            }
        },
        None => None,
    };

    let layer_tree = walk_tree(
        reader.require(source, "layerTree")?,
        id_map,
        &reader.at("layerTree"),
    )?;

    Ok(TargetApplication {
        name: name.to_string(),
        layer_tree,
        client_config: ApplicationClientConfig {
            map_view,
            legal: options.legal.as_ref().and_then(Legal::non_empty),
            theme: options.theme.clone(),
        },
    })
}

/// Pre-order search of the module tree for the first map component. Returns the module together
/// with its path from the application root.
pub fn find_map_module<'v>(
    node: &'v Value,
    path: &str,
    depth: usize,
) -> Option<(String, &'v Value)> {
    if depth > MAX_TREE_DEPTH {
        warn!("Module tree below {path} is nested too deeply, not searching further");
        return None;
    }
    if node.get("xtype").and_then(Value::as_str) == Some(MAP_MODULE_XTYPE) {
        return Some((path.to_string(), node));
    }
    node.get(SUB_MODULES)
        .and_then(Value::as_array)?
        .iter()
        .enumerate()
        .find_map(|(i, sub)| find_map_module(sub, &format!("{path}.{SUB_MODULES}.{i}"), depth + 1))
}

fn build_map_view(module: &Value, reader: &RecordReader, mode: MapViewMode) -> Result<MapView> {
    let config = reader.require(module, "mapConfig")?;
    let reader = reader.at("mapConfig");

    let center = match reader.require(config, "center")? {
        Value::Array(_) => Point::new(
            reader.require_f64(config, "center.0")?,
            reader.require_f64(config, "center.1")?,
        ),
        _ => Point::new(
            reader.require_f64(config, "center.x")?,
            reader.require_f64(config, "center.y")?,
        ),
    };
    let lower_left = Point::new(
        reader.require_f64(config, "extent.lowerLeft.x")?,
        reader.require_f64(config, "extent.lowerLeft.y")?,
    );
    let upper_right = Point::new(
        reader.require_f64(config, "extent.upperRight.x")?,
        reader.require_f64(config, "extent.upperRight.y")?,
    );
    let projection = normalize_projection(reader.require(config, "projection")?)
        .ok_or_else(|| reader.malformed("projection"))?;
    let resolutions = reader.require_f64_list(config, "resolutions")?;
    let zoom = reader.get(config, "zoom").and_then(as_i64);

    let (center, map_extent) = match mode {
        MapViewMode::Passthrough => (
            [center.x, center.y],
            [lower_left.x, lower_left.y, upper_right.x, upper_right.y],
        ),
        MapViewMode::Reproject => {
            let reprojector = Reprojector::new(&projection, GEOGRAPHIC_CRS)?;
            let center = reprojector.reproject(center)?;
            let (lower_left, upper_right) = reprojector.reproject_extent(lower_left, upper_right)?;
            (
                [center.y, center.x],
                [lower_left.y, lower_left.x, upper_right.y, upper_right.x],
            )
        }
    };

    Ok(MapView {
        center,
        map_extent,
        projection,
        zoom,
        resolutions,
    })
}
