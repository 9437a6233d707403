use serde::{Deserialize, Serialize};

use super::layer_tree::LayerTreeNode;
use super::metadata::{Legal, Theme};

/// An application document in the shape the target system accepts on `POST applications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetApplication {
    pub name: String,
    pub layer_tree: LayerTreeNode,
    pub client_config: ApplicationClientConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationClientConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_view: Option<MapView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal: Option<Legal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

/// The initial view of an application's map.
///
/// When the view was reprojected to geographic coordinates, `center` and `map_extent` hold
/// (northing, easting) pairs. Otherwise they keep the source (easting, northing) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub center: [f64; 2],
    pub map_extent: [f64; 4],
    pub projection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<i64>,
    pub resolutions: Vec<f64>,
}
