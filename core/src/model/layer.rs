use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MigrationError, Result};

/// Layer types understood by the target system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayerType {
    TileWms,
    VectorTile,
    Wms,
    Wmts,
    Wfs,
    Xyz,
}

impl LayerType {
    /// Resolves the `source.type` tag of a legacy layer. The match is case sensitive.
    pub fn from_source_type(source_type: &str) -> Result<Self> {
        match source_type {
            "TileWMS" => Ok(Self::TileWms),
            "OSMVectortile" => Ok(Self::VectorTile),
            "ImageWMS" | "WMSTime" => Ok(Self::Wms),
            "WMTS" => Ok(Self::Wmts),
            "WFS" => Ok(Self::Wfs),
            "XYZ" => Ok(Self::Xyz),
            unknown => Err(MigrationError::UnrecognizedType(unknown.to_string())),
        }
    }
}

/// A layer document in the shape the target system accepts on `POST layers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetLayer {
    pub name: String,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    pub client_config: LayerClientConfig,
    pub source_config: LayerSourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerClientConfig {
    /// Copied as found in the source appearance, which stores either numbers or strings.
    pub min_resolution: Value,
    pub max_resolution: Value,
    pub hoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_info_form_config: Option<Vec<FeatureInfoForm>>,
    pub searchable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_config: Option<SearchConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    pub display_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub attributes: Vec<String>,
}

/// A feature info form section titled with the layer name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureInfoForm {
    pub title: String,
    pub children: Vec<FeatureInfoField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureInfoField {
    pub property_name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSourceConfig {
    pub attribution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_url: Option<String>,
    pub url: String,
    pub layer_names: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_origin: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolutions: Option<Vec<f64>>,
}
