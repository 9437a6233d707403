use itertools::Itertools;
use serde_json::Value;
use tracing::{info, warn};

use crate::conf::UrlRewriteRules;
use crate::error::Result;
use crate::model::layer::{
    FeatureInfoField, FeatureInfoForm, LayerClientConfig, LayerSourceConfig, SearchConfig,
};
use crate::model::TargetLayer;

use super::fields::{describe_record, RecordReader};
use super::type_mapper::map_type;

/// Service endpoint used for layers whose URL is not an absolute http(s) URL after rewriting.
/// Keeps such layers working against the map server that ships with the target system.
pub const DEFAULT_SERVICE_URL: &str = "/geoserver/ows";

/// Converts one legacy layer document. Returns `Ok(None)` for layers without a type or with a type
/// the target system does not support.
pub fn transform_layer(source: &Value, rules: &UrlRewriteRules) -> Result<Option<TargetLayer>> {
    let label = describe_record(source);
    let reader = RecordReader::new(&label);
    let name = reader.require_str(source, "name")?;
    reader.require(source, "source")?;

    let Some(source_type) = reader.optional_str(source, "source.type") else {
        warn!("Layer {label} doesn't have a type set.");
        return Ok(None);
    };
    let Some(layer_type) = map_type(source_type) else {
        info!("Skipping layer {label}");
        return Ok(None);
    };

    Ok(Some(TargetLayer {
        name: name.to_string(),
        layer_type,
        client_config: client_config(source, name, &reader)?,
        source_config: source_config(source, rules, &reader)?,
    }))
}

fn client_config(source: &Value, name: &str, reader: &RecordReader) -> Result<LayerClientConfig> {
    let appearance = reader.require(source, "appearance")?;
    let searchable = source
        .get("searchable")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let search_config = if searchable {
        Some(search_config(source, &reader.at("searchConfig"))?)
    } else {
        None
    };
    Ok(LayerClientConfig {
        min_resolution: appearance.get("minResolution").cloned().unwrap_or(Value::Null),
        max_resolution: appearance.get("maxResolution").cloned().unwrap_or(Value::Null),
        hoverable: appearance
            .get("hoverable")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        feature_info_form_config: feature_info_form(source, name),
        searchable,
        search_config,
    })
}

fn search_config(source: &Value, reader: &RecordReader) -> Result<SearchConfig> {
    let config = source.get("searchConfig").unwrap_or(&Value::Null);
    let attributes = reader
        .require_array(config, "attributes")?
        .iter()
        .enumerate()
        .map(|(i, attribute)| {
            attribute
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| reader.malformed(&format!("attributes.{i}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SearchConfig {
        display_template: reader.require_str(config, "displayTemplate")?.to_string(),
        icon: reader.optional_str(config, "icon").map(str::to_string),
        attributes,
    })
}

/// Turns the property alias table into a single form section. The field list is written in the
/// reverse of the table's key order, which existing clients of the target system rely on.
fn feature_info_form(source: &Value, name: &str) -> Option<Vec<FeatureInfoForm>> {
    let aliases = source
        .get("columnAliasesDe")
        .and_then(Value::as_object)
        .filter(|aliases| !aliases.is_empty())?;
    let children = aliases
        .iter()
        .rev()
        .map(|(property, display)| FeatureInfoField {
            property_name: property.clone(),
            display_name: match display {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
        .collect_vec();
    Some(vec![FeatureInfoForm {
        title: name.to_string(),
        children,
    }])
}

fn source_config(
    source: &Value,
    rules: &UrlRewriteRules,
    reader: &RecordReader,
) -> Result<LayerSourceConfig> {
    let url = rules.rewrite(reader.optional_str(source, "source.url").unwrap_or_default());
    let url = if url.starts_with("http") {
        url.to_string()
    } else {
        DEFAULT_SERVICE_URL.to_string()
    };

    let layer_names = reader
        .optional_str(source, "source.layerNames")
        .or_else(|| reader.optional_str(source, "source.wmtsLayer"))
        .unwrap_or_default()
        .to_string();

    let mut config = LayerSourceConfig {
        attribution: reader
            .optional_str(source, "appearance.attribution")
            .map(str::to_string),
        legend_url: reader.get(source, "legendUrl").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        url,
        layer_names,
        tile_size: None,
        tile_origin: None,
        resolutions: None,
    };

    if let Some(tile_grid) = reader.get(source, "source.tileGrid") {
        let grid = reader.at("source.tileGrid");
        config.tile_size = Some(grid.require_i64(tile_grid, "tileSize")?);
        config.tile_origin = Some([
            grid.require_f64(tile_grid, "tileGridOrigin.x")?,
            grid.require_f64(tile_grid, "tileGridOrigin.y")?,
        ]);
        config.resolutions = Some(grid.require_f64_list(tile_grid, "tileGridResolutions")?);
    }
    Ok(config)
}
