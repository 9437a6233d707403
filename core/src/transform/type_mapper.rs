use tracing::warn;

use crate::model::LayerType;

/// Maps a legacy `source.type` tag to the target layer type. Unknown tags are logged and yield
/// `None`, which callers treat as "skip this layer".
pub fn map_type(source_type: &str) -> Option<LayerType> {
    match LayerType::from_source_type(source_type) {
        Ok(layer_type) => Some(layer_type),
        Err(e) => {
            warn!("{e}.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::LayerType;

    use super::map_type;

    #[test]
    fn known_types() {
        let expected = [
            ("TileWMS", LayerType::TileWms),
            ("OSMVectortile", LayerType::VectorTile),
            ("ImageWMS", LayerType::Wms),
            ("WMSTime", LayerType::Wms),
            ("WMTS", LayerType::Wmts),
            ("WFS", LayerType::Wfs),
            ("XYZ", LayerType::Xyz),
        ];
        for (source, target) in expected {
            assert_eq!(map_type(source), Some(target), "{source}");
        }
    }

    #[test]
    fn unknown_types_are_dropped() {
        assert_eq!(map_type("GoogleMaps"), None);
        assert_eq!(map_type(""), None);
    }
}
