use proj4rs::Proj;
use serde_json::Value;
use tracing::debug;

use crate::error::{MigrationError, Result};
use crate::model::Point;

pub const EPSG_PREFIX: &str = "EPSG:";

/// The geographic reference map views are reprojected to.
pub const GEOGRAPHIC_CRS: &str = "EPSG:4326";

/// Brings a projection given as a bare code (`25832`, `"25832"`) or an authority string
/// (`"EPSG:25832"`) to the `EPSG:<code>` form.
pub fn normalize_projection(value: &Value) -> Option<String> {
    let code = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if code.is_empty() {
        return None;
    }
    if code.starts_with(EPSG_PREFIX) {
        Some(code)
    } else {
        Some(format!("{EPSG_PREFIX}{code}"))
    }
}

/// Looks up the definition of an `EPSG:<code>` identifier.
fn resolve_crs(code: &str) -> Result<Proj> {
    let numeric = code
        .strip_prefix(EPSG_PREFIX)
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| {
            MigrationError::Projection(format!("Unsupported coordinate reference system {code}"))
        })?;
    let definition = crs_definitions::from_code(numeric).ok_or_else(|| {
        MigrationError::Projection(format!("Unknown coordinate reference system {code}"))
    })?;
    Ok(Proj::from_proj_string(definition.proj4)?)
}

/// A transform between two coordinate reference systems, resolved once and reused for every
/// coordinate of a document.
pub struct Reprojector {
    source_code: String,
    target_code: String,
    /// `None` when source and target are the same system.
    transform: Option<(Proj, Proj)>,
}

impl Reprojector {
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let transform = if source == target {
            None
        } else {
            Some((resolve_crs(source)?, resolve_crs(target)?))
        };
        debug!("Resolved transform from {source} to {target}");
        Ok(Self {
            source_code: source.to_string(),
            target_code: target.to_string(),
            transform,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.transform.is_none()
    }

    /// Transforms a point given in (easting, northing) or (longitude, latitude) order and
    /// returns it in the same axis order of the target system.
    pub fn reproject(&self, point: Point) -> Result<Point> {
        let (source, target) = match &self.transform {
            Some(t) => t,
            None => return Ok(point),
        };
        let mut coords = (point.x, point.y, 0.0);
        if source.is_latlong() {
            coords.0 = coords.0.to_radians();
            coords.1 = coords.1.to_radians();
        }
        proj4rs::transform::transform(source, target, &mut coords).map_err(|e| {
            MigrationError::Projection(format!(
                "Unable to transform ({}, {}) from {} to {}: {e}",
                point.x, point.y, self.source_code, self.target_code
            ))
        })?;
        if target.is_latlong() {
            coords.0 = coords.0.to_degrees();
            coords.1 = coords.1.to_degrees();
        }
        if !coords.0.is_finite() || !coords.1.is_finite() {
            return Err(MigrationError::Projection(format!(
                "({}, {}) has no finite image in {}",
                point.x, point.y, self.target_code
            )));
        }
        Ok(Point::new(coords.0, coords.1))
    }

    pub fn reproject_extent(&self, lower_left: Point, upper_right: Point) -> Result<(Point, Point)> {
        Ok((self.reproject(lower_left)?, self.reproject(upper_right)?))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::error::{MigrationError, Result};
    use crate::model::Point;

    use super::{normalize_projection, Reprojector, GEOGRAPHIC_CRS};

    const TOLERANCE: f64 = 1e-6;

    fn assert_close(actual: Point, expected: Point) {
        assert!(
            (actual.x - expected.x).abs() < TOLERANCE && (actual.y - expected.y).abs() < TOLERANCE,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn projection_codes_normalize() {
        assert_eq!(normalize_projection(&json!("4326")).as_deref(), Some("EPSG:4326"));
        assert_eq!(normalize_projection(&json!("EPSG:4326")).as_deref(), Some("EPSG:4326"));
        assert_eq!(normalize_projection(&json!(25832)).as_deref(), Some("EPSG:25832"));
        assert_eq!(normalize_projection(&json!("")), None);
        assert_eq!(normalize_projection(&json!(null)), None);
    }

    #[test]
    fn identical_systems_are_a_no_op() -> Result<()> {
        let reprojector = Reprojector::new("EPSG:25832", "EPSG:25832")?;
        assert!(reprojector.is_identity());
        let p = Point::new(100.0, 200.0);
        assert_eq!(reprojector.reproject(p)?, p);
        Ok(())
    }

    #[test]
    fn web_mercator_to_geographic() -> Result<()> {
        let reprojector = Reprojector::new("EPSG:3857", GEOGRAPHIC_CRS)?;
        assert_close(reprojector.reproject(Point::new(0.0, 0.0))?, Point::new(0.0, 0.0));
        assert_close(
            reprojector.reproject(Point::new(1_113_194.907_932_735_7, 0.0))?,
            Point::new(10.0, 0.0),
        );
        Ok(())
    }

    #[test]
    fn utm_central_meridian_on_equator() -> Result<()> {
        let reprojector = Reprojector::new("EPSG:25832", GEOGRAPHIC_CRS)?;
        let (ll, ur) =
            reprojector.reproject_extent(Point::new(500_000.0, 0.0), Point::new(500_000.0, 0.0))?;
        assert_close(ll, Point::new(9.0, 0.0));
        assert_close(ur, Point::new(9.0, 0.0));
        Ok(())
    }

    #[test]
    fn unknown_code_is_projection_error() {
        for code in ["EPSG:1", "EPSG:99999999", "CRS:84"] {
            match Reprojector::new(code, GEOGRAPHIC_CRS) {
                Err(MigrationError::Projection(_)) => (),
                Err(other) => panic!("unexpected error for {code}: {other}"),
                Ok(_) => panic!("{code} should not resolve"),
            }
        }
    }
}
