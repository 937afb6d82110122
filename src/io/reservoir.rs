//! Reservoir record construction
//!
//! Normalizes GeoJSON features into `Reservoir` records. The same record
//! shape serves both ingestion paths: features parsed out of the
//! versioned shapefile set (download and parse handled by the hosting
//! environment) and features returned by the geometry API.

use crate::types::{Reservoir, ReservoirGeometry, WaterError, WaterResult};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, JsonObject, Value};

/// Convert a GeoJSON geometry into the closed reservoir geometry union
///
/// Only Polygon and MultiPolygon are representable; anything else is a
/// fault. Interior rings are dropped, matching the upstream product.
pub fn geometry_from_geojson(value: &Value) -> WaterResult<ReservoirGeometry> {
    match value {
        Value::Polygon(rings) => Ok(ReservoirGeometry::Polygon(polygon_from_rings(rings)?)),
        Value::MultiPolygon(polygons) => {
            let parts: Vec<Polygon<f64>> = polygons
                .iter()
                .map(|rings| polygon_from_rings(rings))
                .collect::<WaterResult<_>>()?;
            Ok(ReservoirGeometry::MultiPolygon(MultiPolygon(parts)))
        }
        other => Err(WaterError::Geometry(format!(
            "unsupported geometry type: {}",
            value_type_name(other)
        ))),
    }
}

/// Build one reservoir record from a GeoJSON feature
pub fn reservoir_from_feature(feature: &Feature) -> WaterResult<Reservoir> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| WaterError::Geometry("feature without geometry".to_string()))?;
    let geometry = geometry_from_geojson(&geometry.value)?;

    let properties = feature
        .properties
        .as_ref()
        .ok_or_else(|| WaterError::Geometry("feature without properties".to_string()))?;

    Ok(Reservoir {
        fid: required_int(properties, "fid")?,
        source_name: required_string(properties, "source_nam")?,
        source_id: optional_string(properties, "source_id"),
        name: optional_string(properties, "name"),
        name_en: optional_string(properties, "name_en"),
        grand_id: optional_int(properties, "grand_id"),
        geometry,
    })
}

/// Build reservoir records from a feature collection
pub fn reservoirs_from_features(collection: &FeatureCollection) -> WaterResult<Vec<Reservoir>> {
    collection.features.iter().map(reservoir_from_feature).collect()
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> WaterResult<Polygon<f64>> {
    let exterior = rings
        .first()
        .ok_or_else(|| WaterError::Geometry("polygon without rings".to_string()))?;
    let coords: Vec<Coord<f64>> = exterior
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(WaterError::Geometry(
                "position with fewer than 2 coordinates".to_string(),
            )),
        })
        .collect::<WaterResult<_>>()?;
    Ok(Polygon::new(LineString(coords), vec![]))
}

fn required_int(properties: &JsonObject, key: &str) -> WaterResult<i64> {
    properties
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| WaterError::Geometry(format!("missing integer property: {}", key)))
}

fn required_string(properties: &JsonObject, key: &str) -> WaterResult<String> {
    properties
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| WaterError::Geometry(format!("missing string property: {}", key)))
}

fn optional_string(properties: &JsonObject, key: &str) -> Option<String> {
    properties
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn optional_int(properties: &JsonObject, key: &str) -> Option<i64> {
    properties.get(key).and_then(|v| v.as_i64())
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
