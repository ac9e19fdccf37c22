//! GeoJSON feature collections of polygons.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::crs::Crs;
use crate::geom::{Attributes, FeatureCollection};
use crate::io::fs::write_atomic;

/// Read a GeoJSON file of `Polygon` / `MultiPolygon` features.
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("[io::geojson] Failed to read {}", path.display()))?;
    let features = parse_feature_collection(&bytes)
        .with_context(|| format!("[io::geojson] Invalid GeoJSON in {}", path.display()))?;
    debug!(path = %path.display(), features = features.len(), "read feature collection");
    Ok(features)
}

/// Parse GeoJSON bytes. Features with other geometry types are skipped; a missing `crs`
/// member means WGS84 lon/lat, while one that cannot be resolved leaves the CRS unset.
pub fn parse_feature_collection(bytes: &[u8]) -> Result<FeatureCollection> {
    let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON bytes")?;
    if value["type"].as_str() != Some("FeatureCollection") {
        bail!("expected a FeatureCollection, found {}", value["type"]);
    }

    let crs = match value.get("crs") {
        None | Some(Value::Null) => Some(Crs::wgs84()),
        Some(member) => parse_crs_member(member),
    };

    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("FeatureCollection has no features array"))?;

    let mut shapes = Vec::with_capacity(features.len());
    let mut attributes = Vec::with_capacity(features.len());
    let mut skipped = 0;
    for (idx, feature) in features.iter().enumerate() {
        let geometry = &feature["geometry"];
        let shape = match geometry["type"].as_str() {
            Some("Polygon") => MultiPolygon(vec![parse_polygon(&geometry["coordinates"])
                .with_context(|| format!("feature {idx}"))?]),
            Some("MultiPolygon") => parse_multipolygon(&geometry["coordinates"])
                .with_context(|| format!("feature {idx}"))?,
            other => {
                debug!(feature = idx, kind = ?other, "skipping non-polygon feature");
                skipped += 1;
                continue;
            }
        };
        let properties = match &feature["properties"] {
            Value::Object(map) => map.clone(),
            _ => Attributes::new(),
        };
        shapes.push(shape);
        attributes.push(properties);
    }
    if skipped > 0 {
        warn!(skipped, "skipped features without polygon geometry");
    }

    Ok(FeatureCollection::with_attributes(shapes, attributes, crs)?)
}

fn parse_crs_member(member: &Value) -> Option<Crs> {
    let Some(name) = member["properties"]["name"].as_str() else {
        warn!(crs = %member, "unrecognised crs member; CRS left unset");
        return None;
    };
    match Crs::parse(name) {
        Ok(crs) => Some(crs),
        Err(e) => {
            warn!(name, error = %e, "cannot resolve crs member; CRS left unset");
            None
        }
    }
}

fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let positions = value.as_array().ok_or_else(|| anyhow!("ring is not an array"))?;
    let coords = positions.iter()
        .map(|position| match position.as_array().map(Vec::as_slice) {
            Some([x, y, ..]) => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(anyhow!("non-numeric position {position}")),
            },
            _ => Err(anyhow!("invalid position {position}")),
        })
        .collect::<Result<Vec<_>>>()?;
    if coords.len() < 3 {
        bail!("ring has {} positions, need at least 3", coords.len());
    }
    Ok(LineString::new(coords))
}

/// `[exterior, hole, hole, ...]`; `Polygon::new` closes open rings.
fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value.as_array().ok_or_else(|| anyhow!("polygon coordinates are not an array"))?;
    let (exterior, interiors) = rings.split_first()
        .ok_or_else(|| anyhow!("polygon has no exterior ring"))?;
    let interiors = interiors.iter().map(parse_ring).collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(parse_ring(exterior)?, interiors))
}

fn parse_multipolygon(value: &Value) -> Result<MultiPolygon<f64>> {
    let polygons = value.as_array().ok_or_else(|| anyhow!("multipolygon coordinates are not an array"))?;
    Ok(MultiPolygon(polygons.iter().map(parse_polygon).collect::<Result<Vec<_>>>()?))
}

fn ring_json(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

/// GeoJSON value of a collection: one `MultiPolygon` feature per member with its attributes,
/// plus the `crs` member when the CRS is known.
pub fn to_geojson_value(features: &FeatureCollection) -> Value {
    let members = features.iter().map(|(shape, attributes)| {
        let polygons = shape.0.iter()
            .map(|polygon| {
                std::iter::once(polygon.exterior()).chain(polygon.interiors())
                    .map(ring_json)
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        json!({
            "type": "Feature",
            "geometry": { "type": "MultiPolygon", "coordinates": polygons },
            "properties": attributes,
        })
    }).collect::<Vec<_>>();

    let mut root = Map::new();
    root.insert("type".into(), json!("FeatureCollection"));
    if let Some(crs) = features.crs() {
        root.insert("crs".into(), json!({ "type": "name", "properties": { "name": crs.urn() } }));
    }
    root.insert("features".into(), Value::Array(members));
    Value::Object(root)
}

/// Write a collection as GeoJSON, atomically.
pub fn write_feature_collection(features: &FeatureCollection, path: &Path, force: bool) -> Result<()> {
    let bytes = serde_json::to_vec(&to_geojson_value(features))
        .context("[io::geojson] Failed to serialize GeoJSON")?;
    write_atomic(path, &bytes, force)
        .with_context(|| format!("[io::geojson] Failed to write {}", path.display()))?;
    debug!(path = %path.display(), features = features.len(), "wrote feature collection");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn polygons_and_multipolygons_are_read() {
        let text = br#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"id": "a", "height": 7.5},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,1],[0,1]]]}},
                {"type": "Feature", "properties": null,
                 "geometry": {"type": "Point", "coordinates": [0, 0]}},
                {"type": "Feature", "properties": {"id": "b"},
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[0,0],[1,0],[1,1],[0,1],[0,0]]],
                    [[[5,5],[6,5],[6,6],[5,6],[5,5]]]
                 ]}}
            ]
        }"#;
        let features = parse_feature_collection(text).unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features.crs(), Some(&Crs::wgs84()));
        assert_eq!(features.shapes()[0].unsigned_area(), 2.0);
        assert_eq!(features.shapes()[1].0.len(), 2);
        assert_eq!(features.attributes()[0]["id"], json!("a"));
        assert_eq!(features.column("height"), vec![Some(7.5), None]);
    }

    #[test]
    fn crs_member_is_honoured() {
        let text = br#"{"type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32617"}},
            "features": []}"#;
        assert_eq!(parse_feature_collection(text).unwrap().crs().map(Crs::epsg), Some(32617));

        let text = br#"{"type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "EPSG:not-a-code"}},
            "features": []}"#;
        assert_eq!(parse_feature_collection(text).unwrap().crs(), None);
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(parse_feature_collection(b"not json").is_err());
        assert!(parse_feature_collection(br#"{"type": "Feature"}"#).is_err());
        let bad_ring = br#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0]]]}}]}"#;
        assert!(parse_feature_collection(bad_ring).is_err());
    }

    #[test]
    fn written_value_carries_crs_and_properties() {
        let text = br#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"id": 1},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}]}"#;
        let features = parse_feature_collection(text).unwrap();
        let value = to_geojson_value(&features);

        assert_eq!(value["crs"]["properties"]["name"], json!("urn:ogc:def:crs:EPSG::4326"));
        assert_eq!(value["features"][0]["properties"]["id"], json!(1));
        assert_eq!(value["features"][0]["geometry"]["type"], json!("MultiPolygon"));

        let reread = parse_feature_collection(&serde_json::to_vec(&value).unwrap()).unwrap();
        assert_eq!(reread.shapes(), features.shapes());
    }
}
