use crate::error::MapError;
use crate::map::LineString;
use anyhow::Result;
use geojson::{FeatureCollection, GeoJson, Geometry, Value};
use glam::DVec2;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Basemap files tried in order; every one found adds its lines
const OUTLINE_FILES: [&str; 3] = ["basemap.geojson", "ne_50m_admin_0_countries.json", "ne_110m_coastline.json"];

/// Parse a GeoJSON document that must be a FeatureCollection
pub fn parse_feature_collection(bytes: &[u8]) -> crate::error::Result<FeatureCollection> {
    let mut buf = bytes.to_vec();
    let geojson: GeoJson =
        simd_json::serde::from_slice(&mut buf).map_err(|e| MapError::Geojson(e.to_string()))?;
    FeatureCollection::try_from(geojson).map_err(|e| MapError::Geojson(e.to_string()))
}

/// Outline lines for the tile layer: every basemap file found in
/// `data_dir`, or the built-in outline when none loads
pub fn load_outlines(data_dir: Option<&Path>) -> Vec<LineString> {
    let mut lines = Vec::new();
    if let Some(dir) = data_dir {
        for filename in OUTLINE_FILES {
            let path = dir.join(filename);
            if !path.exists() {
                continue;
            }
            match load_lines(&path) {
                Ok(loaded) => {
                    info!(file = filename, lines = loaded.len(), "basemap outline loaded");
                    lines.extend(loaded);
                }
                Err(e) => warn!(file = filename, error = %e, "failed to load basemap outline"),
            }
        }
    }
    if lines.is_empty() {
        lines = builtin_outlines();
    }
    lines
}

fn load_lines(path: &Path) -> Result<Vec<LineString>> {
    let mut bytes = fs::read(path)?;
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes)?;
    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

/// Feed every line and polygon exterior of a document to `add_line`
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, &mut add_line),
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|l| add_line(line(l))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        Value::Point(_) | Value::MultiPoint(_) => {}
    }
}

fn line(coords: &[Vec<f64>]) -> LineString {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| DVec2::new(c[0], c[1]))
        .collect()
}

fn outline(points: &[(f64, f64)]) -> LineString {
    points.iter().map(|&(lon, lat)| DVec2::new(lon, lat)).collect()
}

/// Coarse outline of the Low Countries and their surroundings, used when
/// no basemap file is available
pub fn builtin_outlines() -> Vec<LineString> {
    vec![
        // Netherlands
        outline(&[
            (3.36, 51.37), (3.83, 51.21), (4.24, 51.37), (4.78, 51.50),
            (5.04, 51.49), (5.61, 51.28), (5.85, 51.16), (5.64, 50.85),
            (5.69, 50.76), (6.02, 50.75), (6.08, 50.92), (5.87, 51.05),
            (6.18, 51.17), (6.07, 51.26), (6.23, 51.40), (5.95, 51.75),
            (6.41, 51.83), (6.83, 51.97), (6.69, 52.03), (7.06, 52.24),
            (6.70, 52.49), (7.03, 52.62), (7.07, 52.85), (7.22, 53.24),
            (6.91, 53.35), (6.20, 53.41), (5.60, 53.30), (5.09, 52.96),
            (5.42, 52.65), (5.07, 52.37), (4.74, 52.96), (4.58, 52.47),
            (4.20, 52.05), (3.98, 51.82), (3.52, 51.62), (3.36, 51.37),
        ]),
        // Belgium
        outline(&[
            (2.54, 51.09), (3.36, 51.37), (3.83, 51.21), (4.24, 51.37),
            (4.78, 51.50), (5.04, 51.49), (5.61, 51.28), (5.85, 51.16),
            (5.64, 50.85), (5.69, 50.76), (6.02, 50.75), (6.27, 50.50),
            (6.40, 50.32), (5.89, 49.99), (5.81, 49.55), (5.47, 49.50),
            (4.85, 49.79), (4.80, 50.15), (4.23, 49.96), (4.15, 50.27),
            (3.59, 50.38), (3.16, 50.78), (2.54, 51.09),
        ]),
        // North Sea and Baltic coast
        outline(&[
            (2.54, 51.09), (1.60, 50.95), (0.10, 49.70), (-1.60, 49.65),
        ]),
        outline(&[
            (7.22, 53.24), (8.10, 53.55), (8.60, 53.88), (8.90, 54.50),
            (8.60, 55.50), (8.10, 56.60), (8.60, 57.10), (10.60, 57.73),
            (10.50, 56.50), (10.90, 56.40), (10.20, 55.60), (9.60, 55.00),
            (10.90, 54.40), (12.50, 54.45), (14.20, 53.90),
        ]),
        // Great Britain
        outline(&[
            (1.75, 52.70), (1.45, 51.40), (0.45, 50.80), (-1.20, 50.75),
            (-3.50, 50.40), (-5.70, 50.05), (-4.20, 51.20), (-5.20, 51.75),
            (-4.10, 52.90), (-3.00, 53.40), (-3.40, 54.90), (-5.10, 55.80),
            (-6.20, 56.70), (-5.00, 58.60), (-3.00, 58.60), (-2.00, 57.60),
            (-2.50, 56.30), (-1.60, 55.60), (-0.10, 54.10), (0.30, 53.50),
            (1.75, 52.70),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_feature_collections() {
        let doc = br#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[5.1,52.1]},"properties":{"name":"a"}}
        ]}"#;
        let fc = parse_feature_collection(doc).unwrap();
        assert_eq!(fc.features.len(), 1);
    }

    #[test]
    fn rejects_other_documents() {
        let point = br#"{"type":"Point","coordinates":[5.1,52.1]}"#;
        assert!(matches!(parse_feature_collection(point), Err(MapError::Geojson(_))));
        assert!(matches!(parse_feature_collection(b"{not json"), Err(MapError::Geojson(_))));
    }

    #[test]
    fn extracts_polygon_exteriors() {
        let doc: GeoJson = r#"{"type":"MultiPolygon","coordinates":[
            [[[0,0],[1,0],[1,1],[0,0]],[[0.2,0.2],[0.4,0.2],[0.4,0.4],[0.2,0.2]]],
            [[[5,5],[6,5],[6,6],[5,5]]]
        ]}"#
        .parse()
        .unwrap();
        let mut lines = Vec::new();
        process_geojson_lines(&doc, |l| lines.push(l));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1][0], DVec2::new(5.0, 5.0));
    }

    #[test]
    fn falls_back_to_builtin_outline() {
        let lines = load_outlines(Some(Path::new("/nonexistent")));
        assert_eq!(lines.len(), builtin_outlines().len());
        assert!(lines.iter().all(|l| l.len() >= 2));
    }
}
