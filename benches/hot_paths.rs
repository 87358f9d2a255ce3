//! Benchmarks for the per-input hot paths: hit-testing a click against
//! every attached layer, and restyling every feature by bucket.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use tui_layermap::element::MapElement;
use tui_layermap::config::MapSettings;
use tui_layermap::layers::DatasetOptions;
use tui_layermap::map::style::Rgba;

/// A grid of `n` x `n` small squares around the Netherlands with a
/// percentage attribute and a derived marker each
fn grid(n: usize) -> FeatureCollection {
    let step = 3.0 / n as f64;
    let mut features = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let (lon, lat) = (3.5 + col as f64 * step, 50.8 + row as f64 * step);
            let ring = vec![
                vec![lon, lat],
                vec![lon + step * 0.9, lat],
                vec![lon + step * 0.9, lat + step * 0.9],
                vec![lon, lat + step * 0.9],
                vec![lon, lat],
            ];
            let mut properties = JsonObject::new();
            properties.insert("Percentage".into(), ((row * n + col) % 70).into());
            properties.insert("latitude".into(), (lat + step * 0.45).into());
            properties.insert("longitude".into(), (lon + step * 0.45).into());
            features.push(Feature {
                geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                properties: Some(properties),
                ..Default::default()
            });
        }
    }
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn loaded_map(n: usize) -> MapElement {
    let mut map = MapElement::new(MapSettings::default(), vec![]);
    map.resize(200, 60);
    map.connected();
    map.add_dataset(&grid(n), &DatasetOptions::new("grid")).unwrap();
    map.viewport_mut().set_view([52.3, 5.0], 8);
    map
}

fn bench_hit_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_test");
    for n in [20, 60] {
        let map = loaded_map(n);
        group.bench_function(format!("grid_{n}x{n}"), |b| {
            b.iter(|| black_box(map.surface().hit_test(black_box(200), black_box(120))));
        });
    }
    group.finish();
}

fn bench_bucket_restyle(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket_restyle");
    let palette: Vec<Rgba> = (0..6).map(|i| Rgba::rgb(40 * i, 100, 200)).collect();
    for n in [20, 60] {
        let mut map = loaded_map(n);
        group.bench_function(format!("grid_{n}x{n}"), |b| {
            b.iter(|| {
                map.set_layer_colors_by_attribute_bucket("Percentage", black_box(&palette))
                    .unwrap();
                map.reset_all_colors().unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hit_test, bench_bucket_restyle);
criterion_main!(benches);
