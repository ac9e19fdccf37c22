use std::fs::File;
use std::path::Path;

use builtup::{io, Crs, Error, FeatureCollection, GridSpec};
use geo::{Coord, MultiPolygon, Rect};
use pretty_assertions::assert_eq;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon(vec![Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 }).to_polygon()])
}

/// 2 × 2 float GeoTIFF over (0,0)–(1,1) in EPSG:4326, declaring -9999 as no-data.
fn write_quad_tiff(path: &Path, values: &[f32]) {
    let mut encoder = TiffEncoder::new(File::create(path).unwrap()).unwrap();
    let mut image = encoder.new_image::<colortype::Gray32Float>(2, 2).unwrap();
    image.encoder().write_tag(Tag::ModelPixelScaleTag, &[0.5f64, 0.5, 0.0][..]).unwrap();
    image.encoder().write_tag(Tag::ModelTiepointTag, &[0.0f64, 0.0, 0.0, 0.0, 1.0, 0.0][..]).unwrap();
    image.encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &[1u16, 1, 0, 3, 1024, 0, 1, 2, 1025, 0, 1, 1, 2048, 0, 1, 4326][..])
        .unwrap();
    image.encoder().write_tag(Tag::GdalNodata, "-9999").unwrap();
    image.write_data(values).unwrap();
}

#[test]
fn geotiff_georeferencing_and_nodata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ghsl.tif");
    write_quad_tiff(&path, &[10.0, 20.0, 30.0, -9999.0]);

    let raster = io::read_raster(&path, Some(0.0)).unwrap();
    assert_eq!((raster.width(), raster.height()), (2, 2));
    assert_eq!(raster.crs(), Some(&Crs::wgs84()));
    assert_eq!(raster.nodata(), Some(-9999.0));
    assert_eq!(raster.resolution(), (0.5, 0.5));
    assert_eq!(raster.bounds(), Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }));
    assert_eq!(raster.get(0, 1), Some(20.0));
    assert_eq!(raster.get(1, 1), Some(-9999.0));
}

#[test]
fn geotiff_transformation_matrix_and_fallback_nodata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("utm.tif");

    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    let mut image = encoder.new_image::<colortype::Gray16>(3, 2).unwrap();
    let matrix = [
        100.0f64, 0.0, 0.0, 500_000.0,
        0.0, -100.0, 0.0, 4_000_000.0,
        0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    image.encoder().write_tag(Tag::ModelTransformationTag, &matrix[..]).unwrap();
    image.encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &[1u16, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 32617][..])
        .unwrap();
    image.write_data(&[1u16, 2, 3, 4, 5, 6]).unwrap();

    let raster = io::read_raster(&path, Some(-9999.0)).unwrap();
    assert_eq!((raster.width(), raster.height()), (3, 2));
    assert_eq!(raster.crs().map(Crs::epsg), Some(32617));
    assert_eq!(raster.nodata(), Some(-9999.0));
    assert_eq!(
        raster.bounds(),
        Rect::new(Coord { x: 500_000.0, y: 3_999_800.0 }, Coord { x: 500_300.0, y: 4_000_000.0 })
    );
    assert_eq!(raster.get(1, 2), Some(6.0));
}

#[test]
fn tiff_without_georeferencing_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.tif");
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    encoder.write_image::<colortype::Gray8>(2, 2, &[1, 2, 3, 4]).unwrap();

    match io::read_raster(&path, None) {
        Err(Error::RasterRead { path: failed, .. }) => assert_eq!(failed, path),
        other => panic!("expected a raster read error, got {other:?}"),
    }
}

#[test]
fn geojson_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cells.geojson");

    let features = FeatureCollection::new(vec![rect(0.0, 0.0, 1.0, 1.0), rect(1.0, 0.0, 2.0, 1.0)], Some(Crs::from_epsg(32617).unwrap()))
        .with_column("ghsl_sum", &[4.0, 2.5])
        .unwrap();
    io::write_feature_collection(&features, &path, false).unwrap();
    assert!(io::write_feature_collection(&features, &path, false).is_err());

    let reread = io::read_feature_collection(&path).unwrap();
    assert_eq!(reread.crs(), features.crs());
    assert_eq!(reread.shapes(), features.shapes());
    assert_eq!(reread.column("ghsl_sum"), vec![Some(4.0), Some(2.5)]);
}

#[test]
fn end_to_end_grid_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let tiff = dir.path().join("ghsl.tif");
    write_quad_tiff(&tiff, &[10.0, 20.0, 30.0, 40.0]);

    let footprints_path = dir.path().join("buildings.geojson");
    std::fs::write(&footprints_path, r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"id": "w1"},
             "geometry": {"type": "Polygon", "coordinates": [[[0.1,0.6],[0.2,0.6],[0.2,0.7],[0.1,0.7],[0.1,0.6]]]}}
        ]
    }"#).unwrap();

    let footprints = io::read_feature_collection(&footprints_path).unwrap();
    let raster = io::read_raster(&tiff, None).unwrap();
    let analysis = builtup::grid_analysis(&footprints, &raster, &GridSpec::Raster, &Default::default()).unwrap();

    let grid_path = dir.path().join("out/grid.geojson");
    let csv_path = dir.path().join("out/grid.csv");
    io::write_feature_collection(&analysis.grid, &grid_path, false).unwrap();
    io::write_precision_csv(&analysis.grid, &analysis.precision, &csv_path, false).unwrap();

    let grid = io::read_feature_collection(&grid_path).unwrap();
    assert_eq!(grid.len(), 4);
    assert_eq!(grid.column("ghsl_sum"), vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)]);
    assert_eq!(grid.column("precision_ratio")[1], Some(0.0));

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().next(), Some("cell,row,col,ghsl_sum,area,precision_ratio"));
    assert_eq!(csv.lines().count(), 5);
}
