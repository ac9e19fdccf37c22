//! Single-band GeoTIFF reader.
//!
//! Band 1 is decoded whole (strips or tiles) and widened to `f64`. Georeferencing comes from
//! `ModelPixelScale` + `ModelTiepoint`, or `ModelTransformation` when present; the CRS from the
//! `GeoKeyDirectory`, and the no-data sentinel from the GDAL ASCII tag.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::{debug, warn};

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterGrid};

const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

/// Sentinel assumed for GHSL rasters that do not declare one.
pub const DEFAULT_NODATA: f64 = -9999.0;

/// Read band 1 of a GeoTIFF. `fallback_nodata` is used when the file declares no sentinel.
pub fn read_raster(path: &Path, fallback_nodata: Option<f64>) -> Result<RasterGrid> {
    let file = File::open(path).map_err(|e| Error::raster(path, e))?;
    let raster = decode(BufReader::new(file), fallback_nodata)
        .map_err(|reason| Error::raster(path, reason))?;
    debug!(
        path = %path.display(),
        width = raster.width(),
        height = raster.height(),
        crs = ?raster.crs().map(Crs::epsg),
        nodata = ?raster.nodata(),
        "read raster"
    );
    Ok(raster)
}

/// Decode a GeoTIFF from memory.
pub fn read_raster_bytes(bytes: &[u8], fallback_nodata: Option<f64>) -> Result<RasterGrid> {
    decode(std::io::Cursor::new(bytes), fallback_nodata)
        .map_err(|reason| Error::raster("<memory>", reason))
}

fn decode<R: Read + Seek>(reader: R, fallback_nodata: Option<f64>) -> Result<RasterGrid, String> {
    let mut decoder = Decoder::new(reader)
        .map_err(|e| format!("not a TIFF file: {e}"))?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions().map_err(|e| format!("cannot read dimensions: {e}"))?;
    let (width, height) = (width as usize, height as usize);

    let samples = tag_u32(&mut decoder, Tag::SamplesPerPixel)?.unwrap_or(1).max(1) as usize;
    let planar = tag_u32(&mut decoder, Tag::PlanarConfiguration)?.unwrap_or(1);

    let keys = geo_keys(&mut decoder)?;
    let transform = geo_transform(&mut decoder, &keys)?;
    let crs = raster_crs(&keys);
    let nodata = gdal_nodata(&mut decoder)?.or(fallback_nodata);

    let image = decoder.read_image().map_err(|e| format!("cannot decode band 1: {e}"))?;
    let all = widen(image)?;

    let values = match (samples, planar) {
        (1, _) | (_, 2) => {
            // Separate planes store band 1 first.
            let mut values = all;
            values.truncate(width * height);
            values
        }
        _ => all.into_iter().step_by(samples).collect(),
    };
    if values.len() != width * height {
        return Err(format!("decoded {} samples for a {width} × {height} band", values.len()));
    }

    RasterGrid::from_rows(height, width, values, transform, crs, nodata).map_err(|e| e.to_string())
}

fn widen(image: DecodingResult) -> Result<Vec<f64>, String> {
    Ok(match image {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        #[allow(unreachable_patterns)]
        _ => return Err("unsupported sample format".into()),
    })
}

fn tag_u32<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> Result<Option<u32>, String> {
    decoder.find_tag(tag)
        .map_err(|e| format!("cannot read tag {tag:?}: {e}"))?
        .map(|value| value.into_u32().map_err(|e| format!("invalid tag {tag:?}: {e}")))
        .transpose()
}

fn tag_f64s<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> Result<Option<Vec<f64>>, String> {
    decoder.find_tag(tag)
        .map_err(|e| format!("cannot read tag {tag:?}: {e}"))?
        .map(|value| value.into_f64_vec().map_err(|e| format!("invalid tag {tag:?}: {e}")))
        .transpose()
}

/// `(key id, value)` pairs of the GeoKeyDirectory entries stored inline.
fn geo_keys<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Vec<(u16, u16)>, String> {
    let Some(directory) = decoder.find_tag(Tag::GeoKeyDirectoryTag)
        .map_err(|e| format!("cannot read GeoKeyDirectory: {e}"))?
    else {
        return Ok(Vec::new());
    };
    let directory = directory.into_u16_vec().map_err(|e| format!("invalid GeoKeyDirectory: {e}"))?;

    // Header: version, revision, minor revision, key count; then 4 shorts per key.
    let count = directory.get(3).copied().unwrap_or(0) as usize;
    Ok(directory.get(4..).unwrap_or_default()
        .chunks_exact(4)
        .take(count)
        .filter(|entry| entry[1] == 0 && entry[2] == 1)
        .map(|entry| (entry[0], entry[3]))
        .collect())
}

fn geo_key(keys: &[(u16, u16)], id: u16) -> Option<u16> {
    keys.iter().find(|(key, _)| *key == id).map(|(_, value)| *value)
}

fn geo_transform<R: Read + Seek>(decoder: &mut Decoder<R>, keys: &[(u16, u16)]) -> Result<GeoTransform, String> {
    let (mut origin_x, mut origin_y, pixel_width, pixel_height) =
        if let Some(matrix) = tag_f64s(decoder, Tag::ModelTransformationTag)? {
            let [a, b, _, d, e, f, _, h, ..] = matrix[..] else {
                return Err(format!("ModelTransformation has {} values, expected 16", matrix.len()));
            };
            if b != 0.0 || e != 0.0 {
                return Err("rotated or sheared rasters are not supported".into());
            }
            (d, h, a, f)
        } else {
            let scale = tag_f64s(decoder, Tag::ModelPixelScaleTag)?
                .ok_or("missing ModelPixelScale and ModelTransformation")?;
            let tiepoint = tag_f64s(decoder, Tag::ModelTiepointTag)?
                .ok_or("missing ModelTiepoint")?;
            let ([sx, sy, ..], [i, j, _, x, y, ..]) = (&scale[..], &tiepoint[..]) else {
                return Err("malformed ModelPixelScale or ModelTiepoint".into());
            };
            (x - i * sx, y + j * sy, *sx, -sy)
        };

    if geo_key(keys, GT_RASTER_TYPE_KEY) == Some(RASTER_PIXEL_IS_POINT) {
        // Tie points refer to pixel centres.
        origin_x -= pixel_width / 2.0;
        origin_y -= pixel_height / 2.0;
    }

    GeoTransform::new(origin_x, origin_y, pixel_width, pixel_height).map_err(|e| e.to_string())
}

/// The projected CRS wins over the geographic one; unresolvable codes leave the CRS unset.
fn raster_crs(keys: &[(u16, u16)]) -> Option<Crs> {
    let code = geo_key(keys, PROJECTED_CS_TYPE_KEY)
        .filter(|code| *code != USER_DEFINED)
        .or_else(|| geo_key(keys, GEOGRAPHIC_TYPE_KEY).filter(|code| *code != USER_DEFINED))?;

    match Crs::from_epsg(code.into()) {
        Ok(crs) => Some(crs),
        Err(e) => {
            warn!(code, error = %e, "raster CRS cannot be resolved");
            None
        }
    }
}

fn gdal_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<f64>, String> {
    let Some(value) = decoder.find_tag(Tag::GdalNodata)
        .map_err(|e| format!("cannot read GDAL_NODATA: {e}"))?
    else {
        return Ok(None);
    };
    let text = value.into_string().map_err(|e| format!("invalid GDAL_NODATA: {e}"))?;
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match text.to_ascii_lowercase().as_str() {
        "nan" | "-nan" => Ok(Some(f64::NAN)),
        _ => text.parse::<f64>().map(Some).map_err(|_| format!("invalid GDAL_NODATA {text:?}")),
    }
}
