//! GeoTIFF input and output.
//!
//! Input is the first image of a single band TIFF of any
//! integer or float sample type; pixels equal to 0 are
//! no-data. Output is one float32 image with the six flux
//! bands interleaved per pixel (band order of
//! [`Quantity::OUTPUT_BANDS`]) and `GDAL_NODATA` set to 0.
//!
//! Georeferencing is carried in the `ModelPixelScale` and
//! `ModelTiepoint` tags (north-up rasters only). The projection
//! tags (`GeoKeyDirectory`, `GeoDoubleParams`, `GeoAsciiParams`)
//! are copied from input to output as they are.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Cursor, Read, Seek, Write},
    path::Path,
};

use anyhow::{bail, ensure, Context, Result};
use itertools::iproduct;
use log::{debug, warn};
use ndarray::Array2;
use tiff::{
    decoder::{Decoder, DecodingResult},
    encoder::{colortype::ColorType, TiffEncoder},
    tags::{PhotometricInterpretation, SampleFormat, Tag},
};

use crate::{
    engine::{DerivedRasters, Quantity},
    raster::{GeoTransform, Projection, RasterField},
};

/// Value written for no-data pixels, as announced in the
/// `GDAL_NODATA` tag.
pub const OUTPUT_NODATA: &str = "0";

const BAND_COUNT: usize = 6;

/// GeoKey directory written when the input had none: version
/// 1.1.0, GTRasterTypeGeoKey = RasterPixelIsArea.
const RASTER_TYPE_ONLY: &[u16] = &[1, 1, 0, 1, 1025, 0, 1, 1];

/// Six interleaved float32 samples per pixel.
struct FluxBands;

impl ColorType for FluxBands {
    type Inner = f32;
    const TIFF_VALUE: PhotometricInterpretation = PhotometricInterpretation::BlackIsZero;
    const BITS_PER_SAMPLE: &'static [u16] = &[32; BAND_COUNT];
    const SAMPLE_FORMAT: &'static [SampleFormat] = &[SampleFormat::IEEEFP; BAND_COUNT];
}

/// Read a land surface temperature raster.
pub fn read_lst<P: AsRef<Path>>(path: P) -> Result<RasterField> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    decode_lst(BufReader::new(file)).with_context(|| format!("reading {}", path.display()))
}

/// Same as [`read_lst`], from an in-memory buffer.
pub fn read_lst_from_buffer(data: &[u8]) -> Result<RasterField> {
    decode_lst(Cursor::new(data))
}

fn decode_lst<R: Read + Seek>(reader: R) -> Result<RasterField> {
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    let samples: Vec<f64> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
    };
    if samples.len() != rows * cols {
        bail!(
            "expected a single band raster: {} samples for {}x{} pixels",
            samples.len(),
            cols,
            rows
        );
    }
    let data = Array2::from_shape_vec((rows, cols), samples)?;

    let transform = read_geotransform(&mut decoder)?;
    let projection = read_projection(&mut decoder)?;
    debug!(
        "read {}x{} raster, transform {:?}, projection {:?}",
        cols,
        rows,
        transform,
        projection.citation()
    );

    Ok(RasterField::from_raw_band(data, transform, projection))
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    let scale = decoder.find_tag(Tag::ModelPixelScaleTag)?;
    let tiepoint = decoder.find_tag(Tag::ModelTiepointTag)?;
    let (scale, tiepoint) = match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) => (scale.into_f64_vec()?, tiepoint.into_f64_vec()?),
        _ => {
            warn!("raster is not georeferenced, using pixel coordinates");
            return Ok(GeoTransform::default());
        }
    };
    ensure!(
        scale.len() >= 2 && tiepoint.len() >= 6,
        "malformed georeferencing tags"
    );

    // tiepoint: raster (I, J, K) -> model (X, Y, Z)
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_projection<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Projection> {
    let geo_keys = match decoder.find_tag(Tag::GeoKeyDirectoryTag)? {
        Some(value) => value.into_u16_vec()?,
        None => Vec::new(),
    };
    ensure!(
        geo_keys.len() % 4 == 0,
        "malformed GeoKeyDirectory of {} values",
        geo_keys.len()
    );
    let geo_doubles = match decoder.find_tag(Tag::GeoDoubleParamsTag)? {
        Some(value) => value.into_f64_vec()?,
        None => Vec::new(),
    };
    let geo_ascii = match decoder.find_tag(Tag::GeoAsciiParamsTag)? {
        Some(value) => value.into_string()?,
        None => String::new(),
    };
    Ok(Projection {
        geo_keys,
        geo_doubles,
        geo_ascii,
    })
}

/// Write the six flux bands with the georeferencing of the
/// fields they were derived from.
pub fn write_flux_raster<P: AsRef<Path>>(path: P, rasters: &DerivedRasters) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    encode_flux_raster(&mut writer, rasters)
        .with_context(|| format!("writing {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Same as [`write_flux_raster`], into an in-memory buffer.
pub fn write_flux_raster_to_buffer(rasters: &DerivedRasters) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_flux_raster(Cursor::new(&mut buf), rasters)?;
    Ok(buf)
}

fn encode_flux_raster<W: Write + Seek>(writer: W, rasters: &DerivedRasters) -> Result<()> {
    let bands: Vec<(Quantity, Array2<f32>)> = rasters
        .output_bands()
        .map(|(q, field)| (q, field.to_output_band()))
        .collect();
    let (rows, cols) = rasters.net_radiation.shape();
    for (q, band) in &bands {
        ensure!(
            band.dim() == (rows, cols),
            "{} does not match the raster shape",
            q.name()
        );
    }

    let data: Vec<f32> = iproduct!(0..rows, 0..cols, 0..BAND_COUNT)
        .map(|(row, col, band)| bands[band].1[(row, col)])
        .collect();

    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<FluxBands>(cols as u32, rows as u32)?;

    let extra_samples = [0u16; BAND_COUNT - 1];
    image.encoder().write_tag(Tag::ExtraSamples, &extra_samples[..])?;
    image.encoder().write_tag(Tag::GdalNodata, OUTPUT_NODATA)?;

    let transform = rasters.net_radiation.transform();
    if transform.row_rotation != 0. || transform.col_rotation != 0. {
        warn!("rotated geotransform cannot be stored, rotation is dropped");
    }
    let scale = [transform.pixel_width, -transform.pixel_height, 0.];
    let tiepoint = [0., 0., 0., transform.origin_x, transform.origin_y, 0.];
    image.encoder().write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
    image.encoder().write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;

    let projection = rasters.net_radiation.projection();
    let geo_keys = if projection.geo_keys.is_empty() {
        RASTER_TYPE_ONLY
    } else {
        &projection.geo_keys[..]
    };
    image.encoder().write_tag(Tag::GeoKeyDirectoryTag, geo_keys)?;
    if !projection.geo_doubles.is_empty() {
        image
            .encoder()
            .write_tag(Tag::GeoDoubleParamsTag, &projection.geo_doubles[..])?;
    }
    if !projection.geo_ascii.is_empty() {
        image
            .encoder()
            .write_tag(Tag::GeoAsciiParamsTag, projection.geo_ascii.as_str())?;
    }

    image.write_data(&data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tiff::encoder::colortype::{Gray16, Gray32Float};

    fn gray16_tiff(width: u32, height: u32, data: &[u16]) -> Vec<u8> {
        let mut buf = Vec::new();
        TiffEncoder::new(Cursor::new(&mut buf))
            .unwrap()
            .write_image::<Gray16>(width, height, data)
            .unwrap();
        buf
    }

    #[test]
    fn reads_integer_bands() {
        let buf = gray16_tiff(2, 2, &[0, 300, 301, 302]);
        let field = read_lst_from_buffer(&buf).unwrap();
        assert_eq!(field.shape(), (2, 2));
        assert!(field.is_nodata(0, 0));
        assert_eq!(field.get(1, 1), Some(302.));
        assert_eq!(field.transform(), &GeoTransform::default());
        assert!(field.projection().is_empty());
    }

    #[test]
    fn reads_georeferencing() {
        let mut buf = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buf)).unwrap();
            let mut image = encoder.new_image::<Gray32Float>(3, 1).unwrap();
            image
                .encoder()
                .write_tag(Tag::ModelPixelScaleTag, &[0.5, 0.25, 0.][..])
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::ModelTiepointTag, &[0., 0., 0., 11.5, 48.2, 0.][..])
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::GeoAsciiParamsTag, "WGS 84|")
                .unwrap();
            image.write_data(&[290f32, 0., 310.]).unwrap();
        }

        let field = read_lst_from_buffer(&buf).unwrap();
        assert_eq!(field.transform(), &GeoTransform::new(11.5, 48.2, 0.5, -0.25));
        assert_eq!(field.projection().citation(), "WGS 84");
        assert!(field.is_nodata(0, 1));
        assert_eq!(field.get(0, 2), Some(310.));
    }

    #[test]
    fn projection_tags_pass_through() {
        // GTModelType = Projected, RasterPixelIsArea, ProjectedCSType = EPSG:32632
        let geo_keys = [1u16, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, 32632];
        let geo_doubles = [6378137., 298.257223563];
        let mut buf = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buf)).unwrap();
            let mut image = encoder.new_image::<Gray32Float>(2, 1).unwrap();
            image
                .encoder()
                .write_tag(Tag::GeoKeyDirectoryTag, &geo_keys[..])
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::GeoDoubleParamsTag, &geo_doubles[..])
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::GeoAsciiParamsTag, "WGS 84 / UTM zone 32N|")
                .unwrap();
            image.write_data(&[290f32, 300.]).unwrap();
        }

        let field = read_lst_from_buffer(&buf).unwrap();
        assert_eq!(field.projection().geo_keys, geo_keys);
        assert_eq!(field.projection().citation(), "WGS 84 / UTM zone 32N");

        let rasters = DerivedRasters {
            albedo: field.clone(),
            net_radiation: field.clone(),
            evaporative_fraction: field.clone(),
            ground_heat_flux: field.clone(),
            latent_heat_flux: field.clone(),
            sensible_heat_flux: field.clone(),
            water_flux: field,
        };
        let out = write_flux_raster_to_buffer(&rasters).unwrap();
        let mut decoder = Decoder::new(Cursor::new(&out[..])).unwrap();
        assert_eq!(
            decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).unwrap(),
            geo_keys
        );
        assert_eq!(
            decoder.get_tag_f64_vec(Tag::GeoDoubleParamsTag).unwrap(),
            geo_doubles
        );
        assert_eq!(
            decoder.get_tag_ascii_string(Tag::GeoAsciiParamsTag).unwrap(),
            "WGS 84 / UTM zone 32N|"
        );
    }

    #[test]
    fn raster_type_only_without_projection() {
        let rasters = DerivedRasters {
            albedo: RasterField::new(array![[1.]]),
            net_radiation: RasterField::new(array![[1.]]),
            evaporative_fraction: RasterField::new(array![[1.]]),
            ground_heat_flux: RasterField::new(array![[1.]]),
            latent_heat_flux: RasterField::new(array![[1.]]),
            sensible_heat_flux: RasterField::new(array![[1.]]),
            water_flux: RasterField::new(array![[1.]]),
        };
        let out = write_flux_raster_to_buffer(&rasters).unwrap();
        let mut decoder = Decoder::new(Cursor::new(&out[..])).unwrap();
        assert_eq!(
            decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).unwrap(),
            RASTER_TYPE_ONLY
        );
        assert!(decoder.find_tag(Tag::GeoDoubleParamsTag).unwrap().is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(read_lst_from_buffer(b"not a tiff").is_err());
    }

    #[test]
    fn rejects_mismatched_bands() {
        let field = RasterField::new(array![[1., 2.]]);
        let other = RasterField::new(array![[1.], [2.]]);
        let rasters = DerivedRasters {
            albedo: field.clone(),
            net_radiation: field.clone(),
            evaporative_fraction: field.clone(),
            ground_heat_flux: field.clone(),
            latent_heat_flux: other,
            sensible_heat_flux: field.clone(),
            water_flux: field,
        };
        assert!(write_flux_raster_to_buffer(&rasters).is_err());
    }
}
