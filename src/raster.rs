//! Single band floating point rasters with no-data.
//!
//! No-data is represented by NaN inside the model. The
//! conversion from / to the on-disk convention (0.0 marks
//! missing pixels) happens at the boundary, see
//! [`RasterField::from_raw_band`] and
//! [`RasterField::to_output_band`].

use ndarray::{Array2, Zip};
use serde_derive::*;

use crate::error::{Error, Result};

/// Affine georeferencing of a raster, in GDAL order:
/// `x = origin_x + col * pixel_width + row * row_rotation`,
/// `y = origin_y + col * col_rotation + row * pixel_height`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform without rotation.
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform {
            origin_x,
            pixel_width,
            row_rotation: 0.,
            origin_y,
            col_rotation: 0.,
            pixel_height,
        }
    }

    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        GeoTransform {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        GeoTransform::new(0., 0., 1., -1.)
    }
}

/// GeoTIFF projection metadata as found in the input: the
/// GeoKey directory and its double and ASCII parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub geo_keys: Vec<u16>,
    pub geo_doubles: Vec<f64>,
    pub geo_ascii: String,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.geo_keys.is_empty() && self.geo_doubles.is_empty() && self.geo_ascii.is_empty()
    }

    /// First entry of the ASCII parameters, usually the CRS
    /// citation.
    pub fn citation(&self) -> &str {
        self.geo_ascii.split('|').next().unwrap_or("")
    }
}

/// A 2-D grid of samples with georeferencing metadata.
///
/// The geotransform and projection are opaque to the model:
/// every field derived from a source field carries them over
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterField {
    data: Array2<f64>,
    transform: GeoTransform,
    projection: Projection,
}

impl RasterField {
    pub fn new(data: Array2<f64>) -> Self {
        Self::with_georeference(data, GeoTransform::default(), Projection::default())
    }

    pub fn with_georeference(data: Array2<f64>, transform: GeoTransform, projection: Projection) -> Self {
        RasterField {
            data,
            transform,
            projection,
        }
    }

    /// Wrap a band as read from disk: pixels equal to 0.0 mark
    /// missing measurements and become NaN.
    pub fn from_raw_band(mut data: Array2<f64>, transform: GeoTransform, projection: Projection) -> Self {
        data.par_mapv_inplace(|v| if v == 0. { f64::NAN } else { v });
        Self::with_georeference(data, transform, projection)
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    /// New field with this field's georeferencing and the
    /// given samples.
    pub(crate) fn derive(&self, data: Array2<f64>) -> RasterField {
        debug_assert_eq!(data.dim(), self.data.dim());
        RasterField {
            data,
            transform: self.transform,
            projection: self.projection.clone(),
        }
    }

    /// Apply `f` to every sample. NaN samples stay NaN.
    pub fn map<F>(&self, f: F) -> RasterField
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        let data = Zip::from(&self.data).par_map_collect(|&v| if v.is_nan() { v } else { f(v) });
        self.derive(data)
    }

    /// Combine two fields of the same shape sample by sample.
    /// NaN in either input yields NaN.
    pub fn zip_map<F>(&self, other: &RasterField, f: F) -> RasterField
    where
        F: Fn(f64, f64) -> f64 + Sync + Send,
    {
        let data = Zip::from(&self.data)
            .and(&other.data)
            .par_map_collect(|&a, &b| if a.is_nan() || b.is_nan() { f64::NAN } else { f(a, b) });
        self.derive(data)
    }

    pub(crate) fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    pub fn is_nodata(&self, row: usize, col: usize) -> bool {
        self.get(row, col).map_or(true, f64::is_nan)
    }

    /// Whether the sum over all samples is NaN.
    ///
    /// True whenever a no-data pixel is present, and also when
    /// the field holds both `+inf` and `-inf`. This is the test
    /// the model uses to decide whether a clamp pass runs.
    pub fn sum_is_nan(&self) -> bool {
        self.data.iter().sum::<f64>().is_nan()
    }

    /// Valid (non no-data) samples in row-major order.
    pub fn valid_values(&self) -> Vec<f64> {
        self.data.iter().copied().filter(|v| !v.is_nan()).collect()
    }

    /// Percentile of the valid samples using linear
    /// interpolation between closest ranks.
    ///
    /// `name` identifies the field in the error raised when it
    /// holds no valid pixel. `q` outside `[0, 100]` is a
    /// parameter error.
    pub fn percentile(&self, name: &'static str, q: f64) -> Result<f64> {
        if !(0. ..=100.).contains(&q) {
            return Err(Error::parameter(
                "percentile",
                format!("{} outside [0, 100]", q),
            ));
        }
        let mut values = self.valid_values();
        if values.is_empty() {
            return Err(Error::EmptyField { name });
        }
        values.sort_by(|a, b| a.total_cmp(b));
        Ok(percentile_of_sorted(&values, q))
    }

    /// Samples as written to an output band: no-data becomes
    /// 0.0, everything else is narrowed to `f32`.
    pub fn to_output_band(&self) -> Array2<f32> {
        self.data
            .mapv(|v| if v.is_nan() { 0. } else { v as f32 })
    }
}

/// `q` in `[0, 100]`; `sorted` must be non-empty.
fn percentile_of_sorted(sorted: &[f64], q: f64) -> f64 {
    let rank = q / 100. * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
