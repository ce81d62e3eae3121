//! Summary statistics over raster fields.

use std::ops::AddAssign;

use log::warn;
use serde_derive::*;

use crate::{
    engine::{DerivedRasters, Quantity},
    error::{Error, Result},
    raster::RasterField,
};

/// Running count, sum, min and max of samples. NaN samples are
/// skipped; infinite samples are counted.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            count: 0,
            sum: 0.,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Stats {
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    pub fn summary(&self) -> Option<Summary> {
        Some(Summary {
            mean: self.mean()?,
            min: self.min,
            max: self.max,
        })
    }

    pub fn of_field(field: &RasterField) -> Self {
        let mut stats = Stats::default();
        for &v in field.data().iter() {
            stats += v;
        }
        stats
    }
}

impl AddAssign<f64> for Stats {
    fn add_assign(&mut self, val: f64) {
        if val.is_nan() {
            return;
        }
        self.count += 1;
        self.sum += val;
        self.min = self.min.min(val);
        self.max = self.max.max(val);
    }
}

/// Mean, min and max over the valid pixels of a field.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Summary of a field without valid pixels.
    pub const NO_DATA: Summary = Summary {
        mean: f64::NAN,
        min: f64::NAN,
        max: f64::NAN,
    };

    /// Fails with [`Error::EmptyField`] naming `name` if the
    /// field has no valid pixel.
    pub fn of_field(name: &'static str, field: &RasterField) -> Result<Self> {
        Stats::of_field(field)
            .summary()
            .ok_or(Error::EmptyField { name })
    }
}

/// Summaries of every derived field.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub albedo: Summary,
    pub net_radiation: Summary,
    pub latent_heat_flux: Summary,
    pub sensible_heat_flux: Summary,
    pub ground_heat_flux: Summary,
    pub evaporative_fraction: Summary,
    pub water_flux: Summary,
}

impl SummaryStats {
    pub fn get(&self, quantity: Quantity) -> &Summary {
        match quantity {
            Quantity::Albedo => &self.albedo,
            Quantity::NetRadiation => &self.net_radiation,
            Quantity::LatentHeatFlux => &self.latent_heat_flux,
            Quantity::SensibleHeatFlux => &self.sensible_heat_flux,
            Quantity::GroundHeatFlux => &self.ground_heat_flux,
            Quantity::EvaporativeFraction => &self.evaporative_fraction,
            Quantity::WaterFlux => &self.water_flux,
        }
    }
}

/// Mean, min and max of each derived raster. A raster without
/// valid pixels, as a degenerate temperature range produces,
/// gets [`Summary::NO_DATA`].
pub fn summarize(rasters: &DerivedRasters) -> SummaryStats {
    let of = |q: Quantity| {
        Stats::of_field(rasters.get(q)).summary().unwrap_or_else(|| {
            warn!("{} has no valid pixel", q.name());
            Summary::NO_DATA
        })
    };
    SummaryStats {
        albedo: of(Quantity::Albedo),
        net_radiation: of(Quantity::NetRadiation),
        latent_heat_flux: of(Quantity::LatentHeatFlux),
        sensible_heat_flux: of(Quantity::SensibleHeatFlux),
        ground_heat_flux: of(Quantity::GroundHeatFlux),
        evaporative_fraction: of(Quantity::EvaporativeFraction),
        water_flux: of(Quantity::WaterFlux),
    }
}
