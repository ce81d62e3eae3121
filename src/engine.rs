//! The DATTUTDUT energy balance, pixel by pixel.
//!
//! Computes, in this order: albedo, net radiation,
//! evaporative fraction, ground heat flux, latent and
//! sensible heat flux, and the evapotranspired water. Every
//! stage is an elementwise transform of its inputs, so the
//! stages run in parallel over pixels.
//!
//! No-data propagates: a NaN pixel in the LST field is NaN in
//! every output. `tmax == tmin` is not guarded and yields
//! NaN / infinite pixels instead of an error.
//!
//! # Clamping
//!
//! Albedo, evaporative fraction and ground heat flux are
//! clamped right after they are computed. By default
//! ([`ClampMode::SkipOnNoData`]) a clamp pass is skipped
//! altogether when the sum over the field is NaN, which is
//! the case as soon as a single pixel is no-data.
//! [`ClampMode::Always`] clamps the valid pixels regardless.

use log::{info, warn};
use serde_derive::*;

use crate::{
    constants::*,
    error::{Error, Result},
    raster::RasterField,
    resolve::{PixelParam, ResolvedParameters},
};

/// When clamp passes run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampMode {
    /// Skip a clamp pass when the field holds any no-data.
    SkipOnNoData,
    /// Clamp valid pixels even if the field holds no-data.
    Always,
}

impl Default for ClampMode {
    fn default() -> Self {
        ClampMode::SkipOnNoData
    }
}

/// Quantities computed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Albedo,
    NetRadiation,
    LatentHeatFlux,
    SensibleHeatFlux,
    GroundHeatFlux,
    EvaporativeFraction,
    WaterFlux,
}

impl Quantity {
    /// Bands of the output raster, in order.
    pub const OUTPUT_BANDS: [Quantity; 6] = [
        Quantity::NetRadiation,
        Quantity::LatentHeatFlux,
        Quantity::SensibleHeatFlux,
        Quantity::GroundHeatFlux,
        Quantity::EvaporativeFraction,
        Quantity::WaterFlux,
    ];

    pub const ALL: [Quantity; 7] = [
        Quantity::Albedo,
        Quantity::NetRadiation,
        Quantity::LatentHeatFlux,
        Quantity::SensibleHeatFlux,
        Quantity::GroundHeatFlux,
        Quantity::EvaporativeFraction,
        Quantity::WaterFlux,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Quantity::Albedo => "albedo",
            Quantity::NetRadiation => "net_radiation",
            Quantity::LatentHeatFlux => "latent_heat_flux",
            Quantity::SensibleHeatFlux => "sensible_heat_flux",
            Quantity::GroundHeatFlux => "ground_heat_flux",
            Quantity::EvaporativeFraction => "evaporative_fraction",
            Quantity::WaterFlux => "water_flux",
        }
    }

    /// Human readable name with unit.
    pub fn label(&self) -> &'static str {
        match self {
            Quantity::Albedo => "albedo [-]",
            Quantity::NetRadiation => "net radiation [W/m²]",
            Quantity::LatentHeatFlux => "latent heat flux [W/m²]",
            Quantity::SensibleHeatFlux => "sensible heat flux [W/m²]",
            Quantity::GroundHeatFlux => "ground heat flux [W/m²]",
            Quantity::EvaporativeFraction => "evaporative fraction [-]",
            Quantity::WaterFlux => "water amount [mm/time/m²]",
        }
    }
}

/// Outputs of one engine run. All fields share the shape and
/// georeferencing of the LST field they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRasters {
    pub albedo: RasterField,
    pub net_radiation: RasterField,
    pub evaporative_fraction: RasterField,
    pub ground_heat_flux: RasterField,
    pub latent_heat_flux: RasterField,
    pub sensible_heat_flux: RasterField,
    pub water_flux: RasterField,
}

impl DerivedRasters {
    pub fn get(&self, quantity: Quantity) -> &RasterField {
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

    /// The six flux bands, in output order.
    pub fn output_bands(&self) -> impl Iterator<Item = (Quantity, &RasterField)> + '_ {
        Quantity::OUTPUT_BANDS.iter().map(move |&q| (q, self.get(q)))
    }
}

/// The energy balance engine. Holds no state besides its
/// configuration; one instance may serve any number of runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyBalance {
    clamp: ClampMode,
}

impl EnergyBalance {
    pub fn new(clamp: ClampMode) -> Self {
        EnergyBalance { clamp }
    }

    pub fn clamp_mode(&self) -> ClampMode {
        self.clamp
    }

    /// Run the full chain of stages over `lst`.
    pub fn run(&self, lst: &RasterField, params: &ResolvedParameters) -> Result<DerivedRasters> {
        let ResolvedParameters {
            tmin,
            tmax,
            air_temperature,
            time_period_seconds,
            ..
        } = *params;

        let albedo = self.albedo(lst, tmin, tmax, params.albedo);

        let net_radiation = match params.net_radiation {
            PixelParam::Scalar(v) => broadcast(lst, v),
            PixelParam::PerPixel => {
                let surface_emissivity = params.surface_emissivity.ok_or_else(|| {
                    Error::parameter("surface_emissivity", "required to compute net radiation")
                })?;
                net_radiation(
                    lst,
                    &albedo,
                    &RadiationBalance {
                        shortwave_irradiance: params.shortwave_irradiance,
                        surface_emissivity,
                        atmospheric_emissivity: params.atmospheric_emissivity,
                        air_temperature,
                    },
                )
            }
        };

        let evaporative_fraction = self.evaporative_fraction(lst, tmin, tmax);
        let ground_heat_flux =
            self.ground_heat_flux(lst, &net_radiation, tmin, tmax, params.ground_heat_flux_fraction);

        let available = net_radiation.zip_map(&ground_heat_flux, |rn, g| rn - g);
        let latent_heat_flux = available.zip_map(&evaporative_fraction, |a, ef| a * ef);
        let sensible_heat_flux = available.zip_map(&latent_heat_flux, |a, le| a - le);
        let water_flux = water_flux(&latent_heat_flux, time_period_seconds, air_temperature);

        let (rows, cols) = lst.shape();
        info!("energy balance computed over {}x{} pixels", cols, rows);

        Ok(DerivedRasters {
            albedo,
            net_radiation,
            evaporative_fraction,
            ground_heat_flux,
            latent_heat_flux,
            sensible_heat_flux,
            water_flux,
        })
    }

    /// Surface albedo after Timmermans et al. (2015): a linear
    /// ramp from 0.05 at `tmin` to 0.25 at `tmax`, unless a
    /// scalar is supplied. Clamped: values above 1 become
    /// 0.25, negative values 0.05.
    pub fn albedo(&self, lst: &RasterField, tmin: f64, tmax: f64, albedo: PixelParam) -> RasterField {
        let mut field = match albedo {
            PixelParam::Scalar(v) => broadcast(lst, v),
            PixelParam::PerPixel => lst.map(|t| {
                (ALBEDO_BASE + (t - tmin) / (tmax - tmin) * ALBEDO_SPAN).abs()
            }),
        };
        self.clamp_pass(&mut field, Quantity::Albedo, |v| {
            if v > 1. {
                0.25
            } else if v < 0. {
                0.05
            } else {
                v
            }
        });
        field
    }

    /// `(tmax - lst) / (tmax - tmin)`, clamped to `[0, 1]`.
    pub fn evaporative_fraction(&self, lst: &RasterField, tmin: f64, tmax: f64) -> RasterField {
        let mut field = lst.map(|t| (tmax - t) / (tmax - tmin));
        self.clamp_pass(&mut field, Quantity::EvaporativeFraction, |v| {
            if v >= 1. {
                1.
            } else if v <= 0. {
                0.
            } else {
                v
            }
        });
        field
    }

    /// Ground heat flux as a fraction of net radiation: the
    /// given percentage, or a ramp from 5% at `tmin` to 45% at
    /// `tmax`.
    ///
    /// The clamp bounds (above 1 becomes 0.45, negative becomes
    /// 0.05) apply to the flux itself, not to the fraction.
    pub fn ground_heat_flux(
        &self,
        lst: &RasterField,
        net_radiation: &RasterField,
        tmin: f64,
        tmax: f64,
        fraction_percent: Option<f64>,
    ) -> RasterField {
        let mut field = match fraction_percent {
            Some(percent) => net_radiation.map(|rn| rn * (percent / 100.)),
            None => net_radiation.zip_map(lst, |rn, t| {
                rn * (GROUND_FRACTION_BASE + (t - tmin) / (tmax - tmin) * GROUND_FRACTION_SPAN)
            }),
        };
        self.clamp_pass(&mut field, Quantity::GroundHeatFlux, |v| {
            if v > 1. {
                0.45
            } else if v < 0. {
                0.05
            } else {
                v
            }
        });
        field
    }

    fn clamp_pass<F>(&self, field: &mut RasterField, quantity: Quantity, clamp: F)
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        if self.clamp == ClampMode::SkipOnNoData && field.sum_is_nan() {
            warn!("{}: field holds no-data, clamping skipped", quantity.name());
            return;
        }
        field.data_mut().par_mapv_inplace(clamp);
    }
}

/// Scalar inputs of the radiation balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiationBalance {
    pub shortwave_irradiance: f64,
    pub surface_emissivity: f64,
    pub atmospheric_emissivity: f64,
    pub air_temperature: f64,
}

/// Net radiation: absorbed shortwave plus incoming longwave
/// from the atmosphere, minus longwave emitted by the
/// surface.
pub fn net_radiation(lst: &RasterField, albedo: &RasterField, balance: &RadiationBalance) -> RasterField {
    let RadiationBalance {
        shortwave_irradiance,
        surface_emissivity,
        atmospheric_emissivity,
        air_temperature,
    } = *balance;
    let incoming_longwave =
        surface_emissivity * atmospheric_emissivity * STEFAN_BOLTZMANN * air_temperature.powi(4);
    albedo.zip_map(lst, |a, t| {
        (1. - a) * shortwave_irradiance + incoming_longwave
            - surface_emissivity * STEFAN_BOLTZMANN * t.powi(4)
    })
}

/// Evapotranspired water (mm per `time_period_seconds`) from
/// the latent heat flux.
pub fn water_flux(latent_heat_flux: &RasterField, time_period_seconds: f64, air_temperature: f64) -> RasterField {
    let latent_heat = LATENT_HEAT_AT_ZERO - LATENT_HEAT_SLOPE * (air_temperature - CELSIUS_OFFSET);
    latent_heat_flux.map(|le| (le * time_period_seconds / 1_000_000.) / latent_heat)
}

/// `value` on every valid pixel of `lst`.
fn broadcast(lst: &RasterField, value: f64) -> RasterField {
    lst.map(|_| value)
}
