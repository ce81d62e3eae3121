//! Run reports: a plain text summary and its JSON counterpart.

use std::fmt;

use serde_derive::*;

use crate::{engine::Quantity, model::ModelRun, stats::Summary};

/// Parameters and flux statistics of one run.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub input: String,
    pub acquisition_time: Option<String>,
    pub tmin: f64,
    pub tmax: f64,
    pub lst_mean: f64,
    pub surface_emissivity: Option<f64>,
    pub atmospheric_emissivity: f64,
    pub atmospheric_transmissivity: f64,
    pub solar_elevation: Option<f64>,
    pub albedo_mean: f64,
    pub shortwave_irradiance: f64,
    pub air_temperature: f64,
    pub time_period_seconds: f64,
    pub fluxes: Vec<FluxRow>,
}

/// Statistics of one output band.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FluxRow {
    pub quantity: Quantity,
    pub label: &'static str,
    #[serde(flatten)]
    pub summary: Summary,
}

impl Report {
    pub fn new<S: Into<String>>(input: S, run: &ModelRun) -> Self {
        let params = &run.parameters;
        let fluxes = Quantity::OUTPUT_BANDS
            .iter()
            .map(|&quantity| FluxRow {
                quantity,
                label: quantity.label(),
                summary: *run.summary.get(quantity),
            })
            .collect();

        Report {
            input: input.into(),
            acquisition_time: params.acquisition_time.map(|t| t.to_string()),
            tmin: params.tmin,
            tmax: params.tmax,
            lst_mean: run.lst.mean,
            surface_emissivity: params.surface_emissivity,
            atmospheric_emissivity: params.atmospheric_emissivity,
            atmospheric_transmissivity: params.atmospheric_transmissivity,
            solar_elevation: params.solar_elevation,
            albedo_mean: run.summary.albedo.mean,
            shortwave_irradiance: params.shortwave_irradiance,
            air_temperature: params.air_temperature,
            time_period_seconds: params.time_period_seconds,
            fluxes,
        }
    }
}

struct OrNa<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for OrNa<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => fmt::Display::fmt(v, f),
            None => f.write_str("n/a"),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "thermal-et output stats:")?;
        writeln!(f, "Input file name: {}", self.input)?;
        writeln!(f, "utc: {}", OrNa(&self.acquisition_time))?;
        writeln!(f, "Temperature information:")?;
        writeln!(f, "tmin: {}", self.tmin)?;
        writeln!(f, "tmax: {}", self.tmax)?;
        writeln!(f, "temp mean: {}", self.lst_mean)?;
        writeln!(f, "Model parameters:")?;
        writeln!(f, "surf_emis: {}", OrNa(&self.surface_emissivity))?;
        writeln!(f, "atm_emis: {}", self.atmospheric_emissivity)?;
        writeln!(f, "atm_trans: {}", self.atmospheric_transmissivity)?;
        writeln!(f, "solar_elev_ang: {}", OrNa(&self.solar_elevation))?;
        writeln!(f, "albedo mean: {}", self.albedo_mean)?;
        writeln!(f, "sw_irr: {}", self.shortwave_irradiance)?;
        writeln!(f, "air_temp: {}", self.air_temperature)?;
        writeln!(f, "time_period: {}", self.time_period_seconds)?;
        writeln!(f, "Output raster information:")?;
        writeln!(f, "flux mean min max")?;
        for row in &self.fluxes {
            writeln!(
                f,
                "{} {} {} {}",
                row.label, row.summary.mean, row.summary.min, row.summary.max
            )?;
        }
        Ok(())
    }
}
