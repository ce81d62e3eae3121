//! Evapotranspiration from a single thermal image.
//!
//! Implements the DATTUTDUT energy balance model of
//! [Timmermans et al. (2015)]: given a land surface
//! temperature (LST) raster and a handful of optional scalar
//! parameters, compute pixel by pixel the net radiation,
//! ground heat flux, evaporative fraction, sensible and
//! latent heat flux, and the evapotranspired water.
//!
//! # Usage
//!
//! A run goes through three steps:
//!
//! 1. [`resolve`](resolve::resolve) the raw
//! [`ModelParameters`]: every unset parameter is given a
//! default, or derived from the raster (temperature
//! percentiles) or from the sun position at acquisition time.
//!
//! 2. Run the [`EnergyBalance`] over the LST field to obtain
//! the [`DerivedRasters`].
//!
//! 3. [`summarize`](stats::summarize) the derived fields.
//!
//! [`model::run`] does all three at once:
//!
//! ```rust
//! # fn test_compile() -> anyhow::Result<()> {
//! use thermal_et::{io, model, ClampMode, ModelParameters, ParameterName};
//!
//! let lst = io::read_lst("lst.tif")?;
//! let params = ModelParameters::default()
//!     .with(ParameterName::TminThreshold, "0.5")?
//!     .with(ParameterName::TmaxThreshold, "99.5")?
//!     .with(ParameterName::SurfaceEmissivity, "0.98")?
//!     .with(ParameterName::AcquisitionTime, "2019-07-04T10:30:00")?;
//! let run = model::run(&params, &lst, ClampMode::default())?;
//! io::write_flux_raster("fluxes.tif", &run.rasters)?;
//! # Ok(())
//! # }
//! ```
//!
//! # No-data
//!
//! Pixels equal to 0 in the input raster are no-data. They are
//! NaN inside the model, propagate through every stage, and
//! are written back as 0.
//!
//! [Timmermans et al. (2015)]: //doi.org/10.1515/acgeo-2015-0016

pub mod constants;
pub mod error;

pub mod raster;
pub mod solar;

pub mod params;
pub mod resolve;

pub mod engine;
pub mod model;
pub mod stats;

pub mod io;
pub mod report;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::engine::{ClampMode, DerivedRasters, EnergyBalance, Quantity};
pub use crate::error::{Error, Result};
pub use crate::params::{ModelParameters, Param, ParameterName};
pub use crate::raster::{GeoTransform, Projection, RasterField};
pub use crate::resolve::ResolvedParameters;
