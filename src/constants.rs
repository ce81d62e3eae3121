//! Physical constants used by the energy-balance model.
//!
//! Values follow the DATTUTDUT formulation of [Timmermans et
//! al. (2015)] and are not meant to be tuned per run.
//!
//! [Timmermans et al. (2015)]: //doi.org/10.1515/acgeo-2015-0016

/// Stefan-Boltzmann constant (W m⁻² K⁻⁴).
pub const STEFAN_BOLTZMANN: f64 = 5.6704e-8;

/// Exo-atmospheric shortwave irradiance, i.e. the solar
/// constant at the top of the atmosphere (W m⁻²).
pub const EXO_ATMOSPHERIC_IRRADIANCE: f64 = 1361.5;

/// Offset between Kelvin and degrees Celsius.
pub const CELSIUS_OFFSET: f64 = 273.15;

/// Integration period used when none is given: one hour.
pub const DEFAULT_TIME_PERIOD_SECONDS: f64 = 3600.;

// Latent heat of vaporization (MJ kg⁻¹) as a linear function
// of air temperature in Celsius: L = 2.501 - 0.002361 T
pub(crate) const LATENT_HEAT_AT_ZERO: f64 = 2.501;
pub(crate) const LATENT_HEAT_SLOPE: f64 = 0.002361;

// Albedo and ground heat flux fraction ramps over the
// [tmin, tmax] temperature range.
pub(crate) const ALBEDO_BASE: f64 = 0.05;
pub(crate) const ALBEDO_SPAN: f64 = 0.2;
pub(crate) const GROUND_FRACTION_BASE: f64 = 0.05;
pub(crate) const GROUND_FRACTION_SPAN: f64 = 0.4;
