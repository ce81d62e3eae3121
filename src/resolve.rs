//! Resolution of raw inputs into concrete model parameters.
//!
//! Each parameter is either taken from the user, set to a
//! default, or derived from the LST raster / solar geometry.
//! The order of the steps in [`resolve`] is fixed: later
//! defaults depend on earlier results. A derived value is
//! used exactly like a supplied one downstream.

use log::{debug, info};

use crate::{
    constants::{DEFAULT_TIME_PERIOD_SECONDS, EXO_ATMOSPHERIC_IRRADIANCE},
    error::{Error, Result},
    params::{ModelParameters, ParameterName},
    raster::RasterField,
    solar::{solar_elevation_angle, AcquisitionTime, Location},
};

/// A parameter that is either one scalar for the whole
/// raster, or computed pixel by pixel by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelParam {
    Scalar(f64),
    PerPixel,
}

/// Fully resolved parameters of a model run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameters {
    pub tmin: f64,
    pub tmax: f64,
    pub air_temperature: f64,
    pub time_period_seconds: f64,
    pub albedo: PixelParam,
    pub acquisition_time: Option<AcquisitionTime>,
    /// Location used for the solar geometry; only resolved
    /// when an acquisition time is given.
    pub location: Option<Location>,
    /// Solar elevation angle in degrees, if an acquisition
    /// time is given.
    pub solar_elevation: Option<f64>,
    pub atmospheric_transmissivity: f64,
    pub shortwave_irradiance: f64,
    pub atmospheric_emissivity: f64,
    /// Only required when net radiation is computed per pixel.
    pub surface_emissivity: Option<f64>,
    pub net_radiation: PixelParam,
    /// Percentage of net radiation going into the ground; the
    /// engine uses a temperature ramp when unset.
    pub ground_heat_flux_fraction: Option<f64>,
}

/// Resolve `raw` against the land surface temperature field.
pub fn resolve(raw: &ModelParameters, lst: &RasterField) -> Result<ResolvedParameters> {
    use ParameterName::*;

    let tmin = temperature_bound(raw, lst, Tmin, TminThreshold)?;
    let tmax = temperature_bound(raw, lst, Tmax, TmaxThreshold)?;

    let air_temperature = match raw.air_temperature.finite(AirTemperature)? {
        Some(v) => v,
        None => {
            debug!("air_temperature: using tmin ({})", tmin);
            tmin
        }
    };

    let time_period_seconds = match raw.time_period_seconds.finite(TimePeriodSeconds)? {
        Some(v) => v,
        None => {
            debug!(
                "time_period_seconds: using default ({})",
                DEFAULT_TIME_PERIOD_SECONDS
            );
            DEFAULT_TIME_PERIOD_SECONDS
        }
    };

    let albedo = match raw.albedo.finite(Albedo)? {
        Some(v) => PixelParam::Scalar(v),
        None => PixelParam::PerPixel,
    };

    let acquisition_time = raw.acquisition_time.get();
    let location = match acquisition_time {
        Some(_) => Some(location(raw, lst)?),
        None => None,
    };
    let solar_elevation = match (acquisition_time, location) {
        (Some(time), Some(location)) => {
            let elevation = solar_elevation_angle(time, location);
            debug!(
                "solar elevation at {} ({}, {}): {}",
                time, location.longitude, location.latitude, elevation
            );
            Some(elevation)
        }
        _ => None,
    };

    let atmospheric_transmissivity =
        match raw.atmospheric_transmissivity.finite(AtmosphericTransmissivity)? {
            Some(v) => v,
            None => {
                let elevation = solar_elevation.ok_or_else(|| {
                    Error::parameter(
                        AtmosphericTransmissivity.as_str(),
                        "not supplied, and cannot be derived without `acquisition_time`",
                    )
                })?;
                let v = transmissivity_from_elevation(elevation);
                debug!("atmospheric_transmissivity: derived from elevation ({})", v);
                v
            }
        };

    let shortwave_irradiance = match raw.shortwave_irradiance.finite(ShortwaveIrradiance)? {
        Some(v) => v,
        None => {
            let v = match solar_elevation {
                None => EXO_ATMOSPHERIC_IRRADIANCE * atmospheric_transmissivity,
                Some(elevation) => {
                    EXO_ATMOSPHERIC_IRRADIANCE
                        * atmospheric_transmissivity
                        * elevation.to_radians().sin()
                }
            };
            debug!("shortwave_irradiance: derived ({})", v);
            v
        }
    };

    let atmospheric_emissivity = match raw.atmospheric_emissivity.finite(AtmosphericEmissivity)? {
        Some(v) => v,
        None => {
            let v = emissivity_from_transmissivity(atmospheric_transmissivity)?;
            debug!("atmospheric_emissivity: derived from transmissivity ({})", v);
            v
        }
    };

    let net_radiation = match raw.net_radiation.finite(NetRadiation)? {
        Some(v) => PixelParam::Scalar(v),
        None => PixelParam::PerPixel,
    };

    let surface_emissivity = raw.surface_emissivity.finite(SurfaceEmissivity)?;
    if net_radiation == PixelParam::PerPixel && surface_emissivity.is_none() {
        return Err(Error::parameter(
            SurfaceEmissivity.as_str(),
            "required to compute net radiation",
        ));
    }

    let ground_heat_flux_fraction = raw.ground_heat_flux_fraction.finite(GroundHeatFluxFraction)?;

    let resolved = ResolvedParameters {
        tmin,
        tmax,
        air_temperature,
        time_period_seconds,
        albedo,
        acquisition_time,
        location,
        solar_elevation,
        atmospheric_transmissivity,
        shortwave_irradiance,
        atmospheric_emissivity,
        surface_emissivity,
        net_radiation,
        ground_heat_flux_fraction,
    };
    info!("resolved parameters: {:?}", resolved);
    Ok(resolved)
}

/// `tmin` / `tmax`: the supplied value, or the given
/// percentile of the valid LST pixels.
fn temperature_bound(
    raw: &ModelParameters,
    lst: &RasterField,
    name: ParameterName,
    threshold: ParameterName,
) -> Result<f64> {
    let (value, percentile) = match name {
        ParameterName::Tmin => (&raw.tmin, &raw.tmin_threshold),
        _ => (&raw.tmax, &raw.tmax_threshold),
    };
    if let Some(v) = value.finite(name)? {
        return Ok(v);
    }

    let q = percentile.finite(threshold)?.ok_or_else(|| {
        Error::parameter(
            threshold.as_str(),
            format!("required when `{}` is not supplied", name),
        )
    })?;
    let v = lst.percentile("lst", q).map_err(|e| match e {
        Error::Parameter { reason, .. } => Error::parameter(threshold.as_str(), reason),
        e => e,
    })?;
    debug!("{}: {} percentile of lst ({})", name, q, v);
    Ok(v)
}

/// Supplied longitude and latitude, or the raster origin when
/// neither is supplied.
fn location(raw: &ModelParameters, lst: &RasterField) -> Result<Location> {
    let longitude = raw.longitude.finite(ParameterName::Longitude)?;
    let latitude = raw.latitude.finite(ParameterName::Latitude)?;
    match (longitude, latitude) {
        (Some(longitude), Some(latitude)) => Ok(Location {
            longitude,
            latitude,
        }),
        (None, None) => {
            let transform = lst.transform();
            debug!(
                "location: using raster origin ({}, {})",
                transform.origin_x, transform.origin_y
            );
            Ok(Location {
                longitude: transform.origin_x,
                latitude: transform.origin_y,
            })
        }
        (None, Some(_)) => Err(Error::parameter(
            "longitude",
            "must be supplied together with `latitude`",
        )),
        (Some(_), None) => Err(Error::parameter(
            "latitude",
            "must be supplied together with `longitude`",
        )),
    }
}

/// Transmissivity from solar elevation (degrees), after
/// Burridge and Gadd (1977).
pub fn transmissivity_from_elevation(elevation: f64) -> f64 {
    0.6 + 0.2 * elevation.to_radians().sin()
}

/// Atmospheric emissivity from transmissivity, after
/// Bastiaanssen et al. (1998). Defined for transmissivity in
/// the open interval `(0, 1)`.
pub fn emissivity_from_transmissivity(transmissivity: f64) -> Result<f64> {
    if !(transmissivity > 0. && transmissivity < 1.) {
        return Err(Error::parameter(
            ParameterName::AtmosphericEmissivity.as_str(),
            format!(
                "cannot derive from atmospheric transmissivity {} (must lie in (0, 1))",
                transmissivity
            ),
        ));
    }
    Ok(1.08 * (-transmissivity.ln()).powf(0.265))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Param;
    use crate::raster::{GeoTransform, Projection};
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    fn lst() -> RasterField {
        RasterField::new(array![[290., 295.], [300., 305.]])
    }

    /// Inputs that need nothing from the image or the sun.
    fn manual() -> ModelParameters {
        ModelParameters {
            tmin: Param::Supplied(290.),
            tmax: Param::Supplied(305.),
            surface_emissivity: Param::Supplied(0.98),
            atmospheric_transmissivity: Param::Supplied(0.75),
            shortwave_irradiance: Param::Supplied(800.),
            ..Default::default()
        }
    }

    fn parameter_error_name<T: std::fmt::Debug>(res: Result<T>) -> &'static str {
        match res {
            Err(Error::Parameter { name, .. }) => name,
            other => panic!("expected parameter error, got {:?}", other),
        }
    }

    #[test]
    fn defaults() -> Result<()> {
        let p = resolve(&manual(), &lst())?;
        assert_eq!(p.air_temperature, 290.);
        assert_eq!(p.time_period_seconds, 3600.);
        assert_eq!(p.albedo, PixelParam::PerPixel);
        assert_eq!(p.net_radiation, PixelParam::PerPixel);
        assert_eq!(p.ground_heat_flux_fraction, None);
        assert_eq!(p.solar_elevation, None);
        assert_eq!(p.location, None);
        assert_eq!(p.shortwave_irradiance, 800.);
        assert_relative_eq!(
            p.atmospheric_emissivity,
            1.08 * (-(0.75f64).ln()).powf(0.265)
        );
        Ok(())
    }

    #[test]
    fn temperature_bounds_from_percentiles() -> Result<()> {
        let raw = ModelParameters {
            tmin: Param::Unset,
            tmax: Param::Unset,
            tmin_threshold: Param::Supplied(0.),
            tmax_threshold: Param::Supplied(100.),
            ..manual()
        };
        let p = resolve(&raw, &lst())?;
        assert_eq!((p.tmin, p.tmax), (290., 305.));
        // air temperature follows the derived tmin
        assert_eq!(p.air_temperature, 290.);
        Ok(())
    }

    #[test]
    fn percentile_requires_threshold() {
        let raw = ModelParameters {
            tmax: Param::Unset,
            ..manual()
        };
        assert_eq!(parameter_error_name(resolve(&raw, &lst())), "tmax_threshold");

        let raw = ModelParameters {
            tmax: Param::Unset,
            tmax_threshold: Param::Supplied(101.),
            ..manual()
        };
        assert_eq!(parameter_error_name(resolve(&raw, &lst())), "tmax_threshold");
    }

    #[test]
    fn percentile_of_empty_raster() {
        let raw = ModelParameters {
            tmin: Param::Unset,
            tmin_threshold: Param::Supplied(1.),
            ..manual()
        };
        let empty = RasterField::new(Array2::from_elem((3, 3), f64::NAN));
        assert_eq!(resolve(&raw, &empty), Err(Error::EmptyField { name: "lst" }));
    }

    #[test]
    fn irradiance_without_time() -> Result<()> {
        let raw = ModelParameters {
            shortwave_irradiance: Param::Unset,
            ..manual()
        };
        let p = resolve(&raw, &lst())?;
        assert_relative_eq!(p.shortwave_irradiance, 1361.5 * 0.75);
        Ok(())
    }

    #[test]
    fn irradiance_and_transmissivity_from_sun() -> Result<()> {
        let raw = ModelParameters {
            shortwave_irradiance: Param::Unset,
            atmospheric_transmissivity: Param::Unset,
            acquisition_time: Param::Supplied("2019-06-21T11:00:00".parse()?),
            longitude: Param::Supplied(11.58),
            latitude: Param::Supplied(48.14),
            ..manual()
        };
        let p = resolve(&raw, &lst())?;
        let elevation = p.solar_elevation.unwrap();
        let sin = elevation.to_radians().sin();
        assert_relative_eq!(p.atmospheric_transmissivity, 0.6 + 0.2 * sin);
        assert_relative_eq!(
            p.shortwave_irradiance,
            1361.5 * p.atmospheric_transmissivity * sin
        );
        Ok(())
    }

    #[test]
    fn supplied_irradiance_ignores_time() -> Result<()> {
        let raw = ModelParameters {
            acquisition_time: Param::Supplied("2019-06-21T11:00:00".parse()?),
            longitude: Param::Supplied(11.58),
            latitude: Param::Supplied(48.14),
            ..manual()
        };
        let p = resolve(&raw, &lst())?;
        assert_eq!(p.shortwave_irradiance, 800.);
        assert_eq!(p.atmospheric_transmissivity, 0.75);
        assert!(p.solar_elevation.is_some());
        Ok(())
    }

    #[test]
    fn transmissivity_requires_time() {
        let raw = ModelParameters {
            atmospheric_transmissivity: Param::Unset,
            ..manual()
        };
        assert_eq!(
            parameter_error_name(resolve(&raw, &lst())),
            "atmospheric_transmissivity"
        );
    }

    #[test]
    fn location_falls_back_to_raster_origin() -> Result<()> {
        let field = RasterField::with_georeference(
            array![[290., 300.]],
            GeoTransform::new(11.58, 48.14, 0.001, -0.001),
            Projection::default(),
        );
        let raw = ModelParameters {
            acquisition_time: Param::Supplied("2019-06-21T11:00:00".parse()?),
            ..manual()
        };
        let p = resolve(&raw, &field)?;
        assert_eq!(
            p.location,
            Some(Location {
                longitude: 11.58,
                latitude: 48.14
            })
        );

        let half = ModelParameters {
            longitude: Param::Supplied(11.58),
            ..raw
        };
        assert_eq!(parameter_error_name(resolve(&half, &field)), "latitude");
        Ok(())
    }

    #[test]
    fn emissivity_needs_transmissivity_below_one() {
        for t in &[1., 1.2, 0., -0.5] {
            let raw = ModelParameters {
                atmospheric_transmissivity: Param::Supplied(*t),
                ..manual()
            };
            assert_eq!(
                parameter_error_name(resolve(&raw, &lst())),
                "atmospheric_emissivity"
            );
        }

        // a supplied emissivity does not look at transmissivity
        let raw = ModelParameters {
            atmospheric_transmissivity: Param::Supplied(1.),
            atmospheric_emissivity: Param::Supplied(0.8),
            ..manual()
        };
        assert!(resolve(&raw, &lst()).is_ok());
    }

    #[test]
    fn surface_emissivity_only_needed_for_computed_net_radiation() {
        let raw = ModelParameters {
            surface_emissivity: Param::Unset,
            ..manual()
        };
        assert_eq!(
            parameter_error_name(resolve(&raw, &lst())),
            "surface_emissivity"
        );

        let raw = ModelParameters {
            net_radiation: Param::Supplied(500.),
            ..raw
        };
        let p = resolve(&raw, &lst()).unwrap();
        assert_eq!(p.net_radiation, PixelParam::Scalar(500.));
        assert_eq!(p.surface_emissivity, None);
    }

    #[test]
    fn rejects_non_finite_values() {
        let raw = ModelParameters {
            air_temperature: Param::Supplied(f64::NAN),
            ..manual()
        };
        assert_eq!(parameter_error_name(resolve(&raw, &lst())), "air_temperature");
    }
}
