//! Raw model inputs, before resolution.
//!
//! Every input is either [`Param::Unset`] or
//! [`Param::Supplied`]. Values are typically collected from
//! strings (command line, a JSON parameter file) where an
//! empty string means "unset"; see [`ModelParameters::set`].

use std::{collections::BTreeMap, fmt, io::Read, str::FromStr};

use serde_derive::*;

use crate::{
    error::{Error, Result},
    solar,
};

/// An optional model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Param<T> {
    Unset,
    Supplied(T),
}

impl<T> Default for Param<T> {
    fn default() -> Self {
        Param::Unset
    }
}

impl<T: Copy> Param<T> {
    pub fn get(&self) -> Option<T> {
        match self {
            Param::Unset => None,
            Param::Supplied(v) => Some(*v),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Param::Supplied(_))
    }
}

impl Param<f64> {
    /// The supplied value, checked to be a finite number.
    pub fn finite(&self, name: ParameterName) -> Result<Option<f64>> {
        match self.get() {
            Some(v) if !v.is_finite() => Err(Error::parameter(
                name.as_str(),
                format!("{} is not a finite number", v),
            )),
            v => Ok(v),
        }
    }
}

impl<T> From<Option<T>> for Param<T> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Param::Unset, Param::Supplied)
    }
}

macro_rules! parameter_names {
    ($( $variant:ident => $name:literal, $flag:literal, $help:literal; )*) => {
        /// Names of the recognized model inputs.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ParameterName {
            $( #[doc = $help] $variant, )*
        }

        impl ParameterName {
            pub const ALL: &'static [ParameterName] = &[$( ParameterName::$variant ),*];

            /// `snake_case` name, as used in parameter files.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( ParameterName::$variant => $name, )*
                }
            }

            /// `kebab-case` name, as used for command line flags.
            pub fn flag(&self) -> &'static str {
                match self {
                    $( ParameterName::$variant => $flag, )*
                }
            }

            pub fn help(&self) -> &'static str {
                match self {
                    $( ParameterName::$variant => $help, )*
                }
            }
        }

        impl FromStr for ParameterName {
            type Err = Error;
            fn from_str(s: &str) -> Result<Self> {
                #[allow(unreachable_patterns)]
                match s {
                    $( $name | $flag => Ok(ParameterName::$variant), )*
                    _ => Err(Error::UnknownParameter(s.into())),
                }
            }
        }
    };
}

parameter_names! {
    TminThreshold => "tmin_threshold", "tmin-threshold",
        "Percentile of the valid LST pixels used as tmin";
    TmaxThreshold => "tmax_threshold", "tmax-threshold",
        "Percentile of the valid LST pixels used as tmax";
    Tmin => "tmin", "tmin",
        "Temperature of the coolest, fully evaporating surface (K)";
    Tmax => "tmax", "tmax",
        "Temperature of the hottest, dry surface (K)";
    AcquisitionTime => "acquisition_time", "acquisition-time",
        "UTC acquisition time, e.g. 2019-07-04T10:30:00";
    SurfaceEmissivity => "surface_emissivity", "surface-emissivity",
        "Broadband surface emissivity";
    AtmosphericTransmissivity => "atmospheric_transmissivity", "atmospheric-transmissivity",
        "Atmospheric transmissivity, in (0, 1)";
    AtmosphericEmissivity => "atmospheric_emissivity", "atmospheric-emissivity",
        "Atmospheric emissivity";
    AirTemperature => "air_temperature", "air-temperature",
        "Near-surface air temperature (K), defaults to tmin";
    TimePeriodSeconds => "time_period_seconds", "time-period-seconds",
        "Integration period of the water flux in seconds (default 3600)";
    ShortwaveIrradiance => "shortwave_irradiance", "shortwave-irradiance",
        "Incoming shortwave irradiance (W/m²)";
    GroundHeatFluxFraction => "ground_heat_flux_fraction", "ground-heat-flux-fraction",
        "Ground heat flux as a percentage of net radiation";
    Longitude => "longitude", "longitude",
        "Longitude in decimal degrees";
    Latitude => "latitude", "latitude",
        "Latitude in decimal degrees";
    NetRadiation => "net_radiation", "net-radiation",
        "Net radiation (W/m²) applied to every valid pixel";
    Albedo => "albedo", "albedo",
        "Surface albedo applied to every valid pixel";
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw inputs of a model run.
///
/// Built once per run and only read afterwards: resolution
/// produces a separate [`ResolvedParameters`] value.
///
/// [`ResolvedParameters`]: crate::resolve::ResolvedParameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelParameters {
    pub tmin_threshold: Param<f64>,
    pub tmax_threshold: Param<f64>,
    pub tmin: Param<f64>,
    pub tmax: Param<f64>,
    pub acquisition_time: Param<solar::AcquisitionTime>,
    pub surface_emissivity: Param<f64>,
    pub atmospheric_transmissivity: Param<f64>,
    pub atmospheric_emissivity: Param<f64>,
    pub air_temperature: Param<f64>,
    pub time_period_seconds: Param<f64>,
    pub shortwave_irradiance: Param<f64>,
    pub ground_heat_flux_fraction: Param<f64>,
    pub longitude: Param<f64>,
    pub latitude: Param<f64>,
    pub net_radiation: Param<f64>,
    pub albedo: Param<f64>,
}

impl ModelParameters {
    /// Set a parameter from its textual form. An empty (or
    /// all whitespace) value unsets it.
    pub fn set(&mut self, name: ParameterName, value: &str) -> Result<()> {
        let value = value.trim();
        if name == ParameterName::AcquisitionTime {
            self.acquisition_time = if value.is_empty() {
                Param::Unset
            } else {
                Param::Supplied(value.parse()?)
            };
            return Ok(());
        }

        let parsed = if value.is_empty() {
            Param::Unset
        } else {
            Param::Supplied(parse_number(name, value)?)
        };
        if let Some(param) = self.scalar_mut(name) {
            *param = parsed;
        }
        Ok(())
    }

    /// Same as [`set`](Self::set), looking the parameter up by
    /// name.
    pub fn set_by_name(&mut self, name: &str, value: &str) -> Result<()> {
        self.set(name.parse()?, value)
    }

    /// Builder style [`set`](Self::set).
    pub fn with(mut self, name: ParameterName, value: &str) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn is_set(&self, name: ParameterName) -> bool {
        match self.scalar(name) {
            Some(param) => param.is_set(),
            None => self.acquisition_time.is_set(),
        }
    }

    /// Apply every entry of a JSON parameter file. Later calls
    /// overwrite earlier values.
    pub fn apply_json<R: Read>(&mut self, rdr: R) -> anyhow::Result<()> {
        let file: ParameterFile = serde_json::from_reader(rdr)?;
        for (name, value) in file.0 {
            let value = match value {
                ParameterValue::Null => String::new(),
                ParameterValue::Number(v) => v.to_string(),
                ParameterValue::Text(s) => s,
            };
            self.set_by_name(&name, &value)?;
        }
        Ok(())
    }

    /// The scalar slot for `name`; `None` for the acquisition
    /// time, which is not a number.
    fn scalar(&self, name: ParameterName) -> Option<&Param<f64>> {
        use ParameterName::*;
        let param = match name {
            TminThreshold => &self.tmin_threshold,
            TmaxThreshold => &self.tmax_threshold,
            Tmin => &self.tmin,
            Tmax => &self.tmax,
            SurfaceEmissivity => &self.surface_emissivity,
            AtmosphericTransmissivity => &self.atmospheric_transmissivity,
            AtmosphericEmissivity => &self.atmospheric_emissivity,
            AirTemperature => &self.air_temperature,
            TimePeriodSeconds => &self.time_period_seconds,
            ShortwaveIrradiance => &self.shortwave_irradiance,
            GroundHeatFluxFraction => &self.ground_heat_flux_fraction,
            Longitude => &self.longitude,
            Latitude => &self.latitude,
            NetRadiation => &self.net_radiation,
            Albedo => &self.albedo,
            ParameterName::AcquisitionTime => return None,
        };
        Some(param)
    }

    fn scalar_mut(&mut self, name: ParameterName) -> Option<&mut Param<f64>> {
        use ParameterName::*;
        let param = match name {
            TminThreshold => &mut self.tmin_threshold,
            TmaxThreshold => &mut self.tmax_threshold,
            Tmin => &mut self.tmin,
            Tmax => &mut self.tmax,
            SurfaceEmissivity => &mut self.surface_emissivity,
            AtmosphericTransmissivity => &mut self.atmospheric_transmissivity,
            AtmosphericEmissivity => &mut self.atmospheric_emissivity,
            AirTemperature => &mut self.air_temperature,
            TimePeriodSeconds => &mut self.time_period_seconds,
            ShortwaveIrradiance => &mut self.shortwave_irradiance,
            GroundHeatFluxFraction => &mut self.ground_heat_flux_fraction,
            Longitude => &mut self.longitude,
            Latitude => &mut self.latitude,
            NetRadiation => &mut self.net_radiation,
            Albedo => &mut self.albedo,
            ParameterName::AcquisitionTime => return None,
        };
        Some(param)
    }
}

fn parse_number(name: ParameterName, value: &str) -> Result<f64> {
    let v: f64 = value.parse().map_err(|_| {
        Error::parameter(name.as_str(), format!("{:?} is not a number", value))
    })?;
    Param::Supplied(v).finite(name)?;
    Ok(v)
}

/// Contents of a JSON parameter file: an object mapping
/// parameter names to numbers, strings or `null`.
#[derive(Deserialize, Debug)]
#[serde(transparent)]
struct ParameterFile(BTreeMap<String, ParameterValue>);

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ParameterValue {
    Null,
    Number(f64),
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in ParameterName::ALL {
            assert_eq!(name.as_str().parse::<ParameterName>().unwrap(), *name);
            assert_eq!(name.flag().parse::<ParameterName>().unwrap(), *name);
        }
        assert_eq!(ParameterName::ALL.len(), 16);
        assert_eq!(
            "rn".parse::<ParameterName>(),
            Err(Error::UnknownParameter("rn".into()))
        );
    }

    #[test]
    fn empty_strings_are_unset() -> Result<()> {
        let params = ModelParameters::default()
            .with(ParameterName::Tmin, "290.5")?
            .with(ParameterName::Tmin, "  ")?
            .with(ParameterName::AcquisitionTime, "")?;
        assert_eq!(params.tmin, Param::Unset);
        assert_eq!(params.acquisition_time, Param::Unset);
        Ok(())
    }

    #[test]
    fn parses_values() -> Result<()> {
        let params = ModelParameters::default()
            .with(ParameterName::SurfaceEmissivity, "0.98")?
            .with(ParameterName::Longitude, "-3.5")?
            .with(ParameterName::AcquisitionTime, "2019-07-04T10:30:00")?;
        assert_eq!(params.surface_emissivity, Param::Supplied(0.98));
        assert_eq!(params.longitude, Param::Supplied(-3.5));
        assert!(params.is_set(ParameterName::AcquisitionTime));
        assert!(!params.is_set(ParameterName::Latitude));
        Ok(())
    }

    #[test]
    fn rejects_non_numeric_values() {
        let mut params = ModelParameters::default();
        for value in &["abc", "0.98 K", "NaN", "inf"] {
            match params.set(ParameterName::SurfaceEmissivity, value) {
                Err(Error::Parameter { name, .. }) => assert_eq!(name, "surface_emissivity"),
                other => panic!("expected error for {:?}, got {:?}", value, other),
            }
        }
        assert!(params.set(ParameterName::AcquisitionTime, "yesterday").is_err());
    }

    #[test]
    fn finite_check_on_supplied_values() {
        assert_eq!(Param::<f64>::Unset.finite(ParameterName::Tmin), Ok(None));
        assert_eq!(Param::Supplied(1.).finite(ParameterName::Tmin), Ok(Some(1.)));
        assert!(Param::Supplied(f64::NAN).finite(ParameterName::Tmin).is_err());
    }

    #[test]
    fn applies_json_files() -> anyhow::Result<()> {
        let json = r#"{
            "tmin_threshold": 0.5,
            "tmax-threshold": "99.5",
            "acquisition_time": "2019-07-04T10:30:00",
            "net_radiation": null
        }"#;
        let mut params = ModelParameters::default().with(ParameterName::NetRadiation, "500")?;
        params.apply_json(json.as_bytes())?;
        assert_eq!(params.tmin_threshold, Param::Supplied(0.5));
        assert_eq!(params.tmax_threshold, Param::Supplied(99.5));
        assert_eq!(params.net_radiation, Param::Unset);
        assert!(params.acquisition_time.is_set());

        let unknown = ModelParameters::default().apply_json(r#"{"rn": 1}"#.as_bytes());
        assert!(unknown.is_err());
        Ok(())
    }
}
