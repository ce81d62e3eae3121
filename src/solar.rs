//! Solar position from acquisition time and location.
//!
//! Declination and time correction are evaluated with the
//! truncated Fourier series used by the [SunPositionCalculator],
//! in degrees of the orbital angle `g`.
//!
//! [SunPositionCalculator]: //github.com/mperezcorrales/SunPositionCalculator

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Format of acquisition timestamps, e.g. `2019-07-04T10:30:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// UTC time at which the thermal image was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionTime(NaiveDateTime);

impl AcquisitionTime {
    pub fn new(utc: NaiveDateTime) -> Self {
        AcquisitionTime(utc)
    }

    pub fn utc(&self) -> NaiveDateTime {
        self.0
    }

    /// Day of year, starting at 1 on January 1st.
    pub fn day_of_year(&self) -> f64 {
        self.0.ordinal() as f64
    }

    /// Hour of day with minute resolution.
    pub fn fractional_hour(&self) -> f64 {
        self.0.hour() as f64 + self.0.minute() as f64 / 60.
    }
}

impl FromStr for AcquisitionTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
            .map(AcquisitionTime)
            .map_err(|e| {
                Error::parameter(
                    "acquisition_time",
                    format!("cannot parse {:?} as {}: {}", s, TIMESTAMP_FORMAT, e),
                )
            })
    }
}

impl fmt::Display for AcquisitionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// Geographic location in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

// declination = Σ a_k cos(k g) + b_k sin(k g)
const DECLINATION_COS: [f64; 4] = [0.396372, -22.91327, -0.387205, -0.154527];
const DECLINATION_SIN: [f64; 4] = [0., 4.02543, 0.051967, 0.084798];

const TIME_CORRECTION_COS: [f64; 3] = [0.004297, 0.107029, -0.837378];
const TIME_CORRECTION_SIN: [f64; 3] = [0., -1.837877, -2.340475];

#[inline]
fn fourier_series_at(cos: &[f64], sin: &[f64], angle: f64) -> f64 {
    cos.iter()
        .zip(sin.iter())
        .enumerate()
        .map(|(k, (a, b))| {
            let k = k as f64;
            a * (k * angle).cos() + b * (k * angle).sin()
        })
        .sum()
}

/// Solar elevation angle in degrees above the horizon.
///
/// Deterministic and side effect free: identical inputs
/// always yield the identical angle.
pub fn solar_elevation_angle(time: AcquisitionTime, location: Location) -> f64 {
    let hour = time.fractional_hour();

    // orbital angle
    let g = (360. / 365.25) * (time.day_of_year() + hour / 24.);
    let g = g.to_radians();

    let declination = fourier_series_at(&DECLINATION_COS, &DECLINATION_SIN, g);
    let time_correction = fourier_series_at(&TIME_CORRECTION_COS, &TIME_CORRECTION_SIN, g);

    let mut hour_angle = (hour - 12.) * 15. + location.longitude + time_correction;
    if hour_angle > 180. {
        hour_angle -= 360.;
    } else if hour_angle < -180. {
        hour_angle += 360.;
    }

    let lat = location.latitude.to_radians();
    let decl = declination.to_radians();
    let cos_zenith =
        lat.sin() * decl.sin() + lat.cos() * decl.cos() * hour_angle.to_radians().cos();

    // rounding may push the cosine marginally out of [-1, 1]
    let zenith = cos_zenith.max(-1.).min(1.).acos().to_degrees();

    90. - zenith
}
